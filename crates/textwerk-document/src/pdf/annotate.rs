// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Highlight annotations with a ready-made appearance stream.

use lopdf::content::Operation;
use lopdf::{Object, ObjectId, dictionary};
use textwerk_core::Rect;
use textwerk_core::error::{Result, TextwerkError};
use tracing::{debug, instrument};

use super::document::PdfDocument;
use super::geometry::PageGeometry;
use super::objects::{get_name, get_resolved, numbers, page_dict_mut, reals, resolve};

/// Print flag: the annotation is printed with the page.
const PRINT: i64 = 4;

impl PdfDocument {
    /// Add a yellow `/Highlight` annotation covering `rect` (page space) on
    /// 0-based `page`. Returns the annotation's object id.
    #[instrument(skip(self))]
    pub fn add_highlight(&mut self, page: usize, rect: Rect) -> Result<ObjectId> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::of_page(&self.document, page_id);
        let [llx, lly, urx, ury] = geometry.rect_to_pdf(&rect);
        let (width, height) = (urx - llx, ury - lly);

        let appearance = self.add_content_stream(vec![
            Operation::new("gs", vec![Object::Name(b"Multiply".to_vec())]),
            Operation::new("rg", vec![1.into(), 1.into(), 0.into()]),
            Operation::new(
                "re",
                vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            ),
            Operation::new("f", vec![]),
        ])?;
        let form = self
            .document
            .get_object_mut(appearance)
            .and_then(Object::as_stream_mut)
            .map_err(|err| TextwerkError::Pdf(format!("appearance stream: {err}")))?;
        form.dict.extend(&dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => reals(&[0.0, 0.0, width, height]),
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "Multiply" => dictionary! {
                        "Type" => "ExtGState",
                        "BM" => "Multiply",
                    },
                },
            },
        });

        let annotation = self.document.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
            "Rect" => reals(&[llx, lly, urx, ury]),
            "QuadPoints" => reals(&[llx, ury, urx, ury, llx, lly, urx, lly]),
            "C" => reals(&[1.0, 1.0, 0.0]),
            "F" => PRINT,
            "P" => page_id,
            "AP" => dictionary! { "N" => appearance },
        });
        self.push_annotation(page_id, annotation)?;

        debug!(?annotation, "highlight added");
        Ok(annotation)
    }

    /// Page-space rectangles of the `/Highlight` annotations on 0-based `page`.
    pub fn highlight_rects(&self, page: usize) -> Result<Vec<Rect>> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::of_page(&self.document, page_id);
        let doc = &self.document;
        let page_dict = doc
            .get_dictionary(page_id)
            .map_err(|err| TextwerkError::Pdf(format!("page object {page_id:?}: {err}")))?;
        let Some(Object::Array(annots)) = get_resolved(doc, page_dict, b"Annots") else {
            return Ok(Vec::new());
        };
        Ok(annots
            .iter()
            .filter_map(|annot| resolve(doc, annot).as_dict().ok())
            .filter(|annot| get_name(doc, annot, b"Subtype") == Some(b"Highlight".as_slice()))
            .filter_map(|annot| get_resolved(doc, annot, b"Rect")?.as_array().ok())
            .filter_map(|values| match numbers(values)?.as_slice() {
                [x0, y0, x1, y1] => Some(geometry.bounds_to_page(&[(*x0, *y0), (*x1, *y1)])),
                _ => None,
            })
            .collect())
    }

    fn push_annotation(&mut self, page_id: ObjectId, annotation: ObjectId) -> Result<()> {
        let existing = self
            .document
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"Annots").ok())
            .cloned();

        if let Some(Object::Reference(array_id)) = existing
            && let Ok(Object::Array(annots)) = self.document.get_object_mut(array_id)
        {
            annots.push(Object::Reference(annotation));
            return Ok(());
        }

        let page = page_dict_mut(&mut self.document, page_id)?;
        if let Ok(Object::Array(annots)) = page.get_mut(b"Annots") {
            annots.push(Object::Reference(annotation));
        } else {
            page.set("Annots", vec![Object::Reference(annotation)]);
        }
        Ok(())
    }
}
