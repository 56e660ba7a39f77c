// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text redaction: remove every glyph whose centre lies in an area, keep the
// positions of the glyphs around it, and paint the area white.

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use textwerk_core::Rect;
use textwerk_core::error::Result;
use tracing::{debug, instrument};

use super::document::PdfDocument;
use super::geometry::PageGeometry;
use crate::text::interpret::{ShowItem, ShowOp};

impl PdfDocument {
    /// Redact the text in `area` (page space) on 0-based `page`.
    ///
    /// Each text-showing operation that draws a glyph in the area is
    /// rewritten as a `TJ` whose removed glyphs are replaced by offsets of
    /// the same advance. The rewritten content replaces the page's content
    /// streams, then a white rectangle is painted over the area. Returns the
    /// number of glyphs removed.
    #[instrument(skip(self))]
    pub fn redact(&mut self, page: usize, area: Rect) -> Result<usize> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::of_page(&self.document, page_id);
        let (mut content, interpretation) = self.interpret(page_id, geometry)?;

        let hit = |glyph: usize| {
            interpretation.glyphs.get(glyph).is_some_and(|g| {
                let (x, y) = g.rect.center();
                area.contains_point(x, y)
            })
        };

        let mut removed = 0;
        let mut replacements = Vec::new();
        for show in &interpretation.shows {
            let hits = show
                .items
                .iter()
                .filter(|item| matches!(item, ShowItem::Glyph { glyph, .. } if hit(*glyph)))
                .count();
            if hits == 0 {
                continue;
            }
            removed += hits;
            let Some(original) = content.operations.get(show.op_index) else {
                continue;
            };
            replacements.push((show.op_index, rewrite_show(original, show, &hit)));
        }

        for (op_index, operations) in replacements.into_iter().rev() {
            content.operations.splice(op_index..=op_index, operations);
        }

        let mut operations = content.operations;
        if !self.wrapped_pages.contains(&page_id) {
            operations.insert(0, Operation::new("q", vec![]));
            operations.push(Operation::new("Q", vec![]));
            self.wrapped_pages.insert(page_id);
        }
        let [llx, lly, urx, ury] = geometry.rect_to_pdf(&area);
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
            Operation::new(
                "re",
                vec![
                    Object::Real(llx),
                    Object::Real(lly),
                    Object::Real(urx - llx),
                    Object::Real(ury - lly),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);

        let stream = self.add_content_stream(operations)?;
        self.set_content_refs(page_id, vec![Object::Reference(stream)])?;

        debug!(removed, "page content redacted");
        Ok(removed)
    }
}

/// Replacement for one text-showing operation with the hit glyphs removed.
fn rewrite_show(original: &Operation, show: &ShowOp, hit: &impl Fn(usize) -> bool) -> Vec<Operation> {
    let mut elements = Vec::new();
    let mut kept = Vec::new();
    for item in &show.items {
        match item {
            ShowItem::Glyph { glyph, adjust, .. } if hit(*glyph) => {
                flush(&mut kept, &mut elements);
                if let Some(adjust) = adjust {
                    elements.push(Object::Real(*adjust));
                }
            }
            ShowItem::Glyph { raw, .. } => kept.extend_from_slice(raw),
            ShowItem::Offset(offset) => {
                flush(&mut kept, &mut elements);
                elements.push(offset.clone());
            }
        }
    }
    flush(&mut kept, &mut elements);

    let tj = Operation::new("TJ", vec![Object::Array(elements)]);
    match (original.operator.as_str(), original.operands.as_slice()) {
        ("'", _) => vec![Operation::new("T*", vec![]), tj],
        ("\"", [word_spacing, char_spacing, ..]) => vec![
            Operation::new("Tw", vec![word_spacing.clone()]),
            Operation::new("Tc", vec![char_spacing.clone()]),
            Operation::new("T*", vec![]),
            tj,
        ],
        _ => vec![tj],
    }
}

fn flush(kept: &mut Vec<u8>, elements: &mut Vec<Object>) {
    if !kept.is_empty() {
        elements.push(Object::String(std::mem::take(kept), StringFormat::Literal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::pdf::objects::page_content;
    use lopdf::content::Content;

    fn word_rect(doc: &PdfDocument, text: &str) -> Rect {
        doc.text_page(0)
            .expect("text")
            .words()
            .into_iter()
            .find(|word| word.text == text)
            .map(|word| word.rect)
            .expect("word")
    }

    #[test]
    fn removes_glyphs_and_keeps_following_positions() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "see PDF now")]);
        let before = word_rect(&doc, "now");
        let target = word_rect(&doc, "PDF");

        let removed = doc.redact(0, target).expect("redact");
        assert_eq!(removed, 3);

        let page = doc.text_page(0).expect("text");
        let words: Vec<String> = page.words().into_iter().map(|w| w.text).collect();
        assert_eq!(words, ["see", "now"]);
        let after = word_rect(&doc, "now");
        assert!((after.x0 - before.x0).abs() < 1e-2);
    }

    #[test]
    fn paints_the_area_white() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "PDF")]);
        let target = word_rect(&doc, "PDF");
        doc.redact(0, target).expect("redact");

        let page_id = doc.page_id(0).expect("page");
        let content = Content::decode(&page_content(doc.inner(), page_id).expect("content")).expect("decode");
        let operators: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(&operators[operators.len() - 5..], ["q", "rg", "re", "f", "Q"]);
        assert_eq!(operators.first(), Some(&"q"));
    }

    #[test]
    fn quote_operator_keeps_its_line_move() {
        let mut doc = fixtures::helvetica_document(&[
            "BT /F1 10 Tf 14 TL 72 700 Td (keep) Tj (PDF) ' (after) ' ET",
        ]);
        let target = word_rect(&doc, "PDF");
        let before = word_rect(&doc, "after");
        doc.redact(0, target).expect("redact");
        assert_eq!(doc.text_page(0).expect("text").text(), "keep\n\nafter");
        assert_eq!(word_rect(&doc, "after"), before);
    }

    #[test]
    fn untouched_areas_remove_nothing() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "PDF")]);
        let removed = doc.redact(0, Rect::new(0.0, 0.0, 10.0, 10.0)).expect("redact");
        assert_eq!(removed, 0);
        assert_eq!(doc.text_page(0).expect("text").text(), "PDF");
    }
}
