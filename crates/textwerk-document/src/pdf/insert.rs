// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text insertion with a registered font. Font dictionaries are added to the
// document once and referenced from each page that uses them.

use lopdf::content::Operation;
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use textwerk_core::RgbColor;
use textwerk_core::error::Result;
use tracing::{debug, instrument};

use super::document::PdfDocument;
use super::geometry::PageGeometry;
use super::objects::{page_dict_mut, page_resources, reals};
use crate::fonts::resource::{FIRST_CHAR, LAST_CHAR};
use crate::fonts::{FontFormat, FontProgram, FontResource};

/// Font descriptor flag for a non-symbolic font.
const NONSYMBOLIC: i64 = 1 << 5;

impl PdfDocument {
    /// Write `text` on 0-based `page` with its baseline starting at `origin`
    /// (page space), in `font` at `size` points and fill `color`.
    #[instrument(skip(self, font), fields(family = font.family()))]
    pub fn insert_text(
        &mut self,
        page: usize,
        origin: (f32, f32),
        text: &str,
        font: &FontResource,
        size: f32,
        color: RgbColor,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let geometry = PageGeometry::of_page(&self.document, page_id);
        let font_id = self.font_object(font)?;
        let name = self.page_font_name(page_id, font_id)?;

        let (x, y) = geometry.to_pdf(origin.0, origin.1);
        let [r, g, b] = color.components();
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("Tf", vec![Object::Name(name), Object::Real(size)]),
            Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), Object::Real(x), Object::Real(y)],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(font.encode(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.append_content(page_id, operations)?;

        debug!(text, x, y, "text inserted");
        Ok(())
    }

    /// The document-level font dictionary for `font`, created on first use.
    fn font_object(&mut self, font: &FontResource) -> Result<ObjectId> {
        if let Some(id) = self.font_objects.get(font.base_font()) {
            return Ok(*id);
        }

        let dict = match font.program() {
            None => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            },
            Some(program) => self.embedded_font(font.base_font(), program),
        };
        let id = self.document.add_object(dict);
        self.font_objects.insert(font.base_font().to_string(), id);
        debug!(base_font = font.base_font(), embedded = font.program().is_some(), "font added");
        Ok(id)
    }

    fn embedded_font(&mut self, base_font: &str, program: &FontProgram) -> Dictionary {
        let (file_key, subtype, stream_dict) = match program.format {
            FontFormat::TrueType => (
                "FontFile2",
                "TrueType",
                dictionary! { "Length1" => program.data.len() as i64 },
            ),
            FontFormat::OpenTypeCff => (
                "FontFile3",
                "Type1",
                dictionary! { "Subtype" => "OpenType" },
            ),
        };
        let file_id = self
            .document
            .add_object(Object::Stream(Stream::new(stream_dict, program.data.clone())));

        let descriptor_id = self.document.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font,
            "Flags" => NONSYMBOLIC,
            "FontBBox" => reals(&program.bbox),
            "ItalicAngle" => Object::Real(program.italic_angle),
            "Ascent" => Object::Real(program.ascent),
            "Descent" => Object::Real(program.descent),
            "CapHeight" => Object::Real(program.cap_height),
            "StemV" => 80,
            file_key => file_id,
        });

        dictionary! {
            "Type" => "Font",
            "Subtype" => subtype,
            "BaseFont" => base_font,
            "FirstChar" => i64::from(FIRST_CHAR),
            "LastChar" => i64::from(LAST_CHAR),
            "Widths" => reals(&program.widths),
            "FontDescriptor" => descriptor_id,
            "Encoding" => "WinAnsiEncoding",
        }
    }

    /// Resource name under which `font_id` is available on the page, adding
    /// it to the page's own `/Resources` when needed.
    fn page_font_name(&mut self, page_id: ObjectId, font_id: ObjectId) -> Result<Vec<u8>> {
        let mut resources = page_resources(&self.document, page_id);
        let mut fonts = match resources.get(b"Font") {
            Ok(Object::Dictionary(fonts)) => fonts.clone(),
            _ => Dictionary::new(),
        };

        if let Some((name, _)) = fonts
            .iter()
            .find(|(_, value)| matches!(value, Object::Reference(id) if *id == font_id))
        {
            return Ok(name.clone());
        }

        let name = (1..)
            .map(|n| format!("TwF{n}").into_bytes())
            .find(|candidate| !fonts.has(candidate))
            .unwrap_or_default();
        fonts.set(name.clone(), Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));
        page_dict_mut(&mut self.document, page_id)?.set("Resources", Object::Dictionary(resources));
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn helvetica() -> FontResource {
        FontResource::standard("Helvetica", "Helvetica").expect("standard font")
    }

    #[test]
    fn inserted_text_extracts_at_origin_and_color() {
        let mut doc = fixtures::helvetica_document(&[""]);
        doc.insert_text(0, (100.0, 200.0), "PDF", &helvetica(), 12.0, RgbColor::RED)
            .expect("insert");

        let page = doc.text_page(0).expect("text");
        let span = &page.blocks[0].lines[0].spans[0];
        assert_eq!(span.text, "PDF");
        assert_eq!(span.color, 0xFF0000);
        assert_eq!(span.font, "Helvetica");
        assert!((span.size - 12.0).abs() < 1e-4);
        // Baseline at 200 in page space; descent reaches 0.2 em below it.
        assert!((span.rect.x0 - 100.0).abs() < 1e-3);
        assert!((span.rect.y1 - (200.0 + 0.2 * 12.0)).abs() < 1e-3);
    }

    #[test]
    fn font_is_added_once_and_named_uniquely() {
        let mut doc = fixtures::helvetica_document(&["", ""]);
        let font = helvetica();
        doc.insert_text(0, (72.0, 72.0), "one", &font, 10.0, RgbColor::BLACK)
            .expect("insert");
        doc.insert_text(0, (72.0, 86.0), "two", &font, 10.0, RgbColor::BLACK)
            .expect("insert");
        doc.insert_text(1, (72.0, 72.0), "three", &font, 10.0, RgbColor::BLACK)
            .expect("insert");
        assert_eq!(doc.font_objects.len(), 1);

        let page_id = doc.page_id(0).expect("page");
        let resources = page_resources(doc.inner(), page_id);
        let fonts = resources
            .get(b"Font")
            .and_then(Object::as_dict)
            .expect("font dict");
        // F1 and F2 from the fixture, plus one inserted entry.
        assert_eq!(fonts.len(), 3);
        assert!(fonts.has(b"TwF1"));
        assert_eq!(doc.text_page(0).expect("text").text(), "one\ntwo");
    }

    #[test]
    fn truetype_fonts_are_embedded_with_widths() {
        let mut doc = fixtures::helvetica_document(&[""]);
        let font = FontResource::from_file("Sans", &fixtures::test_font_path()).expect("font");
        doc.insert_text(0, (100.0, 200.0), "PDF.", &font, 10.0, RgbColor::RED)
            .expect("insert");

        let inner = doc.inner();
        let font_id = doc.font_objects["TextwerkTestSans"];
        let dict = inner.get_dictionary(font_id).expect("font dict");
        assert_eq!(dict.get(b"Subtype").and_then(Object::as_name).ok(), Some(b"TrueType".as_slice()));
        let widths = dict.get(b"Widths").and_then(Object::as_array).expect("widths");
        assert_eq!(widths.len(), 224);
        assert_eq!(widths[usize::from(b'.' - FIRST_CHAR)].as_float().ok(), Some(250.0));

        let descriptor_id = dict
            .get(b"FontDescriptor")
            .and_then(Object::as_reference)
            .expect("descriptor");
        let descriptor = inner.get_dictionary(descriptor_id).expect("descriptor dict");
        assert_eq!(
            descriptor.get(b"FontName").and_then(Object::as_name).ok(),
            Some(b"TextwerkTestSans".as_slice())
        );
        let file_id = descriptor
            .get(b"FontFile2")
            .and_then(Object::as_reference)
            .expect("font file");
        let file = inner.get_object(file_id).and_then(Object::as_stream).expect("stream");
        let data = fixtures::test_font_bytes();
        assert_eq!(file.content, data);
        assert_eq!(file.dict.get(b"Length1").and_then(Object::as_i64).ok(), Some(data.len() as i64));

        // Extraction measures with the embedded /Widths, not a builtin table.
        let page = doc.text_page(0).expect("text");
        let span = &page.blocks[0].lines[0].spans[0];
        assert_eq!(span.text, "PDF.");
        assert_eq!(span.font, "TextwerkTestSans");
        assert_eq!(span.color, 0xFF0000);
        assert!((span.rect.x1 - span.rect.x0 - 20.5).abs() < 1e-3);
    }

    #[test]
    fn existing_text_keeps_its_state() {
        let mut doc = fixtures::helvetica_document(&["0 0 1 rg 2 0 0 2 0 0 cm BT /F1 10 Tf 36 300 Td (big) Tj ET"]);
        doc.insert_text(0, (72.0, 72.0), "small", &helvetica(), 10.0, RgbColor::RED)
            .expect("insert");
        let page = doc.text_page(0).expect("text");
        let spans: Vec<_> = page.spans().map(|(_, _, _, span)| span.clone()).collect();
        let small = spans.iter().find(|span| span.text == "small").expect("small");
        assert!((small.size - 10.0).abs() < 1e-4);
        assert_eq!(small.color, 0xFF0000);
        let big = spans.iter().find(|span| span.text == "big").expect("big");
        assert!((big.size - 20.0).abs() < 1e-4);
        assert_eq!(big.color, 0x0000FF);
    }
}
