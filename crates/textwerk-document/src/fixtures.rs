// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory test documents built with `lopdf::dictionary!`.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::pdf::PdfDocument;

/// A US Letter document with one page per entry of `pages`, each holding the
/// given raw content stream. `fonts` maps resource names to standard 14
/// `/BaseFont` names and is shared by every page.
pub fn document(fonts: &[(&str, &str)], pages: &[&str]) -> PdfDocument {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font_dict = Dictionary::new();
    for (name, base_font) in fonts {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => *base_font,
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(*name, Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_dict,
    });

    let mut kids = Vec::with_capacity(pages.len());
    for content in pages {
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.as_bytes().to_vec(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    PdfDocument::from_document(doc)
}

/// Pages whose content uses `/F1` (Helvetica) and `/F2` (Times-Roman).
pub fn helvetica_document(pages: &[&str]) -> PdfDocument {
    document(&[("F1", "Helvetica"), ("F2", "Times-Roman")], pages)
}

/// A single line of text at the given baseline, in `/F1` at `size`.
pub fn line(x: f32, baseline: f32, size: f32, text: &str) -> String {
    format!("BT /F1 {size} Tf {x} {baseline} Td ({text}) Tj ET")
}

/// A small TrueType font, PostScript name `TextwerkTestSans`, at 1000 units
/// per em. Space is 300 units, `.` 250, U+2019 200, and every other
/// printable ASCII glyph 600. Nothing outside ASCII besides U+2019 is mapped.
pub fn test_font_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/textwerk-test-sans.ttf")
}

pub fn test_font_bytes() -> Vec<u8> {
    std::fs::read(test_font_path()).expect("test font fixture")
}
