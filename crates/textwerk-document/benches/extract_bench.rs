// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for page text extraction in the textwerk-document crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use textwerk_document::PdfDocument;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// One Letter page of 50 Helvetica lines, serialised to bytes.
fn dense_page() -> Vec<u8> {
    let mut content = String::from("BT /F1 10 Tf 12 TL 72 740 Td\n");
    for line in 0..50 {
        content.push_str(&format!(
            "(Line {line}: the PDF engine places every glyph of this sentence, PDF.) '\n"
        ));
    }
    content.push_str("ET");

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        content.into_bytes(),
    )));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise fixture");
    bytes
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Interpret one dense page and tokenise it into words.
fn bench_text_page_words(c: &mut Criterion) {
    let document = PdfDocument::from_bytes(&dense_page()).expect("load fixture");

    c.bench_function("text_page + words (50 lines)", |b| {
        b.iter(|| {
            let page = document.text_page(black_box(0)).expect("extract");
            black_box(page.words());
        });
    });
}

criterion_group!(benches, bench_text_page_words);
criterion_main!(benches);
