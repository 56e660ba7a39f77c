// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textwerk-document — the PDF engine behind Textwerk.
//
// A thin layer over `lopdf`: a text-positioning interpreter that yields
// characters, spans, lines, blocks, and word tokens with page-space boxes,
// plus the three page edits Textwerk needs (highlight annotations, text
// redaction, text insertion) and a registry of fonts to write with.

pub mod fonts;
pub mod pdf;
pub mod text;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Re-export the primary structs so callers can use `textwerk_document::PdfDocument` etc.
pub use fonts::{FontRegistry, FontResource};
pub use pdf::PdfDocument;
pub use text::{TextBlock, TextChar, TextLine, TextPage, TextSpan, WordToken};
