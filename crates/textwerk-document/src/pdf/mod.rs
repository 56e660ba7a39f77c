// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — open and save documents, extract page text, and edit pages
// with highlights, redactions, and inserted text.

mod annotate;
pub mod document;
pub mod geometry;
mod insert;
pub(crate) mod objects;
mod redact;

pub use document::PdfDocument;
pub use geometry::{Matrix, PageGeometry};
