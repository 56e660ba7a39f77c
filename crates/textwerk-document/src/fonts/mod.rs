// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fonts used to measure and write replacement text.

pub mod registry;
pub mod resource;

pub use registry::FontRegistry;
pub use resource::{FontFormat, FontProgram, FontResource};
