// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Textwerk — word matching and marking.
//
// The pipeline is Matcher (find boxes) → PropertyResolver (span font
// properties) → Mutator (highlight or recolor), joined per page on `WordKey`
// and driven by `Processor`.

pub mod matcher;
pub mod mutator;
pub mod processor;
pub mod resolver;

pub use matcher::{Matcher, PageMatch, PageMatches, clean};
pub use mutator::{Mutator, Outcome};
pub use processor::{MarkReport, PageReport, Processor};
pub use resolver::{PropertyResolver, Resolution};
