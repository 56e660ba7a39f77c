// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Property resolver — re-scans a page's styled spans and records, for every
// matching word, the font properties needed to mark it.

use serde::Serialize;
use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{FontProperties, WordKey};
use textwerk_document::{FontRegistry, TextPage};
use tracing::{debug, warn};

use crate::matcher::clean;

/// Font properties for one matching word, or why there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resolution {
    Resolved(FontProperties),
    /// The span's family has no registry entry. The span's size and color
    /// and the single trailing character (if any) are kept so that a
    /// fallback font can still be applied.
    Unregistered {
        family: String,
        font_size: f32,
        color: u32,
        trailing: Option<char>,
    },
}

pub struct PropertyResolver<'r> {
    target: &'r str,
    registry: &'r FontRegistry,
}

impl<'r> PropertyResolver<'r> {
    pub fn new(target: &'r str, registry: &'r FontRegistry) -> Self {
        Self { target, registry }
    }

    /// One entry per matching whitespace-separated word, in block, line,
    /// span, word order.
    ///
    /// Fails only when a registered font cannot be loaded.
    pub fn resolve(&self, page: &TextPage) -> Result<Vec<(WordKey, Resolution)>> {
        let mut resolved = Vec::new();
        for (block, line, span_index, span) in page.spans() {
            if !span.text.contains(self.target) {
                continue;
            }
            for (word, piece) in span.text.split_whitespace().enumerate() {
                if clean(piece) != self.target {
                    continue;
                }
                let key = WordKey {
                    page: page.page,
                    block,
                    line,
                    span: span_index,
                    word,
                };
                let trailing = trailing_char(piece, self.target);

                let resolution = match self.registry.lookup(&span.font) {
                    Ok(font) => Resolution::Resolved(FontProperties {
                        font_size: span.size,
                        family: span.font.clone(),
                        color: span.color,
                        extra_width: trailing
                            .map_or(0.0, |ch| font.text_length(ch.encode_utf8(&mut [0; 4]), span.size)),
                    }),
                    Err(TextwerkError::UnregisteredFont { family }) => {
                        warn!(%family, %key, "font family not registered; occurrence skipped");
                        Resolution::Unregistered {
                            family,
                            font_size: span.size,
                            color: span.color,
                            trailing,
                        }
                    }
                    Err(err) => return Err(err),
                };
                debug!(%key, ?resolution, "word resolved");
                resolved.push((key, resolution));
            }
        }
        Ok(resolved)
    }
}

/// The one character following `target` when `piece` is exactly the target
/// plus one trailing character.
pub fn trailing_char(piece: &str, target: &str) -> Option<char> {
    let mut rest = piece.strip_prefix(target)?.chars();
    let ch = rest.next()?;
    rest.next().is_none().then_some(ch)
}
