// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mutator — applies highlight or recolor to matched words.
//
// Matches and resolutions are joined on `WordKey`. Recolor is a strict
// two-phase edit per match: the redaction is committed to the page before
// the replacement text is inserted.

use std::collections::HashMap;

use serde::Serialize;
use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{FontProperties, Match, Mode, Rect, UnregisteredFontPolicy, WordKey};
use textwerk_document::{FontRegistry, FontResource, PdfDocument};
use tracing::{debug, info, warn};

use crate::matcher::PageMatch;
use crate::resolver::Resolution;

/// What happened to one matched occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    /// Marked; `rect` is the adjusted box that was highlighted or redacted.
    Applied { key: WordKey, rect: Rect },
    /// Left untouched because its font family is not registered.
    SkippedFont { key: WordKey, family: String },
    /// Left untouched because no span word produced properties for it.
    Unresolved { key: WordKey },
}

pub struct Mutator<'r> {
    registry: &'r FontRegistry,
    policy: UnregisteredFontPolicy,
    fallback: Option<&'r str>,
}

impl<'r> Mutator<'r> {
    pub fn new(
        registry: &'r FontRegistry,
        policy: UnregisteredFontPolicy,
        fallback: Option<&'r str>,
    ) -> Self {
        Self {
            registry,
            policy,
            fallback,
        }
    }

    /// Mark every match of `page_match`, in order.
    ///
    /// Returns an error (leaving earlier marks in place) when the policy is
    /// `Abort` and an unregistered family is met, or when an engine call fails.
    pub fn apply(
        &self,
        document: &mut PdfDocument,
        mode: Mode,
        target: &str,
        page_match: &PageMatch,
        resolutions: &[(WordKey, Resolution)],
    ) -> Result<Vec<Outcome>> {
        let by_key: HashMap<WordKey, &Resolution> =
            resolutions.iter().map(|(key, res)| (*key, res)).collect();

        let mut outcomes = Vec::with_capacity(page_match.matches.len());
        for found in &page_match.matches {
            let Some(resolution) = by_key.get(&found.key) else {
                warn!(key = %found.key, text = %found.text, "no font properties for match; skipped");
                outcomes.push(Outcome::Unresolved { key: found.key });
                continue;
            };

            let Some((properties, font)) = self.properties(resolution)? else {
                outcomes.push(Outcome::SkippedFont {
                    key: found.key,
                    family: family_of(resolution).to_string(),
                });
                continue;
            };

            let rect = self.mark(document, mode, target, page_match.page, found, &properties, font)?;
            outcomes.push(Outcome::Applied {
                key: found.key,
                rect,
            });
        }
        Ok(outcomes)
    }

    /// Properties and font to mark with, after applying the policy for
    /// unregistered families. `None` means skip.
    fn properties(&self, resolution: &Resolution) -> Result<Option<(FontProperties, &'r FontResource)>> {
        match resolution {
            Resolution::Resolved(properties) => {
                let font = self.registry.lookup(&properties.family)?;
                Ok(Some((properties.clone(), font)))
            }
            Resolution::Unregistered {
                family,
                font_size,
                color,
                trailing,
            } => match (self.policy, self.fallback) {
                (UnregisteredFontPolicy::Abort, _) => Err(TextwerkError::UnregisteredFont {
                    family: family.clone(),
                }),
                (UnregisteredFontPolicy::Fallback, Some(fallback)) => {
                    let font = self.registry.lookup(fallback)?;
                    info!(%family, %fallback, "using fallback font");
                    let extra_width = trailing
                        .map_or(0.0, |ch| font.text_length(ch.encode_utf8(&mut [0; 4]), *font_size));
                    Ok(Some((
                        FontProperties {
                            font_size: *font_size,
                            family: fallback.to_string(),
                            color: *color,
                            extra_width,
                        },
                        font,
                    )))
                }
                _ => {
                    debug!(%family, "unregistered family skipped");
                    Ok(None)
                }
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn mark(
        &self,
        document: &mut PdfDocument,
        mode: Mode,
        target: &str,
        page: usize,
        found: &Match,
        properties: &FontProperties,
        font: &FontResource,
    ) -> Result<Rect> {
        let rect = found.rect.trim_right(properties.extra_width);
        match mode {
            Mode::Highlight => {
                document.add_highlight(page, rect)?;
            }
            Mode::Recolor(color) => {
                document.redact(page, rect)?;
                document.insert_text(
                    page,
                    (rect.x0, rect.y0 + properties.font_size),
                    target,
                    font,
                    properties.font_size,
                    color,
                )?;
            }
        }
        debug!(key = %found.key, %mode, ?rect, "occurrence marked");
        Ok(rect)
    }
}

fn family_of(resolution: &Resolution) -> &str {
    match resolution {
        Resolution::Resolved(properties) => &properties.family,
        Resolution::Unregistered { family, .. } => family,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;
    use crate::resolver::PropertyResolver;
    use textwerk_core::{AppConfig, FontSource, RgbColor};
    use textwerk_document::fixtures;

    fn registry() -> FontRegistry {
        let config = AppConfig::default().with_font(
            "Helvetica",
            FontSource::Standard {
                base_font: "Helvetica".into(),
            },
        );
        FontRegistry::from_config(&config)
    }

    fn scan(document: &PdfDocument, registry: &FontRegistry) -> (PageMatch, Vec<(WordKey, Resolution)>) {
        let matcher = Matcher::new("PDF").expect("matcher");
        let page_match = matcher
            .find(document)
            .next()
            .expect("a page with matches")
            .expect("scan");
        let text = document.text_page(page_match.page).expect("text");
        let resolutions = PropertyResolver::new("PDF", registry)
            .resolve(&text)
            .expect("resolve");
        (page_match, resolutions)
    }

    #[test]
    fn highlight_trims_trailing_character() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "a PDF. b")]);
        let registry = registry();
        let (page_match, resolutions) = scan(&doc, &registry);

        let outcomes = Mutator::new(&registry, UnregisteredFontPolicy::Skip, None)
            .apply(&mut doc, Mode::Highlight, "PDF", &page_match, &resolutions)
            .expect("apply");

        let original = page_match.matches[0].rect;
        let Outcome::Applied { rect, .. } = outcomes[0] else {
            panic!("expected applied, got {:?}", outcomes[0]);
        };
        assert!(rect.x1 <= original.x1);
        assert!(rect.x1 >= rect.x0);
        assert!((original.x1 - rect.x1 - 278.0 * 12.0 / 1000.0).abs() < 1e-3);
        let drawn = doc.highlight_rects(0).expect("highlights");
        assert_eq!(drawn.len(), 1);
        assert!((drawn[0].x0 - rect.x0).abs() < 1e-3);
        assert!((drawn[0].x1 - rect.x1).abs() < 1e-3);
        assert!((drawn[0].y1 - rect.y1).abs() < 1e-3);
    }

    #[test]
    fn missing_resolutions_are_unresolved() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "PDF")]);
        let registry = registry();
        let (page_match, _) = scan(&doc, &registry);

        let outcomes = Mutator::new(&registry, UnregisteredFontPolicy::Skip, None)
            .apply(&mut doc, Mode::Highlight, "PDF", &page_match, &[])
            .expect("apply");
        assert_eq!(
            outcomes,
            [Outcome::Unresolved {
                key: page_match.matches[0].key
            }]
        );
        assert!(doc.highlight_rects(0).expect("highlights").is_empty());
    }

    #[test]
    fn policies_for_unregistered_families() {
        let content = "BT /F2 12 Tf 72 700 Td (PDF) Tj ET";
        let registry = registry();

        let mut doc = fixtures::helvetica_document(&[content]);
        let (page_match, resolutions) = scan(&doc, &registry);
        let skipped = Mutator::new(&registry, UnregisteredFontPolicy::Skip, None)
            .apply(&mut doc, Mode::Recolor(RgbColor::RED), "PDF", &page_match, &resolutions)
            .expect("skip");
        assert!(matches!(&skipped[0], Outcome::SkippedFont { family, .. } if family == "Times-Roman"));

        let aborted = Mutator::new(&registry, UnregisteredFontPolicy::Abort, None).apply(
            &mut doc,
            Mode::Recolor(RgbColor::RED),
            "PDF",
            &page_match,
            &resolutions,
        );
        assert!(matches!(aborted, Err(TextwerkError::UnregisteredFont { .. })));

        let substituted = Mutator::new(&registry, UnregisteredFontPolicy::Fallback, Some("Helvetica"))
            .apply(&mut doc, Mode::Recolor(RgbColor::RED), "PDF", &page_match, &resolutions)
            .expect("fallback");
        assert!(matches!(substituted[0], Outcome::Applied { .. }));
        let page = doc.text_page(0).expect("text");
        let spans: Vec<_> = page.spans().map(|(_, _, _, span)| span.font.clone()).collect();
        assert_eq!(spans, ["Helvetica"]);
    }

    #[test]
    fn recolor_erases_then_writes_in_color() {
        let mut doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "x PDF y")]);
        let registry = registry();
        let (page_match, resolutions) = scan(&doc, &registry);

        Mutator::new(&registry, UnregisteredFontPolicy::Skip, None)
            .apply(&mut doc, Mode::Recolor(RgbColor::RED), "PDF", &page_match, &resolutions)
            .expect("apply");

        let page = doc.text_page(0).expect("text");
        let red: Vec<&str> = page
            .spans()
            .filter(|(_, _, _, span)| span.color == 0xFF0000)
            .map(|(_, _, _, span)| span.text.as_str())
            .collect();
        assert_eq!(red, ["PDF"]);
        let black: String = page
            .spans()
            .filter(|(_, _, _, span)| span.color == 0x000000)
            .map(|(_, _, _, span)| span.text.as_str())
            .collect();
        assert!(!black.contains("PDF"));
        assert!(black.contains('x') && black.contains('y'));
    }
}
