// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Matcher — finds every word token whose alphanumeric core equals the target.

use std::iter::FusedIterator;

use serde::Serialize;
use textwerk_core::Match;
use textwerk_core::error::{Result, TextwerkError};
use textwerk_document::{PdfDocument, TextPage};
use tracing::debug;

/// Keep only ASCII letters and digits.
pub fn clean(token: &str) -> String {
    token.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// The matches on one page, in tokenizer order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMatch {
    pub page: usize,
    pub matches: Vec<Match>,
}

/// Case-sensitive, whole-token matcher for one target word.
#[derive(Debug, Clone)]
pub struct Matcher {
    target: String,
}

impl Matcher {
    /// Build a matcher. The target must be non-empty ASCII alphanumeric,
    /// since a cleaned token can never equal anything else.
    pub fn new(target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        if target.is_empty() {
            return Err(TextwerkError::InvalidTarget("target word is empty".into()));
        }
        if clean(&target) != target {
            return Err(TextwerkError::InvalidTarget(format!(
                "{target:?} contains characters other than ASCII letters and digits"
            )));
        }
        Ok(Self { target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_match(&self, token: &str) -> bool {
        token.len() >= self.target.len() && clean(token) == self.target
    }

    /// Matching tokens on one extracted page.
    pub fn matches_on(&self, page: &TextPage) -> Vec<Match> {
        page.words()
            .into_iter()
            .filter(|word| self.is_match(&word.text))
            .map(|word| Match {
                key: word.key,
                rect: word.rect,
                text: word.text,
            })
            .collect()
    }

    /// Lazily scan `document`, yielding one entry per page with matches.
    pub fn find<'a>(&'a self, document: &'a PdfDocument) -> PageMatches<'a> {
        PageMatches {
            matcher: self,
            document,
            next_page: 0,
            page_count: document.page_count(),
        }
    }
}

/// Iterator over pages holding at least one match, in ascending page order.
///
/// Each step extracts one more page. Extraction errors are yielded in place
/// and the scan carries on with the next page.
pub struct PageMatches<'a> {
    matcher: &'a Matcher,
    document: &'a PdfDocument,
    next_page: usize,
    page_count: usize,
}

impl Iterator for PageMatches<'_> {
    type Item = Result<PageMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_page < self.page_count {
            let page = self.next_page;
            self.next_page += 1;

            let text = match self.document.text_page(page) {
                Ok(text) => text,
                Err(err) => return Some(Err(err)),
            };
            let matches = self.matcher.matches_on(&text);
            if !matches.is_empty() {
                debug!(page, count = matches.len(), target = %self.matcher.target, "matches found");
                return Some(Ok(PageMatch { page, matches }));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.page_count - self.next_page))
    }
}

impl FusedIterator for PageMatches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use textwerk_document::fixtures;

    #[test]
    fn clean_strips_everything_but_ascii_alphanumerics() {
        assert_eq!(clean("(PDF),"), "PDF");
        assert_eq!(clean("PDFs"), "PDFs");
        assert_eq!(clean("naïve-42"), "nave42");
    }

    #[test]
    fn matching_is_whole_token_and_case_sensitive() {
        let matcher = Matcher::new("PDF").expect("matcher");
        assert!(matcher.is_match("PDF"));
        assert!(matcher.is_match("PDF,"));
        assert!(matcher.is_match("(PDF)"));
        assert!(!matcher.is_match("PDFs"));
        assert!(!matcher.is_match("pdf"));
        assert!(!matcher.is_match("PD"));
        assert!(!matcher.is_match("xPDF"));
    }

    #[test]
    fn invalid_targets_are_rejected() {
        assert!(matches!(Matcher::new(""), Err(TextwerkError::InvalidTarget(_))));
        assert!(matches!(Matcher::new("PD-F"), Err(TextwerkError::InvalidTarget(_))));
        assert!(matches!(Matcher::new("two words"), Err(TextwerkError::InvalidTarget(_))));
    }

    #[test]
    fn find_yields_only_pages_with_matches_in_order() {
        let doc = fixtures::helvetica_document(&[
            &fixtures::line(72.0, 700.0, 12.0, "a PDF here"),
            &fixtures::line(72.0, 700.0, 12.0, "nothing"),
            &fixtures::line(72.0, 700.0, 12.0, "PDF, then (PDF) but PDFs"),
        ]);
        let matcher = Matcher::new("PDF").expect("matcher");
        let pages: Vec<PageMatch> = matcher
            .find(&doc)
            .collect::<Result<_>>()
            .expect("scan");

        assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), [0, 2]);
        let texts: Vec<&str> = pages[1].matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["PDF,", "(PDF)"]);
        assert!(pages[1].matches[0].rect.x1 < pages[1].matches[1].rect.x0);
    }

    #[test]
    fn find_is_exhausted_after_one_pass() {
        let doc = fixtures::helvetica_document(&[&fixtures::line(72.0, 700.0, 12.0, "PDF")]);
        let matcher = Matcher::new("PDF").expect("matcher");
        let mut scan = matcher.find(&doc);
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
        // A new scan starts over.
        assert_eq!(matcher.find(&doc).count(), 1);
    }

    #[test]
    fn every_box_re_extracts_to_the_target() {
        let doc = fixtures::helvetica_document(&[
            "BT /F1 11 Tf 14 TL 72 700 Td (The PDF format, PDF.) Tj (and PDF) ' ET",
        ]);
        let matcher = Matcher::new("PDF").expect("matcher");
        let page = doc.text_page(0).expect("text");
        let matches = matcher.matches_on(&page);
        assert_eq!(matches.len(), 3);

        for found in &matches {
            let inside: String = page
                .blocks
                .iter()
                .flat_map(|block| &block.lines)
                .flat_map(|line| &line.spans)
                .flat_map(|span| &span.chars)
                .filter(|ch| {
                    let (x, y) = ch.rect.center();
                    found.rect.contains_point(x, y)
                })
                .map(|ch| ch.ch)
                .collect();
            assert_eq!(clean(&inside), "PDF");
        }
    }
}
