// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processor — owns one open document and the font registry, runs
// Matcher → Resolver → Mutator per page, and saves once.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use textwerk_core::error::{Result, TextwerkError};
use textwerk_core::{AppConfig, Mode, RgbColor};
use textwerk_document::{FontRegistry, PdfDocument};
use tracing::{info, instrument};

use crate::matcher::{Matcher, PageMatch};
use crate::mutator::{Mutator, Outcome};
use crate::resolver::PropertyResolver;

/// Outcomes of one run on one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: usize,
    pub outcomes: Vec<Outcome>,
}

/// Summary of a marking run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarkReport {
    pub matched: usize,
    pub applied: usize,
    pub skipped_fonts: usize,
    pub unresolved: usize,
    pub pages: Vec<PageReport>,
}

impl MarkReport {
    fn record(&mut self, page: usize, outcomes: Vec<Outcome>) {
        for outcome in &outcomes {
            self.matched += 1;
            match outcome {
                Outcome::Applied { .. } => self.applied += 1,
                Outcome::SkippedFont { .. } => self.skipped_fonts += 1,
                Outcome::Unresolved { .. } => self.unresolved += 1,
            }
        }
        self.pages.push(PageReport { page, outcomes });
    }
}

impl fmt::Display for MarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched on {} page(s): {} marked, {} skipped (unregistered font), {} unresolved",
            self.matched,
            self.pages.len(),
            self.applied,
            self.skipped_fonts,
            self.unresolved
        )
    }
}

pub struct Processor {
    document: PdfDocument,
    registry: FontRegistry,
    config: AppConfig,
}

impl Processor {
    /// Open `input` and build the font registry from `config`.
    #[instrument(skip_all, fields(input = %input.as_ref().display()))]
    pub fn open(input: impl AsRef<Path>, config: AppConfig) -> Result<Self> {
        let document = PdfDocument::open(input)?;
        Self::from_document(document, config)
    }

    pub fn from_document(document: PdfDocument, config: AppConfig) -> Result<Self> {
        config.validate()?;
        let registry = FontRegistry::from_config(&config);
        info!(
            pages = document.page_count(),
            fonts = registry.families().count(),
            "processor ready"
        );
        Ok(Self {
            document,
            registry,
            config,
        })
    }

    pub fn document(&self) -> &PdfDocument {
        &self.document
    }

    /// Matches of `target` on every page, without touching the document.
    pub fn find(&self, target: &str) -> Result<Vec<PageMatch>> {
        let matcher = Matcher::new(target)?;
        matcher.find(&self.document).collect()
    }

    pub fn highlight(&mut self, target: &str) -> Result<MarkReport> {
        self.run(target, Mode::Highlight)
    }

    pub fn recolor(&mut self, target: &str, color: RgbColor) -> Result<MarkReport> {
        self.run(target, Mode::Recolor(color))
    }

    /// Mark every occurrence of `target`.
    ///
    /// All pages are scanned before the first mutation. Each page with
    /// matches is then re-extracted for its span properties and marked. An
    /// error stops the run; marks already made stay in the document.
    #[instrument(skip(self), fields(%mode))]
    pub fn run(&mut self, target: &str, mode: Mode) -> Result<MarkReport> {
        let page_matches = self.find(target)?;

        let resolver = PropertyResolver::new(target, &self.registry);
        let mutator = Mutator::new(
            &self.registry,
            self.config.unregistered_font,
            self.config.fallback_font.as_deref(),
        );

        let mut report = MarkReport::default();
        for page_match in &page_matches {
            let text = self.document.text_page(page_match.page)?;
            let resolutions = resolver.resolve(&text)?;
            let outcomes = mutator.apply(&mut self.document, mode, target, page_match, &resolutions)?;
            report.record(page_match.page, outcomes);
        }

        info!(
            matched = report.matched,
            applied = report.applied,
            skipped_fonts = report.skipped_fonts,
            unresolved = report.unresolved,
            "run complete"
        );
        Ok(report)
    }

    /// Write the document to `output`. The file the document was opened
    /// from is never overwritten.
    pub fn save(&mut self, output: impl AsRef<Path>) -> Result<()> {
        let output = output.as_ref();
        if let Some(input) = self.document.source_path()
            && is_same_file(input, output)
        {
            return Err(TextwerkError::OutputIsInput(output.to_path_buf()));
        }
        self.document.save(output)
    }
}

fn is_same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}
