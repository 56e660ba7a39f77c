// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font registry: maps extracted family names to font sources and loads each
// font at most once per run.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use textwerk_core::config::{AppConfig, FontSource};
use textwerk_core::error::{Result, TextwerkError};
use tracing::info;

use super::resource::FontResource;

struct Entry {
    source: FontSource,
    loaded: OnceCell<FontResource>,
}

/// Registered font families, loaded lazily on first lookup.
pub struct FontRegistry {
    entries: BTreeMap<String, Entry>,
}

impl FontRegistry {
    /// Build the registry from `config.fonts`. Relative file paths are
    /// resolved against the config's base directory now; nothing is read
    /// until a family is looked up.
    pub fn from_config(config: &AppConfig) -> Self {
        let entries = config
            .fonts
            .iter()
            .map(|(family, source)| {
                let source = match source {
                    FontSource::File { path } => FontSource::File {
                        path: config.resolve_font_path(path),
                    },
                    standard => standard.clone(),
                };
                (
                    family.clone(),
                    Entry {
                        source,
                        loaded: OnceCell::new(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn contains(&self, family: &str) -> bool {
        self.entries.contains_key(family)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The font resource for `family`, loading it on first use.
    ///
    /// Returns `UnregisteredFont` when the family has no entry, and `Font`
    /// when its file cannot be read or parsed. A failed load is retried on
    /// the next lookup.
    pub fn lookup(&self, family: &str) -> Result<&FontResource> {
        let entry = self
            .entries
            .get(family)
            .ok_or_else(|| TextwerkError::UnregisteredFont {
                family: family.to_string(),
            })?;

        if let Some(resource) = entry.loaded.get() {
            return Ok(resource);
        }

        let resource = match &entry.source {
            FontSource::File { path } => FontResource::from_file(family, path)?,
            FontSource::Standard { base_font } => FontResource::standard(family, base_font.clone())?,
        };
        info!(family, base_font = resource.base_font(), "font loaded");
        Ok(entry.loaded.get_or_init(|| resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn registry() -> FontRegistry {
        let config = AppConfig::default()
            .with_font(
                "Helvetica",
                FontSource::Standard {
                    base_font: "Helvetica".into(),
                },
            )
            .with_font(
                "Broken",
                FontSource::File {
                    path: PathBuf::from("/nonexistent/broken.ttf"),
                },
            );
        FontRegistry::from_config(&config)
    }

    #[test]
    fn lookup_caches_the_resource() {
        let registry = registry();
        let first = registry.lookup("Helvetica").expect("lookup") as *const FontResource;
        let second = registry.lookup("Helvetica").expect("lookup") as *const FontResource;
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_families_are_unregistered() {
        let registry = registry();
        assert!(!registry.contains("Arial"));
        assert!(matches!(
            registry.lookup("Arial"),
            Err(TextwerkError::UnregisteredFont { family }) if family == "Arial"
        ));
    }

    #[test]
    fn unreadable_files_are_font_errors() {
        let registry = registry();
        assert!(registry.contains("Broken"));
        assert!(matches!(registry.lookup("Broken"), Err(TextwerkError::Font(_))));
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let mut config = AppConfig::default();
        config.base_dir = Some(PathBuf::from("/etc/textwerk"));
        let registry = FontRegistry::from_config(&config);
        let Some(Entry {
            source: FontSource::File { path },
            ..
        }) = registry.entries.get("CenturySchoolbook-Bold")
        else {
            panic!("expected a file entry");
        };
        assert_eq!(path, &PathBuf::from("/etc/textwerk/fonts/SCHLBKB.TTF"));
        assert_eq!(registry.families().count(), 2);
    }
}
