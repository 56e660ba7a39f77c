// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and the font registry table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextwerkError};

/// Where the program for a registered font family comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FontSource {
    /// A TrueType or OpenType file on disk, embedded when text is inserted.
    File { path: PathBuf },
    /// One of the standard 14 PDF fonts, referenced by name, never embedded.
    Standard { base_font: String },
}

/// What to do when a matched word uses a family missing from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnregisteredFontPolicy {
    /// Log a warning and leave the occurrence untouched.
    #[default]
    Skip,
    /// Stop the run with `TextwerkError::UnregisteredFont`.
    Abort,
    /// Use `AppConfig::fallback_font` instead.
    Fallback,
}

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Font family name (as reported by the text extractor) to font source.
    pub fonts: BTreeMap<String, FontSource>,
    /// Policy for families absent from `fonts`.
    pub unregistered_font: UnregisteredFontPolicy,
    /// Registered family used under `UnregisteredFontPolicy::Fallback`.
    pub fallback_font: Option<String>,
    /// Output path used when the caller does not give one.
    pub default_output: PathBuf,
    /// Directory that relative font paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut fonts = BTreeMap::new();
        fonts.insert(
            "CenturySchoolbook".to_string(),
            FontSource::File {
                path: PathBuf::from("fonts/Century Schoolbook Std Regular.otf"),
            },
        );
        fonts.insert(
            "CenturySchoolbook-Bold".to_string(),
            FontSource::File {
                path: PathBuf::from("fonts/SCHLBKB.TTF"),
            },
        );

        Self {
            fonts,
            unregistered_font: UnregisteredFontPolicy::Skip,
            fallback_font: None,
            default_output: PathBuf::from("output.pdf"),
            base_dir: None,
        }
    }
}

impl AppConfig {
    /// Load a JSON config file. Relative font paths in it resolve against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&json)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Register (or replace) a font family.
    pub fn with_font(mut self, family: impl Into<String>, source: FontSource) -> Self {
        self.fonts.insert(family.into(), source);
        self
    }

    /// Resolve a font file path against `base_dir` when it is relative.
    pub fn resolve_font_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.unregistered_font == UnregisteredFontPolicy::Fallback {
            let family = self.fallback_font.as_deref().ok_or_else(|| {
                TextwerkError::Font("fallback policy set but no fallback_font given".into())
            })?;
            if !self.fonts.contains_key(family) {
                return Err(TextwerkError::UnregisteredFont {
                    family: family.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_holds_century_schoolbook() {
        let config = AppConfig::default();
        assert_eq!(config.fonts.len(), 2);
        assert!(config.fonts.contains_key("CenturySchoolbook"));
        assert!(config.fonts.contains_key("CenturySchoolbook-Bold"));
        assert_eq!(config.unregistered_font, UnregisteredFontPolicy::Skip);
        assert_eq!(config.default_output, PathBuf::from("output.pdf"));
    }

    #[test]
    fn save_and_load_resolve_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("textwerk.json");

        let config = AppConfig::default().with_font(
            "Helvetica",
            FontSource::Standard {
                base_font: "Helvetica".into(),
            },
        );
        config.save(&path).expect("save");

        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded.fonts, config.fonts);
        assert_eq!(
            loaded.resolve_font_path(Path::new("fonts/SCHLBKB.TTF")),
            dir.path().join("fonts/SCHLBKB.TTF")
        );
    }

    #[test]
    fn font_source_json_shape() {
        let json = r#"{
            "fonts": {
                "Body": { "kind": "file", "path": "/opt/fonts/body.ttf" },
                "Helvetica": { "kind": "standard", "base_font": "Helvetica" }
            },
            "unregistered_font": "abort"
        }"#;
        let config: AppConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(config.unregistered_font, UnregisteredFontPolicy::Abort);
        assert_eq!(
            config.fonts["Body"],
            FontSource::File {
                path: PathBuf::from("/opt/fonts/body.ttf")
            }
        );
        // Missing fields fall back to defaults.
        assert_eq!(config.default_output, PathBuf::from("output.pdf"));
    }

    #[test]
    fn fallback_policy_requires_registered_family() {
        let mut config = AppConfig {
            unregistered_font: UnregisteredFontPolicy::Fallback,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        config.fallback_font = Some("Missing".into());
        assert!(matches!(
            config.validate(),
            Err(TextwerkError::UnregisteredFont { .. })
        ));

        config.fallback_font = Some("CenturySchoolbook".into());
        assert!(config.validate().is_ok());
    }
}
