// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A font that text can be written with: either a standard 14 font referenced
// by name, or a TrueType/OpenType program read with ttf-parser and embedded.

use std::path::Path;

use textwerk_core::error::{Result, TextwerkError};
use tracing::debug;
use ttf_parser::Face;

use crate::text::metrics::{is_standard_font, standard_width, win_ansi_char, win_ansi_code};

/// First and last WinAnsi codes given widths in an embedded font dictionary.
pub const FIRST_CHAR: u8 = 32;
pub const LAST_CHAR: u8 = 255;

const DEFAULT_WIDTH: f32 = 500.0;

/// Container format of an embedded font program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    /// `glyf` outlines, embedded as `/FontFile2`.
    TrueType,
    /// CFF outlines in an OpenType wrapper, embedded as `/FontFile3 /OpenType`.
    OpenTypeCff,
}

/// Parsed font program plus the descriptor values a PDF needs.
#[derive(Debug, Clone)]
pub struct FontProgram {
    pub data: Vec<u8>,
    pub format: FontFormat,
    /// Advances for WinAnsi codes `FIRST_CHAR..=LAST_CHAR`, in 1/1000 em.
    pub widths: Vec<f32>,
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub italic_angle: f32,
    pub bbox: [f32; 4],
}

/// A registered font ready for measuring and writing text.
#[derive(Debug, Clone)]
pub struct FontResource {
    family: String,
    base_font: String,
    program: Option<FontProgram>,
}

impl FontResource {
    /// Reference one of the standard 14 fonts.
    pub fn standard(family: impl Into<String>, base_font: impl Into<String>) -> Result<Self> {
        let base_font = base_font.into();
        if !is_standard_font(&base_font) {
            return Err(TextwerkError::Font(format!(
                "{base_font:?} is not a standard 14 font"
            )));
        }
        Ok(Self {
            family: family.into(),
            base_font,
            program: None,
        })
    }

    /// Read and parse a TrueType or OpenType file.
    pub fn from_file(family: impl Into<String>, path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|err| {
            TextwerkError::Font(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_bytes(family, data)
    }

    pub fn from_bytes(family: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let family = family.into();
        let face = Face::parse(&data, 0)
            .map_err(|err| TextwerkError::Font(format!("cannot parse font for {family}: {err}")))?;

        let units = f32::from(face.units_per_em().max(1));
        let scale = |value: f32| value * 1000.0 / units;

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map_or(0.0, |advance| scale(f32::from(advance)))
            })
            .collect();

        let bbox = face.global_bounding_box();
        let ascent = scale(f32::from(face.ascender()));
        let base_font = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .unwrap_or_else(|| family.replace(' ', ""));

        let program = FontProgram {
            format: if data.starts_with(b"OTTO") {
                FontFormat::OpenTypeCff
            } else {
                FontFormat::TrueType
            },
            widths,
            ascent,
            descent: scale(f32::from(face.descender())),
            cap_height: face
                .capital_height()
                .map_or(ascent, |height| scale(f32::from(height))),
            italic_angle: face.italic_angle().unwrap_or(0.0),
            bbox: [
                scale(f32::from(bbox.x_min)),
                scale(f32::from(bbox.y_min)),
                scale(f32::from(bbox.x_max)),
                scale(f32::from(bbox.y_max)),
            ],
            data,
        };
        debug!(%family, %base_font, format = ?program.format, "font program parsed");

        Ok(Self {
            family,
            base_font,
            program: Some(program),
        })
    }

    /// Registry family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// PostScript name written as `/BaseFont`.
    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Embedded program, `None` for standard 14 fonts.
    pub fn program(&self) -> Option<&FontProgram> {
        self.program.as_ref()
    }

    /// Advance of `ch` in 1/1000 em.
    pub fn char_width(&self, ch: char) -> f32 {
        match &self.program {
            Some(program) => win_ansi_code(ch)
                .filter(|code| *code >= FIRST_CHAR)
                .and_then(|code| program.widths.get(usize::from(code - FIRST_CHAR)))
                .copied()
                .unwrap_or(DEFAULT_WIDTH),
            None => standard_width(&self.base_font, ch).map_or(DEFAULT_WIDTH, f32::from),
        }
    }

    /// Rendered width of `text` at `size` points.
    pub fn text_length(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch)).sum::<f32>() * size / 1000.0
    }

    /// WinAnsi bytes for `text`; characters outside the encoding become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| win_ansi_code(ch).unwrap_or(b'?'))
            .collect()
    }
}
