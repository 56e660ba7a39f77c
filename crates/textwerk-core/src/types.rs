// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Textwerk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TextwerkError;

/// Axis-aligned rectangle in page space.
///
/// The origin is the top-left corner of the page's MediaBox and `y` grows
/// downward, so `y0` is the top edge and `y1` the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Smallest rectangle enclosing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Move the right edge left by `amount`, never past the left edge.
    pub fn trim_right(&self, amount: f32) -> Rect {
        let amount = amount.max(0.0);
        Rect {
            x1: (self.x1 - amount).max(self.x0),
            ..*self
        }
    }
}

/// Normalised RGB color, each component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor { r: 0.0, g: 0.0, b: 0.0 };
    pub const RED: RgbColor = RgbColor { r: 1.0, g: 0.0, b: 0.0 };

    /// Build a color, clamping each component into `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    /// Decode a packed `0xRRGGBB` integer.
    pub fn from_packed(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Encode as a packed `0xRRGGBB` integer.
    pub fn to_packed(&self) -> u32 {
        let channel = |v: f32| (clamp_unit(v) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_packed())
    }
}

impl FromStr for RgbColor {
    type Err = TextwerkError;

    /// Accepts `#RRGGBB`, `RRGGBB`, or three comma-separated components in
    /// `[0, 1]` such as `1,0,0`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();

        if trimmed.contains(',') {
            let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(TextwerkError::InvalidColor(format!(
                    "expected three components, got {}",
                    parts.len()
                )));
            }
            let mut values = [0.0f32; 3];
            for (slot, part) in values.iter_mut().zip(&parts) {
                let value: f32 = part.parse().map_err(|_| {
                    TextwerkError::InvalidColor(format!("{part:?} is not a number"))
                })?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(TextwerkError::InvalidColor(format!(
                        "component {value} is outside [0, 1]"
                    )));
                }
                *slot = value;
            }
            return Ok(Self::new(values[0], values[1], values[2]));
        }

        let hex = trimmed.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TextwerkError::InvalidColor(format!(
                "{input:?} is neither #RRGGBB nor r,g,b"
            )));
        }
        let packed = u32::from_str_radix(hex, 16)
            .map_err(|err| TextwerkError::InvalidColor(err.to_string()))?;
        Ok(Self::from_packed(packed))
    }
}

/// Stable identity of a word occurrence on a page.
///
/// `span` is the span holding the word's first character and `word` the
/// ordinal of the whitespace-separated piece of that span's text where the
/// word begins. Both the word tokenizer and the span re-scan compute it the
/// same way, so the two can be joined on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WordKey {
    pub page: usize,
    pub block: usize,
    pub line: usize,
    pub span: usize,
    pub word: usize,
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p{}/b{}/l{}/s{}/w{}",
            self.page, self.block, self.line, self.span, self.word
        )
    }
}

/// One occurrence of the target word found by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub key: WordKey,
    pub rect: Rect,
    /// Raw token text, punctuation included.
    pub text: String,
}

/// Visual properties of the span a matched word came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontProperties {
    pub font_size: f32,
    pub family: String,
    /// Packed `0xRRGGBB` fill color of the span.
    pub color: u32,
    /// Rendered width of a single trailing character, or zero.
    pub extra_width: f32,
}

/// What to do with each matched occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    /// Draw a highlight annotation over the word.
    Highlight,
    /// Erase the word and write it again in the given color.
    Recolor(RgbColor),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highlight => write!(f, "highlight"),
            Self::Recolor(color) => write!(f, "recolor({color})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_right_never_inverts() {
        let rect = Rect::new(10.0, 0.0, 20.0, 5.0);
        assert_eq!(rect.trim_right(3.0).x1, 17.0);
        assert_eq!(rect.trim_right(50.0).x1, 10.0);
        assert_eq!(rect.trim_right(-4.0), rect);
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(3.0, -2.0, 9.0, 4.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -2.0, 9.0, 5.0));
    }

    #[test]
    fn packed_color_round_trip() {
        let color = RgbColor::from_packed(0xFF8000);
        assert_eq!(color.r, 1.0);
        assert!((color.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.to_packed(), 0xFF8000);
    }

    #[test]
    fn parse_hex_and_triples() {
        assert_eq!("#ff0000".parse::<RgbColor>().unwrap(), RgbColor::RED);
        assert_eq!("00FF00".parse::<RgbColor>().unwrap().to_packed(), 0x00FF00);
        assert_eq!("1, 0, 0".parse::<RgbColor>().unwrap(), RgbColor::RED);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("#ff00".parse::<RgbColor>().is_err());
        assert!("1,0".parse::<RgbColor>().is_err());
        assert!("2,0,0".parse::<RgbColor>().is_err());
        assert!("zzzzzz".parse::<RgbColor>().is_err());
    }

    #[test]
    fn new_clamps_components() {
        let color = RgbColor::new(1.5, -0.2, f32::NAN);
        assert_eq!(color.components(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn word_keys_order_by_reading_position() {
        let first = WordKey { page: 0, block: 0, line: 1, span: 0, word: 4 };
        let second = WordKey { page: 0, block: 1, line: 0, span: 0, word: 0 };
        assert!(first < second);
        assert_eq!(first.to_string(), "p0/b0/l1/s0/w4");
    }
}
