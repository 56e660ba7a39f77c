// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font dictionaries as the text interpreter sees them: code splitting,
// advance widths, and code-to-Unicode mapping.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::metrics;
use crate::pdf::objects::{get_dict, get_name, get_number, get_resolved, number, resolve, stream_bytes};

/// Fallback advance for glyphs no table knows about, in 1/1000 em.
const DEFAULT_WIDTH: f32 = 500.0;

/// A decoded font resource.
#[derive(Debug, Clone)]
pub struct PdfFont {
    /// Family name with any subset prefix (`ABCDEF+`) removed.
    pub family: String,
    base_font: String,
    composite: bool,
    first_char: u32,
    widths: Vec<f32>,
    missing_width: f32,
    cid_widths: HashMap<u32, f32>,
    default_cid_width: f32,
    encoding: Vec<Option<String>>,
    to_unicode: HashMap<u32, String>,
    /// Ascender height as a fraction of the em.
    pub ascent: f32,
    /// Descender depth as a (negative) fraction of the em.
    pub descent: f32,
}

impl PdfFont {
    /// Decode a font dictionary. `resource_name` names the font when the
    /// dictionary carries no `/BaseFont` (Type 3 fonts).
    pub fn load(doc: &Document, dict: &Dictionary, resource_name: &str) -> Self {
        let base_font = get_name(doc, dict, b"BaseFont")
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .unwrap_or_else(|| resource_name.to_string());
        let composite = get_name(doc, dict, b"Subtype") == Some(b"Type0".as_slice());

        let mut font = Self::with_base_font(base_font, composite);

        let descendant = if composite {
            get_resolved(doc, dict, b"DescendantFonts")
                .and_then(|obj| obj.as_array().ok())
                .and_then(|fonts| fonts.first())
                .and_then(|first| resolve(doc, first).as_dict().ok())
        } else {
            None
        };

        let descriptor_owner = descendant.unwrap_or(dict);
        if let Some(descriptor) = get_dict(doc, descriptor_owner, b"FontDescriptor") {
            if let Some(ascent) = get_number(doc, descriptor, b"Ascent")
                && ascent > 0.0
            {
                font.ascent = ascent / 1000.0;
            }
            if let Some(descent) = get_number(doc, descriptor, b"Descent")
                && descent < 0.0
            {
                font.descent = descent / 1000.0;
            }
            if let Some(missing) = get_number(doc, descriptor, b"MissingWidth") {
                font.missing_width = missing;
            }
        }

        if let Some(descendant) = descendant {
            font.load_cid_widths(doc, descendant);
        } else {
            font.first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0) as u32;
            if let Some(widths) = get_resolved(doc, dict, b"Widths").and_then(|w| w.as_array().ok())
            {
                font.widths = widths
                    .iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                    .collect();
            }
            font.load_encoding(doc, dict);
        }

        if let Some(Object::Stream(stream)) = get_resolved(doc, dict, b"ToUnicode") {
            match stream_bytes(stream) {
                Ok(bytes) => font.to_unicode = parse_to_unicode(&bytes),
                Err(err) => debug!(font = %font.family, %err, "unreadable ToUnicode stream"),
            }
        }

        font
    }

    /// Stand-in for a font resource that cannot be found on the page.
    pub fn missing(resource_name: &str) -> Self {
        Self::with_base_font(resource_name.to_string(), false)
    }

    fn with_base_font(base_font: String, composite: bool) -> Self {
        let family = strip_subset_prefix(&base_font).to_string();
        Self {
            family,
            base_font,
            composite,
            first_char: 0,
            widths: Vec::new(),
            missing_width: 0.0,
            cid_widths: HashMap::new(),
            default_cid_width: 1000.0,
            encoding: (0u8..=255)
                .map(|code| metrics::win_ansi_char(code).map(String::from))
                .collect(),
            to_unicode: HashMap::new(),
            ascent: 0.8,
            descent: -0.2,
        }
    }

    fn load_encoding(&mut self, doc: &Document, dict: &Dictionary) {
        let Some(encoding) = get_resolved(doc, dict, b"Encoding") else {
            return;
        };
        let Ok(encoding) = encoding.as_dict() else {
            // Named base encodings agree with WinAnsi over printable ASCII.
            return;
        };
        let Some(differences) = get_resolved(doc, encoding, b"Differences")
            .and_then(|obj| obj.as_array().ok())
        else {
            return;
        };

        let mut code: usize = 0;
        for entry in differences {
            match resolve(doc, entry) {
                Object::Integer(start) => code = (*start).clamp(0, 255) as usize,
                Object::Name(name) => {
                    if code < self.encoding.len() {
                        let name = String::from_utf8_lossy(name);
                        self.encoding[code] = metrics::glyph_name_to_text(&name);
                    }
                    code += 1;
                }
                _ => {}
            }
        }
    }

    fn load_cid_widths(&mut self, doc: &Document, descendant: &Dictionary) {
        if let Some(dw) = get_number(doc, descendant, b"DW") {
            self.default_cid_width = dw;
        }
        let Some(w) = get_resolved(doc, descendant, b"W").and_then(|obj| obj.as_array().ok())
        else {
            return;
        };

        // Entries are either `c [w1 w2 ...]` or `c_first c_last w`.
        let mut index = 0;
        while index < w.len() {
            let Some(start) = number(resolve(doc, &w[index])) else {
                index += 1;
                continue;
            };
            let start = start as u32;
            match w.get(index + 1).map(|obj| resolve(doc, obj)) {
                Some(Object::Array(run)) => {
                    for (offset, width) in run.iter().enumerate() {
                        if let Some(width) = number(resolve(doc, width)) {
                            self.cid_widths.insert(start + offset as u32, width);
                        }
                    }
                    index += 2;
                }
                Some(end) => {
                    let end = number(end).unwrap_or(start as f32) as u32;
                    let width = w
                        .get(index + 2)
                        .and_then(|obj| number(resolve(doc, obj)))
                        .unwrap_or(self.default_cid_width);
                    for cid in start..=end.min(start.saturating_add(0xFFFF)) {
                        self.cid_widths.insert(cid, width);
                    }
                    index += 3;
                }
                None => break,
            }
        }
    }

    /// Split a shown string into `(code, raw bytes)` pairs.
    pub fn codes<'a>(&self, bytes: &'a [u8]) -> Vec<(u32, &'a [u8])> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    (code, pair)
                })
                .collect()
        } else {
            bytes
                .chunks(1)
                .map(|single| (u32::from(single[0]), single))
                .collect()
        }
    }

    /// Advance width of `code` in 1/1000 em.
    pub fn width(&self, code: u32) -> f32 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_cid_width);
        }

        if let Some(index) = code.checked_sub(self.first_char)
            && let Some(width) = self.widths.get(index as usize)
        {
            return *width;
        }
        if !self.widths.is_empty() && self.missing_width > 0.0 {
            return self.missing_width;
        }

        let standard = self
            .text(code)
            .chars()
            .next()
            .and_then(|ch| metrics::standard_width(&self.base_font, ch));
        match standard {
            Some(width) => f32::from(width),
            None if self.missing_width > 0.0 => self.missing_width,
            None => DEFAULT_WIDTH,
        }
    }

    /// Unicode text for `code`. Unmapped composite codes become U+FFFD.
    pub fn text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.composite {
            return '\u{FFFD}'.to_string();
        }
        self.encoding
            .get(code as usize)
            .cloned()
            .flatten()
            .unwrap_or_else(|| char::from_u32(code).unwrap_or('\u{FFFD}').to_string())
    }

    /// Word spacing (`Tw`) applies only to the single-byte code 32.
    pub fn is_word_space(&self, raw: &[u8]) -> bool {
        raw == b" "
    }
}

/// Drop a six-letter subset tag such as `ABCDEF+`.
pub fn strip_subset_prefix(base_font: &str) -> &str {
    match base_font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => base_font,
    }
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
///
/// CMaps share the content-stream token syntax, so lopdf's content parser
/// yields them as operations whose operands are the mapping entries.
fn parse_to_unicode(bytes: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    let content = match Content::decode(bytes) {
        Ok(content) => content,
        Err(err) => {
            debug!(%err, "cannot tokenize ToUnicode CMap");
            return map;
        }
    };

    for operation in &content.operations {
        match operation.operator.as_str() {
            "endbfchar" => {
                for pair in operation.operands.chunks(2) {
                    if let [Object::String(src, _), Object::String(dst, _)] = pair {
                        map.insert(code_of(src), utf16_text(dst));
                    }
                }
            }
            "endbfrange" => {
                for triple in operation.operands.chunks(3) {
                    let [Object::String(lo, _), Object::String(hi, _), dst] = triple else {
                        continue;
                    };
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    if hi < lo || hi - lo > 0xFFFF {
                        continue;
                    }
                    match dst {
                        Object::String(first, _) => {
                            let mut units = utf16_units(first);
                            for code in lo..=hi {
                                map.insert(code, String::from_utf16_lossy(&units));
                                if let Some(last) = units.last_mut() {
                                    *last = last.wrapping_add(1);
                                }
                            }
                        }
                        Object::Array(targets) => {
                            for (code, target) in (lo..=hi).zip(targets) {
                                if let Object::String(dst, _) = target {
                                    map.insert(code, utf16_text(dst));
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    map
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn helvetica() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }
    }

    #[test]
    fn subset_prefix_is_removed() {
        assert_eq!(strip_subset_prefix("ABCDEF+CenturySchoolbook"), "CenturySchoolbook");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abc+Font"), "abc+Font");
    }

    #[test]
    fn standard_font_without_widths_uses_builtin_metrics() {
        let doc = Document::with_version("1.5");
        let dict = helvetica();
        let font = PdfFont::load(&doc, &dict, "F1");
        assert_eq!(font.family, "Helvetica");
        assert_eq!(font.width(u32::from(b'P')), 667.0);
        assert_eq!(font.text(u32::from(b'P')), "P");
        assert_eq!(font.codes(b"PDF").len(), 3);
    }

    #[test]
    fn explicit_widths_and_differences() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "XYZABC+Body",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(600), Object::Integer(650)],
            "Encoding" => dictionary! {
                "Type" => "Encoding",
                "Differences" => vec![Object::Integer(66), Object::Name(b"period".to_vec())],
            },
        };
        let font = PdfFont::load(&doc, &dict, "F2");
        assert_eq!(font.family, "Body");
        assert_eq!(font.width(65), 600.0);
        assert_eq!(font.width(66), 650.0);
        assert_eq!(font.text(66), ".");
        assert_eq!(font.text(65), "A");
        assert_eq!(font.width(90), DEFAULT_WIDTH);
    }

    #[test]
    fn to_unicode_bfchar_and_bfrange() {
        let cmap = b"/CIDInit /ProcSet findresource begin\n\
            12 dict begin\nbegincmap\n\
            1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
            2 beginbfchar\n<0003> <0020>\n<0011> <0050>\nendbfchar\n\
            1 beginbfrange\n<0020> <0022> <0041>\nendbfrange\n\
            endcmap\nend\nend\n";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x0003).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x0011).map(String::as_str), Some("P"));
        assert_eq!(map.get(&0x0020).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x0022).map(String::as_str), Some("C"));
    }

    #[test]
    fn composite_font_reads_two_byte_codes() {
        let mut doc = Document::with_version("1.5");
        let cmap = b"1 beginbfchar <0011> <0050> endbfchar";
        let to_unicode = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), cmap.to_vec())));
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "Body",
            "DW" => 1000,
            "W" => vec![Object::Integer(17), Object::Array(vec![Object::Integer(640)])],
        });
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Body",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => to_unicode,
        };
        let font = PdfFont::load(&doc, &dict, "F3");
        let codes = font.codes(&[0x00, 0x11, 0x00, 0x12]);
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].0, 0x11);
        assert_eq!(font.width(0x11), 640.0);
        assert_eq!(font.width(0x12), 1000.0);
        assert_eq!(font.text(0x11), "P");
        assert_eq!(font.text(0x12), "\u{FFFD}");
    }
}
