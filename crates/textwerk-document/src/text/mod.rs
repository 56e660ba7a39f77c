// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structured page text: blocks of lines of uniformly styled spans, plus the
// word tokens derived from them.

pub mod font;
pub(crate) mod interpret;
pub(crate) mod layout;
pub mod metrics;

use textwerk_core::{Rect, WordKey};

/// One character with its box in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    pub ch: char,
    pub rect: Rect,
}

/// A maximal run of characters sharing font family, size, and fill color.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// Font family name, subset prefix removed.
    pub font: String,
    pub size: f32,
    /// Packed `0xRRGGBB` fill color.
    pub color: u32,
    pub text: String,
    pub chars: Vec<TextChar>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub rect: Rect,
}

/// A whitespace-delimited word as the tokenizer reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct WordToken {
    pub key: WordKey,
    pub rect: Rect,
    pub text: String,
}

/// All text on one page, in content-stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPage {
    /// 0-based page index.
    pub page: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

impl TextPage {
    /// Word tokens in reading order. A word may continue across spans of the
    /// same line; its key names the span holding its first character.
    pub fn words(&self) -> Vec<WordToken> {
        let mut words = Vec::new();
        for (block_index, block) in self.blocks.iter().enumerate() {
            for (line_index, line) in block.lines.iter().enumerate() {
                let mut current: Option<WordToken> = None;
                for (span_index, span) in line.spans.iter().enumerate() {
                    let ordinals = piece_ordinals(&span.text);
                    for (char_index, text_char) in span.chars.iter().enumerate() {
                        if text_char.ch.is_whitespace() {
                            words.extend(current.take());
                            continue;
                        }
                        match current.as_mut() {
                            Some(word) => {
                                word.rect = word.rect.union(&text_char.rect);
                                word.text.push(text_char.ch);
                            }
                            None => {
                                let ordinal = ordinals.get(char_index).copied().flatten();
                                current = Some(WordToken {
                                    key: WordKey {
                                        page: self.page,
                                        block: block_index,
                                        line: line_index,
                                        span: span_index,
                                        word: ordinal.unwrap_or(0),
                                    },
                                    rect: text_char.rect,
                                    text: text_char.ch.to_string(),
                                });
                            }
                        }
                    }
                }
                words.extend(current.take());
            }
        }
        words
    }

    /// Plain text, one line per row and a blank line between blocks.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .lines
                    .iter()
                    .map(|line| line.spans.iter().map(|span| span.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Every span on the page with its (block, line, span) position.
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize, usize, &TextSpan)> {
        self.blocks.iter().enumerate().flat_map(|(b, block)| {
            block.lines.iter().enumerate().flat_map(move |(l, line)| {
                line.spans
                    .iter()
                    .enumerate()
                    .map(move |(s, span)| (b, l, s, span))
            })
        })
    }
}

/// For each character of `text`, the ordinal of the whitespace-separated
/// piece it belongs to, or `None` for whitespace. Ordinals agree with
/// `str::split_whitespace().enumerate()`.
pub fn piece_ordinals(text: &str) -> Vec<Option<usize>> {
    let mut ordinals = Vec::with_capacity(text.len());
    let mut next = 0;
    let mut in_piece = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            in_piece = false;
            ordinals.push(None);
        } else {
            if !in_piece {
                in_piece = true;
                next += 1;
            }
            ordinals.push(Some(next - 1));
        }
    }
    ordinals
}
