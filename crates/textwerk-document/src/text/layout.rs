// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Groups positioned glyphs into spans, lines, and blocks.

use textwerk_core::Rect;

use super::interpret::Glyph;
use super::{TextBlock, TextChar, TextLine, TextPage, TextSpan};
use crate::pdf::geometry::PageGeometry;

/// Horizontal gap, in font sizes, that reads as a word break.
const SPACE_GAP: f32 = 0.2;
/// Vertical gap between lines, in font sizes, that starts a new block.
const BLOCK_GAP: f32 = 1.0;

pub(crate) fn build(page: usize, geometry: PageGeometry, glyphs: &[Glyph]) -> TextPage {
    let mut builder = Builder::default();
    for glyph in glyphs {
        builder.push(glyph);
    }
    TextPage {
        page,
        width: geometry.width(),
        height: geometry.height(),
        blocks: builder.finish(),
    }
}

#[derive(Default)]
struct Builder {
    blocks: Vec<TextBlock>,
    lines: Vec<TextLine>,
    spans: Vec<TextSpan>,
    last: Option<(Rect, f32)>,
}

impl Builder {
    fn push(&mut self, glyph: &Glyph) {
        if glyph.text.is_empty() {
            return;
        }
        if let Some((last_rect, last_size)) = self.last {
            let size = glyph.size.max(last_size);
            let same_line = (glyph.rect.y1 - last_rect.y1).abs() <= 0.5 * size
                && glyph.rect.x0 >= last_rect.x0 - size;
            if same_line {
                let gap = glyph.rect.x0 - last_rect.x1;
                if gap > SPACE_GAP * size
                    && !self.ends_with_space()
                    && !glyph.text.starts_with(char::is_whitespace)
                {
                    self.push_space(Rect::new(last_rect.x1, last_rect.y0, glyph.rect.x0, last_rect.y1));
                }
            } else if let Some(line_rect) = self.close_line() {
                let gap = glyph.rect.y0 - line_rect.y1;
                if gap > BLOCK_GAP * glyph.size || glyph.rect.y1 <= line_rect.y0 {
                    self.close_block();
                }
            }
        }
        self.append(glyph);
        self.last = Some((glyph.rect, glyph.size));
    }

    fn ends_with_space(&self) -> bool {
        self.spans
            .last()
            .and_then(|span| span.chars.last())
            .is_none_or(|last| last.ch.is_whitespace())
    }

    fn push_space(&mut self, rect: Rect) {
        if let Some(span) = self.spans.last_mut() {
            span.chars.push(TextChar { ch: ' ', rect });
            span.text.push(' ');
            span.rect = span.rect.union(&rect);
        }
    }

    fn append(&mut self, glyph: &Glyph) {
        let same_style = self.spans.last().is_some_and(|span| {
            span.font == glyph.family
                && (span.size - glyph.size).abs() < 0.01
                && span.color == glyph.color
        });
        if !same_style {
            self.spans.push(TextSpan {
                font: glyph.family.clone(),
                size: glyph.size,
                color: glyph.color,
                text: String::new(),
                chars: Vec::new(),
                rect: glyph.rect,
            });
        }
        let Some(span) = self.spans.last_mut() else {
            return;
        };

        // Ligatures and other multi-character glyphs share their box evenly.
        let count = glyph.text.chars().count() as f32;
        let step = glyph.rect.width() / count;
        for (index, ch) in glyph.text.chars().enumerate() {
            let x0 = glyph.rect.x0 + step * index as f32;
            let rect = Rect::new(x0, glyph.rect.y0, x0 + step, glyph.rect.y1);
            span.chars.push(TextChar { ch, rect });
            span.text.push(ch);
            span.rect = span.rect.union(&rect);
        }
    }

    fn close_line(&mut self) -> Option<Rect> {
        let spans = std::mem::take(&mut self.spans);
        let rect = union_all(spans.iter().map(|span| span.rect))?;
        self.lines.push(TextLine { spans, rect });
        Some(rect)
    }

    fn close_block(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        if let Some(rect) = union_all(lines.iter().map(|line| line.rect)) {
            self.blocks.push(TextBlock { lines, rect });
        }
    }

    fn finish(mut self) -> Vec<TextBlock> {
        self.close_line();
        self.close_block();
        self.blocks
    }
}

fn union_all(mut rects: impl Iterator<Item = Rect>) -> Option<Rect> {
    let first = rects.next()?;
    Some(rects.fold(first, |acc, rect| acc.union(&rect)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(text: &str, x0: f32, y0: f32, width: f32) -> Glyph {
        Glyph {
            text: text.to_string(),
            rect: Rect::new(x0, y0, x0 + width, y0 + 10.0),
            family: "Helvetica".into(),
            size: 10.0,
            color: 0,
        }
    }

    fn word(text: &str, x0: f32, y0: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| glyph(&ch.to_string(), x0 + i as f32 * 5.0, y0, 5.0))
            .collect()
    }

    fn page(glyphs: Vec<Glyph>) -> TextPage {
        build(0, PageGeometry::LETTER, &glyphs)
    }

    #[test]
    fn gaps_become_spaces() {
        let mut glyphs = word("see", 0.0, 0.0);
        glyphs.extend(word("PDF", 18.0, 0.0));
        let page = page(glyphs);
        assert_eq!(page.text(), "see PDF");
        let words = page.words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].rect, Rect::new(18.0, 0.0, 33.0, 10.0));
    }

    #[test]
    fn tight_glyphs_stay_in_one_word() {
        let page = page(word("PDF", 0.0, 0.0));
        assert_eq!(page.words().len(), 1);
    }

    #[test]
    fn lines_and_blocks_split_on_vertical_moves() {
        let mut glyphs = word("one", 0.0, 0.0);
        glyphs.extend(word("two", 0.0, 14.0));
        glyphs.extend(word("far", 0.0, 60.0));
        let page = page(glyphs);
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0].lines.len(), 2);
        assert_eq!(page.text(), "one\ntwo\n\nfar");
        let keys: Vec<_> = page.words().iter().map(|w| (w.key.block, w.key.line)).collect();
        assert_eq!(keys, [(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn style_changes_start_spans() {
        let mut glyphs = word("ab", 0.0, 0.0);
        let mut red = glyph("c", 10.0, 0.0, 5.0);
        red.color = 0xFF0000;
        glyphs.push(red);
        let page = page(glyphs);
        let line = &page.blocks[0].lines[0];
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[1].text, "c");
        assert_eq!(line.spans[1].color, 0xFF0000);
        // Still one word across the span boundary.
        assert_eq!(page.words()[0].text, "abc");
    }

    #[test]
    fn ligatures_split_evenly() {
        let page = page(vec![glyph("fi", 0.0, 0.0, 10.0)]);
        let chars = &page.blocks[0].lines[0].spans[0].chars;
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[1].rect, Rect::new(5.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn unmapped_glyphs_are_dropped() {
        let page = page(vec![glyph("", 0.0, 0.0, 5.0)]);
        assert!(page.blocks.is_empty());
    }
}
