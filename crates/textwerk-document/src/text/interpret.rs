// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-positioning interpreter for page content streams.
//
// Tracks just enough graphics and text state (CTM, fill color, Tm/Tlm, Tf,
// Tc, Tw, Tz, TL, Ts) to place every shown glyph on the page. Painting,
// clipping, and Form XObjects are not interpreted.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object};
use textwerk_core::{Rect, RgbColor};
use tracing::debug;

use super::font::PdfFont;
use crate::pdf::geometry::{Matrix, PageGeometry};
use crate::pdf::objects::{number, numbers, resolve};

/// One shown glyph, positioned in page space.
#[derive(Debug, Clone)]
pub(crate) struct Glyph {
    pub text: String,
    pub rect: Rect,
    pub family: String,
    pub size: f32,
    pub color: u32,
}

/// A piece of a text-showing operation, in operand order.
#[derive(Debug, Clone)]
pub(crate) enum ShowItem {
    /// Index into `Interpretation::glyphs`, the glyph's raw code bytes, and
    /// the `TJ` offset that reproduces its displacement (`None` when the
    /// current font size or horizontal scale is zero).
    Glyph {
        glyph: usize,
        raw: Vec<u8>,
        adjust: Option<f32>,
    },
    /// An explicit `TJ` offset carried over unchanged.
    Offset(Object),
}

/// A `Tj`, `TJ`, `'`, or `"` operation and what it drew.
#[derive(Debug, Clone)]
pub(crate) struct ShowOp {
    pub op_index: usize,
    pub items: Vec<ShowItem>,
}

#[derive(Debug, Default)]
pub(crate) struct Interpretation {
    pub glyphs: Vec<Glyph>,
    pub shows: Vec<ShowOp>,
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Rc<PdfFont>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: u32,
    text: TextState,
}

pub(crate) struct Interpreter<'a> {
    doc: &'a Document,
    fonts: Option<&'a Dictionary>,
    geometry: PageGeometry,
    font_cache: HashMap<Vec<u8>, Rc<PdfFont>>,
    stack: Vec<GraphicsState>,
    state: GraphicsState,
    tm: Matrix,
    tlm: Matrix,
    output: Interpretation,
}

impl<'a> Interpreter<'a> {
    pub fn new(doc: &'a Document, resources: &'a Dictionary, geometry: PageGeometry) -> Self {
        let fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|obj| resolve(doc, obj).as_dict().ok());
        Self {
            doc,
            fonts,
            geometry,
            font_cache: HashMap::new(),
            stack: Vec::new(),
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                fill: 0x000000,
                text: TextState::default(),
            },
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            output: Interpretation::default(),
        }
    }

    pub fn run(mut self, operations: &[Operation]) -> Interpretation {
        for (op_index, operation) in operations.iter().enumerate() {
            self.step(op_index, operation);
        }
        self.output
    }

    fn step(&mut self, op_index: usize, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = numbers(operands).as_deref().and_then(Matrix::from_slice) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tc" => set_number(operands, &mut self.state.text.char_spacing),
            "Tw" => set_number(operands, &mut self.state.text.word_spacing),
            "TL" => set_number(operands, &mut self.state.text.leading),
            "Ts" => set_number(operands, &mut self.state.text.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(number) {
                    self.state.text.horizontal_scale = scale / 100.0;
                }
            }
            "Tf" => {
                if let [Object::Name(name), size] = operands.as_slice() {
                    let font = self.font(name);
                    self.state.text.font = Some(font);
                    self.state.text.size = number(size).unwrap_or(0.0);
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers(operands).as_deref().map(two) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers(operands).as_deref().map(two) {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = numbers(operands).as_deref().and_then(Matrix::from_slice) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let items = self.show_string(bytes);
                    self.output.shows.push(ShowOp { op_index, items });
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let items = self.show_string(bytes);
                    self.output.shows.push(ShowOp { op_index, items });
                }
            }
            "\"" => {
                if let [aw, ac, Object::String(bytes, _)] = operands.as_slice() {
                    set_number(std::slice::from_ref(aw), &mut self.state.text.word_spacing);
                    set_number(std::slice::from_ref(ac), &mut self.state.text.char_spacing);
                    self.next_line();
                    let items = self.show_string(bytes);
                    self.output.shows.push(ShowOp { op_index, items });
                }
            }
            "TJ" => {
                if let Some(Object::Array(elements)) = operands.first() {
                    let mut items = Vec::new();
                    for element in elements {
                        match element {
                            Object::String(bytes, _) => items.extend(self.show_string(bytes)),
                            other => {
                                if let Some(offset) = number(other) {
                                    let text = &self.state.text;
                                    let tx = -offset / 1000.0 * text.size * text.horizontal_scale;
                                    self.tm = Matrix::translate(tx, 0.0).then(&self.tm);
                                    items.push(ShowItem::Offset(other.clone()));
                                }
                            }
                        }
                    }
                    self.output.shows.push(ShowOp { op_index, items });
                }
            }
            "g" | "rg" | "k" | "sc" | "scn" => self.set_fill(operands),
            "cs" => self.state.fill = 0x000000,
            "Do" => debug!("skipping XObject text"),
            _ => {}
        }
    }

    fn font(&mut self, name: &[u8]) -> Rc<PdfFont> {
        if let Some(font) = self.font_cache.get(name) {
            return Rc::clone(font);
        }
        let resource_name = String::from_utf8_lossy(name).into_owned();
        let font = match self
            .fonts
            .and_then(|fonts| fonts.get(name).ok())
            .and_then(|obj| resolve(self.doc, obj).as_dict().ok())
        {
            Some(dict) => PdfFont::load(self.doc, dict, &resource_name),
            None => {
                debug!(font = %resource_name, "font resource not found on page");
                PdfFont::missing(&resource_name)
            }
        };
        let font = Rc::new(font);
        self.font_cache.insert(name.to_vec(), Rc::clone(&font));
        font
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn set_fill(&mut self, operands: &[Object]) {
        // Pattern operands end with a name; those keep the previous color.
        let Some(values) = numbers(operands) else {
            return;
        };
        let color = match values.as_slice() {
            [gray] => RgbColor::new(*gray, *gray, *gray),
            [r, g, b] => RgbColor::new(*r, *g, *b),
            [c, m, y, k] => RgbColor::new(
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            ),
            _ => return,
        };
        self.state.fill = color.to_packed();
    }

    fn show_string(&mut self, bytes: &[u8]) -> Vec<ShowItem> {
        let text = self.state.text.clone();
        let font = text
            .font
            .clone()
            .unwrap_or_else(|| Rc::new(PdfFont::missing("unknown")));
        let scale = text.size * text.horizontal_scale;
        let mut items = Vec::new();

        for (code, raw) in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let trm = Matrix::new(scale, 0.0, 0.0, text.size, 0.0, text.rise)
                .then(&self.tm)
                .then(&self.state.ctm);

            let corners = [
                trm.apply(0.0, font.descent),
                trm.apply(w0, font.descent),
                trm.apply(0.0, font.ascent),
                trm.apply(w0, font.ascent),
            ];
            let rect = self.geometry.bounds_to_page(&corners);
            let size = text.size * self.tm.then(&self.state.ctm).vertical_scale();

            self.output.glyphs.push(Glyph {
                text: font.text(code),
                rect,
                family: font.family.clone(),
                size,
                color: self.state.fill,
            });

            let spacing = text.char_spacing
                + if font.is_word_space(raw) {
                    text.word_spacing
                } else {
                    0.0
                };
            let tx = (w0 * text.size + spacing) * text.horizontal_scale;
            let adjust = (scale != 0.0).then(|| -tx * 1000.0 / scale);
            self.tm = Matrix::translate(tx, 0.0).then(&self.tm);

            items.push(ShowItem::Glyph {
                glyph: self.output.glyphs.len() - 1,
                raw: raw.to_vec(),
                adjust,
            });
        }
        items
    }
}

fn set_number(operands: &[Object], slot: &mut f32) {
    if let Some(value) = operands.first().and_then(number) {
        *slot = value;
    }
}

fn two(values: &[f32]) -> [f32; 2] {
    match values {
        [a, b, ..] => [*a, *b],
        _ => [0.0, 0.0],
    }
}
