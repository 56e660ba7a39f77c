// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Affine matrices and the mapping between PDF user space (origin bottom-left,
// y up) and page space (origin top-left of the MediaBox, y down).

use lopdf::{Document, ObjectId};
use textwerk_core::Rect;

use super::objects::{inherited, number};

/// A PDF transformation matrix `[a b c d e f]`, applied to row vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    pub fn vertical_scale(&self) -> f32 {
        self.c.hypot(self.d)
    }
}

/// MediaBox placement of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl PageGeometry {
    /// US Letter, the PDF default when a page has no usable MediaBox.
    pub const LETTER: PageGeometry = PageGeometry {
        left: 0.0,
        bottom: 0.0,
        right: 612.0,
        top: 792.0,
    };

    pub fn of_page(doc: &Document, page_id: ObjectId) -> Self {
        let corners = inherited(doc, page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|values| values.iter().map(number).collect::<Option<Vec<f32>>>());
        match corners.as_deref() {
            Some([x0, y0, x1, y1]) => Self {
                left: x0.min(*x1),
                bottom: y0.min(*y1),
                right: x0.max(*x1),
                top: y0.max(*y1),
            },
            _ => Self::LETTER,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// PDF user space point to page space.
    pub fn to_page(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.left, self.top - y)
    }

    /// Page space point to PDF user space.
    pub fn to_pdf(&self, x: f32, y: f32) -> (f32, f32) {
        (x + self.left, self.top - y)
    }

    /// Page space rectangle to PDF `[llx lly urx ury]`.
    pub fn rect_to_pdf(&self, rect: &Rect) -> [f32; 4] {
        let (llx, lly) = self.to_pdf(rect.x0, rect.y1);
        let (urx, ury) = self.to_pdf(rect.x1, rect.y0);
        [llx, lly, urx, ury]
    }

    /// Bounding box, in page space, of PDF user space points.
    pub fn bounds_to_page(&self, points: &[(f32, f32)]) -> Rect {
        let mut rect = Rect::new(f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in points {
            let (px, py) = self.to_page(*x, *y);
            rect.x0 = rect.x0.min(px);
            rect.y0 = rect.y0.min(py);
            rect.x1 = rect.x1.max(px);
            rect.y1 = rect.y1.max(py);
        }
        rect
    }
}
