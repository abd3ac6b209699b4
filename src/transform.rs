// src/transform.rs
//
// Геометрические проходы стратегии поиска: повороты, инверсия яркости,
// половинный даунскейл. Каждый трансформ порождает СВЕЖИЙ GrayBuffer
// (исходник не трогаем), а quad найденного кандидата отображается
// обратно в координаты исходного изображения.

use std::fmt;

use crate::core::pixel::GrayBuffer;
use crate::core::types::{Point, Quad};

/// Угол поворота по часовой стрелке.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

/// Один проход поиска: поворот + опциональная инверсия + опциональный
/// половинный даунскейл (применяются именно в этом порядке).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transform {
    pub rotation: Rotation,
    pub inverted: bool,
    pub downscaled: bool,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotation: Rotation::R0,
        inverted: false,
        downscaled: false,
    };

    #[inline]
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Построить трансформированный буфер из исходного серого плана.
    #[must_use]
    pub fn apply(self, base: &GrayBuffer) -> GrayBuffer {
        let mut g = match self.rotation {
            Rotation::R0 => base.clone(),
            Rotation::R90 => rotate90_cw(base),
            Rotation::R180 => rotate180(base),
            Rotation::R270 => rotate270_cw(base),
        };
        if self.inverted {
            for v in &mut g.data {
                *v = 255 - *v;
            }
        }
        if self.downscaled {
            g = downscale_half(&g);
        }
        g
    }

    /// Точка из координат трансформированного буфера → координаты исходника.
    /// `orig_w`/`orig_h` — размеры исходного (неповёрнутого) изображения.
    #[must_use]
    pub fn map_point_back(self, p: Point, orig_w: usize, orig_h: usize) -> Point {
        let w = orig_w as i32;
        let h = orig_h as i32;

        // 1) даунскейл: центр пикселя 2×2 блока
        let (x, y) = if self.downscaled {
            (p.x * 2 + 1, p.y * 2 + 1)
        } else {
            (p.x, p.y)
        };

        // 2) инверсия яркости геометрию не меняет

        // 3) обратный поворот
        let (xo, yo) = match self.rotation {
            Rotation::R0 => (x, y),
            Rotation::R90 => (y, h - 1 - x),
            Rotation::R180 => (w - 1 - x, h - 1 - y),
            Rotation::R270 => (w - 1 - y, x),
        };

        Point::new(xo.clamp(0, w - 1), yo.clamp(0, h - 1))
    }

    /// Quad из координат трансформированного буфера → исходник,
    /// с восстановлением канонического порядка углов (TL, TR, BR, BL).
    #[must_use]
    pub fn map_quad_back(self, q: Quad, orig_w: usize, orig_h: usize) -> Quad {
        let pts = [
            self.map_point_back(q.tl, orig_w, orig_h),
            self.map_point_back(q.tr, orig_w, orig_h),
            self.map_point_back(q.br, orig_w, orig_h),
            self.map_point_back(q.bl, orig_w, orig_h),
        ];
        canonical_quad(pts)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rot = match self.rotation {
            Rotation::R0 => "rot0",
            Rotation::R90 => "rot90",
            Rotation::R180 => "rot180",
            Rotation::R270 => "rot270",
        };
        write!(
            f,
            "{rot}{}{}",
            if self.inverted { "+inv" } else { "" },
            if self.downscaled { "+half" } else { "" }
        )
    }
}

/// Упорядочить четыре произвольных угла канонически:
/// TL = min(x+y), BR = max(x+y), TR = max(x−y), BL = min(x−y).
#[must_use]
pub fn canonical_quad(pts: [Point; 4]) -> Quad {
    let mut tl = pts[0];
    let mut br = pts[0];
    let mut tr = pts[0];
    let mut bl = pts[0];
    for p in pts {
        if p.x + p.y < tl.x + tl.y {
            tl = p;
        }
        if p.x + p.y > br.x + br.y {
            br = p;
        }
        if p.x - p.y > tr.x - tr.y {
            tr = p;
        }
        if p.x - p.y < bl.x - bl.y {
            bl = p;
        }
    }
    Quad { tl, tr, br, bl }
}

fn rotate90_cw(g: &GrayBuffer) -> GrayBuffer {
    let (w, h) = (g.width, g.height);
    let mut data = vec![0u8; w * h];
    // пиксель (xi, yi) исходника уходит в (h-1-yi, xi)
    for yo in 0..w {
        for xo in 0..h {
            data[yo * h + xo] = g.get(yo, h - 1 - xo);
        }
    }
    GrayBuffer {
        data,
        width: h,
        height: w,
    }
}

fn rotate180(g: &GrayBuffer) -> GrayBuffer {
    let mut data = g.data.clone();
    data.reverse();
    GrayBuffer {
        data,
        width: g.width,
        height: g.height,
    }
}

fn rotate270_cw(g: &GrayBuffer) -> GrayBuffer {
    let (w, h) = (g.width, g.height);
    let mut data = vec![0u8; w * h];
    // пиксель (xi, yi) исходника уходит в (yi, w-1-xi)
    for yo in 0..w {
        for xo in 0..h {
            data[yo * h + xo] = g.get(w - 1 - yo, xo);
        }
    }
    GrayBuffer {
        data,
        width: h,
        height: w,
    }
}

/// Половинное разрешение box-фильтром 2×2 (хвостовые строки/столбцы
/// при нечётном размере отбрасываются).
fn downscale_half(g: &GrayBuffer) -> GrayBuffer {
    let w = g.width / 2;
    let h = g.height / 2;
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        let r0 = g.row(2 * y);
        let r1 = g.row(2 * y + 1);
        for x in 0..w {
            let sum = u32::from(r0[2 * x])
                + u32::from(r0[2 * x + 1])
                + u32::from(r1[2 * x])
                + u32::from(r1[2 * x + 1]);
            data.push((sum / 4) as u8);
        }
    }
    GrayBuffer {
        data,
        width: w,
        height: h,
    }
}
