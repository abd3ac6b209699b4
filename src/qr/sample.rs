//! Сэмплинг сетки QR v1 (21×21) по трём центрам finder patterns.
//!
//! Геометрия: векторы модуля ux=(TR−TL)/14, uy=(BL−TL)/14 дают четыре
//! внешних угла символа; из единичного квадрата в эти углы строится
//! гомография. Поверх — лёгкая автокалибровка (анизотропные масштабы и
//! сдвиги в нормированных координатах) со скорингом по чередованию
//! центрального участка timing-линий, и суперсэмплинг 3×3 на модуль.

use super::data::N1;
use super::finder::{order_finders, PointF};
use crate::core::pixel::GrayBuffer;
use crate::core::types::Point;

/// Результат сэмплинга: биты сетки row-major + внешние углы символа
/// в пикселях исходного буфера (порядок: c00, c10, c01, c11).
pub(crate) struct SampledGrid {
    pub bits: Vec<bool>,
    pub corners: [PointF; 4],
}

impl SampledGrid {
    /// Углы как целочисленный quad (tl, tr, br, bl).
    pub(crate) fn quad(&self) -> crate::core::types::Quad {
        let p = |c: PointF| Point::new(c.x.round() as i32, c.y.round() as i32);
        crate::core::types::Quad {
            tl: p(self.corners[0]),
            tr: p(self.corners[1]),
            br: p(self.corners[3]),
            bl: p(self.corners[2]),
        }
    }
}

#[inline]
fn sample_bilinear(gray: &GrayBuffer, x: f32, y: f32) -> u8 {
    let w = (gray.width as i32 - 1).max(0);
    let h = (gray.height as i32 - 1).max(0);

    let xf = x.clamp(0.0, w as f32);
    let yf = y.clamp(0.0, h as f32);

    let x0 = xf.floor() as i32;
    let y0 = yf.floor() as i32;
    let x1 = (x0 + 1).clamp(0, w);
    let y1 = (y0 + 1).clamp(0, h);

    let dx = xf - x0 as f32;
    let dy = yf - y0 as f32;

    let at = |xx: i32, yy: i32| f32::from(gray.get(xx as usize, yy as usize));
    let i0 = at(x0, y0) * (1.0 - dx) + at(x1, y0) * dx;
    let i1 = at(x0, y1) * (1.0 - dx) + at(x1, y1) * dx;
    (i0 * (1.0 - dy) + i1 * dy).round() as u8
}

#[inline]
fn is_dark(v: u8) -> bool {
    v < 128
}

// Гомография: единичный квадрат -> произвольный четырёхугольник.

#[derive(Clone, Copy)]
struct ProjMap {
    x0: f32,
    x1: f32,
    x2: f32,
    x3: f32,
    y0: f32,
    y1: f32,
    y2: f32,
    y3: f32,
    g: f32,
    h: f32,
}

fn build_projective(p00: PointF, p10: PointF, p01: PointF, p11: PointF) -> ProjMap {
    let (x0, y0) = (p00.x, p00.y);
    let (x1, y1) = (p10.x - p00.x, p10.y - p00.y);
    let (x2, y2) = (p01.x - p00.x, p01.y - p00.y);
    let (x3, y3) = (
        p11.x - p10.x - p01.x + p00.x,
        p11.y - p10.y - p01.y + p00.y,
    );

    let denom = x1 * y2 - y1 * x2;
    let (g, h) = if denom.abs() < 1e-6 {
        (0.0, 0.0)
    } else {
        (
            (x3 * y2 - y3 * x2) / denom,
            (x1 * y3 - y1 * x3) / denom,
        )
    };
    ProjMap {
        x0,
        x1,
        x2,
        x3,
        y0,
        y1,
        y2,
        y3,
        g,
        h,
    }
}

#[inline]
fn map_uv(pm: &ProjMap, u: f32, v: f32) -> PointF {
    let den = 1.0 + pm.g * u + pm.h * v;
    PointF {
        x: (pm.x0 + pm.x1 * u + pm.x2 * v + pm.x3 * u * v) / den,
        y: (pm.y0 + pm.y1 * u + pm.y2 * v + pm.y3 * u * v) / den,
    }
}

// Осе-выровненный фоллбэк: кадр кратен 29 модулям (v1 + quiet 4).

fn sample_axis_aligned(gray: &GrayBuffer) -> Option<Vec<bool>> {
    if gray.width % 29 != 0 || gray.height % 29 != 0 {
        return None;
    }
    let unit_x = (gray.width as f32) / 29.0;
    let unit_y = (gray.height as f32) / 29.0;
    let qz = 4.0f32;
    let rx = unit_x * 0.35;
    let ry = unit_y * 0.35;

    log::trace!("sample: axis-aligned path, unit=({unit_x:.2},{unit_y:.2})");

    let mut out = vec![false; N1 * N1];
    for y in 0..N1 {
        for x in 0..N1 {
            let cx = (qz + x as f32 + 0.5) * unit_x;
            let cy = (qz + y as f32 + 0.5) * unit_y;

            let x0 = (cx - rx).floor().max(0.0) as usize;
            let x1 = ((cx + rx).floor() as usize).min(gray.width - 1);
            let y0 = (cy - ry).floor().max(0.0) as usize;
            let y1 = ((cy + ry).floor() as usize).min(gray.height - 1);
            if x1 < x0 || y1 < y0 {
                continue;
            }

            let mut sum: u32 = 0;
            let mut cnt: u32 = 0;
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    sum += u32::from(gray.get(xx, yy));
                    cnt += 1;
                }
            }
            out[y * N1 + x] = is_dark((sum / cnt.max(1)) as u8);
        }
    }
    Some(out)
}

fn is_near_axis_aligned(ux: PointF, uy: PointF) -> bool {
    let ux_len = (ux.x * ux.x + ux.y * ux.y).sqrt();
    let uy_len = (uy.x * uy.x + uy.y * uy.y).sqrt();
    if ux_len < 1e-3 || uy_len < 1e-3 {
        return false;
    }

    let dot = ux.x * uy.x + ux.y * uy.y;
    let cos_abs = (dot / (ux_len * uy_len)).abs();

    let shear_x = ux.y.abs() / (ux.x.abs() + 1e-6);
    let shear_y = uy.x.abs() / (uy.y.abs() + 1e-6);
    let scale_off = ((ux_len - uy_len) / (ux_len + 1e-6)).abs();

    cos_abs < 0.02 && shear_x < 0.05 && shear_y < 0.05 && scale_off < 0.05
}

/// Скоринг калибровки: доля чередований на центральных участках
/// timing-строки (y=6, x=8..=12) и timing-столбца (x=6, y=8..=12).
fn timing_score<F>(get_bit: F) -> f32
where
    F: Fn(usize, usize) -> bool,
{
    let row: Vec<bool> = (8..=12).map(|x| get_bit(x, 6)).collect();
    let col: Vec<bool> = (8..=12).map(|y| get_bit(6, y)).collect();

    let alternations = |bits: &[bool]| -> f32 {
        let mut alt = 0usize;
        for w in bits.windows(2) {
            if w[0] != w[1] {
                alt += 1;
            }
        }
        alt as f32 / (bits.len() - 1) as f32
    };

    (alternations(&row) + alternations(&col)) * 0.5
}

/// Сэмплировать сетку v1 по трём finder-центрам.
pub(crate) fn sample_grid(gray: &GrayBuffer, finders: &[PointF]) -> Option<SampledGrid> {
    if finders.len() < 3 {
        return None;
    }
    let [bl, tl, tr] = order_finders([finders[0], finders[1], finders[2]]);

    // векторы модуля из центров finder'ов (между центрами 14 модулей)
    let ux = PointF {
        x: (tr.x - tl.x) / 14.0,
        y: (tr.y - tl.y) / 14.0,
    };
    let uy = PointF {
        x: (bl.x - tl.x) / 14.0,
        y: (bl.y - tl.y) / 14.0,
    };

    // внешние углы символа (модульные координаты 0..20 от центра TL = (3.5,3.5))
    let corner = |mu: f32, mv: f32| PointF {
        x: tl.x + mu * ux.x + mv * uy.x,
        y: tl.y + mu * ux.y + mv * uy.y,
    };
    let c00 = corner(-3.5, -3.5);
    let c10 = corner(17.5, -3.5);
    let c01 = corner(-3.5, 17.5);
    let c11 = corner(17.5, 17.5);
    let corners = [c00, c10, c01, c11];

    log::trace!(
        "sample: corners c00=({:.1},{:.1}) c11=({:.1},{:.1})",
        c00.x,
        c00.y,
        c11.x,
        c11.y
    );

    if gray.width % 29 == 0 && gray.height % 29 == 0 && is_near_axis_aligned(ux, uy) {
        if let Some(bits) = sample_axis_aligned(gray) {
            return Some(SampledGrid { bits, corners });
        }
    }

    let pm = build_projective(c00, c10, c01, c11);

    // автокалибровка в нормированных координатах u,v = (x+0.5)/21
    const SCALES: [f32; 5] = [0.985, 0.995, 1.000, 1.005, 1.015];
    const OFFS: [f32; 5] = [-0.012, -0.006, 0.0, 0.006, 0.012];
    const SS: f32 = 0.18 / 21.0;
    const SS_OFFS: [f32; 3] = [-SS, 0.0, SS];

    let get_bit_with = |su: f32, sv: f32, du: f32, dv: f32, xx: usize, yy: usize| -> bool {
        let u0 = ((xx as f32 + 0.5) / 21.0 * su + du).clamp(-0.02, 1.02);
        let v0 = ((yy as f32 + 0.5) / 21.0 * sv + dv).clamp(-0.02, 1.02);

        let mut sum: u32 = 0;
        for dv_ in SS_OFFS {
            for du_ in SS_OFFS {
                let p = map_uv(&pm, u0 + du_, v0 + dv_);
                sum += u32::from(sample_bilinear(gray, p.x, p.y));
            }
        }
        is_dark((sum / 9) as u8)
    };

    let mut best = (f32::NEG_INFINITY, 1.0f32, 1.0f32, 0.0f32, 0.0f32);
    for &su in &SCALES {
        for &sv in &SCALES {
            for &du in &OFFS {
                for &dv in &OFFS {
                    let score = timing_score(|x, y| get_bit_with(su, sv, du, dv, x, y));
                    if score > best.0 {
                        best = (score, su, sv, du, dv);
                    }
                }
            }
        }
    }
    let (score, su, sv, du, dv) = best;
    log::trace!("sample: tuning su={su:.3} sv={sv:.3} du={du:.3} dv={dv:.3} score={score:.2}");

    let mut bits = vec![false; N1 * N1];
    for y in 0..N1 {
        for x in 0..N1 {
            bits[y * N1 + x] = get_bit_with(su, sv, du, dv, x, y);
        }
    }
    Some(SampledGrid { bits, corners })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::encode::synthesize_qr_v1;
    use crate::qr::finder::find_finder_patterns;
    use crate::qr::QrScanParams;

    #[test]
    fn timing_lines_alternate_after_sampling() {
        let img = synthesize_qr_v1("HELLO", 3, 4);
        let finders = find_finder_patterns(&img, &QrScanParams { scan_lines: 32 });
        let grid = sample_grid(&img, &finders).expect("grid");
        assert_eq!(grid.bits.len(), N1 * N1);

        // центральные участки timing-линий: 10101
        let expect = [true, false, true, false, true];
        for (k, x) in (8usize..=12).enumerate() {
            assert_eq!(grid.bits[6 * N1 + x], expect[k], "timing row x={x}");
        }
        for (k, y) in (8usize..=12).enumerate() {
            assert_eq!(grid.bits[y * N1 + 6], expect[k], "timing col y={y}");
        }
    }

    #[test]
    fn corners_span_the_symbol() {
        let img = synthesize_qr_v1("Q", 0, 4);
        let finders = find_finder_patterns(&img, &QrScanParams { scan_lines: 32 });
        let grid = sample_grid(&img, &finders).expect("grid");
        let q = grid.quad();
        // символ занимает модули 4..25 при unit=4 → пиксели ~16..100
        assert!(q.tl.x >= 8 && q.tl.x <= 24);
        assert!(q.br.x >= 92 && q.br.x <= 108);
        assert!(q.br.y > q.tl.y);
    }

    #[test]
    fn too_few_finders_is_none() {
        let g = GrayBuffer::from_raw(vec![255u8; 50 * 50], 50, 50);
        assert!(sample_grid(&g, &[PointF { x: 1.0, y: 1.0 }]).is_none());
    }
}
