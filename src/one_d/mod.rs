//! 1D-декодеры (EAN-13/UPC-A, Code 128): общий каркас сканирования строк.
//!
//! Построчный декодер пробегает несколько строк, равномерно выбранных по
//! высоте; одинаковые хиты соседних строк склеиваются в один кластер,
//! из которого собирается quad (пиксельный охват по x × диапазон строк)
//! и уверенность: один ряд — слабое свидетельство (0.7), два согласных
//! ряда и больше — полная уверенность.

pub mod code128;
pub mod ean13;

pub use code128::Code128Decoder;
pub use ean13::Ean13Decoder;

use crate::core::pixel::GrayBuffer;
use crate::core::types::{Point, Quad};

/// Хит одной строки: текст + пиксельный охват символа по x.
#[derive(Clone, Debug)]
pub(crate) struct RowHit {
    pub text: String,
    pub x0: usize,
    /// Эксклюзивный правый край.
    pub x1: usize,
}

/// Параметры построчного сканирования.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScanParams {
    /// Сколько строк пробегать (равномерно по высоте).
    pub scan_rows: usize,
    /// Минимальная ширина строки, имеющая смысл для символики.
    pub min_width: usize,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            scan_rows: 15,
            min_width: 30,
        }
    }
}

/// Кластер согласных хитов по соседним строкам.
#[derive(Clone, Debug)]
pub(crate) struct RowCluster {
    pub text: String,
    pub x0: usize,
    pub x1: usize,
    pub y_min: usize,
    pub y_max: usize,
    pub rows: usize,
}

impl RowCluster {
    pub(crate) fn quad(&self) -> Quad {
        Quad {
            tl: Point::new(self.x0 as i32, self.y_min as i32),
            tr: Point::new(self.x1.saturating_sub(1) as i32, self.y_min as i32),
            br: Point::new(self.x1.saturating_sub(1) as i32, self.y_max as i32),
            bl: Point::new(self.x0 as i32, self.y_max as i32),
        }
    }

    pub(crate) fn confidence(&self) -> f32 {
        if self.rows >= 2 {
            1.0
        } else {
            0.7
        }
    }
}

/// Пробежать строки и склеить одинаковые хиты в кластеры.
pub(crate) fn scan_and_cluster<F>(
    gray: &GrayBuffer,
    params: ScanParams,
    decode_row: F,
) -> Vec<RowCluster>
where
    F: Fn(&[u8]) -> Option<RowHit>,
{
    let mut clusters: Vec<RowCluster> = Vec::new();
    if gray.width < params.min_width || gray.height == 0 {
        return clusters;
    }

    let rows = params.scan_rows.clamp(1, gray.height);
    let row_step = (gray.height / rows).max(1);

    for i in 0..rows {
        let y = (i * (gray.height - 1)) / (rows - 1).max(1);
        let Some(hit) = decode_row(gray.row(y)) else {
            continue;
        };

        // склейка: тот же текст, соседний диапазон строк, пересечение по x
        let merged = clusters.iter_mut().any(|c| {
            let adjacent = y.saturating_sub(c.y_max) <= row_step * 2;
            let overlaps = hit.x0 < c.x1 && c.x0 < hit.x1;
            if c.text == hit.text && adjacent && overlaps {
                c.y_max = y;
                c.x0 = c.x0.min(hit.x0);
                c.x1 = c.x1.max(hit.x1);
                c.rows += 1;
                true
            } else {
                false
            }
        });

        if !merged {
            clusters.push(RowCluster {
                text: hit.text,
                x0: hit.x0,
                x1: hit.x1,
                y_min: y,
                y_max: y,
                rows: 1,
            });
        }
    }

    clusters
}
