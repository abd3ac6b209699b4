//! Декодер EAN-13/UPC-A по одной строке + синтезатор идеального ряда.
//!
//! Путь по строке:
//! 1) бинаризация (адаптивная, фоллбэк на глобальную) → run-lengths;
//! 2) нормализация run'ов в модули 1..4;
//! 3) перебор стартовых guard'ов (чёрный [1,1,1]), центральный (01010),
//!    финальный (101);
//! 4) левая половина по наборам A/B (B — реверс A), правая — C;
//! 5) первая цифра по маске чётности A/B, контрольная сумма.
//!
//! Пиксельный охват (от старта первого guard'а до конца последнего)
//! возвращается вместе с текстом — из него собирается quad кандидата.

use crate::api::{DecoderHit, SymbologyDecoder};
use crate::binarize::{binarize_row, binarize_row_adaptive, normalize_modules, runs, RunLengths};
use crate::core::pixel::GrayBuffer;
use crate::core::types::Symbology;
use crate::one_d::{scan_and_cluster, RowHit, ScanParams};

// Левые «A»-паттерны (bars/spaces), сумма ширин = 7 модулей.
const A_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (3, 2, 1, 1),
    (2, 2, 2, 1),
    (2, 1, 2, 2),
    (1, 4, 1, 1),
    (1, 1, 3, 2),
    (1, 2, 3, 1),
    (1, 1, 1, 4),
    (1, 3, 1, 2),
    (1, 2, 1, 3),
    (3, 1, 1, 2),
];

// «B» (G) — реверс A по run'ам.
const B_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (1, 1, 2, 3),
    (1, 2, 2, 2),
    (2, 2, 1, 2),
    (1, 1, 4, 1),
    (2, 3, 1, 1),
    (1, 3, 2, 1),
    (4, 1, 1, 1),
    (2, 1, 3, 1),
    (3, 1, 2, 1),
    (2, 1, 1, 3),
];

// Правая сторона «C» — по ширинам совпадает с A (инверсия цветов
// на ширины run'ов не влияет).
const C_PATTERNS: [(u8, u8, u8, u8); 10] = A_PATTERNS;

/// Маски чётности шести левых цифр, определяющие первую цифру.
/// true = набор B, false = набор A.
const FIRST_DIGIT_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false], // 0
    [false, false, true, false, true, true],    // 1
    [false, false, true, true, false, true],    // 2
    [false, false, true, true, true, false],    // 3
    [false, true, false, false, true, true],    // 4
    [false, true, true, false, false, true],    // 5
    [false, true, true, true, false, false],    // 6
    [false, true, false, true, false, true],    // 7
    [false, true, false, true, true, false],    // 8
    [false, true, true, false, true, false],    // 9
];

/// Встроенный декодер EAN-13/UPC-A (UPC-A — это EAN-13 с ведущим нулём).
pub struct Ean13Decoder {
    params: ScanParams,
}

impl Ean13Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: ScanParams::default(),
        }
    }
}

impl Default for Ean13Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbologyDecoder for Ean13Decoder {
    fn formats(&self) -> &'static [Symbology] {
        &[Symbology::Ean13, Symbology::UpcA]
    }

    fn try_decode(&self, gray: &GrayBuffer) -> Vec<DecoderHit> {
        scan_and_cluster(gray, self.params, decode_row)
            .into_iter()
            .map(|c| {
                // 12 цифр — UPC-A, 13 — EAN-13
                let format = if c.text.len() == 12 {
                    Symbology::UpcA
                } else {
                    Symbology::Ean13
                };
                DecoderHit {
                    text: c.text.clone(),
                    format,
                    confidence: c.confidence(),
                    quad: c.quad(),
                }
            })
            .collect()
    }
}

/// Попытка декодировать один ряд. Успех — текст из 13 (EAN) или 12 (UPC-A)
/// цифр плюс пиксельный охват.
pub(crate) fn decode_row(row_gray: &[u8]) -> Option<RowHit> {
    // EAN-13 — это 59 run'ов + quiet-зоны; меньше 40 — заведомо не он
    let rl = {
        let rl1 = runs(&binarize_row_adaptive(row_gray));
        if rl1.len() >= 40 {
            rl1
        } else {
            let rl2 = runs(&binarize_row(row_gray));
            if rl2.len() < 40 {
                return None;
            }
            rl2
        }
    };
    let modules = normalize_modules(&rl);

    // перебираем все кандидаты стартового guard'а
    for start in guard_candidates(&modules, &rl) {
        if let Some(hit) = decode_from_guard(&modules, &rl, start) {
            return Some(hit);
        }
    }
    None
}

/// Индексы run'ов, где может начинаться стартовый guard:
/// чёрный run и подряд модули [1,1,1].
fn guard_candidates<'a>(
    modules: &'a [u8],
    rl: &'a RunLengths,
) -> impl Iterator<Item = usize> + 'a {
    (0..modules.len().saturating_sub(2)).filter(move |&i| {
        rl.is_black(i) && modules[i] == 1 && modules[i + 1] == 1 && modules[i + 2] == 1
    })
}

fn decode_from_guard(modules: &[u8], rl: &RunLengths, start: usize) -> Option<RowHit> {
    let mut idx = start + 3;

    // левая половина: 6 цифр по 4 run'а, наборы A/B
    let mut left_digits = [0u8; 6];
    let mut left_is_b = [false; 6];
    for d in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let pat = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (digit_a, dist_a) = best_match(pat, &A_PATTERNS);
        let (digit_b, dist_b) = best_match(pat, &B_PATTERNS);
        if dist_a <= dist_b {
            left_digits[d] = digit_a;
        } else {
            left_digits[d] = digit_b;
            left_is_b[d] = true;
        }
        idx += 4;
    }

    // центральный guard 01010 — 5 run'ов по модулю 1
    if idx + 4 >= modules.len() || modules[idx..idx + 5].iter().any(|&m| m != 1) {
        return None;
    }
    idx += 5;

    // правая половина: 6 цифр набора C
    let mut right_digits = [0u8; 6];
    for d in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let pat = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (digit_c, _) = best_match(pat, &C_PATTERNS);
        right_digits[d] = digit_c;
        idx += 4;
    }

    // финальный guard 101
    if idx + 2 >= modules.len() || modules[idx..idx + 3].iter().any(|&m| m != 1) {
        return None;
    }
    let end_run = idx + 2;

    // первая цифра по маске чётности
    let first = FIRST_DIGIT_MASKS.iter().position(|m| *m == left_is_b)? as u8;

    let mut digits = [0u8; 13];
    digits[0] = first;
    digits[1..7].copy_from_slice(&left_digits);
    digits[7..13].copy_from_slice(&right_digits);

    if !checksum_ok(&digits) {
        return None;
    }

    // UPC-A — EAN-13 с ведущим нулём: отдаём 12 цифр
    let skip = usize::from(digits[0] == 0);
    let text: String = digits[skip..].iter().map(|d| char::from(b'0' + d)).collect();

    Some(RowHit {
        text,
        x0: rl.starts[start],
        x1: rl.end(end_run),
    })
}

/// Ближайшая цифра по паттерну ширин (манхэттенское расстояние).
fn best_match(pat: (u8, u8, u8, u8), dict: &[(u8, u8, u8, u8); 10]) -> (u8, u32) {
    let mut best = (0u8, u32::MAX);
    for (i, &q) in dict.iter().enumerate() {
        let d = pat_dist(pat, q);
        if d < best.1 {
            best = (i as u8, d);
        }
    }
    best
}

fn pat_dist(p: (u8, u8, u8, u8), q: (u8, u8, u8, u8)) -> u32 {
    p.0.abs_diff(q.0) as u32
        + p.1.abs_diff(q.1) as u32
        + p.2.abs_diff(q.2) as u32
        + p.3.abs_diff(q.3) as u32
}

fn checksum_ok(d: &[u8; 13]) -> bool {
    let mut sum = 0u32;
    for (i, &v) in d[..12].iter().enumerate() {
        let w = if i % 2 == 0 { 1 } else { 3 };
        sum += u32::from(v) * w;
    }
    (10 - (sum % 10)) % 10 == u32::from(d[12])
}

/// Синтез идеального ряда (ч/б пиксели) по строке из 13 цифр EAN
/// или 12 цифр UPC-A; контрольная цифра для UPC-A пересчитывается.
///
/// # Panics
/// Если во входе не 12/13 символов или не цифры.
#[must_use]
pub fn synthesize_row_ean13(digits: &str, unit: usize) -> Vec<u8> {
    let ds: Vec<u8> = digits
        .bytes()
        .map(|c| {
            assert!(c.is_ascii_digit(), "EAN-13: только цифры");
            c - b'0'
        })
        .collect();
    assert!(
        ds.len() == 13 || ds.len() == 12,
        "EAN-13: 13 цифр (или 12 для UPC-A)"
    );

    let mut ean13 = [0u8; 13];
    if ds.len() == 12 {
        ean13[1..13].copy_from_slice(&ds);
        let mut sum = 0u32;
        for (i, &v) in ean13[..12].iter().enumerate() {
            let w = if i % 2 == 0 { 1 } else { 3 };
            sum += u32::from(v) * w;
        }
        ean13[12] = ((10 - (sum % 10)) % 10) as u8;
    } else {
        ean13.copy_from_slice(&ds);
    }

    let mask = FIRST_DIGIT_MASKS[ean13[0] as usize];

    let mut modules: Vec<u8> = Vec::new();
    modules.push(9); // quiet (белое)
    modules.extend([1, 1, 1]); // старт 101

    for i in 0..6 {
        let d = ean13[1 + i] as usize;
        let (a, b, c, w) = if mask[i] { B_PATTERNS[d] } else { A_PATTERNS[d] };
        modules.extend([a, b, c, w]);
    }
    modules.extend([1, 1, 1, 1, 1]); // центр 01010
    for i in 0..6 {
        let d = ean13[7 + i] as usize;
        let (a, b, c, w) = C_PATTERNS[d];
        modules.extend([a, b, c, w]);
    }
    modules.extend([1, 1, 1]); // финал
    modules.push(9); // quiet

    // модули → пиксели, начиная с белого quiet'а
    let mut pix: Vec<u8> = Vec::new();
    let mut black = false;
    for m in modules {
        let val = if black { 0u8 } else { 255u8 };
        for _ in 0..(m as usize) * unit.max(1) {
            pix.push(val);
        }
        black = !black;
    }
    pix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ideal_ean13_row() {
        let row = synthesize_row_ean13("4006381333931", 3);
        let hit = decode_row(&row).expect("ряд должен декодироваться");
        assert_eq!(hit.text, "4006381333931");
        assert!(hit.x0 < hit.x1);
        assert!(hit.x1 <= row.len());
    }

    #[test]
    fn decodes_upca_as_12_digits() {
        // UPC-A: EAN-13 с ведущим нулём
        let row = synthesize_row_ean13("036000291452", 3);
        let hit = decode_row(&row).unwrap();
        assert_eq!(hit.text, "036000291452");
    }

    #[test]
    fn rejects_broken_checksum() {
        // валидный ряд, но подменяем контрольную цифру при синтезе 13 цифр
        let row = synthesize_row_ean13("4006381333932", 3);
        assert!(decode_row(&row).is_none());
    }

    #[test]
    fn rejects_flat_row() {
        assert!(decode_row(&vec![255u8; 300]).is_none());
    }

    #[test]
    fn decoder_reports_quad_and_format() {
        let row = synthesize_row_ean13("4006381333931", 3);
        let width = row.len();
        let mut data = Vec::new();
        for _ in 0..40 {
            data.extend_from_slice(&row);
        }
        let g = GrayBuffer::from_raw(data, width, 40);

        let hits = Ean13Decoder::new().try_decode(&g);
        assert_eq!(hits.len(), 1);
        let h = &hits[0];
        assert_eq!(h.format, Symbology::Ean13);
        assert_eq!(h.text, "4006381333931");
        assert!((h.confidence - 1.0).abs() < f32::EPSILON);
        assert!(h.quad.tr.x > h.quad.tl.x);
        assert!(h.quad.bl.y > h.quad.tl.y);
    }
}
