//! Декодер Code 128 по одной строке + синтезатор ряда.
//!
//! Якорь — STOP-паттерн (7 run'ов, сумма 13): находим его, затем идём
//! НАЗАД по 6-run символам до старт-кода. Такой порядок надёжно
//! выравнивает поток и снимает вопрос «с какого run'а начинать».
//!
//! Поддержка: наборы A/B/C, латчи CODE A/B/C, SHIFT, FNC1 (ASCII GS),
//! checksum mod 103.

use crate::api::{DecoderHit, SymbologyDecoder};
use crate::binarize::{binarize_row, binarize_row_adaptive, runs, RunLengths};
use crate::core::pixel::GrayBuffer;
use crate::core::types::Symbology;
use crate::one_d::{scan_and_cluster, RowHit, ScanParams};

/// Паттерны 0..=105: по 6 ширин (bars/spaces), сумма 11.
const PATTERNS_STR: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214",
    "211232", // 103..105 — Start A/B/C
];

/// STOP (7 ширин, сумма 13).
const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Встроенный декодер Code 128.
pub struct Code128Decoder {
    params: ScanParams,
}

impl Code128Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: ScanParams::default(),
        }
    }
}

impl Default for Code128Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbologyDecoder for Code128Decoder {
    fn formats(&self) -> &'static [Symbology] {
        &[Symbology::Code128]
    }

    fn try_decode(&self, gray: &GrayBuffer) -> Vec<DecoderHit> {
        scan_and_cluster(gray, self.params, decode_row)
            .into_iter()
            .map(|c| DecoderHit {
                text: c.text.clone(),
                format: Symbology::Code128,
                confidence: c.confidence(),
                quad: c.quad(),
            })
            .collect()
    }
}

/// Попытка декодировать один ряд как Code 128.
pub(crate) fn decode_row(row_gray: &[u8]) -> Option<RowHit> {
    // минимум: старт + символ + checksum + STOP = 3*6 + 7 run'ов
    let rl = {
        let rl1 = runs(&binarize_row_adaptive(row_gray));
        if rl1.len() >= 25 {
            rl1
        } else {
            let rl2 = runs(&binarize_row(row_gray));
            if rl2.len() < 25 {
                return None;
            }
            rl2
        }
    };

    let patterns = patterns();

    // STOP: окно из 7 run'ов, начинающееся с чёрного
    for stop_i in 0..=rl.len().saturating_sub(7) {
        if !rl.is_black(stop_i) {
            continue;
        }
        let cand = normalize_window::<7>(&rl.widths[stop_i..stop_i + 7], 13);
        if pat_dist(&cand, &STOP) > 1 {
            continue;
        }
        if let Some(hit) = decode_backwards_from(&rl, &patterns, stop_i) {
            return Some(hit);
        }
    }
    None
}

/// От STOP'а идём назад по 6-run символам до старт-кода, затем
/// проверяем checksum и раскодируем payload в прямом порядке.
fn decode_backwards_from(
    rl: &RunLengths,
    patterns: &[[u8; 6]; 106],
    stop_i: usize,
) -> Option<RowHit> {
    let mut idx = stop_i; // правая граница текущего символа
    let mut vals_rev: Vec<u8> = Vec::new(); // [checksum, payload...] справа налево
    let mut start_set: Option<CodeSet> = None;
    let mut start_run = 0usize;

    while idx >= 6 {
        let pat = normalize_window::<6>(&rl.widths[idx - 6..idx], 11);
        let (val, dist) = best_match(&pat, patterns);
        if dist > 1 {
            return None;
        }
        if (START_A..=START_C).contains(&val) {
            start_set = Some(match val {
                START_A => CodeSet::A,
                START_B => CodeSet::B,
                _ => CodeSet::C,
            });
            start_run = idx - 6;
            break;
        }
        vals_rev.push(val as u8);
        idx -= 6;
    }

    let start_set = start_set?;
    if vals_rev.is_empty() {
        return None; // нет даже checksum-символа
    }

    vals_rev.reverse();
    let values = vals_rev; // [payload..., checksum]
    let n = values.len() - 1;

    // checksum mod 103: старт-код + позиция×значение по payload
    let mut sum = match start_set {
        CodeSet::A => START_A as u32,
        CodeSet::B => START_B as u32,
        CodeSet::C => START_C as u32,
    };
    for (i, &v) in values[..n].iter().enumerate() {
        sum += u32::from(v) * (i as u32 + 1);
    }
    if sum % 103 != u32::from(values[n]) {
        return None;
    }

    let text = values_to_text(&values[..n], start_set)?;
    Some(RowHit {
        text,
        x0: rl.starts[start_run],
        x1: rl.end(stop_i + 6),
    })
}

/// Значения символов → текст с учётом латчей/шифтов наборов.
fn values_to_text(vals: &[u8], start: CodeSet) -> Option<String> {
    let mut out = String::new();
    let mut set = start;
    let mut shifted: Option<CodeSet> = None;

    for &v in vals {
        let v = u32::from(v);
        let eff = shifted.take().unwrap_or(set);
        match eff {
            CodeSet::A => match v {
                0..=63 => out.push((v as u8 + 32) as char), // ASCII 32..95
                64..=95 => out.push((v as u8 - 64) as char), // управляющие 0..31
                96 | 97 => {}                                // FNC3/FNC2
                98 => shifted = Some(CodeSet::B),
                99 => set = CodeSet::C,
                100 => set = CodeSet::B,
                101 => {} // CODE A: уже в A
                102 => out.push('\u{1d}'), // FNC1 → GS
                _ => return None,
            },
            CodeSet::B => match v {
                0..=95 => out.push((v as u8 + 32) as char), // ASCII 32..127
                96 | 97 => {}
                98 => shifted = Some(CodeSet::A),
                99 => set = CodeSet::C,
                100 => {} // CODE B: уже в B
                101 => set = CodeSet::A,
                102 => out.push('\u{1d}'),
                _ => return None,
            },
            CodeSet::C => match v {
                0..=99 => {
                    // две цифры за символ
                    out.push(char::from(b'0' + (v / 10) as u8));
                    out.push(char::from(b'0' + (v % 10) as u8));
                }
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => out.push('\u{1d}'),
                _ => return None,
            },
        }
    }
    Some(out)
}

/// Нормализовать окно из N run'ов к модульным ширинам с заданной суммой.
fn normalize_window<const N: usize>(widths: &[usize], target: i32) -> [u8; N] {
    debug_assert_eq!(widths.len(), N);
    let sum: usize = widths.iter().sum();
    let scale = sum as f32 / target as f32;
    let mut out = [0u8; N];
    for (k, &w) in widths.iter().enumerate() {
        out[k] = ((w as f32 / scale).round() as i32).clamp(1, 4) as u8;
    }
    adjust_sum(&mut out, target);
    out
}

/// Подогнать сумму модулей к целевой, двигая максимальный/минимальный run.
fn adjust_sum(v: &mut [u8], target: i32) {
    let mut sum: i32 = v.iter().map(|&x| i32::from(x)).sum();
    while sum != target {
        let changed = if sum > target {
            v.iter_mut()
                .rev()
                .max_by_key(|x| **x)
                .filter(|x| **x > 1)
                .map(|x| *x -= 1)
                .is_some()
        } else {
            v.iter_mut()
                .min_by_key(|x| **x)
                .filter(|x| **x < 4)
                .map(|x| *x += 1)
                .is_some()
        };
        if !changed {
            break;
        }
        sum += if sum > target { -1 } else { 1 };
    }
}

fn patterns() -> [[u8; 6]; 106] {
    let mut out = [[0u8; 6]; 106];
    for (i, s) in PATTERNS_STR.iter().enumerate() {
        let b = s.as_bytes();
        for k in 0..6 {
            out[i][k] = b[k] - b'0';
        }
    }
    out
}

fn pat_dist(p: &[u8], q: &[u8]) -> u32 {
    p.iter().zip(q).map(|(&a, &b)| u32::from(a.abs_diff(b))).sum()
}

fn best_match(pat: &[u8; 6], patterns: &[[u8; 6]; 106]) -> (usize, u32) {
    let mut best = (0usize, u32::MAX);
    for (i, q) in patterns.iter().enumerate() {
        let d = pat_dist(pat, q);
        if d < best.1 {
            best = (i, d);
            if d == 0 {
                break;
            }
        }
    }
    best
}

/// Сгенерировать идеальный ряд (ч/б пиксели) Code 128 в наборе A/B/C.
///
/// # Panics
/// Если текст не представим выбранным набором.
#[must_use]
pub fn synthesize_row_code128(text: &str, set: char, unit: usize) -> Vec<u8> {
    assert!(unit >= 1);
    let patterns = patterns();

    let set_cur = match set {
        'A' | 'a' => CodeSet::A,
        'C' | 'c' => CodeSet::C,
        _ => CodeSet::B,
    };

    let mut codes: Vec<usize> = Vec::new();
    codes.push(match set_cur {
        CodeSet::A => START_A,
        CodeSet::B => START_B,
        CodeSet::C => START_C,
    });

    match set_cur {
        CodeSet::A => {
            for ch in text.chars() {
                let b = ch as u32;
                assert!(b <= 95, "Code128A: только ASCII 0..95");
                codes.push(if b < 32 { (b + 64) as usize } else { (b - 32) as usize });
            }
        }
        CodeSet::B => {
            for ch in text.chars() {
                let b = ch as u32;
                assert!((32..=127).contains(&b), "Code128B: только ASCII 32..127");
                codes.push((b - 32) as usize);
            }
        }
        CodeSet::C => {
            assert!(text.len() % 2 == 0, "Code128C: чётное число цифр");
            let bytes = text.as_bytes();
            for k in (0..bytes.len()).step_by(2) {
                assert!(
                    bytes[k].is_ascii_digit() && bytes[k + 1].is_ascii_digit(),
                    "Code128C: только цифры"
                );
                codes.push(usize::from(bytes[k] - b'0') * 10 + usize::from(bytes[k + 1] - b'0'));
            }
        }
    }

    // checksum
    let mut sum = codes[0] as u32;
    for (i, &v) in codes.iter().enumerate().skip(1) {
        sum += (v as u32) * (i as u32);
    }
    codes.push((sum % 103) as usize);

    // quiet(10) + символы + STOP + quiet(10)
    let mut modules: Vec<u8> = vec![10];
    for &code in &codes {
        modules.extend_from_slice(&patterns[code]);
    }
    modules.extend_from_slice(&STOP);
    modules.push(10);

    let mut pix: Vec<u8> = Vec::new();
    let mut black = false;
    for m in modules {
        let val = if black { 0u8 } else { 255u8 };
        for _ in 0..(m as usize) * unit {
            pix.push(val);
        }
        black = !black;
    }
    pix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_buffer(row: &[u8], rows: usize) -> GrayBuffer {
        let mut data = Vec::new();
        for _ in 0..rows {
            data.extend_from_slice(row);
        }
        GrayBuffer::from_raw(data, row.len(), rows)
    }

    #[test]
    fn set_b_roundtrip() {
        let row = synthesize_row_code128("HELLO-128", 'B', 2);
        let hit = decode_row(&row).expect("набор B");
        assert_eq!(hit.text, "HELLO-128");
    }

    #[test]
    fn set_c_digit_pairs() {
        let row = synthesize_row_code128("0123456789", 'C', 2);
        assert_eq!(decode_row(&row).unwrap().text, "0123456789");
    }

    #[test]
    fn set_c_pair_99_is_digits_not_latch() {
        let row = synthesize_row_code128("9900", 'C', 2);
        assert_eq!(decode_row(&row).unwrap().text, "9900");
    }

    #[test]
    fn set_a_control_chars() {
        let row = synthesize_row_code128("AB\u{9}CD", 'A', 2);
        assert_eq!(decode_row(&row).unwrap().text, "AB\u{9}CD");
    }

    #[test]
    fn short_payload_a1() {
        let row = synthesize_row_code128("A1", 'B', 3);
        let hit = decode_row(&row).unwrap();
        assert_eq!(hit.text, "A1");
        assert!(hit.x0 < hit.x1 && hit.x1 <= row.len());
    }

    #[test]
    fn decoder_emits_code128_hit() {
        let row = synthesize_row_code128("A1", 'B', 3);
        let g = as_buffer(&row, 30);
        let hits = Code128Decoder::new().try_decode(&g);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].format, Symbology::Code128);
        assert_eq!(hits[0].text, "A1");
    }

    #[test]
    fn flat_row_is_rejected() {
        assert!(decode_row(&vec![128u8; 400]).is_none());
    }
}
