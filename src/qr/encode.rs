//! Синтез валидного QR v1-L (Byte mode) в растровый буфер.
//!
//! Используется в тестах и бенчмарках: finders, timing, формат, данные
//! с маской, quiet zone в 4 модуля.

use super::data::{is_function_v1, walk_pairs_v1, N1};
use super::format::{encode_format_word, mask_hit, EcLevel, FORMAT_READ_PATHS_V1};
use super::rs::rs_ec_bytes;
use crate::core::pixel::GrayBuffer;

/// Построить QR v1-L с заданной маской (0..7) и масштабом `unit` px/модуль.
///
/// # Panics
/// Если payload длиннее 17 байт (предел Byte mode для v1-L).
#[must_use]
pub fn synthesize_qr_v1(text: &str, mask_id: u8, unit: usize) -> GrayBuffer {
    let bytes = text.as_bytes();
    assert!(bytes.len() <= 17, "v1-L Byte mode вмещает до 17 байт");

    // битовый поток: mode 0100, длина, payload, терминатор, паддинг
    let mut bits: Vec<bool> = Vec::new();
    for i in (0..4).rev() {
        bits.push(((0b0100 >> i) & 1) != 0);
    }
    for i in (0..8).rev() {
        bits.push(((bytes.len() >> i) & 1) != 0);
    }
    for &b in bytes {
        for i in (0..8).rev() {
            bits.push(((b >> i) & 1) != 0);
        }
    }
    let capacity_bits: usize = 19 * 8;
    let term = capacity_bits.saturating_sub(bits.len()).min(4);
    for _ in 0..term {
        bits.push(false);
    }
    while bits.len() % 8 != 0 {
        bits.push(false);
    }

    let mut data_cw: Vec<u8> = bits
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | u8::from(b)))
        .collect();
    while data_cw.len() < 19 {
        data_cw.push(if data_cw.len() % 2 == 0 { 0xEC } else { 0x11 });
    }

    let ec = rs_ec_bytes(&data_cw, 7);
    let mut all_cw = data_cw;
    all_cw.extend_from_slice(&ec);

    // матрица 21×21, true = чёрный
    let mut grid = vec![false; N1 * N1];

    let draw_finder = |grid: &mut [bool], ox: usize, oy: usize| {
        for dy in 0..7 {
            for dx in 0..7 {
                let on_border = dx == 0 || dx == 6 || dy == 0 || dy == 6;
                let in_core = (2..=4).contains(&dx) && (2..=4).contains(&dy);
                grid[(oy + dy) * N1 + (ox + dx)] = on_border || in_core;
            }
        }
    };
    draw_finder(&mut grid, 0, 0);
    draw_finder(&mut grid, 14, 0);
    draw_finder(&mut grid, 0, 14);

    for i in 8..=12 {
        grid[6 * N1 + i] = i % 2 == 0;
        grid[i * N1 + 6] = i % 2 == 0;
    }

    // формат (две копии) и dark module
    let fmt = encode_format_word(EcLevel::L, mask_id);
    for i in 0..15 {
        let bit = ((fmt >> (14 - i)) & 1) != 0;
        let (x1, y1) = FORMAT_READ_PATHS_V1[0][i];
        let (x2, y2) = FORMAT_READ_PATHS_V1[1][i];
        grid[y1 * N1 + x1] = bit;
        grid[y2 * N1 + x2] = bit;
    }
    grid[13 * N1 + 8] = true;

    // данные змейкой, маска только на data-модулях
    let mut bit_iter = all_cw
        .iter()
        .flat_map(|&cw| (0..8).rev().map(move |i| ((cw >> i) & 1) != 0));
    for (x, y) in walk_pairs_v1() {
        if is_function_v1(x, y) {
            continue;
        }
        if let Some(bit) = bit_iter.next() {
            grid[y * N1 + x] = bit ^ mask_hit(mask_id, x, y);
        }
    }

    // в пиксели: quiet zone 4 модуля, белый фон
    let unit = unit.max(1);
    let qz = 4usize;
    let total = N1 + 2 * qz;
    let w = total * unit;
    let mut data = Vec::with_capacity(w * w);
    for my in 0..total {
        for _ in 0..unit {
            for mx in 0..total {
                let dark = (qz..qz + N1).contains(&mx)
                    && (qz..qz + N1).contains(&my)
                    && grid[(my - qz) * N1 + (mx - qz)];
                let px = if dark { 0u8 } else { 255u8 };
                for _ in 0..unit {
                    data.push(px);
                }
            }
        }
    }
    GrayBuffer::from_raw(data, w, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_geometry_matches_unit() {
        let img = synthesize_qr_v1("TEST", 0, 3);
        assert_eq!(img.width, 29 * 3);
        assert_eq!(img.height, 29 * 3);
    }

    #[test]
    fn quiet_zone_is_white_and_finder_core_dark() {
        let img = synthesize_qr_v1("TEST", 3, 4);
        assert_eq!(img.get(0, 0), 255);
        assert_eq!(img.get(img.width - 1, img.height - 1), 255);
        // центр TL finder'а: модуль (4+3, 4+3), середина
        let c = (4 + 3) * 4 + 2;
        assert_eq!(img.get(c, c), 0);
    }
}
