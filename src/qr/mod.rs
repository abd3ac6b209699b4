//! Декодер QR Code версии 1 (21×21, Byte mode).
//!
//! Конвейер: поиск finder patterns → сэмплинг сетки → слово формата
//! (BCH 15,5) → размаскировка → извлечение 208 бит → Reed–Solomon →
//! разбор Byte mode. Уверенность деградирует на 0.1 за каждый
//! исправленный RS-байт, но не ниже 0.5.

mod bytes;
mod data;
mod encode;
mod finder;
mod format;
mod rs;
mod sample;

pub use encode::synthesize_qr_v1;

use crate::api::{DecoderHit, SymbologyDecoder};
use crate::core::pixel::GrayBuffer;
use crate::core::types::Symbology;
use data::{extract_data_bits_v1, is_function_v1, N1};
use format::{decode_format_word, mask_hit};
use sample::SampledGrid;

/// Параметры сканирования QR.
#[derive(Debug, Clone, Copy)]
pub struct QrScanParams {
    /// Сколько строк/столбцов пробегать при поиске finder patterns.
    pub scan_lines: usize,
}

impl Default for QrScanParams {
    fn default() -> Self {
        Self { scan_lines: 24 }
    }
}

/// Встроенный декодер QR v1.
pub struct QrDecoder {
    params: QrScanParams,
}

impl QrDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: QrScanParams::default(),
        }
    }
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbologyDecoder for QrDecoder {
    fn formats(&self) -> &'static [Symbology] {
        &[Symbology::QrCode]
    }

    fn try_decode(&self, gray: &GrayBuffer) -> Vec<DecoderHit> {
        let finders = finder::find_finder_patterns(gray, &self.params);
        if finders.len() < 3 {
            return Vec::new();
        }
        let Some(sampled) = sample::sample_grid(gray, &finders) else {
            return Vec::new();
        };
        match decode_grid(&sampled) {
            Some((text, corrected)) => {
                let confidence = (1.0 - 0.1 * corrected as f32).max(0.5);
                vec![DecoderHit {
                    text,
                    format: Symbology::QrCode,
                    confidence,
                    quad: sampled.quad(),
                }]
            }
            None => Vec::new(),
        }
    }
}

/// Довести сетку до текста: формат → размаскировка → RS → Byte mode.
/// Возвращает текст и число исправленных RS-байт.
fn decode_grid(sampled: &SampledGrid) -> Option<(String, usize)> {
    let grid = &sampled.bits;

    let (ec_level, mask_id) = read_format(grid)?;
    log::debug!("qr: format ec={ec_level:?} mask={mask_id}");

    let mut unmasked = grid.clone();
    for y in 0..N1 {
        for x in 0..N1 {
            if !is_function_v1(x, y) && mask_hit(mask_id, x, y) {
                unmasked[y * N1 + x] = !unmasked[y * N1 + x];
            }
        }
    }

    let bits = extract_data_bits_v1(&unmasked);
    let mut codewords = bytes::bits_to_bytes(&bits);
    if codewords.len() != 26 {
        return None;
    }

    let (data_len, ec_len) = ec_level.block_v1();
    let corrected = rs::rs_correct_block(&mut codewords, data_len, ec_len)?;
    if corrected > 0 {
        log::debug!("qr: RS исправил {corrected} байт");
    }

    let text = bytes::parse_byte_mode(&codewords[..data_len], ec_level.byte_capacity_v1())?;
    Some((text, corrected))
}

/// Прочитать слово формата: сначала основная дорожка, затем зеркальная.
fn read_format(grid: &[bool]) -> Option<(format::EcLevel, u8)> {
    for path in &format::FORMAT_READ_PATHS_V1 {
        let mut word = 0u16;
        for &(x, y) in path {
            word = (word << 1) | u16::from(grid[y * N1 + x]);
        }
        if let Some((ec, mask, dist)) = decode_format_word(word) {
            log::trace!("qr: формат прочитан, dist={dist}");
            return Some((ec, mask));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_synthetic_hello() {
        let img = synthesize_qr_v1("HELLO", 3, 4);
        let hits = QrDecoder::new().try_decode(&img);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "HELLO");
        assert_eq!(hits[0].format, Symbology::QrCode);
        assert!((hits[0].confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn all_masks_decode() {
        for mask in 0u8..8 {
            let img = synthesize_qr_v1("MASK", mask, 4);
            let hits = QrDecoder::new().try_decode(&img);
            assert_eq!(hits.len(), 1, "маска {mask}");
            assert_eq!(hits[0].text, "MASK");
        }
    }

    #[test]
    fn max_capacity_payload() {
        let text = "12345678901234567"; // 17 байт, предел v1-L
        let img = synthesize_qr_v1(text, 1, 4);
        let hits = QrDecoder::new().try_decode(&img);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, text);
    }

    #[test]
    fn quad_covers_symbol_extent() {
        let img = synthesize_qr_v1("HELLO", 3, 4);
        let hits = QrDecoder::new().try_decode(&img);
        let q = hits[0].quad;
        // символ лежит в модулях 4..25 при unit=4
        assert!(q.tl.x < q.tr.x);
        assert!(q.tl.y < q.bl.y);
        assert!(q.tr.x - q.tl.x >= 70, "ширина quad'а слишком мала");
    }

    #[test]
    fn blank_buffer_has_no_hits() {
        let g = GrayBuffer::from_raw(vec![255u8; 120 * 90], 120, 90);
        assert!(QrDecoder::new().try_decode(&g).is_empty());
    }

    #[test]
    fn inverted_symbol_is_rejected() {
        let img = synthesize_qr_v1("HELLO", 3, 4);
        let inv = GrayBuffer::from_raw(
            img.data.iter().map(|&v| 255 - v).collect(),
            img.width,
            img.height,
        );
        assert!(QrDecoder::new().try_decode(&inv).is_empty());
    }
}
