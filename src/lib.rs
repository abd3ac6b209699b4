#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

//! polycode — мультиформатный декодер штрихкодов из растровых буферов.
//!
//! Поддерживаемые символики: QR Code (v1), Code 128, EAN-13/UPC-A.
//! Движок перебирает трансформы кадра (повороты, инверсия, полукадр),
//! дедуплицирует находки и ранжирует их по уверенности.

// Публичные модули
pub mod api; // трейт декодера и реестр
pub mod core; // PixelBuffer, типы результатов
pub mod prelude; // удобные re-export'ы

pub mod binarize; // бинаризация строк для 1D
pub mod one_d; // 1D декодеры (ean13, code128)
pub mod qr; // декодер QR v1

pub mod error;
pub mod options;
pub mod transform;

mod aggregate;
mod engine;
mod search;

// Слой совместимости со старым API (getLastError и пр.)
pub mod compat;

pub use crate::core::pixel::{GrayBuffer, PixelBuffer, PixelFormat};
pub use crate::core::types::{DecodeResult, FormatMask, Point, Quad, Symbology};
pub use crate::engine::{default_engine, DecodeEngine};
pub use crate::error::DecodeError;
pub use crate::options::{CancelToken, ReaderOptions};

/// One-shot: первый символ из буфера через процесс-глобальный движок.
///
/// # Errors
/// См. [`DecodeEngine::decode_one`].
#[inline]
pub fn decode_one(
    buffer: &PixelBuffer,
    options: &ReaderOptions,
) -> Result<DecodeResult, DecodeError> {
    default_engine().decode_one(buffer, options)
}

/// One-shot: все символы из буфера через процесс-глобальный движок.
///
/// # Errors
/// См. [`DecodeEngine::decode_all`].
#[inline]
pub fn decode_all(
    buffer: &PixelBuffer,
    options: &ReaderOptions,
) -> Result<Vec<DecodeResult>, DecodeError> {
    default_engine().decode_all(buffer, options)
}
