//! Удобные re-export'ы для типового использования движка.

pub use crate::api::{DecoderHit, DecoderRegistry, SymbologyDecoder};
pub use crate::core::pixel::{GrayBuffer, PixelBuffer, PixelFormat};
pub use crate::core::types::{DecodeResult, FormatMask, Point, Quad, Symbology};
pub use crate::engine::{default_engine, DecodeEngine};
pub use crate::error::DecodeError;
pub use crate::options::{CancelToken, ReaderOptions};
