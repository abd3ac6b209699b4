// Общие типы, независимые от конкретных декодеров.

pub mod pixel;
pub mod types;

pub use pixel::{GrayBuffer, PixelBuffer, PixelFormat};
pub use types::{Candidate, DecodeResult, FormatMask, Point, Quad, Symbology};
