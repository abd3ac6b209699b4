// src/core/pixel.rs
//
// Входное изображение (PixelBuffer) и его серый план (GrayBuffer).
// PixelBuffer неизменяем после конструирования; все производные
// (повороты, инверсия, даунскейл) — отдельные GrayBuffer-ы.

use crate::error::DecodeError;

/// Формат пикселей входного буфера. Каналы идут interleaved, построчно.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PixelFormat {
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl PixelFormat {
    /// Число каналов (байт на пиксель для 8-битных буферов).
    #[inline]
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Luminance => 1,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }
}

/// Неизменяемое входное изображение: сырые сэмплы + геометрия.
///
/// Инварианты (проверяются в [`PixelBuffer::new`]):
/// - `stride >= width * channels`;
/// - `data.len() >= stride * height`;
/// - `width > 0 && height > 0`.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat,
}

impl PixelBuffer {
    /// Сконструировать буфер с проверкой геометрии.
    ///
    /// # Errors
    /// `DecodeError::InvalidInput`, если stride/width/height/format
    /// несогласованы или данных меньше, чем `stride * height`.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidInput(format!(
                "пустая геометрия: {width}x{height}"
            )));
        }
        let min_stride = width
            .checked_mul(format.channels())
            .ok_or_else(|| DecodeError::InvalidInput("переполнение stride".into()))?;
        if stride < min_stride {
            return Err(DecodeError::InvalidInput(format!(
                "stride {stride} меньше, чем width*channels = {min_stride}"
            )));
        }
        let need = stride
            .checked_mul(height)
            .ok_or_else(|| DecodeError::InvalidInput("переполнение размера буфера".into()))?;
        if data.len() < need {
            return Err(DecodeError::InvalidInput(format!(
                "буфер {} байт короче, чем stride*height = {need}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Плотный буфер без паддинга строк: stride = width * channels.
    ///
    /// # Errors
    /// См. [`PixelBuffer::new`].
    pub fn packed(
        data: Vec<u8>,
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> Result<Self, DecodeError> {
        let stride = width * format.channels();
        Self::new(data, width, height, stride, format)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Каналы пикселя (x, y) с проверкой границ.
    #[must_use]
    pub fn sample(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.format.channels();
        let off = y * self.stride + x * ch;
        Some(&self.data[off..off + ch])
    }

    /// Свернуть буфер в серый план (8 бит, построчно, без паддинга).
    /// RGB/BGR взвешиваются по ITU-R BT.601; альфа игнорируется.
    #[must_use]
    pub fn to_luma(&self) -> GrayBuffer {
        let ch = self.format.channels();
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            let row = &self.data[y * self.stride..y * self.stride + self.width * ch];
            match self.format {
                PixelFormat::Luminance => out.extend_from_slice(row),
                PixelFormat::LuminanceAlpha => {
                    out.extend(row.chunks_exact(2).map(|p| p[0]));
                }
                PixelFormat::Rgb => {
                    out.extend(row.chunks_exact(3).map(|p| luma_601(p[0], p[1], p[2])));
                }
                PixelFormat::Bgr => {
                    out.extend(row.chunks_exact(3).map(|p| luma_601(p[2], p[1], p[0])));
                }
                PixelFormat::Rgba => {
                    out.extend(row.chunks_exact(4).map(|p| luma_601(p[0], p[1], p[2])));
                }
                PixelFormat::Bgra => {
                    out.extend(row.chunks_exact(4).map(|p| luma_601(p[2], p[1], p[0])));
                }
            }
        }
        GrayBuffer {
            data: out,
            width: self.width,
            height: self.height,
        }
    }
}

#[inline]
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    // Целочисленное BT.601: (299R + 587G + 114B) / 1000
    let v = 299u32 * u32::from(r) + 587u32 * u32::from(g) + 114u32 * u32::from(b);
    (v / 1000) as u8
}

/// «Владельческий» серый план — единица работы декодеров и трансформов.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayBuffer {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl GrayBuffer {
    /// Серый план из готовых сэмплов (для синтетики и тестов).
    ///
    /// # Panics
    /// Если `data.len() != width * height`.
    #[must_use]
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "несогласованный серый буфер");
        Self {
            data,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Столбец `x` во внешний буфер (переиспользуемый между вызовами).
    pub fn col<'b>(&self, x: usize, buf: &'b mut Vec<u8>) -> &'b [u8] {
        buf.clear();
        buf.reserve(self.height);
        for y in 0..self.height {
            buf.push(self.data[y * self.width + x]);
        }
        &buf[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        let r = PixelBuffer::new(vec![0u8; 10], 4, 4, 4, PixelFormat::Luminance);
        assert!(matches!(r, Err(DecodeError::InvalidInput(_))));
    }

    #[test]
    fn rejects_small_stride() {
        let r = PixelBuffer::new(vec![0u8; 64], 4, 4, 8, PixelFormat::Rgb);
        assert!(matches!(r, Err(DecodeError::InvalidInput(_))));
    }

    #[test]
    fn rejects_zero_geometry() {
        let r = PixelBuffer::packed(Vec::new(), 0, 0, PixelFormat::Luminance);
        assert!(r.is_err());
    }

    #[test]
    fn stride_padding_is_skipped() {
        // 2x2 luma со stride=4: паддинг-байты 0xAA не должны попасть в план
        let data = vec![1, 2, 0xAA, 0xAA, 3, 4, 0xAA, 0xAA];
        let buf = PixelBuffer::new(data, 2, 2, 4, PixelFormat::Luminance).unwrap();
        let g = buf.to_luma();
        assert_eq!(g.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn bgr_channels_are_swapped() {
        // один пиксель: B=255, R=0 → BT.601 даёт вес 114, а не 299
        let buf = PixelBuffer::packed(vec![255, 0, 0], 1, 1, PixelFormat::Bgr).unwrap();
        assert_eq!(buf.to_luma().get(0, 0), 29); // 114*255/1000
    }

    #[test]
    fn rgba_ignores_alpha() {
        let buf = PixelBuffer::packed(vec![100, 100, 100, 0], 1, 1, PixelFormat::Rgba).unwrap();
        assert_eq!(buf.to_luma().get(0, 0), 100); // (299+587+114)*100/1000
    }

    #[test]
    fn sample_bounds_checked() {
        let buf = PixelBuffer::packed(vec![7, 8], 2, 1, PixelFormat::Luminance).unwrap();
        assert_eq!(buf.sample(1, 0), Some(&[8u8][..]));
        assert_eq!(buf.sample(2, 0), None);
        assert_eq!(buf.sample(0, 1), None);
    }
}
