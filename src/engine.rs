//! Фасад движка: декодирование буфера или файла целиком.
//!
//! Движок не держит мутабельного состояния между вызовами — его можно
//! разделять между потоками (`&DecodeEngine` из нескольких потоков
//! безопасен, реестр после конструирования только читается).

use std::path::Path;
use std::sync::OnceLock;

use crate::aggregate;
use crate::api::DecoderRegistry;
use crate::core::pixel::{PixelBuffer, PixelFormat};
use crate::core::types::DecodeResult;
use crate::error::DecodeError;
use crate::options::ReaderOptions;
use crate::search;

/// Движок декодирования со своим реестром декодеров.
pub struct DecodeEngine {
    registry: DecoderRegistry,
}

impl DecodeEngine {
    /// Движок со встроенными декодерами.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: DecoderRegistry::with_builtins(),
        }
    }

    /// Движок с кастомным реестром (свои декодеры, свой набор форматов).
    #[must_use]
    pub fn with_registry(registry: DecoderRegistry) -> Self {
        Self { registry }
    }

    /// Первый найденный символ в порядке перебора трансформов и
    /// декодеров (исторический контракт «result\[0\]» одиночного decode).
    /// Кандидат с наибольшей уверенностью доступен как `decode_all()?[0]`.
    ///
    /// # Errors
    /// `NoSymbolFound`, если ни один декодер ничего не нашёл;
    /// `Cancelled` при сработавшем токене или дедлайне.
    pub fn decode_one(
        &self,
        buffer: &PixelBuffer,
        options: &ReaderOptions,
    ) -> Result<DecodeResult, DecodeError> {
        let gray = buffer.to_luma();
        let candidates = search::run_search(&self.registry, &gray, options)?;
        aggregate::first_match(&candidates).ok_or(DecodeError::NoSymbolFound)
    }

    /// Все найденные символы: дедуплицированы, отсортированы по убыванию
    /// уверенности (при равенстве — по порядку обнаружения).
    ///
    /// # Errors
    /// `NoSymbolFound` при пустом результате; `Cancelled` — как у
    /// [`DecodeEngine::decode_one`].
    pub fn decode_all(
        &self,
        buffer: &PixelBuffer,
        options: &ReaderOptions,
    ) -> Result<Vec<DecodeResult>, DecodeError> {
        let gray = buffer.to_luma();
        let candidates = search::run_search(&self.registry, &gray, options)?;
        let results = aggregate::aggregate_all(candidates);
        if results.is_empty() {
            return Err(DecodeError::NoSymbolFound);
        }
        Ok(results)
    }

    /// Загрузить изображение с диска и декодировать первый символ.
    ///
    /// # Errors
    /// `ImageLoad`, если файл не читается или формат не поддержан;
    /// дальше — как у [`DecodeEngine::decode_one`].
    pub fn decode_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ReaderOptions,
    ) -> Result<DecodeResult, DecodeError> {
        let buffer = load_pixels(path.as_ref())?;
        self.decode_one(&buffer, options)
    }

    /// Загрузить изображение с диска и декодировать все символы.
    ///
    /// # Errors
    /// См. [`DecodeEngine::decode_file`] и [`DecodeEngine::decode_all`].
    pub fn decode_file_all<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ReaderOptions,
    ) -> Result<Vec<DecodeResult>, DecodeError> {
        let buffer = load_pixels(path.as_ref())?;
        self.decode_all(&buffer, options)
    }
}

impl Default for DecodeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Процесс-глобальный движок со встроенными декодерами.
///
/// Инициализация идемпотентна и потокобезопасна; отдельного shutdown
/// не требуется.
pub fn default_engine() -> &'static DecodeEngine {
    static ENGINE: OnceLock<DecodeEngine> = OnceLock::new();
    ENGINE.get_or_init(DecodeEngine::new)
}

/// Прочитать файл в [`PixelBuffer`] (RGB8).
fn load_pixels(path: &Path) -> Result<PixelBuffer, DecodeError> {
    let img = image::open(path).map_err(|e| DecodeError::ImageLoad(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    PixelBuffer::packed(rgb.into_raw(), w as usize, h as usize, PixelFormat::Rgb)
}
