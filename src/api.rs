// src/api.rs
//
// Шов расширяемости: трейт декодера символики и реестр формат → декодер.
// Новая символика подключается регистрацией, стратегию поиска менять
// не нужно.

use crate::core::pixel::GrayBuffer;
use crate::core::types::{Quad, Symbology};

/// Сырой хит одного декодера: координаты quad'а — в системе ТОГО буфера,
/// который декодер получил (обратное отображение делает стратегия поиска).
#[derive(Clone, Debug)]
pub struct DecoderHit {
    pub text: String,
    pub format: Symbology,
    /// 0.0..=1.0; декодер без собственного понятия уверенности отдаёт 1.0.
    pub confidence: f32,
    pub quad: Quad,
}

/// Декодер одной или нескольких родственных символик.
///
/// Контракт: чистая функция от буфера — никакого разделяемого
/// мутабельного состояния между вызовами, чтобы стратегия поиска могла
/// дёргать декодер на разных трансформах без синхронизации.
pub trait SymbologyDecoder: Send + Sync {
    /// Какие форматы обслуживает этот декодер.
    fn formats(&self) -> &'static [Symbology];

    /// Найти и демодулировать все экземпляры на буфере (возможно, ни одного).
    fn try_decode(&self, gray: &GrayBuffer) -> Vec<DecoderHit>;
}

/// Реестр декодеров. После конструирования только читается, поэтому
/// безопасен для конкурентных decode-вызовов.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn SymbologyDecoder>>,
}

impl DecoderRegistry {
    /// Пустой реестр (для кастомных наборов декодеров).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Реестр со встроенными декодерами: QR v1, Code 128, EAN-13/UPC-A.
    /// DataMatrix и EAN-8 распознаются маской, но декодера не имеют —
    /// такие форматы стратегия поиска молча пропускает.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.register(Box::new(crate::qr::QrDecoder::new()));
        reg.register(Box::new(crate::one_d::Code128Decoder::new()));
        reg.register(Box::new(crate::one_d::Ean13Decoder::new()));
        reg
    }

    pub fn register(&mut self, decoder: Box<dyn SymbologyDecoder>) {
        self.decoders.push(decoder);
    }

    /// Индекс декодера, обслуживающего формат (если зарегистрирован).
    #[must_use]
    pub fn index_for(&self, format: Symbology) -> Option<usize> {
        self.decoders
            .iter()
            .position(|d| d.formats().contains(&format))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &dyn SymbologyDecoder {
        self.decoders[index].as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_expected_formats() {
        let reg = DecoderRegistry::with_builtins();
        assert!(reg.index_for(Symbology::QrCode).is_some());
        assert!(reg.index_for(Symbology::Code128).is_some());
        assert!(reg.index_for(Symbology::Ean13).is_some());
        assert!(reg.index_for(Symbology::UpcA).is_some());
        // распознаются, но без встроенного декодера
        assert!(reg.index_for(Symbology::DataMatrix).is_none());
        assert!(reg.index_for(Symbology::Ean8).is_none());
    }

    #[test]
    fn ean_decoder_is_shared_between_ean13_and_upca() {
        let reg = DecoderRegistry::with_builtins();
        assert_eq!(
            reg.index_for(Symbology::Ean13),
            reg.index_for(Symbology::UpcA)
        );
    }
}
