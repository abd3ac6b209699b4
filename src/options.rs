// src/options.rs
//
// Конфигурация одного decode-вызова. Передаётся по значению (снимок),
// никакого разделяемого состояния между вызовами.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::types::FormatMask;

/// Токен отмены: дешёвый клон, взводится из любого потока.
/// Стратегия поиска проверяет его на каждой паре трансформ×формат.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Опции чтения. Дефолт повторяет `create_default_options()` исходного
/// биндинга: все форматы, try_harder+try_rotate+try_downscale включены,
/// try_invert выключен.
#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Какие символики пробовать.
    pub formats: FormatMask,
    /// Исчерпывающий перебор: не останавливаться на первом кандидате формата.
    pub try_harder: bool,
    /// Пробовать повороты 90/180/270°.
    pub try_rotate: bool,
    /// Пробовать инверсию яркости (светлый код на тёмном).
    pub try_invert: bool,
    /// Фоллбэк-проходы в половинном разрешении.
    pub try_downscale: bool,
    /// Необязательный токен отмены.
    pub cancel: Option<CancelToken>,
    /// Необязательный дедлайн; по истечении поиск прерывается.
    pub deadline: Option<Instant>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            formats: FormatMask::all(),
            try_harder: true,
            try_rotate: true,
            try_invert: false,
            try_downscale: true,
            cancel: None,
            deadline: None,
        }
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_formats(mut self, formats: FormatMask) -> Self {
        self.formats = formats;
        self
    }

    #[must_use]
    pub fn with_try_harder(mut self, v: bool) -> Self {
        self.try_harder = v;
        self
    }

    #[must_use]
    pub fn with_try_rotate(mut self, v: bool) -> Self {
        self.try_rotate = v;
        self
    }

    #[must_use]
    pub fn with_try_invert(mut self, v: bool) -> Self {
        self.try_invert = v;
        self
    }

    #[must_use]
    pub fn with_try_downscale(mut self, v: bool) -> Self {
        self.try_downscale = v;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Пора ли прерываться (токен взведён или дедлайн прошёл).
    #[inline]
    #[must_use]
    pub(crate) fn should_abort(&self) -> bool {
        if let Some(tok) = &self.cancel {
            if tok.is_cancelled() {
                return true;
            }
        }
        if let Some(dl) = self.deadline {
            if Instant::now() >= dl {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Symbology;

    #[test]
    fn default_matches_legacy_defaults() {
        let o = ReaderOptions::default();
        assert_eq!(o.formats, FormatMask::all());
        assert!(o.try_harder);
        assert!(o.try_rotate);
        assert!(!o.try_invert);
        assert!(o.try_downscale);
        assert!(o.cancel.is_none());
        assert!(o.deadline.is_none());
    }

    #[test]
    fn snapshots_are_independent() {
        let a = ReaderOptions::default();
        let b = ReaderOptions::default().with_try_invert(true).with_formats(FormatMask::only(Symbology::QrCode));
        assert!(!a.try_invert);
        assert_eq!(a.formats, FormatMask::all());
        assert!(b.try_invert);
    }

    #[test]
    fn cancel_token_trips_abort() {
        let tok = CancelToken::new();
        let o = ReaderOptions::default().with_cancel(tok.clone());
        assert!(!o.should_abort());
        tok.cancel();
        assert!(o.should_abort());
    }

    #[test]
    fn elapsed_deadline_trips_abort() {
        let past = ReaderOptions::default().with_deadline(Instant::now());
        assert!(past.should_abort());

        let far = Instant::now() + std::time::Duration::from_secs(3600);
        assert!(!ReaderOptions::default().with_deadline(far).should_abort());
    }
}
