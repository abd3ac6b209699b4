// src/error.rs
//
// Ошибки верхнего уровня. Вместо глобального слота «последней ошибки»
// (как в старых биндингах) — структурный Result из каждого вызова;
// legacy-аксессор живёт отдельно в `compat`.

use thiserror::Error;

/// Ошибка decode-вызова.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Кривой вход: пустой путь, несогласованная геометрия буфера и т.п.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Кодек не смог прочитать файл изображения.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    /// Поиск завершился, кандидатов нет.
    #[error("no barcode found")]
    NoSymbolFound,

    /// Внутренний сбой декодера символики, перехваченный стратегией
    /// поиска. Пока другие декодеры дают кандидатов, сбой только
    /// логируется; наружу выходит лишь при полностью пустом результате.
    #[error("decode error: {0}")]
    DecoderFault(String),

    /// Сканирование прервано токеном отмены или дедлайном.
    #[error("decode cancelled")]
    Cancelled,
}
