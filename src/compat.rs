// src/compat.rs
//! Совместимость со старым C-подобным API: Option вместо Result и
//! потоко-локальный слот с текстом последней ошибки.
//!
//! Старые вызывающие работали по схеме «результата нет — спроси
//! getLastError». Слот хранится per-thread, поэтому конкурентные
//! декодирования не затирают ошибки друг друга.

use std::cell::RefCell;
use std::path::Path;

use crate::core::types::DecodeResult;
use crate::engine::default_engine;
use crate::options::ReaderOptions;

thread_local! {
    static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

fn record_error(text: String) {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = text);
}

fn clear_error() {
    LAST_ERROR.with(|slot| slot.borrow_mut().clear());
}

/// Текст последней ошибки текущего потока; пустая строка — ошибки не было.
#[must_use]
pub fn get_last_error() -> String {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Декодировать первый символ из файла. `None` — смотри [`get_last_error`].
pub fn decode<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Option<DecodeResult> {
    match default_engine().decode_file(path, options) {
        Ok(r) => {
            clear_error();
            Some(r)
        }
        Err(e) => {
            record_error(e.to_string());
            None
        }
    }
}

/// Декодировать все символы из файла. `None` — смотри [`get_last_error`].
pub fn decode_multi<P: AsRef<Path>>(
    path: P,
    options: &ReaderOptions,
) -> Option<Vec<DecodeResult>> {
    match default_engine().decode_file_all(path, options) {
        Ok(rs) => {
            clear_error();
            Some(rs)
        }
        Err(e) => {
            record_error(e.to_string());
            None
        }
    }
}
