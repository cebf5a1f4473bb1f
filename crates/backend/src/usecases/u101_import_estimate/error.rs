use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::a002_estimate_item::StoreError;

/// Ошибки импорта сметы
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Неподдерживаемый формат файла «{0}»: ожидается .csv, .xlsx или .xls")]
    UnsupportedFormat(String),

    #[error("Не удалось прочитать файл: {0}")]
    Unreadable(String),

    #[error("Файл не содержит данных")]
    EmptySheet,

    #[error("В файле не найдено ни одной позиции сметы (нужно наименование или количество)")]
    NoUsableRows,

    #[error(
        "В таблице позиций смет нет колонки «{column}». \
         Перезапустите сервер, чтобы обновить схему БД, и повторите импорт"
    )]
    SchemaMismatch { column: String, inserted: usize },

    #[error("Ошибка записи в БД (уже записано позиций: {inserted}): {message}")]
    Persistence { inserted: usize, message: String },
}

static MISSING_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)has no column named\s+"?([\w.]+)"?|no such column:?\s*"?([\w.]+)"?|column\s+"?([\w.]+)"?(?:\s+of relation\s+\S+)?\s+does not exist"#,
    )
    .expect("valid missing-column regex")
});

impl ImportError {
    /// Ошибка хранилища с учётом уже записанных позиций.
    /// Сообщения об отсутствующей колонке превращаются в `SchemaMismatch`.
    pub fn from_store(err: StoreError, inserted: usize) -> Self {
        let message = err.to_string();
        match missing_column(&message) {
            Some(column) => ImportError::SchemaMismatch { column, inserted },
            None => ImportError::Persistence { inserted, message },
        }
    }

    /// Сколько позиций успело попасть в БД до ошибки
    pub fn inserted(&self) -> usize {
        match self {
            ImportError::SchemaMismatch { inserted, .. }
            | ImportError::Persistence { inserted, .. } => *inserted,
            _ => 0,
        }
    }

    /// Ошибка входных данных (до любых обращений к хранилищу)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat(_)
                | ImportError::Unreadable(_)
                | ImportError::EmptySheet
                | ImportError::NoUsableRows
        )
    }
}

fn missing_column(message: &str) -> Option<String> {
    let caps = MISSING_COLUMN.captures(message)?;
    let raw = (1..=3).find_map(|i| caps.get(i))?.as_str();
    // "table.column" -> "column"
    Some(raw.rsplit('.').next().unwrap_or(raw).to_string())
}
