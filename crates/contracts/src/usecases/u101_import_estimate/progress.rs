use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Текущий прогресс импорта сметы
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    pub session_id: String,
    pub estimate_id: String,
    pub file_name: String,
    pub status: ImportStatus,
    pub stage: ImportStage,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Строк в исходном файле (включая заголовок)
    pub rows_total: Option<i32>,
    /// Позиций после нормализации
    pub records_total: Option<i32>,
    /// Строк, пропущенных без позиции (пустые, без названия и количества)
    pub rows_skipped: i32,
    /// Записано в хранилище
    pub inserted: i32,
    /// Выполнено пакетных вставок
    pub batches: i32,
    /// Позиций в смете после импорта (контрольное чтение)
    pub stored_total: Option<i32>,

    pub errors: i32,
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Running,
    Completed,
    Failed,
}

/// Этап импорта
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    Reading,
    Normalizing,
    Persisting,
    Verifying,
    Done,
}

impl ImportProgress {
    pub fn new(session_id: String, estimate_id: String, file_name: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            estimate_id,
            file_name,
            status: ImportStatus::Running,
            stage: ImportStage::Reading,
            started_at: now,
            completed_at: None,
            updated_at: now,
            rows_total: None,
            records_total: None,
            rows_skipped: 0,
            inserted: 0,
            batches: 0,
            stored_total: None,
            errors: 0,
            error_messages: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ImportStatus::Running
    }
}
