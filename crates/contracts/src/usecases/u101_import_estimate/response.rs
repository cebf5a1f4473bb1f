use serde::{Deserialize, Serialize};

/// Ответ на запрос запуска импорта сметы
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub session_id: String,
    pub status: ImportStartStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStartStatus {
    Started,
    /// Для этой сметы уже идёт импорт
    AlreadyRunning,
    Failed,
}
