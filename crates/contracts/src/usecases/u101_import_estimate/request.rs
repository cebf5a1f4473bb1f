use serde::{Deserialize, Serialize};

/// Запрос на импорт сметы из файла (.csv / .xlsx / .xls).
///
/// Содержимое файла передаётся отдельно (multipart), здесь только параметры.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    /// ID сметы (a001_estimate), в которую загружаются позиции
    pub estimate_id: String,

    /// Имя исходного файла; по расширению определяется формат
    pub file_name: String,

    /// Удалить существующие позиции сметы перед загрузкой
    #[serde(default)]
    pub replace_existing: bool,
}
