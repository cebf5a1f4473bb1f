use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Нормализованная строка сметы, полученная при импорте.
///
/// Создаётся в памяти за один проход импорта и после этого не меняется;
/// идентификатор появляется только при записи в хранилище.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub apartment_label: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub category: Option<String>,
    /// Порядковый номер в пределах одного импорта
    pub sort_order: i32,
}

/// Сохранённая позиция сметы (таблица a002_estimate_item)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateItem {
    pub id: Uuid,
    pub estimate_id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub apartment_label: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl EstimateItem {
    pub fn from_record(estimate_id: Uuid, record: &EstimateRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            estimate_id,
            name: record.name.clone(),
            unit: record.unit.clone(),
            quantity: record.quantity,
            apartment_label: record.apartment_label.clone(),
            section: record.section.clone(),
            subsection: record.subsection.clone(),
            category: record.category.clone(),
            sort_order: record.sort_order,
            created_at: Utc::now(),
        }
    }
}
