use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use crate::uuid_aggregate_id;

uuid_aggregate_id!(
    /// Уникальный идентификатор сметы
    EstimateId
);

/// Смета: именованный набор позиций работ и материалов по объекту (без цен)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    #[serde(flatten)]
    pub base: BaseAggregate<EstimateId>,

    /// Наименование объекта/проекта
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
}

impl Estimate {
    pub fn new_for_insert(
        code: String,
        description: String,
        project_name: Option<String>,
        comment: Option<String>,
    ) -> Self {
        let mut base = BaseAggregate::new(EstimateId::new_v4(), code, description);
        base.comment = comment;
        Self { base, project_name }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn update(&mut self, dto: &EstimateDto) {
        self.base.code = dto.code.clone().unwrap_or_default();
        self.base.description = dto.description.clone();
        self.base.comment = dto.comment.clone();
        self.project_name = dto.project_name.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.description.trim().is_empty() {
            return Err("Наименование сметы не может быть пустым".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for Estimate {
    type Id = EstimateId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "estimate"
    }

    fn element_name() -> &'static str {
        "Смета"
    }

    fn list_name() -> &'static str {
        "Сметы"
    }
}

/// DTO для создания/обновления сметы
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EstimateDto {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: String,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(Estimate::table_name(), "a001_estimate");
    }

    #[test]
    fn test_validate_requires_description() {
        let estimate = Estimate::new_for_insert("EST-1".into(), "  ".into(), None, None);
        assert!(estimate.validate().is_err());

        let estimate = Estimate::new_for_insert("EST-1".into(), "Кв. 12".into(), None, None);
        assert!(estimate.validate().is_ok());
    }

    #[test]
    fn test_update_from_dto() {
        let mut estimate = Estimate::new_for_insert("EST-1".into(), "Старое".into(), None, None);
        estimate.update(&EstimateDto {
            id: None,
            code: Some("EST-2".into()),
            description: "Новое".into(),
            project_name: Some("ЖК Северный".into()),
            comment: None,
        });
        assert_eq!(estimate.base.code, "EST-2");
        assert_eq!(estimate.base.description, "Новое");
        assert_eq!(estimate.project_name.as_deref(), Some("ЖК Северный"));
    }
}
