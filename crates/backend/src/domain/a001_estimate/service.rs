use super::repository;
use contracts::domain::a001_estimate::aggregate::{Estimate, EstimateDto};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Создание новой сметы
pub async fn create(db: &DatabaseConnection, dto: EstimateDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| format!("EST-{}", &Uuid::new_v4().simple().to_string()[..8]));
    let mut aggregate =
        Estimate::new_for_insert(code, dto.description, dto.project_name, dto.comment);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(db, &aggregate).await
}

/// Обновление существующей сметы
pub async fn update(db: &DatabaseConnection, dto: EstimateDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.update(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::update(db, &aggregate).await
}

/// Создать или обновить, в зависимости от наличия id в DTO
pub async fn upsert(db: &DatabaseConnection, dto: EstimateDto) -> anyhow::Result<Uuid> {
    match dto.id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) {
        Some(id) => {
            update(db, dto).await?;
            Ok(id)
        }
        None => create(db, dto).await,
    }
}

/// Мягкое удаление сметы
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(db, id).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<Estimate>> {
    repository::get_by_id(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Estimate>> {
    repository::list_all(db).await
}
