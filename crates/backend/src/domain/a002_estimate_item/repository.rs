use chrono::Utc;
use contracts::domain::a002_estimate_item::{EstimateItem, EstimateRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_estimate_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub estimate_id: String,
    pub name: String,
    pub unit: String,
    pub quantity: f64,
    pub apartment_label: Option<String>,
    pub section: Option<String>,
    pub subsection: Option<String>,
    pub category: Option<String>,
    pub sort_order: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EstimateItem {
    fn from(m: Model) -> Self {
        EstimateItem {
            id: Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4()),
            estimate_id: Uuid::parse_str(&m.estimate_id).unwrap_or_default(),
            name: m.name,
            unit: m.unit,
            quantity: m.quantity,
            apartment_label: m.apartment_label,
            section: m.section,
            subsection: m.subsection,
            category: m.category,
            sort_order: m.sort_order,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

fn active_from_record(estimate_id: Uuid, record: &EstimateRecord) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        estimate_id: Set(estimate_id.to_string()),
        name: Set(record.name.clone()),
        unit: Set(record.unit.clone()),
        quantity: Set(record.quantity),
        apartment_label: Set(record.apartment_label.clone()),
        section: Set(record.section.clone()),
        subsection: Set(record.subsection.clone()),
        category: Set(record.category.clone()),
        sort_order: Set(record.sort_order),
        created_at: Set(Some(Utc::now())),
    }
}

/// Вставить пакет позиций одним запросом. Возвращает число вставленных строк.
pub async fn insert_batch(
    db: &DatabaseConnection,
    estimate_id: Uuid,
    records: &[EstimateRecord],
) -> Result<usize, DbErr> {
    if records.is_empty() {
        return Ok(0);
    }
    let models = records
        .iter()
        .map(|record| active_from_record(estimate_id, record));
    Entity::insert_many(models).exec(db).await?;
    Ok(records.len())
}

pub async fn list_by_estimate(
    db: &DatabaseConnection,
    estimate_id: Uuid,
) -> Result<Vec<EstimateItem>, DbErr> {
    let items = Entity::find()
        .filter(Column::EstimateId.eq(estimate_id.to_string()))
        .order_by_asc(Column::SortOrder)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn delete_by_estimate(db: &DatabaseConnection, estimate_id: Uuid) -> Result<u64, DbErr> {
    let result = Entity::delete_many()
        .filter(Column::EstimateId.eq(estimate_id.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
