use async_trait::async_trait;
use contracts::domain::a002_estimate_item::{EstimateItem, EstimateRecord};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;
use uuid::Uuid;

use super::repository;

/// Ошибка хранилища позиций смет
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Хранилище позиций смет, которым пользуется импорт.
///
/// Передаётся в импорт явно, чтобы нормализацию и пакетную запись
/// можно было проверять без живой БД.
#[async_trait]
pub trait EstimateItemStore: Send + Sync {
    /// Вставить пакет позиций; возвращает число вставленных
    async fn create_records_batch(
        &self,
        estimate_id: Uuid,
        records: &[EstimateRecord],
    ) -> Result<usize, StoreError>;

    /// Прочитать все позиции сметы в порядке sort_order
    async fn fetch_records(&self, estimate_id: Uuid) -> Result<Vec<EstimateItem>, StoreError>;

    /// Удалить все позиции сметы; возвращает число удалённых
    async fn delete_records(&self, estimate_id: Uuid) -> Result<u64, StoreError>;
}

/// Реализация поверх sea-orm (SQLite)
#[derive(Clone)]
pub struct SeaOrmEstimateItemStore {
    db: DatabaseConnection,
}

impl SeaOrmEstimateItemStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EstimateItemStore for SeaOrmEstimateItemStore {
    async fn create_records_batch(
        &self,
        estimate_id: Uuid,
        records: &[EstimateRecord],
    ) -> Result<usize, StoreError> {
        Ok(repository::insert_batch(&self.db, estimate_id, records).await?)
    }

    async fn fetch_records(&self, estimate_id: Uuid) -> Result<Vec<EstimateItem>, StoreError> {
        Ok(repository::list_by_estimate(&self.db, estimate_id).await?)
    }

    async fn delete_records(&self, estimate_id: Uuid) -> Result<u64, StoreError> {
        Ok(repository::delete_by_estimate(&self.db, estimate_id).await?)
    }
}
