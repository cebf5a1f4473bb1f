//! Хранилище позиций в памяти для тестов импорта.

use async_trait::async_trait;
use contracts::domain::a002_estimate_item::{EstimateItem, EstimateRecord};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::a002_estimate_item::{EstimateItemStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<Uuid, Vec<EstimateItem>>>,
    /// Размеры принятых пакетов в порядке вызовов
    batch_sizes: Mutex<Vec<usize>>,
    /// Номер вызова (с 0), на котором вставка падает
    fail_on_batch: Option<usize>,
    fail_message: String,
    fail_fetch: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(batch: usize, message: &str) -> Self {
        Self {
            fail_on_batch: Some(batch),
            fail_message: message.to_string(),
            ..Self::default()
        }
    }

    pub fn failing_fetch() -> Self {
        Self {
            fail_fetch: true,
            ..Self::default()
        }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn stored(&self, estimate_id: Uuid) -> Vec<EstimateItem> {
        self.items
            .lock()
            .unwrap()
            .get(&estimate_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EstimateItemStore for MemoryStore {
    async fn create_records_batch(
        &self,
        estimate_id: Uuid,
        records: &[EstimateRecord],
    ) -> Result<usize, StoreError> {
        let mut sizes = self.batch_sizes.lock().unwrap();
        if self.fail_on_batch == Some(sizes.len()) {
            return Err(StoreError::Backend(self.fail_message.clone()));
        }
        sizes.push(records.len());

        let mut items = self.items.lock().unwrap();
        let stored = items.entry(estimate_id).or_default();
        stored.extend(
            records
                .iter()
                .map(|record| EstimateItem::from_record(estimate_id, record)),
        );
        Ok(records.len())
    }

    async fn fetch_records(&self, estimate_id: Uuid) -> Result<Vec<EstimateItem>, StoreError> {
        if self.fail_fetch {
            return Err(StoreError::Backend("connection reset".into()));
        }
        let mut stored = self.stored(estimate_id);
        stored.sort_by_key(|item| item.sort_order);
        Ok(stored)
    }

    async fn delete_records(&self, estimate_id: Uuid) -> Result<u64, StoreError> {
        let removed = self.items.lock().unwrap().remove(&estimate_id);
        Ok(removed.map(|items| items.len() as u64).unwrap_or(0))
    }
}
