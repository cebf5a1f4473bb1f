//! Пакетная запись нормализованных позиций в хранилище.

use contracts::domain::a002_estimate_item::EstimateRecord;
use std::ops::Range;
use uuid::Uuid;

use super::error::ImportError;
use crate::domain::a002_estimate_item::EstimateItemStore;

/// Итог одной отправки пакета
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub batch_index: usize,
    pub size: usize,
    pub inserted: usize,
    pub total_inserted: usize,
    pub apartment_label: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub inserted: usize,
    pub batches: usize,
}

/// Разбить позиции на пакеты: не больше `max_batch` в пакете,
/// и новая квартира всегда начинает новый пакет
pub fn plan_chunks(records: &[EstimateRecord], max_batch: usize) -> Vec<Range<usize>> {
    let max_batch = max_batch.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    for idx in 1..records.len() {
        let full = idx - start >= max_batch;
        let apartment_changed = records[idx].apartment_label != records[idx - 1].apartment_label;
        if full || apartment_changed {
            chunks.push(start..idx);
            start = idx;
        }
    }
    if start < records.len() {
        chunks.push(start..records.len());
    }

    chunks
}

pub struct BatchPersister<'a> {
    store: &'a dyn EstimateItemStore,
    max_batch: usize,
}

impl<'a> BatchPersister<'a> {
    pub fn new(store: &'a dyn EstimateItemStore, max_batch: usize) -> Self {
        Self {
            store,
            max_batch: max_batch.max(1),
        }
    }

    /// Записать позиции по пакетам, сообщая о каждом пакете в `on_flush`.
    ///
    /// Первая ошибка прерывает запись; уже записанные пакеты остаются в БД.
    pub async fn persist<F>(
        &self,
        estimate_id: Uuid,
        records: &[EstimateRecord],
        mut on_flush: F,
    ) -> Result<PersistSummary, ImportError>
    where
        F: FnMut(&FlushReport),
    {
        let chunks = plan_chunks(records, self.max_batch);
        tracing::info!(
            "Persisting {} records for estimate {} in {} batches",
            records.len(),
            estimate_id,
            chunks.len()
        );

        let mut total_inserted = 0;
        for (batch_index, range) in chunks.iter().enumerate() {
            let batch = &records[range.clone()];
            let inserted = match self.store.create_records_batch(estimate_id, batch).await {
                Ok(inserted) => inserted,
                Err(e) => {
                    tracing::error!(
                        "Batch {} of {} failed after {} inserted records: {}",
                        batch_index + 1,
                        chunks.len(),
                        total_inserted,
                        e
                    );
                    return Err(ImportError::from_store(e, total_inserted));
                }
            };
            total_inserted += inserted;

            let report = FlushReport {
                batch_index,
                size: batch.len(),
                inserted,
                total_inserted,
                apartment_label: batch[0].apartment_label.clone(),
            };
            tracing::debug!(
                "Batch {}: {} of {} records ({:?}), total {}",
                batch_index + 1,
                inserted,
                report.size,
                report.apartment_label,
                total_inserted
            );
            on_flush(&report);
        }

        Ok(PersistSummary {
            inserted: total_inserted,
            batches: chunks.len(),
        })
    }
}
