use super::batch_persister::BatchPersister;
use super::error::ImportError;
use super::grid::CellGrid;
use super::progress_tracker::ProgressTracker;
use super::reducer::{normalize_grid, ReduceOptions, ReduceOutcome};
use super::source_reader::{read_source, SourceFormat};
use crate::domain::a002_estimate_item::EstimateItemStore;
use crate::shared::config::ImportSettings;
use anyhow::Result;
use contracts::usecases::u101_import_estimate::{
    progress::{ImportProgress, ImportStage, ImportStatus},
    request::ImportRequest,
    response::{ImportResponse, ImportStartStatus},
};
use std::sync::Arc;
use uuid::Uuid;

/// Итог успешного импорта
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_total: usize,
    pub records: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub batches: usize,
    /// Позиций в смете по контрольному чтению (None, если чтение не удалось)
    pub stored_total: Option<usize>,
    pub used_positional_fallback: bool,
}

/// Executor для UseCase импорта сметы из файла
#[derive(Clone)]
pub struct ImportExecutor {
    store: Arc<dyn EstimateItemStore>,
    settings: ImportSettings,
    pub progress_tracker: Arc<ProgressTracker>,
}

impl ImportExecutor {
    pub fn new(
        store: Arc<dyn EstimateItemStore>,
        settings: ImportSettings,
        progress_tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            store,
            settings,
            progress_tracker,
        }
    }

    /// Запустить импорт (создаёт async task и возвращает session_id)
    pub async fn start_import(
        &self,
        request: ImportRequest,
        content: Vec<u8>,
    ) -> Result<ImportResponse> {
        self.progress_tracker
            .cleanup_old_sessions(self.settings.session_max_age_hours);

        let estimate_id = Uuid::parse_str(&request.estimate_id)
            .map_err(|_| anyhow::anyhow!("Invalid estimate_id"))?;

        if SourceFormat::from_file_name(&request.file_name).is_none() {
            let error = ImportError::UnsupportedFormat(request.file_name.clone());
            tracing::warn!("Rejected import for estimate {}: {}", estimate_id, error);
            return Ok(ImportResponse {
                session_id: String::new(),
                status: ImportStartStatus::Failed,
                message: error.to_string(),
            });
        }

        let session_id = Uuid::new_v4().to_string();
        if let Err(running) = self.progress_tracker.try_create_session(
            session_id.clone(),
            request.estimate_id.clone(),
            request.file_name.clone(),
        ) {
            tracing::warn!(
                "Import for estimate {} is already running (session {})",
                estimate_id,
                running
            );
            return Ok(ImportResponse {
                session_id: running,
                status: ImportStartStatus::AlreadyRunning,
                message: "Импорт этой сметы уже выполняется".to_string(),
            });
        }

        let executor = self.clone();
        let sid = session_id.clone();
        let req = request.clone();

        tokio::spawn(async move {
            match executor.run_import(&sid, estimate_id, &req, &content).await {
                Ok(summary) => {
                    tracing::info!(
                        "Estimate import {} completed: {} rows, {} records ({} skipped, positional fallback: {}), {} inserted in {} batches",
                        sid,
                        summary.rows_total,
                        summary.records,
                        summary.skipped,
                        summary.used_positional_fallback,
                        summary.inserted,
                        summary.batches
                    );
                    executor
                        .progress_tracker
                        .complete_session(&sid, ImportStatus::Completed);
                }
                Err(e) => {
                    if e.is_input_error() {
                        tracing::warn!("Estimate import {} rejected: {}", sid, e);
                    } else {
                        tracing::error!(
                            "Estimate import {} failed with {} items already stored: {}",
                            sid,
                            e.inserted(),
                            e
                        );
                    }
                    executor.progress_tracker.add_error(&sid, e.to_string());
                    executor
                        .progress_tracker
                        .complete_session(&sid, ImportStatus::Failed);
                }
            }
        });

        Ok(ImportResponse {
            session_id,
            status: ImportStartStatus::Started,
            message: "Import started".to_string(),
        })
    }

    /// Получить прогресс сессии
    pub fn get_progress(&self, session_id: &str) -> Option<ImportProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    /// Выполнить импорт: чтение, нормализация, запись, контрольное чтение
    pub async fn run_import(
        &self,
        session_id: &str,
        estimate_id: Uuid,
        request: &ImportRequest,
        content: &[u8],
    ) -> Result<ImportSummary, ImportError> {
        tracing::info!(
            "Starting estimate import {} for estimate {} from {}",
            session_id,
            estimate_id,
            request.file_name
        );

        let (rows_total, outcome) = self.normalize(session_id, request, content)?;
        let mut summary = ImportSummary {
            rows_total,
            records: outcome.records.len(),
            skipped: outcome.stats.skipped,
            used_positional_fallback: outcome.stats.used_positional_fallback,
            ..Default::default()
        };

        self.progress_tracker
            .set_stage(session_id, ImportStage::Persisting);
        if request.replace_existing {
            let removed = self
                .store
                .delete_records(estimate_id)
                .await
                .map_err(|e| ImportError::from_store(e, 0))?;
            tracing::info!("Removed {} existing items of estimate {}", removed, estimate_id);
        }

        let tracker = &self.progress_tracker;
        let persisted = BatchPersister::new(self.store.as_ref(), self.settings.batch_size)
            .persist(estimate_id, &outcome.records, |report| {
                tracker.record_flush(session_id, report)
            })
            .await?;
        summary.inserted = persisted.inserted;
        summary.batches = persisted.batches;

        self.progress_tracker
            .set_stage(session_id, ImportStage::Verifying);
        match self.store.fetch_records(estimate_id).await {
            Ok(items) => {
                if items.len() < persisted.inserted {
                    tracing::warn!(
                        "Estimate {} holds {} items after inserting {}",
                        estimate_id,
                        items.len(),
                        persisted.inserted
                    );
                }
                self.progress_tracker
                    .set_stored_total(session_id, items.len());
                summary.stored_total = Some(items.len());
            }
            Err(e) => {
                tracing::warn!("Could not read back items of estimate {}: {}", estimate_id, e);
            }
        }

        Ok(summary)
    }

    fn normalize(
        &self,
        session_id: &str,
        request: &ImportRequest,
        content: &[u8],
    ) -> Result<(usize, ReduceOutcome), ImportError> {
        self.progress_tracker.set_stage(session_id, ImportStage::Reading);
        let grid = read_source(&request.file_name, content, &self.settings.preferred_sheet)?;
        let rows_total = grid.row_count();
        self.progress_tracker.set_rows_total(session_id, rows_total);

        self.progress_tracker
            .set_stage(session_id, ImportStage::Normalizing);
        let outcome = normalize_grid(&grid, &ReduceOptions::from(&self.settings));
        let stats = &outcome.stats;
        if stats.skipped > 0 {
            tracing::warn!(
                "Skipped {} rows without usable name or quantity in {}",
                stats.skipped,
                request.file_name
            );
        }
        tracing::info!(
            "Normalized {} rows into {} records (header: {}, positional: {}, apartments: {}, rescued: {}, blank: {})",
            stats.rows_scanned,
            outcome.records.len(),
            outcome.columns.has_header,
            outcome.columns.positional,
            stats.apartment_rows,
            stats.rescued,
            stats.blank_rows
        );
        self.progress_tracker
            .set_records_total(session_id, outcome.records.len(), stats.skipped);

        if outcome.records.is_empty() {
            return Err(ImportError::NoUsableRows);
        }
        Ok((rows_total, outcome))
    }
}
