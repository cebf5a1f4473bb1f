use contracts::usecases::u101_import_estimate::progress::{
    ImportProgress, ImportStage, ImportStatus,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::batch_persister::FlushReport;

/// Трекер сессий импорта смет (in-memory)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, ImportProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Создать сессию, если для этой сметы нет другого идущего импорта.
    ///
    /// Возвращает id уже идущей сессии, если она есть.
    pub fn try_create_session(
        &self,
        session_id: String,
        estimate_id: String,
        file_name: String,
    ) -> Result<(), String> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(running) = sessions
            .values()
            .find(|p| p.estimate_id == estimate_id && p.is_running())
        {
            return Err(running.session_id.clone());
        }
        sessions.insert(
            session_id.clone(),
            ImportProgress::new(session_id, estimate_id, file_name),
        );
        Ok(())
    }

    pub fn get_progress(&self, session_id: &str) -> Option<ImportProgress> {
        self.sessions.read().unwrap().get(session_id).cloned()
    }

    fn update(&self, session_id: &str, apply: impl FnOnce(&mut ImportProgress)) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(p) = sessions.get_mut(session_id) {
            apply(p);
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn set_stage(&self, session_id: &str, stage: ImportStage) {
        self.update(session_id, |p| p.stage = stage);
    }

    pub fn set_rows_total(&self, session_id: &str, rows: usize) {
        self.update(session_id, |p| p.rows_total = Some(rows as i32));
    }

    pub fn set_records_total(&self, session_id: &str, records: usize, skipped: usize) {
        self.update(session_id, |p| {
            p.records_total = Some(records as i32);
            p.rows_skipped = skipped as i32;
        });
    }

    pub fn record_flush(&self, session_id: &str, report: &FlushReport) {
        self.update(session_id, |p| {
            p.inserted = report.total_inserted as i32;
            p.batches = report.batch_index as i32 + 1;
        });
    }

    pub fn set_stored_total(&self, session_id: &str, stored: usize) {
        self.update(session_id, |p| p.stored_total = Some(stored as i32));
    }

    pub fn add_error(&self, session_id: &str, message: String) {
        self.update(session_id, |p| {
            p.error_messages.push(message);
            p.errors += 1;
        });
    }

    pub fn complete_session(&self, session_id: &str, status: ImportStatus) {
        self.update(session_id, |p| {
            p.status = status;
            if status == ImportStatus::Completed {
                p.stage = ImportStage::Done;
            }
            p.completed_at = Some(chrono::Utc::now());
        });
    }

    pub fn cleanup_old_sessions(&self, max_age_hours: i64) {
        let mut sessions = self.sessions.write().unwrap();
        let now = chrono::Utc::now();
        sessions.retain(|_, p| {
            if let Some(completed_at) = p.completed_at {
                (now - completed_at).num_hours() < max_age_hours
            } else {
                true
            }
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(tracker: &ProgressTracker, session: &str, estimate: &str) -> Result<(), String> {
        tracker.try_create_session(session.into(), estimate.into(), "smeta.csv".into())
    }

    #[test]
    fn test_second_import_for_same_estimate_refused() {
        let tracker = ProgressTracker::new();
        start(&tracker, "s1", "e1").unwrap();
        assert_eq!(start(&tracker, "s2", "e1"), Err("s1".to_string()));
        assert!(start(&tracker, "s3", "e2").is_ok());

        tracker.complete_session("s1", ImportStatus::Completed);
        assert!(start(&tracker, "s4", "e1").is_ok());
    }

    #[test]
    fn test_flush_updates_counters() {
        let tracker = ProgressTracker::new();
        start(&tracker, "s1", "e1").unwrap();
        tracker.set_records_total("s1", 250, 4);
        tracker.record_flush(
            "s1",
            &FlushReport {
                batch_index: 1,
                size: 100,
                inserted: 100,
                total_inserted: 200,
                apartment_label: None,
            },
        );

        let progress = tracker.get_progress("s1").unwrap();
        assert_eq!(progress.records_total, Some(250));
        assert_eq!(progress.rows_skipped, 4);
        assert_eq!(progress.inserted, 200);
        assert_eq!(progress.batches, 2);
        assert!(progress.is_running());
    }

    #[test]
    fn test_complete_and_fail() {
        let tracker = ProgressTracker::new();
        start(&tracker, "ok", "e1").unwrap();
        start(&tracker, "bad", "e2").unwrap();
        tracker.set_stage("bad", ImportStage::Persisting);

        tracker.complete_session("ok", ImportStatus::Completed);
        tracker.add_error("bad", "Ошибка записи".into());
        tracker.complete_session("bad", ImportStatus::Failed);

        let ok = tracker.get_progress("ok").unwrap();
        assert_eq!(ok.stage, ImportStage::Done);
        assert!(ok.completed_at.is_some());

        let bad = tracker.get_progress("bad").unwrap();
        assert_eq!(bad.status, ImportStatus::Failed);
        assert_eq!(bad.stage, ImportStage::Persisting);
        assert_eq!(bad.errors, 1);
    }

    #[test]
    fn test_cleanup_keeps_running_sessions() {
        let tracker = ProgressTracker::new();
        start(&tracker, "running", "e1").unwrap();
        start(&tracker, "done", "e2").unwrap();
        tracker.complete_session("done", ImportStatus::Completed);

        tracker.cleanup_old_sessions(0);
        assert!(tracker.get_progress("running").is_some());
        assert!(tracker.get_progress("done").is_none());
    }
}
