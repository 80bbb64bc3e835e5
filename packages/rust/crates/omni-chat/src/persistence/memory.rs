use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::{CreateOutcome, HistoryStore, PersistedSession, RecordKey};

#[derive(Debug, Clone)]
struct StoredRow {
    key: RecordKey,
    history: String,
}

/// In-process record store; the default backend and the one tests inspect.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    rows: Mutex<HashMap<String, StoredRow>>,
    next_row: AtomicU64,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredRow>> {
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Drop a record behind the bridge's back (external deletion).
    pub fn delete_record(&self, session_id: &str) -> bool {
        self.rows().remove(session_id).is_some()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, session_id: &str, history_json: &str) -> anyhow::Result<CreateOutcome> {
        let mut rows = self.rows();
        if rows.contains_key(session_id) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        let row = self.next_row.fetch_add(1, Ordering::Relaxed) + 1;
        rows.insert(
            session_id.to_string(),
            StoredRow {
                key: RecordKey(row.to_string()),
                history: history_json.to_string(),
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn find(&self, session_id: &str) -> anyhow::Result<Option<RecordKey>> {
        Ok(self.rows().get(session_id).map(|row| row.key.clone()))
    }

    async fn update(&self, key: &RecordKey, history_json: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows();
        let Some(row) = rows.values_mut().find(|row| &row.key == key) else {
            return Ok(false);
        };
        row.history = history_json.to_string();
        Ok(true)
    }

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<PersistedSession>> {
        Ok(self.rows().get(session_id).map(|row| PersistedSession {
            session_id: session_id.to_string(),
            history: row.history.clone(),
        }))
    }
}
