//! Write-behind persistence of session history to an external record store.
//!
//! One record per session id with fields `sessionId` and `history` (JSON text). The
//! [`PersistenceBridge`] creates the record on a session's first successful turn and
//! overwrites its history on every later turn.

mod bridge;
mod memory;
mod valkey;

use async_trait::async_trait;
use serde::Serialize;

use crate::session::HistoryEntry;

pub use bridge::{PersistenceBridge, PersistenceStats, SyncOutcome};
pub use memory::MemoryHistoryStore;
pub use valkey::{DEFAULT_VALKEY_KEY_PREFIX, ValkeyHistoryStore};

/// Opaque handle of one stored record, returned by [`HistoryStore::find`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(pub String);

/// Outcome of [`HistoryStore::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A record for this session id already exists; nothing was written.
    AlreadyExists,
}

/// Stored record as read back from the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub session_id: String,
    /// Serialized history text.
    pub history: String,
}

impl PersistedSession {
    /// Decode the stored history text; an empty text is an empty history.
    pub fn decode_history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        if self.history.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&self.history)?)
    }
}

/// Create-if-absent / update-by-filter contract of the external store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;

    async fn create(&self, session_id: &str, history_json: &str) -> anyhow::Result<CreateOutcome>;

    /// Locate the record for `session_id`; `None` when it does not exist.
    async fn find(&self, session_id: &str) -> anyhow::Result<Option<RecordKey>>;

    /// Overwrite the stored history; `false` when the record vanished.
    async fn update(&self, key: &RecordKey, history_json: &str) -> anyhow::Result<bool>;

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<PersistedSession>>;
}
