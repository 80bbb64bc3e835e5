use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::{CreateOutcome, HistoryStore};
use crate::observability::SessionEvent;
use crate::session::{HistoryEntry, SessionRecord};

/// What one sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    /// The record was expected but is gone; nothing was written.
    RecordMissing,
    Failed(String),
    /// No history store is configured.
    Disabled,
}

/// Persistence counters reported by `/health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistenceStats {
    pub created: u64,
    pub updated: u64,
    pub missing_record: u64,
    pub failed: u64,
    pub in_flight: usize,
}

#[derive(Default)]
struct BridgeShared {
    created: AtomicU64,
    updated: AtomicU64,
    missing_record: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
    idle: Notify,
}

struct InFlightGuard(Arc<BridgeShared>);

impl InFlightGuard {
    fn enter(shared: &Arc<BridgeShared>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Best-effort adapter from session history to the external [`HistoryStore`].
///
/// Never returns an error: every anomaly is logged and counted.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Option<Arc<dyn HistoryStore>>,
    shared: Arc<BridgeShared>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self {
            store: Some(store),
            shared: Arc::default(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            shared: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store
            .as_ref()
            .map_or("none", |store| store.backend_name())
    }

    pub fn history_store(&self) -> Option<&Arc<dyn HistoryStore>> {
        self.store.as_ref()
    }

    pub fn stats(&self) -> PersistenceStats {
        PersistenceStats {
            created: self.shared.created.load(Ordering::Relaxed),
            updated: self.shared.updated.load(Ordering::Relaxed),
            missing_record: self.shared.missing_record.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            in_flight: self.shared.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Write the full history for `session_id`.
    ///
    /// `first_turn` creates the record (falling back to an update when it already
    /// exists); otherwise the record is located and overwritten.
    pub async fn sync(
        &self,
        session_id: &str,
        history: &[HistoryEntry],
        first_turn: bool,
    ) -> SyncOutcome {
        let Some(store) = self.store.as_ref() else {
            return SyncOutcome::Disabled;
        };
        let outcome = match Self::write(store.as_ref(), session_id, history, first_turn).await {
            Ok(outcome) => outcome,
            Err(error) => SyncOutcome::Failed(format!("{error:#}")),
        };
        self.record_outcome(store.backend_name(), session_id, history.len(), &outcome);
        outcome
    }

    async fn write(
        store: &dyn HistoryStore,
        session_id: &str,
        history: &[HistoryEntry],
        first_turn: bool,
    ) -> anyhow::Result<SyncOutcome> {
        let history_json = serde_json::to_string(history)?;
        if first_turn && store.create(session_id, &history_json).await? == CreateOutcome::Created
        {
            return Ok(SyncOutcome::Created);
        }
        let Some(key) = store.find(session_id).await? else {
            return Ok(SyncOutcome::RecordMissing);
        };
        Ok(if store.update(&key, &history_json).await? {
            SyncOutcome::Updated
        } else {
            SyncOutcome::RecordMissing
        })
    }

    fn record_outcome(
        &self,
        backend: &'static str,
        session_id: &str,
        history_len: usize,
        outcome: &SyncOutcome,
    ) {
        match outcome {
            SyncOutcome::Created => {
                self.shared.created.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    event = SessionEvent::PersistenceRecordCreated.as_str(),
                    session_id,
                    backend,
                    history_len,
                    "history record created"
                );
            }
            SyncOutcome::Updated => {
                self.shared.updated.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    event = SessionEvent::PersistenceRecordUpdated.as_str(),
                    session_id,
                    backend,
                    history_len,
                    "history record updated"
                );
            }
            SyncOutcome::RecordMissing => {
                self.shared.missing_record.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event = SessionEvent::PersistenceRecordMissing.as_str(),
                    session_id,
                    backend,
                    history_len,
                    "history record missing; not recreated"
                );
            }
            SyncOutcome::Failed(error) => {
                self.shared.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event = SessionEvent::PersistenceSyncFailed.as_str(),
                    session_id,
                    backend,
                    error = %error,
                    "history sync failed"
                );
            }
            SyncOutcome::Disabled => {}
        }
    }

    /// Detached sync of `record`'s latest history.
    ///
    /// Syncs of one session run one at a time; each writes the history as it is when
    /// the sync starts, so the last write carries the newest history.
    pub fn spawn_sync(&self, record: Arc<SessionRecord>) -> Option<JoinHandle<SyncOutcome>> {
        if !self.is_enabled() {
            return None;
        }
        let guard = InFlightGuard::enter(&self.shared);
        let bridge = self.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            let mut created = record.persist_gate().lock().await;
            let history = record.history();
            let outcome = bridge.sync(record.id(), &history, !*created).await;
            if matches!(outcome, SyncOutcome::Created | SyncOutcome::Updated) {
                *created = true;
            }
            outcome
        }))
    }

    /// Wait until no sync is in flight, up to `grace`; `false` on timeout.
    pub async fn drain(&self, grace: Duration) -> bool {
        let shared = Arc::clone(&self.shared);
        let wait_idle = async move {
            loop {
                let notified = shared.idle.notified();
                if shared.in_flight.load(Ordering::SeqCst) == 0 {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(grace, wait_idle).await.is_ok() {
            return true;
        }
        tracing::warn!(
            event = SessionEvent::PersistenceDrainTimedOut.as_str(),
            in_flight = self.shared.in_flight.load(Ordering::SeqCst),
            grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            "persistence drain timed out"
        );
        false
    }
}
