//! In-memory session store: session_id → session record.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::record::{SessionRecord, SessionSummary};
use crate::error::StoreError;
use crate::observability::SessionEvent;

/// Process-wide map of live sessions.
///
/// Lock sections are pure map operations; no caller holds the lock across an agent call
/// or a persistence write. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Arc<SessionRecord>>>>,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, session_id: &str) -> Option<Arc<SessionRecord>> {
        let found = self.inner.read().await.get(session_id).cloned();
        if found.is_none() {
            tracing::debug!(
                event = SessionEvent::SessionLookupMissed.as_str(),
                session_id,
                "session lookup missed"
            );
        }
        found
    }

    /// Register a record under its own id; never overwrites an existing entry.
    pub async fn insert(&self, record: Arc<SessionRecord>) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().to_string()));
        }
        let session_id = record.id().to_string();
        guard.insert(session_id.clone(), record);
        let live_sessions = guard.len();
        drop(guard);
        tracing::debug!(
            event = SessionEvent::SessionInserted.as_str(),
            session_id = %session_id,
            live_sessions,
            "session inserted"
        );
        Ok(())
    }

    /// Remove one session; `None` means it was not present and nothing changed.
    pub async fn remove(&self, session_id: &str) -> Option<Arc<SessionRecord>> {
        let removed = self.inner.write().await.remove(session_id);
        if removed.is_some() {
            tracing::debug!(
                event = SessionEvent::SessionRemoved.as_str(),
                session_id,
                "session removed"
            );
        }
        removed
    }

    /// Remove every session; returns how many were removed.
    pub async fn clear(&self) -> usize {
        let removed = {
            let mut guard = self.inner.write().await;
            let removed = guard.len();
            guard.clear();
            removed
        };
        tracing::debug!(
            event = SessionEvent::SessionsCleared.as_str(),
            removed,
            "sessions cleared"
        );
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot of the sessions present now, ordered by creation time then id.
    ///
    /// Membership is fixed at call time; summaries are computed as the listing is
    /// consumed.
    pub async fn list_all(&self) -> SessionListing {
        let mut records: Vec<Arc<SessionRecord>> =
            self.inner.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        SessionListing {
            records: records.into_iter(),
        }
    }
}

/// Single-pass iterator over a session snapshot.
pub struct SessionListing {
    records: std::vec::IntoIter<Arc<SessionRecord>>,
}

impl Iterator for SessionListing {
    type Item = SessionSummary;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|record| record.summary())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for SessionListing {}
