//! Session manager facade: chat, get, delete, clear, list, shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::factory::{Credentials, SessionFactory};
use super::message::HistoryEntry;
use super::record::{SessionSummary, SessionView};
use super::store::SessionStore;
use super::turn::TurnOrchestrator;
use crate::agent::AgentFactory;
use crate::error::ChatError;
use crate::observability::SessionEvent;
use crate::persistence::{HistoryStore, PersistenceBridge, PersistenceStats};

const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    pub persona_name: String,
    /// Budget for one agent call when the caller gives none.
    pub turn_timeout: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            persona_name: "Ava".to_string(),
            turn_timeout: Duration::from_secs(DEFAULT_TURN_TIMEOUT_SECS),
        }
    }
}

/// Result of one chat call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    pub history: Vec<HistoryEntry>,
}

/// Entry point for every session operation; cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    factory: SessionFactory,
    orchestrator: TurnOrchestrator,
    credentials: Credentials,
}

impl SessionManager {
    /// Start with an empty store.
    pub fn new(
        agents: Arc<dyn AgentFactory>,
        credentials: Credentials,
        history_store: Option<Arc<dyn HistoryStore>>,
        config: SessionManagerConfig,
    ) -> Self {
        let store = SessionStore::new();
        let bridge = history_store.map_or_else(PersistenceBridge::disabled, PersistenceBridge::new);
        Self {
            factory: SessionFactory::new(store.clone(), agents, config.persona_name),
            orchestrator: TurnOrchestrator::new(bridge, config.turn_timeout),
            store,
            credentials,
        }
    }

    /// Replace the session factory's identifier source.
    #[must_use]
    pub fn with_id_minter(mut self, mint_id: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.factory = self.factory.with_id_minter(mint_id);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.orchestrator
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn turn_timeout(&self) -> Duration {
        self.orchestrator.default_timeout()
    }

    pub fn persistence_backend(&self) -> &'static str {
        self.orchestrator.bridge().backend_name()
    }

    pub fn persistence_stats(&self) -> PersistenceStats {
        self.orchestrator.bridge().stats()
    }

    /// Run one turn with the default timeout.
    pub async fn chat(
        &self,
        session_id: Option<&str>,
        input: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        self.chat_with_timeout(session_id, input, None).await
    }

    /// Run one turn; an absent or unknown `session_id` starts a new session.
    pub async fn chat_with_timeout(
        &self,
        session_id: Option<&str>,
        input: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<ChatReply, ChatError> {
        let existing = match session_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.store.lookup(id).await,
            None => None,
        };
        let record = match existing {
            Some(record) => record,
            None => self.factory.create(&self.credentials).await?,
        };
        let outcome = self.orchestrator.run(&record, input, timeout).await?;
        Ok(ChatReply {
            session_id: record.id().to_string(),
            reply: outcome.reply,
            history: outcome.history,
        })
    }

    pub async fn get_session(&self, session_id: &str) -> Option<SessionView> {
        self.store.lookup(session_id).await.map(|record| record.view())
    }

    /// Like [`Self::get_session`] but with not-found as [`ChatError::SessionNotFound`].
    pub async fn require_session(&self, session_id: &str) -> Result<SessionView, ChatError> {
        self.get_session(session_id)
            .await
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    /// `true` when a session was removed; `false` leaves the store unchanged.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.store.remove(session_id).await.is_some()
    }

    pub async fn clear_sessions(&self) -> usize {
        self.store.clear().await
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions: Vec<SessionSummary> = self.store.list_all().await.collect();
        tracing::debug!(
            event = SessionEvent::SessionsListed.as_str(),
            sessions = sessions.len(),
            "sessions listed"
        );
        sessions
    }

    pub async fn live_sessions(&self) -> usize {
        self.store.len().await
    }

    /// Drop every live session and wait up to `grace` for pending persistence writes.
    ///
    /// Returns `true` when all writes finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let removed = self.store.clear().await;
        let drained = self.orchestrator.bridge().drain(grace).await;
        tracing::info!(
            event = SessionEvent::SessionsCleared.as_str(),
            removed,
            drained,
            "session manager shut down"
        );
        drained
    }
}
