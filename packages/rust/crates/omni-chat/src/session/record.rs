//! Session record: identity, agent binding, conversation state and visible history.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::message::{ChatMessage, HistoryEntry};
use crate::agent::ConversationalAgent;

/// Messages exchanged with the agent, excluding the binding's system prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Messages added after the first `base_len` entries.
    pub fn appended_since(&self, base_len: usize) -> &[ChatMessage] {
        self.messages.get(base_len..).unwrap_or(&[])
    }

    fn extend_from_slice(&mut self, messages: &[ChatMessage]) {
        self.messages.extend_from_slice(messages);
    }
}

#[derive(Debug, Default)]
struct SessionLog {
    conversation: ConversationState,
    history: Vec<HistoryEntry>,
    turns: u64,
}

/// Listing row for one live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub last_role: Option<String>,
}

/// Point-in-time copy of one session's visible state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

/// One live conversation.
///
/// `id`, agent binding, initial prompt and creation time are immutable. Conversation
/// state and history sit behind a short-lived std mutex that is never held across an
/// await; `persist_gate` serializes this session's external writes.
pub struct SessionRecord {
    id: String,
    agent: Arc<dyn ConversationalAgent>,
    initial_prompt: String,
    created_at: DateTime<Utc>,
    log: Mutex<SessionLog>,
    persist_gate: tokio::sync::Mutex<bool>,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("agent", &self.agent.label())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SessionRecord {
    pub fn new(
        id: impl Into<String>,
        agent: Arc<dyn ConversationalAgent>,
        initial_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            agent,
            initial_prompt: initial_prompt.into(),
            created_at: Utc::now(),
            log: Mutex::new(SessionLog::default()),
            persist_gate: tokio::sync::Mutex::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent(&self) -> &Arc<dyn ConversationalAgent> {
        &self.agent
    }

    pub fn initial_prompt(&self) -> &str {
        &self.initial_prompt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn lock_log(&self) -> MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_log().history.clone()
    }

    pub fn history_len(&self) -> usize {
        self.lock_log().history.len()
    }

    /// Number of successfully completed turns.
    pub fn turns(&self) -> u64 {
        self.lock_log().turns
    }

    /// Copy of the conversation state plus its length, used as the merge base of a turn.
    pub fn conversation_snapshot(&self) -> (ConversationState, usize) {
        let log = self.lock_log();
        (log.conversation.clone(), log.conversation.len())
    }

    /// Atomically apply one successful turn.
    ///
    /// Only the messages the agent appended after `base_len` are merged, so a concurrent
    /// turn that committed first keeps its entries. Appends the user input (when present)
    /// and then the reply to the history; returns the resulting history.
    pub fn commit_turn(
        &self,
        base_len: usize,
        updated: &ConversationState,
        input: Option<&str>,
        reply: &str,
    ) -> Vec<HistoryEntry> {
        let mut log = self.lock_log();
        log.conversation
            .extend_from_slice(updated.appended_since(base_len));
        if let Some(input) = input {
            log.history.push(HistoryEntry::user(input));
        }
        log.history.push(HistoryEntry::assistant(reply));
        log.turns += 1;
        log.history.clone()
    }

    pub fn summary(&self) -> SessionSummary {
        let log = self.lock_log();
        SessionSummary {
            session_id: self.id.clone(),
            created_at: self.created_at,
            message_count: log.history.len(),
            last_role: log.history.last().map(|entry| entry.role.clone()),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            created_at: self.created_at,
            history: self.history(),
        }
    }

    /// Per-session persistence gate; the guarded flag records whether the external
    /// record has been created.
    pub(crate) fn persist_gate(&self) -> &tokio::sync::Mutex<bool> {
        &self.persist_gate
    }
}
