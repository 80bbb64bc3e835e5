//! One request/response cycle against a session's agent.

use std::sync::Arc;
use std::time::Duration;

use super::message::HistoryEntry;
use super::record::SessionRecord;
use crate::error::{AgentError, ChatError};
use crate::observability::SessionEvent;
use crate::persistence::PersistenceBridge;

/// Reply of one successful turn and the session history after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub history: Vec<HistoryEntry>,
    /// The turn had no input and used the initial prompt.
    pub greeting: bool,
}

/// Drives turns: agent call under a timeout, atomic history commit, then a detached
/// persistence sync.
#[derive(Clone)]
pub struct TurnOrchestrator {
    bridge: PersistenceBridge,
    default_timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(bridge: PersistenceBridge, default_timeout: Duration) -> Self {
        Self {
            bridge,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn bridge(&self) -> &PersistenceBridge {
        &self.bridge
    }

    /// Run one turn.
    ///
    /// Absent or blank input makes this a greeting turn: the initial prompt is sent and
    /// only the reply is appended. On failure or timeout the history is untouched.
    pub async fn run(
        &self,
        record: &Arc<SessionRecord>,
        input: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<TurnOutcome, ChatError> {
        let input = input.filter(|text| !text.trim().is_empty());
        let greeting = input.is_none();
        let effective_input = input.unwrap_or_else(|| record.initial_prompt());
        let budget = timeout.unwrap_or(self.default_timeout);
        let session_id = record.id();

        let (state, base_len) = record.conversation_snapshot();
        let started = if greeting {
            SessionEvent::TurnGreeting
        } else {
            SessionEvent::TurnStarted
        };
        tracing::debug!(
            event = started.as_str(),
            session_id,
            agent = record.agent().label(),
            input_chars = effective_input.chars().count(),
            timeout_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            "turn started"
        );

        let result =
            match tokio::time::timeout(budget, record.agent().respond(state, effective_input))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AgentError::Timeout {
                    after_secs: budget.as_secs(),
                }),
            };
        let reply = match result {
            Ok(reply) => reply,
            Err(source) => {
                tracing::warn!(
                    event = SessionEvent::TurnFailed.as_str(),
                    session_id,
                    kind = source.kind(),
                    error = %source,
                    "turn failed; history unchanged"
                );
                return Err(ChatError::AgentInvocationFailed {
                    session_id: session_id.to_string(),
                    source,
                });
            }
        };

        let history = record.commit_turn(base_len, &reply.state, input, &reply.reply);
        tracing::info!(
            event = SessionEvent::TurnCompleted.as_str(),
            session_id,
            greeting,
            history_len = history.len(),
            reply_chars = reply.reply.chars().count(),
            "turn completed"
        );
        self.bridge.spawn_sync(Arc::clone(record));

        Ok(TurnOutcome {
            reply: reply.reply,
            history,
            greeting,
        })
    }
}
