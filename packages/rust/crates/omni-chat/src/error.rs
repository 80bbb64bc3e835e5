//! Error types for session management and agent invocation.
//!
//! Library-facing failures are explicit `thiserror` enums; "not found" outcomes are
//! returned as values by the store and persistence bridge, never as errors.

use thiserror::Error;

/// Failure of one language-model agent call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The call did not complete within the turn budget.
    #[error("agent call timed out after {after_secs}s")]
    Timeout {
        /// Budget that was exceeded.
        after_secs: u64,
    },

    /// The provider rejected the call for rate/quota reasons.
    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    /// Any other provider, transport or response-shape failure.
    #[error("provider error: {0}")]
    ProviderError(String),
}

impl AgentError {
    /// Stable snake_case label for logs and error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::RateLimited(_) => "rate_limited",
            Self::ProviderError(_) => "provider_error",
        }
    }
}

/// Session store mutation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An entry with this identifier is already registered.
    #[error("session already exists: {0}")]
    AlreadyExists(String),
}

/// Errors surfaced by the session manager to its callers.
#[derive(Error, Debug)]
pub enum ChatError {
    /// A required credential (model API key) is not configured. Not retriable.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// No live session with this identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The agent call failed; the session history is unchanged.
    #[error("agent invocation failed for session {session_id}: {source}")]
    AgentInvocationFailed {
        /// Session whose turn failed.
        session_id: String,
        /// Underlying agent failure.
        #[source]
        source: AgentError,
    },

    /// A new session could not be registered.
    #[error("session creation failed: {0}")]
    SessionCreationFailed(String),

    /// The request was malformed (empty identifier and similar).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ChatError {
    /// Stable category string used in structured error payloads.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => "missing_credential",
            Self::SessionNotFound(_) => "session_not_found",
            Self::AgentInvocationFailed { .. } => "agent_invocation_failed",
            Self::SessionCreationFailed(_) => "session_creation_failed",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Whether the caller may resubmit the same request.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::AgentInvocationFailed { .. } | Self::SessionCreationFailed(_)
        )
    }

    /// Agent failure cause, when this is an agent invocation error.
    pub fn agent_cause(&self) -> Option<&AgentError> {
        match self {
            Self::AgentInvocationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
