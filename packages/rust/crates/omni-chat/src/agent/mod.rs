//! Conversational agent capability.
//!
//! The turn orchestrator depends only on [`ConversationalAgent`]. Concrete bindings are
//! [`ModelAgent`] (model only) and [`ToolAgent`] (model plus tool-call loop), built per
//! session by an [`AgentFactory`].

mod factory;
mod model;
mod tool_agent;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::session::ConversationState;

pub use factory::OpenAiAgentFactory;
pub use model::ModelAgent;
pub use tool_agent::ToolAgent;

/// Result of one successful agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub reply: String,
    /// Conversation state after this call (input and reply appended).
    pub state: ConversationState,
}

/// `respond(conversationState, input) -> (reply, updatedState)`.
#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    /// Short variant label for logs.
    fn label(&self) -> &str;

    /// Produce a reply to `input` given the conversation so far.
    ///
    /// Failures propagate unchanged; implementations do not retry.
    async fn respond(
        &self,
        state: ConversationState,
        input: &str,
    ) -> Result<AgentReply, AgentError>;
}

/// Inputs needed to bind an agent for one session.
#[derive(Clone, Copy)]
pub struct AgentBindingRequest<'a> {
    pub model_api_key: &'a str,
    pub search_api_key: Option<&'a str>,
    pub system_prompt: &'a str,
}

impl std::fmt::Debug for AgentBindingRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBindingRequest")
            .field("model_api_key", &"<redacted>")
            .field("search_api_key", &self.search_api_key.map(|_| "<redacted>"))
            .field("system_prompt_chars", &self.system_prompt.chars().count())
            .finish()
    }
}

/// Builds the per-session agent binding.
pub trait AgentFactory: Send + Sync {
    fn build(
        &self,
        request: &AgentBindingRequest<'_>,
    ) -> anyhow::Result<Arc<dyn ConversationalAgent>>;
}

pub(crate) fn non_empty_reply(content: Option<String>) -> Result<String, AgentError> {
    content
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AgentError::ProviderError("model returned an empty reply".to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/agent.rs"]
mod tests;
