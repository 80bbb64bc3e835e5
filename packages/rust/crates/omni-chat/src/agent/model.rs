use std::sync::Arc;

use async_trait::async_trait;

use super::{AgentReply, ConversationalAgent, non_empty_reply};
use crate::error::AgentError;
use crate::llm::ChatBackend;
use crate::observability::SessionEvent;
use crate::session::{ChatMessage, ConversationState};

/// Model-only binding: system prompt + conversation + input, one completion call.
pub struct ModelAgent {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
}

impl ModelAgent {
    pub fn new(backend: Arc<dyn ChatBackend>, system_prompt: impl Into<String>) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
        }
    }
}

/// Messages for one completion call: optional system prompt followed by the conversation.
pub(crate) fn request_messages(system_prompt: &str, state: &ConversationState) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(state.len() + 1);
    if !system_prompt.trim().is_empty() {
        messages.push(ChatMessage::system(system_prompt));
    }
    messages.extend_from_slice(state.messages());
    messages
}

#[async_trait]
impl ConversationalAgent for ModelAgent {
    fn label(&self) -> &str {
        "model"
    }

    async fn respond(
        &self,
        state: ConversationState,
        input: &str,
    ) -> Result<AgentReply, AgentError> {
        let mut state = state;
        state.push(ChatMessage::user(input));
        let message = self
            .backend
            .chat(request_messages(&self.system_prompt, &state), None)
            .await
            .inspect_err(|error| {
                tracing::warn!(
                    event = SessionEvent::AgentProviderCallFailed.as_str(),
                    agent = self.label(),
                    kind = error.kind(),
                    error = %error,
                    "model call failed"
                );
            })?;
        let reply = non_empty_reply(message.content)?;
        state.push(ChatMessage::assistant(reply.clone()));
        Ok(AgentReply { reply, state })
    }
}
