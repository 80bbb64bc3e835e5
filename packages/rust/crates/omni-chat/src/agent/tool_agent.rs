use std::sync::Arc;

use async_trait::async_trait;

use super::model::request_messages;
use super::{AgentReply, ConversationalAgent, non_empty_reply};
use crate::error::AgentError;
use crate::llm::{AssistantMessage, ChatBackend};
use crate::observability::SessionEvent;
use crate::session::{ChatMessage, ConversationState, ToolCallOut};
use crate::tools::{Tool, tool_definitions};

/// Model plus tools: runs the OpenAI tool-call loop until the model answers in text.
///
/// Tool failures are fed back to the model as tool results; they never fail the turn.
/// After `max_tool_rounds` rounds that all requested tools, one last call is made
/// without tools to force a text answer.
pub struct ToolAgent {
    backend: Arc<dyn ChatBackend>,
    system_prompt: String,
    tools: Vec<Arc<dyn Tool>>,
    max_tool_rounds: u32,
}

impl ToolAgent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        system_prompt: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            backend,
            system_prompt: system_prompt.into(),
            tools,
            max_tool_rounds: max_tool_rounds.max(1),
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    async fn call_model(
        &self,
        state: &ConversationState,
        tools_json: Option<Vec<serde_json::Value>>,
    ) -> Result<AssistantMessage, AgentError> {
        self.backend
            .chat(request_messages(&self.system_prompt, state), tools_json)
            .await
            .inspect_err(|error| {
                tracing::warn!(
                    event = SessionEvent::AgentProviderCallFailed.as_str(),
                    agent = self.label(),
                    kind = error.kind(),
                    error = %error,
                    "model call failed"
                );
            })
    }

    async fn invoke_tool(&self, call: &ToolCallOut) -> String {
        let name = call.function.name.as_str();
        let result = match self.tools.iter().find(|tool| tool.name() == name) {
            None => Err(anyhow::anyhow!("unknown tool")),
            Some(tool) => match parse_arguments(&call.function.arguments) {
                Ok(args) => tool.execute(args).await,
                Err(error) => Err(error),
            },
        };
        match result {
            Ok(output) => {
                tracing::debug!(
                    event = SessionEvent::AgentToolInvoked.as_str(),
                    tool = name,
                    output_chars = output.chars().count(),
                    "tool call completed"
                );
                output
            }
            Err(error) => {
                tracing::warn!(
                    event = SessionEvent::AgentToolFailed.as_str(),
                    tool = name,
                    error = %error,
                    "tool call failed"
                );
                format!("tool `{name}` call failed: {error:#}")
            }
        }
    }
}

fn parse_arguments(raw: &str) -> anyhow::Result<serde_json::Value> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    serde_json::from_str(raw).map_err(|error| anyhow::anyhow!("invalid tool arguments: {error}"))
}

#[async_trait]
impl ConversationalAgent for ToolAgent {
    fn label(&self) -> &str {
        "model+tools"
    }

    async fn respond(
        &self,
        state: ConversationState,
        input: &str,
    ) -> Result<AgentReply, AgentError> {
        let mut state = state;
        state.push(ChatMessage::user(input));
        let tools_json = tool_definitions(&self.tools);

        for round in 1..=self.max_tool_rounds {
            tracing::debug!(
                event = SessionEvent::AgentToolRoundStarted.as_str(),
                round,
                max_rounds = self.max_tool_rounds,
                "agent round started"
            );
            let message = self.call_model(&state, Some(tools_json.clone())).await?;
            let Some(calls) = message.requested_tool_calls().map(<[ToolCallOut]>::to_vec) else {
                let reply = non_empty_reply(message.content)?;
                state.push(ChatMessage::assistant(reply.clone()));
                return Ok(AgentReply { reply, state });
            };
            state.push(ChatMessage::assistant_tool_calls(
                message.content.clone(),
                calls.clone(),
            ));
            for call in &calls {
                let output = self.invoke_tool(call).await;
                state.push(ChatMessage::tool_result(
                    call.id.clone(),
                    call.function.name.clone(),
                    output,
                ));
            }
        }

        tracing::warn!(
            event = SessionEvent::AgentToolRoundsExhausted.as_str(),
            max_rounds = self.max_tool_rounds,
            "tool rounds exhausted; requesting a plain answer"
        );
        let message = self.call_model(&state, None).await?;
        let reply = non_empty_reply(message.content)?;
        state.push(ChatMessage::assistant(reply.clone()));
        Ok(AgentReply { reply, state })
    }
}
