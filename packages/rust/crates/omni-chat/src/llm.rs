//! Chat-completions client for the model provider; the wire shape is OpenAI-compatible.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::session::{ChatMessage, ToolCallOut};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct ToolDef {
    #[serde(rename = "type")]
    typ: String,
    function: FunctionDef,
}

#[derive(Debug, Serialize)]
struct FunctionDef {
    name: String,
    description: Option<String>,
    parameters: Option<serde_json::Value>,
}

/// Only `choices[0].message` is read.
#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallOut>>,
}

impl AssistantMessage {
    /// Non-empty tool calls requested by the model, if any.
    pub fn requested_tool_calls(&self) -> Option<&[ToolCallOut]> {
        self.tool_calls
            .as_deref()
            .filter(|calls| !calls.is_empty())
    }
}

/// One chat-completions round trip; implemented by [`LlmClient`] and by test doubles.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `tools_json` is `None` when the model must answer in plain text.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools_json: Option<Vec<serde_json::Value>>,
    ) -> Result<AssistantMessage, AgentError>;
}

/// Provider client bound to one endpoint, model and key.
pub struct LlmClient {
    client: reqwest::Client,
    inference_url: String,
    model: String,
    temperature: f32,
    api_key: String,
    request_timeout_secs: u64,
}

impl LlmClient {
    pub fn new(
        inference_url: String,
        model: String,
        temperature: f32,
        api_key: String,
        request_timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let request_timeout_secs = request_timeout_secs.max(1);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            inference_url,
            model,
            temperature,
            api_key,
            request_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, error: &reqwest::Error) -> AgentError {
        if error.is_timeout() {
            return AgentError::Timeout {
                after_secs: self.request_timeout_secs,
            };
        }
        AgentError::ProviderError(format!("LLM request failed: {error}"))
    }
}

/// Map a non-success provider status to the agent error taxonomy.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> AgentError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(truncate_body(body)),
        _ => AgentError::ProviderError(format!("LLM API error {status}: {}", truncate_body(body))),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 512;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push('…');
    out
}

fn to_tool_defs(list: Vec<serde_json::Value>) -> Vec<ToolDef> {
    list.into_iter()
        .filter_map(|v| {
            let name = v.get("name")?.as_str()?.to_string();
            let description = v
                .get("description")
                .and_then(|d| d.as_str())
                .map(String::from);
            let parameters = v
                .get("parameters")
                .cloned()
                .or_else(|| v.get("input_schema").cloned());
            Some(ToolDef {
                typ: "function".to_string(),
                function: FunctionDef {
                    name,
                    description,
                    parameters,
                },
            })
        })
        .collect()
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools_json: Option<Vec<serde_json::Value>>,
    ) -> Result<AssistantMessage, AgentError> {
        let tools = tools_json.map(to_tool_defs).filter(|defs| !defs.is_empty());
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            tool_choice: tools.as_ref().map(|_| "auto".to_string()),
            tools,
        };
        let res = self
            .client
            .post(&self.inference_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let status = res.status();
        let text = res.text().await.map_err(|e| self.transport_error(&e))?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }
        let parsed: CompletionEnvelope = serde_json::from_str(&text).map_err(|e| {
            AgentError::ProviderError(format!(
                "LLM response parse error: {e}; body: {}",
                truncate_body(&text)
            ))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::ProviderError("LLM response has no choices".to_string()))
    }
}

#[cfg(test)]
#[path = "../tests/unit/llm.rs"]
mod tests;
