//! Chat message types: OpenAI-compatible wire messages and the persisted history projection.

use serde::{Deserialize, Serialize};

/// Role label for the seed/system message.
pub const ROLE_SYSTEM: &str = "system";
/// Role label for caller utterances.
pub const ROLE_USER: &str = "user";
/// Role label for model replies.
pub const ROLE_ASSISTANT: &str = "assistant";
/// Role label for tool results fed back to the model.
pub const ROLE_TOOL: &str = "tool";

/// One message in OpenAI-compatible chat format (conversation state and LLM wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant", "tool".
    pub role: String,
    /// Text content (none when tool_calls present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Assistant tool calls (when role is assistant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallOut>>,
    /// Tool call id for tool result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name for tool result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ROLE_SYSTEM, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ROLE_USER, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ROLE_ASSISTANT, content)
    }

    /// Assistant message that requests tool calls instead of answering.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallOut>) -> Self {
        Self {
            role: ROLE_ASSISTANT.to_string(),
            content,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
        }
    }

    /// Tool result answering one assistant tool call.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: ROLE_TOOL.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// Tool call from assistant message (OpenAI format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallOut {
    /// Unique id for this tool call.
    pub id: String,
    /// Type (e.g. "function").
    #[serde(rename = "type")]
    pub typ: String,
    /// Function name and arguments.
    pub function: FunctionCall,
}

/// Function call payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool/function name.
    pub name: String,
    /// JSON string of arguments.
    pub arguments: String,
}

/// One entry of a session's visible history: `{role, content}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_ASSISTANT.to_string(),
            content: content.into(),
        }
    }
}
