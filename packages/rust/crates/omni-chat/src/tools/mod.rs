//! Auxiliary tools an agent binding may call: search, browser, image generation.
//!
//! Each tool is built independently. A tool that cannot be built is replaced by an
//! [`UnavailableTool`] so session creation still succeeds and only invocations of that
//! tool report the failure.

mod browser;
mod image;
mod search;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::ToolsConfig;
use crate::observability::SessionEvent;

pub use browser::{BrowserTool, html_to_text};
pub use image::ImageTool;
pub use search::{SearchTool, summarize_search_results};

/// A capability the model can invoke through OpenAI function calling.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name exposed to the model.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool; the returned text is fed back to the model as the tool result.
    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<String>;
}

/// Tool definitions in the `{name, description, parameters}` shape the LLM client expects.
pub fn tool_definitions(tools: &[Arc<dyn Tool>]) -> Vec<serde_json::Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "parameters": tool.parameters_schema(),
            })
        })
        .collect()
}

/// Stand-in for a tool whose construction failed; every call reports the original reason.
pub struct UnavailableTool {
    name: String,
    description: String,
    reason: String,
}

impl UnavailableTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl Tool for UnavailableTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<String> {
        Err(anyhow::anyhow!(
            "tool '{}' is unavailable: {}",
            self.name,
            self.reason
        ))
    }
}

fn or_unavailable<T: Tool + 'static>(
    name: &str,
    description: &str,
    built: anyhow::Result<T>,
) -> Arc<dyn Tool> {
    match built {
        Ok(tool) => Arc::new(tool),
        Err(error) => {
            tracing::warn!(
                event = SessionEvent::AgentToolUnavailable.as_str(),
                tool = name,
                error = %error,
                "tool construction failed; tool will report unavailability when called"
            );
            Arc::new(UnavailableTool::new(name, description, format!("{error:#}")))
        }
    }
}

/// Build the enabled tool set for one session.
///
/// `search_api_key` is optional; when search is enabled without it, the search slot
/// becomes an [`UnavailableTool`].
pub fn build_tool_set(config: &ToolsConfig, search_api_key: Option<&str>) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    if config.search_enabled {
        tools.push(or_unavailable(
            search::SEARCH_TOOL_NAME,
            search::SEARCH_TOOL_DESCRIPTION,
            SearchTool::new(search_api_key, config),
        ));
    }
    if config.browser_enabled {
        tools.push(or_unavailable(
            browser::BROWSER_TOOL_NAME,
            browser::BROWSER_TOOL_DESCRIPTION,
            BrowserTool::new(config),
        ));
    }
    tools
}

/// Image generation needs the model credential, so it is built alongside the model client.
pub fn build_image_tool(config: &ToolsConfig, model_api_key: &str) -> Option<Arc<dyn Tool>> {
    if !config.image_enabled {
        return None;
    }
    Some(or_unavailable(
        image::IMAGE_TOOL_NAME,
        image::IMAGE_TOOL_DESCRIPTION,
        ImageTool::new(model_api_key, config),
    ))
}

/// Pull one required string argument out of a tool-call arguments object.
pub(crate) fn required_str_arg<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("missing '{key}' parameter"))
}

#[cfg(test)]
#[path = "../../tests/unit/tools.rs"]
mod tests;
