use std::sync::Arc;

use anyhow::Context;

use super::{AgentBindingRequest, AgentFactory, ConversationalAgent, ModelAgent, ToolAgent};
use crate::config::{AgentConfig, ToolsConfig};
use crate::llm::{ChatBackend, LlmClient};
use crate::observability::SessionEvent;
use crate::tools::{build_image_tool, build_tool_set};

/// Builds OpenAI-compatible bindings: one [`LlmClient`] plus the configured tool set.
#[derive(Debug, Clone)]
pub struct OpenAiAgentFactory {
    agent: AgentConfig,
    tools: ToolsConfig,
}

impl OpenAiAgentFactory {
    pub fn new(agent: AgentConfig, tools: ToolsConfig) -> Self {
        Self { agent, tools }
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn tools_config(&self) -> &ToolsConfig {
        &self.tools
    }
}

impl AgentFactory for OpenAiAgentFactory {
    fn build(
        &self,
        request: &AgentBindingRequest<'_>,
    ) -> anyhow::Result<Arc<dyn ConversationalAgent>> {
        let client = LlmClient::new(
            self.agent.inference_url.clone(),
            self.agent.model.clone(),
            self.agent.temperature,
            request.model_api_key.to_string(),
            self.agent.request_timeout_secs,
        )
        .context("failed to build model client")?;
        let backend: Arc<dyn ChatBackend> = Arc::new(client);

        let mut tools = build_tool_set(&self.tools, request.search_api_key);
        tools.extend(build_image_tool(&self.tools, request.model_api_key));

        let agent: Arc<dyn ConversationalAgent> = if tools.is_empty() {
            Arc::new(ModelAgent::new(backend, request.system_prompt))
        } else {
            Arc::new(ToolAgent::new(
                backend,
                request.system_prompt,
                tools,
                self.agent.max_tool_rounds,
            ))
        };
        tracing::debug!(
            event = SessionEvent::AgentBindingBuilt.as_str(),
            agent = agent.label(),
            model = %self.agent.model,
            search = self.tools.search_enabled,
            browser = self.tools.browser_enabled,
            image = self.tools.image_enabled,
            "agent binding built"
        );
        Ok(agent)
    }
}
