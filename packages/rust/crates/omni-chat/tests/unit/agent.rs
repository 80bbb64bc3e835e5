use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::llm::{AssistantMessage, ChatBackend};
use crate::session::{ChatMessage, FunctionCall, ToolCallOut};
use crate::tools::Tool;

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<AssistantMessage, AgentError>>>,
    calls: Mutex<Vec<(Vec<ChatMessage>, bool)>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<AssistantMessage, AgentError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Vec<ChatMessage>, bool)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools_json: Option<Vec<serde_json::Value>>,
    ) -> Result<AssistantMessage, AgentError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((messages, tools_json.is_some()));
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::ProviderError("script exhausted".to_string())))
    }
}

fn text(content: &str) -> Result<AssistantMessage, AgentError> {
    Ok(AssistantMessage {
        content: Some(content.to_string()),
        tool_calls: None,
    })
}

fn tool_call(id: &str, name: &str, arguments: &str) -> Result<AssistantMessage, AgentError> {
    Ok(AssistantMessage {
        content: None,
        tool_calls: Some(vec![ToolCallOut {
            id: id.to_string(),
            typ: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }]),
    })
}

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "echo the text argument"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let text = args
            .get("text")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing text"))?;
        Ok(format!("echo: {text}"))
    }
}

#[tokio::test]
async fn model_agent_prepends_system_prompt_and_appends_exchange() {
    let backend = ScriptedBackend::new(vec![text("  Hi, I'm Ava.  ")]);
    let agent = ModelAgent::new(backend.clone(), "You are Ava.");

    let out = agent
        .respond(ConversationState::new(), "hello")
        .await
        .expect("reply");
    assert_eq!(out.reply, "Hi, I'm Ava.");
    assert_eq!(out.state.len(), 2);
    assert_eq!(out.state.messages()[0], ChatMessage::user("hello"));
    assert_eq!(out.state.messages()[1], ChatMessage::assistant("Hi, I'm Ava."));

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    let (messages, with_tools) = &calls[0];
    assert!(!with_tools);
    assert_eq!(messages[0], ChatMessage::system("You are Ava."));
    assert_eq!(messages[1], ChatMessage::user("hello"));
}

#[tokio::test]
async fn model_agent_rejects_empty_reply() {
    let backend = ScriptedBackend::new(vec![text("   ")]);
    let agent = ModelAgent::new(backend, "");
    let error = agent
        .respond(ConversationState::new(), "hello")
        .await
        .expect_err("empty reply must fail");
    assert_eq!(error.kind(), "provider_error");
}

#[tokio::test]
async fn model_agent_propagates_provider_failure() {
    let backend = ScriptedBackend::new(vec![Err(AgentError::RateLimited("slow down".to_string()))]);
    let agent = ModelAgent::new(backend.clone(), "");
    let error = agent
        .respond(ConversationState::new(), "hello")
        .await
        .expect_err("rate limit must propagate");
    assert_eq!(error, AgentError::RateLimited("slow down".to_string()));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn tool_agent_runs_tool_then_answers() {
    let backend = ScriptedBackend::new(vec![
        tool_call("call-1", "echo", r#"{"text":"ping"}"#),
        text("pong"),
    ]);
    let agent = ToolAgent::new(backend.clone(), "sys", vec![Arc::new(EchoTool) as Arc<dyn Tool>], 3);

    let out = agent
        .respond(ConversationState::new(), "say ping")
        .await
        .expect("reply");
    assert_eq!(out.reply, "pong");
    let roles: Vec<&str> = out.state.messages().iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "tool", "assistant"]);
    assert_eq!(
        out.state.messages()[2].content.as_deref(),
        Some("echo: ping")
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, with_tools)| *with_tools));
}

#[tokio::test]
async fn tool_agent_feeds_tool_failures_back_to_the_model() {
    let backend = ScriptedBackend::new(vec![
        tool_call("call-1", "missing_tool", "{}"),
        tool_call("call-2", "echo", "not json"),
        text("sorry, tools are down"),
    ]);
    let agent = ToolAgent::new(backend, "", vec![Arc::new(EchoTool) as Arc<dyn Tool>], 5);

    let out = agent
        .respond(ConversationState::new(), "try tools")
        .await
        .expect("tool failures must not fail the turn");
    assert_eq!(out.reply, "sorry, tools are down");
    let tool_outputs: Vec<&str> = out
        .state
        .messages()
        .iter()
        .filter(|m| m.role == "tool")
        .filter_map(|m| m.content.as_deref())
        .collect();
    assert_eq!(tool_outputs.len(), 2);
    assert!(tool_outputs[0].contains("unknown tool"));
    assert!(tool_outputs[1].contains("invalid tool arguments"));
}

#[tokio::test]
async fn tool_agent_forces_plain_answer_after_round_limit() {
    let backend = ScriptedBackend::new(vec![
        tool_call("call-1", "echo", r#"{"text":"a"}"#),
        tool_call("call-2", "echo", r#"{"text":"b"}"#),
        text("final"),
    ]);
    let agent = ToolAgent::new(backend.clone(), "", vec![Arc::new(EchoTool) as Arc<dyn Tool>], 2);

    let out = agent
        .respond(ConversationState::new(), "loop")
        .await
        .expect("reply");
    assert_eq!(out.reply, "final");
    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].1 && calls[1].1);
    assert!(!calls[2].1, "final call must be made without tools");
}

#[test]
fn factory_builds_model_agent_without_tools_and_tool_agent_with_tools() {
    let request = AgentBindingRequest {
        model_api_key: "sk-test",
        search_api_key: None,
        system_prompt: "sys",
    };

    let plain = OpenAiAgentFactory::new(
        crate::config::AgentConfig::default(),
        crate::config::ToolsConfig::disabled(),
    );
    assert_eq!(plain.build(&request).expect("binding").label(), "model");

    let with_search = OpenAiAgentFactory::new(
        crate::config::AgentConfig::default(),
        crate::config::ToolsConfig::default(),
    );
    assert_eq!(
        with_search.build(&request).expect("binding").label(),
        "model+tools"
    );
}

#[test]
fn binding_request_debug_redacts_keys() {
    let request = AgentBindingRequest {
        model_api_key: "sk-secret",
        search_api_key: Some("serp-secret"),
        system_prompt: "sys",
    };
    let rendered = format!("{request:?}");
    assert!(!rendered.contains("sk-secret"));
    assert!(!rendered.contains("serp-secret"));
}
