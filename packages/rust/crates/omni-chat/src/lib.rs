//! Conversational session manager: an HTTP chat gateway over per-session LLM agents.
//!
//! - Session store, factory and turn orchestrator keep each session's history consistent
//!   while agent calls are in flight.
//! - A persistence bridge mirrors every session's history to an external record store
//!   (in-memory or Valkey) without blocking replies.

#![allow(missing_docs)]

mod agent;
mod config;
mod error;
mod gateway;
mod llm;
mod observability;
mod persistence;
mod session;
mod tools;

pub use agent::{
    AgentBindingRequest, AgentFactory, AgentReply, ConversationalAgent, ModelAgent,
    OpenAiAgentFactory, ToolAgent,
};
pub use config::{
    AgentConfig, AgentSettings, GatewaySettings, OPENAI_DEFAULT_URL, OPENAI_IMAGES_DEFAULT_URL,
    PersistenceSettings, RuntimeSettings, SERPAPI_DEFAULT_URL, ToolsConfig, ToolsSettings,
    load_runtime_settings, load_runtime_settings_from_paths, runtime_settings_paths,
    set_config_home_override,
};
pub use error::{AgentError, ChatError, StoreError};
pub use gateway::{
    ApiError, ChatRequest, ChatRequestBody, GatewayHealthResponse, GatewayState, MAX_INPUT_CHARS,
    MAX_SESSION_ID_CHARS, MessageResponse, PersistenceHealthResponse, SessionListResponse,
    SessionResponse, router, run_http, run_stdio, run_stdio_with, validate_chat_request,
};
pub use llm::{AssistantMessage, ChatBackend, LlmClient};
pub use observability::SessionEvent;
pub use persistence::{
    CreateOutcome, DEFAULT_VALKEY_KEY_PREFIX, HistoryStore, MemoryHistoryStore, PersistedSession,
    PersistenceBridge, PersistenceStats, RecordKey, SyncOutcome, ValkeyHistoryStore,
};
pub use session::{
    ChatMessage, ChatReply, ConversationState, Credentials, FunctionCall, HistoryEntry,
    MODEL_API_KEY_ENV, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_TOOL, ROLE_USER, SEARCH_API_KEY_ENV,
    SessionFactory, SessionListing, SessionManager, SessionManagerConfig, SessionRecord,
    SessionStore, SessionSummary, SessionView, ToolCallOut, TurnOrchestrator, TurnOutcome,
    format_initial_prompt,
};
pub use tools::{
    BrowserTool, ImageTool, SearchTool, Tool, UnavailableTool, build_image_tool, build_tool_set,
    html_to_text, summarize_search_results, tool_definitions,
};
