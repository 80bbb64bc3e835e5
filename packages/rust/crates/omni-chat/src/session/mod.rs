//! Session namespace: message types, records, store, factory, turn orchestration and the
//! manager facade.

mod factory;
mod manager;
mod message;
mod record;
mod store;
mod turn;

pub use factory::{
    Credentials, MODEL_API_KEY_ENV, SEARCH_API_KEY_ENV, SessionFactory, format_initial_prompt,
};
pub use manager::{ChatReply, SessionManager, SessionManagerConfig};
pub use message::{
    ChatMessage, FunctionCall, HistoryEntry, ROLE_ASSISTANT, ROLE_SYSTEM, ROLE_TOOL, ROLE_USER,
    ToolCallOut,
};
pub use record::{ConversationState, SessionRecord, SessionSummary, SessionView};
pub use store::{SessionListing, SessionStore};
pub use turn::{TurnOrchestrator, TurnOutcome};
