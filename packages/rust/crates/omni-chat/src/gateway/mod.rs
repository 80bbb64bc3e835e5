//! Gateway namespace: HTTP and stdio entrypoints.

mod http;
mod stdio;

pub use http::{
    ApiError, ChatRequest, ChatRequestBody, GatewayHealthResponse, GatewayState,
    MAX_INPUT_CHARS, MAX_SESSION_ID_CHARS, MessageResponse, PersistenceHealthResponse,
    SessionListResponse, SessionResponse, router, run_http, validate_chat_request,
};
pub use stdio::{run_stdio, run_stdio_with};
