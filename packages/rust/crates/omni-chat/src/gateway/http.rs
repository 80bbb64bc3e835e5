//! HTTP gateway: chat turns and session administration over JSON.
//!
//! Validation failures are 400, unknown sessions 404, agent failures map to 429/502/504,
//! a missing model credential to 503. Every error body is
//! `{"error": {"category", "message", "retriable"}}`; agent failures also carry the
//! `sessionId` the caller can retry against.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::error::{AgentError, ChatError};
use crate::observability::SessionEvent;
use crate::persistence::PersistenceStats;
use crate::session::{ChatReply, HistoryEntry, SessionManager, SessionSummary};

/// Longest accepted `input`, in characters.
pub const MAX_INPUT_CHARS: usize = 16_000;
/// Longest accepted `sessionId`, in characters.
pub const MAX_SESSION_ID_CHARS: usize = 128;

/// Fields of a chat request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

/// `POST /chat` body: `{"data": {...}}` or the flat object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChatRequestBody {
    Wrapped { data: ChatRequest },
    Plain(ChatRequest),
}

impl ChatRequestBody {
    pub fn into_request(self) -> ChatRequest {
        match self {
            Self::Wrapped { data } => data,
            Self::Plain(request) => request,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PersistenceHealthResponse {
    pub backend: &'static str,
    #[serde(flatten)]
    pub stats: PersistenceStats,
}

/// Response body for the gateway health endpoint.
#[derive(Debug, Serialize)]
pub struct GatewayHealthResponse {
    pub status: &'static str,
    pub turn_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_turns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight_turns: Option<usize>,
    pub live_sessions: usize,
    pub model_credential_present: bool,
    pub persistence: PersistenceHealthResponse,
}

/// Structured error response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub category: &'static str,
    pub message: String,
    pub retriable: bool,
    pub session_id: Option<String>,
}

impl ApiError {
    fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            category: "unavailable",
            message: message.into(),
            retriable: true,
            session_id: None,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        let status = match &error {
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::MissingCredential(_) => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::SessionCreationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ChatError::AgentInvocationFailed { source, .. } => match source {
                AgentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                AgentError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                AgentError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            },
        };
        let session_id = match &error {
            ChatError::AgentInvocationFailed { session_id, .. } => Some(session_id.clone()),
            _ => None,
        };
        Self {
            status,
            category: error.category(),
            message: error.to_string(),
            retriable: error.is_retriable(),
            session_id,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "category": self.category,
            "message": self.message,
            "retriable": self.retriable,
        });
        if let Some(session_id) = self.session_id {
            error["sessionId"] = json!(session_id);
        }
        let body = json!({ "error": error });
        (self.status, Json(body)).into_response()
    }
}

/// Validate a chat request; a blank `sessionId` means "start new", blank `input` means
/// a greeting turn. Non-blank input is passed through verbatim.
pub fn validate_chat_request(
    request: &ChatRequest,
) -> Result<(Option<String>, Option<String>), ChatError> {
    let session_id = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string);
    if session_id
        .as_deref()
        .is_some_and(|id| id.chars().count() > MAX_SESSION_ID_CHARS)
    {
        return Err(ChatError::InvalidRequest(format!(
            "sessionId must be at most {MAX_SESSION_ID_CHARS} characters"
        )));
    }
    let input = request
        .input
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(ToString::to_string);
    if input
        .as_deref()
        .is_some_and(|text| text.chars().count() > MAX_INPUT_CHARS)
    {
        return Err(ChatError::InvalidRequest(format!(
            "input must be at most {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok((session_id, input))
}

fn validate_path_session_id(session_id: &str) -> Result<&str, ChatError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(ChatError::InvalidRequest(
            "sessionId must be non-empty".to_string(),
        ));
    }
    Ok(session_id)
}

/// Shared state for the HTTP server: session manager + optional concurrency limit.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: SessionManager,
    /// When Some, limits concurrent chat turns; excess requests wait for a slot.
    pub concurrency_semaphore: Option<Arc<Semaphore>>,
    pub max_concurrent_turns: Option<usize>,
}

async fn handle_chat(
    State(state): State<GatewayState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) =
        body.map_err(|rejection| ChatError::InvalidRequest(rejection.body_text()))?;
    let (session_id, input) = validate_chat_request(&body.into_request())?;
    let _permit = if let Some(ref sem) = state.concurrency_semaphore {
        Some(
            sem.acquire()
                .await
                .map_err(|_| ApiError::unavailable("concurrency limit closed"))?,
        )
    } else {
        None
    };
    let reply = state
        .manager
        .chat(session_id.as_deref(), input.as_deref())
        .await?;
    Ok(Json(reply))
}

async fn handle_get_session(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = validate_path_session_id(&session_id)?;
    let view = state.manager.require_session(session_id).await?;
    Ok(Json(SessionResponse {
        session_id: view.session_id,
        history: view.history,
    }))
}

async fn handle_delete_session(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session_id = validate_path_session_id(&session_id)?;
    if !state.manager.delete_session(session_id).await {
        return Err(ChatError::SessionNotFound(session_id.to_string()).into());
    }
    Ok(Json(MessageResponse {
        message: "Session deleted",
        removed: None,
    }))
}

async fn handle_clear_sessions(State(state): State<GatewayState>) -> Json<MessageResponse> {
    let removed = state.manager.clear_sessions().await;
    Json(MessageResponse {
        message: "Sessions cleared",
        removed: Some(removed),
    })
}

async fn handle_list_sessions(State(state): State<GatewayState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.manager.list_sessions().await,
    })
}

async fn handle_health(State(state): State<GatewayState>) -> Json<GatewayHealthResponse> {
    let in_flight_turns = state.max_concurrent_turns.and_then(|max| {
        state
            .concurrency_semaphore
            .as_ref()
            .map(|sem| max.saturating_sub(sem.available_permits()))
    });
    Json(GatewayHealthResponse {
        status: "healthy",
        turn_timeout_secs: state.manager.turn_timeout().as_secs(),
        max_concurrent_turns: state.max_concurrent_turns,
        in_flight_turns,
        live_sessions: state.manager.live_sessions().await,
        model_credential_present: state.manager.credentials().has_model_api_key(),
        persistence: PersistenceHealthResponse {
            backend: state.manager.persistence_backend(),
            stats: state.manager.persistence_stats(),
        },
    })
}

/// Build the gateway router, including the `/chat-api/...` aliases.
pub fn router(manager: SessionManager, max_concurrent_turns: Option<usize>) -> Router {
    let max_concurrent_turns = max_concurrent_turns.filter(|n| *n > 0);
    let concurrency_semaphore = max_concurrent_turns.map(|n| Arc::new(Semaphore::new(n)));
    let state = GatewayState {
        manager,
        concurrency_semaphore,
        max_concurrent_turns,
    };
    Router::new()
        .route("/health", get(handle_health))
        .route("/chat", post(handle_chat))
        .route(
            "/session/{session_id}",
            get(handle_get_session).delete(handle_delete_session),
        )
        .route("/sessions/clear", post(handle_clear_sessions))
        .route("/sessions", get(handle_list_sessions))
        .route("/chat-api/chat", post(handle_chat))
        .route(
            "/chat-api/get-session-by-id/{session_id}",
            get(handle_get_session),
        )
        .route(
            "/chat-api/delete-session-by-id/{session_id}",
            delete(handle_delete_session),
        )
        .route("/chat-api/clear-all-sessions", post(handle_clear_sessions))
        .route("/chat-api/get-all-sessions", get(handle_list_sessions))
        .with_state(state)
}

/// Run the HTTP server on `bind_addr` (e.g. `0.0.0.0:8080`).
///
/// Graceful shutdown on Ctrl+C (SIGINT) and SIGTERM (Unix); afterwards the manager drops
/// all sessions and waits up to `shutdown_grace` for pending persistence writes.
pub async fn run_http(
    manager: SessionManager,
    bind_addr: &str,
    max_concurrent_turns: Option<usize>,
    shutdown_grace: Duration,
) -> Result<()> {
    if !manager.credentials().has_model_api_key() {
        tracing::warn!(
            event = SessionEvent::GatewayCredentialMissing.as_str(),
            "OPENAI_API_KEY is not set; chat requests will fail until it is configured"
        );
    }
    let app = router(manager.clone(), max_concurrent_turns);
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway to {bind_addr}"))?;
    let max_str = max_concurrent_turns
        .filter(|n| *n > 0)
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
    tracing::info!(
        event = SessionEvent::GatewayStarted.as_str(),
        bind_addr,
        turn_timeout_secs = manager.turn_timeout().as_secs(),
        max_concurrent = %max_str,
        persistence = manager.persistence_backend(),
        "gateway listening (Ctrl+C/SIGTERM to stop)"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server failed")?;
    let drained = manager.shutdown(shutdown_grace).await;
    tracing::info!(
        event = SessionEvent::GatewayStopped.as_str(),
        drained,
        "gateway stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to listen for SIGTERM; Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
