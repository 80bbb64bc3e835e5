//! HTTP gateway integration tests: validation (400), routing, error mapping, response shape.
//! Uses in-process agents so no provider is contacted.

#![allow(missing_docs)]

mod support;

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use omni_chat::{
    AgentError, ChatError, ChatRequest, Credentials, HistoryEntry, SessionManager,
    SessionManagerConfig, router, validate_chat_request,
};
use serde_json::{Value, json};
use support::{EchoAgent, FailingAgent, StubFactory, manager_with_agent, manager_with_memory_store};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).expect("request")
}

fn echo_app() -> (Router, SessionManager) {
    let manager = manager_with_agent(Arc::new(EchoAgent::new()));
    (router(manager.clone(), None), manager)
}

#[tokio::test]
async fn chat_without_session_starts_one() {
    let (app, manager) = echo_app();

    let (status, body) = send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    let session_id = body["sessionId"].as_str().expect("sessionId");
    assert!(!session_id.is_empty());
    assert_eq!(body["reply"], "echo: hi");
    assert_eq!(
        body["history"],
        json!([
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "echo: hi" },
        ])
    );
    assert!(manager.get_session(session_id).await.is_some());
}

#[tokio::test]
async fn chat_accepts_the_data_envelope() {
    let (app, _manager) = echo_app();

    let (status, first) = send(&app, post_json("/chat", &json!({ "data": {} }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["history"].as_array().map(Vec::len), Some(1));

    let session_id = first["sessionId"].clone();
    let (status, second) = send(
        &app,
        post_json(
            "/chat",
            &json!({ "data": { "sessionId": session_id, "input": "hello" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["sessionId"], session_id);
    assert_eq!(second["history"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, manager) = echo_app();

    let (status, body) = send(
        &app,
        Request::post("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["category"], "invalid_request");
    assert_eq!(body["error"]["retriable"], false);
    assert_eq!(manager.live_sessions().await, 0);
}

#[tokio::test]
async fn oversized_fields_are_rejected() {
    let (app, manager) = echo_app();

    let long_input = "x".repeat(omni_chat::MAX_INPUT_CHARS + 1);
    let (status, _) = send(&app, post_json("/chat", &json!({ "input": long_input }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_id = "s".repeat(omni_chat::MAX_SESSION_ID_CHARS + 1);
    let (status, _) = send(
        &app,
        post_json("/chat", &json!({ "sessionId": long_id, "input": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(manager.live_sessions().await, 0);
}

#[tokio::test]
async fn get_session_returns_history_or_404() {
    let (app, _manager) = echo_app();
    let (_, chat) = send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;
    let session_id = chat["sessionId"].as_str().expect("sessionId");

    let (status, body) = send(&app, get(&format!("/session/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id);
    assert_eq!(body["history"], chat["history"]);

    let (status, body) = send(&app, get("/session/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["category"], "session_not_found");
    assert_eq!(body["error"]["message"], "Session not found: abc");
}

#[tokio::test]
async fn delete_unknown_session_is_404_and_changes_nothing() {
    let (app, manager) = echo_app();
    send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;

    let (status, _) = send(&app, delete("/session/abc")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(manager.live_sessions().await, 1);
}

#[tokio::test]
async fn delete_session_removes_it() {
    let (app, manager) = echo_app();
    let (_, chat) = send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;
    let session_id = chat["sessionId"].as_str().expect("sessionId");

    let (status, body) = send(&app, delete(&format!("/session/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session deleted");

    let (status, _) = send(&app, get(&format!("/session/{session_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(manager.live_sessions().await, 0);
}

#[tokio::test]
async fn list_and_clear_sessions() {
    let (app, _manager) = echo_app();
    for input in ["a", "b"] {
        send(&app, post_json("/chat", &json!({ "input": input }))).await;
    }

    let (status, body) = send(&app, get("/sessions")).await;
    assert_eq!(status, StatusCode::OK);
    let sessions = body["sessions"].as_array().expect("sessions");
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["messageCount"], 2);
    assert_eq!(sessions[0]["lastRole"], "assistant");

    let (status, body) = send(&app, post_json("/sessions/clear", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Sessions cleared", "removed": 2 }));

    let (_, body) = send(&app, get("/sessions")).await;
    assert_eq!(body["sessions"], json!([]));
}

#[tokio::test]
async fn legacy_routes_are_aliases() {
    let (app, _manager) = echo_app();

    let (status, chat) = send(&app, post_json("/chat-api/chat", &json!({ "input": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = chat["sessionId"].as_str().expect("sessionId");

    let (status, _) = send(
        &app,
        get(&format!("/chat-api/get-session-by-id/{session_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, get("/chat-api/get-all-sessions")).await;
    assert_eq!(listed["sessions"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        delete(&format!("/chat-api/delete-session-by-id/{session_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/chat-api/clear-all-sessions", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);
}

#[tokio::test]
async fn missing_model_credential_is_503() {
    let manager = SessionManager::new(
        Arc::new(StubFactory::new(Arc::new(EchoAgent::new()))),
        Credentials::default(),
        None,
        SessionManagerConfig::default(),
    );
    let app = router(manager.clone(), None);

    let (status, body) = send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["category"], "missing_credential");
    assert_eq!(body["error"]["retriable"], false);
    assert_eq!(manager.live_sessions().await, 0);
}

#[tokio::test]
async fn agent_failures_map_to_upstream_statuses() {
    let cases = [
        (
            AgentError::RateLimited("quota".to_string()),
            StatusCode::TOO_MANY_REQUESTS,
        ),
        (
            AgentError::ProviderError("bad gateway".to_string()),
            StatusCode::BAD_GATEWAY,
        ),
        (
            AgentError::Timeout { after_secs: 1 },
            StatusCode::GATEWAY_TIMEOUT,
        ),
    ];
    for (error, expected) in cases {
        let app = router(manager_with_agent(Arc::new(FailingAgent(error))), None);

        let (status, body) = send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;

        assert_eq!(status, expected);
        assert_eq!(body["error"]["category"], "agent_invocation_failed");
        assert_eq!(body["error"]["retriable"], true);
    }
}

#[tokio::test]
async fn failed_first_turn_reports_the_session_id_for_retry() {
    let manager = manager_with_agent(Arc::new(EchoAgent::failing_on(
        "boom",
        AgentError::RateLimited("quota".to_string()),
    )));
    let app = router(manager.clone(), None);

    let (status, body) = send(&app, post_json("/chat", &json!({ "input": "boom" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let session_id = body["error"]["sessionId"]
        .as_str()
        .expect("session id in error")
        .to_string();

    let (status, body) = send(&app, get(&format!("/session/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"], json!([]));

    let (status, body) = send(
        &app,
        post_json("/chat", &json!({ "sessionId": session_id, "input": "again" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["reply"], "echo: again");
    assert_eq!(manager.live_sessions().await, 1);
}

#[tokio::test]
async fn chat_input_is_stored_verbatim() {
    let (app, manager) = echo_app();

    let (status, body) = send(
        &app,
        post_json("/chat", &json!({ "input": "    fn main() {}\n" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let session_id = body["sessionId"].as_str().expect("session id");
    let view = manager.get_session(session_id).await.expect("session");
    assert_eq!(view.history[0], HistoryEntry::user("    fn main() {}\n"));
    assert_eq!(body["reply"], "echo:     fn main() {}\n");
}

#[test]
fn validation_failures_are_invalid_request_errors() {
    let request = ChatRequest {
        session_id: Some("s".repeat(omni_chat::MAX_SESSION_ID_CHARS + 1)),
        input: Some("hi".to_string()),
    };

    let err = validate_chat_request(&request).expect_err("too long");

    assert!(matches!(err, ChatError::InvalidRequest(_)));
    assert_eq!(err.category(), "invalid_request");
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _manager) = echo_app();

    let (status, _) = send(&app, get("/unknown")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_sessions_and_persistence() {
    let (manager, _records) = manager_with_memory_store(Arc::new(EchoAgent::new()));
    let app = router(manager.clone(), Some(4));
    send(&app, post_json("/chat", &json!({ "input": "hi" }))).await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["turn_timeout_secs"], 300);
    assert_eq!(body["max_concurrent_turns"], 4);
    assert_eq!(body["in_flight_turns"], 0);
    assert_eq!(body["live_sessions"], 1);
    assert_eq!(body["model_credential_present"], true);
    assert_eq!(body["persistence"]["backend"], "memory");
}
