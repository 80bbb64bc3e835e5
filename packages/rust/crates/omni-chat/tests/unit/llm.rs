use reqwest::StatusCode;

use super::*;

#[test]
fn classify_status_maps_429_to_rate_limited() {
    let error = classify_status(StatusCode::TOO_MANY_REQUESTS, "  slow down  ");
    assert_eq!(error, AgentError::RateLimited("slow down".to_string()));
}

#[test]
fn classify_status_maps_auth_failure_to_provider_error() {
    let error = classify_status(StatusCode::UNAUTHORIZED, "bad key");
    match error {
        AgentError::ProviderError(message) => {
            assert!(message.contains("401"), "unexpected message: {message}");
            assert!(message.contains("bad key"));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[test]
fn classify_status_truncates_long_bodies() {
    let body = "x".repeat(2_000);
    let AgentError::ProviderError(message) = classify_status(StatusCode::BAD_GATEWAY, &body) else {
        panic!("expected provider error");
    };
    assert!(message.chars().count() < 700);
    assert!(message.ends_with('…'));
}

#[test]
fn tool_defs_accept_parameters_or_input_schema() {
    let defs = to_tool_defs(vec![
        serde_json::json!({
            "name": "search",
            "description": "web search",
            "parameters": {"type": "object"}
        }),
        serde_json::json!({
            "name": "legacy",
            "input_schema": {"type": "object", "properties": {}}
        }),
        serde_json::json!({"description": "nameless entries are skipped"}),
    ]);
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].function.name, "search");
    assert!(defs[1].function.parameters.is_some());
    assert!(defs[1].function.description.is_none());
}

#[test]
fn assistant_message_ignores_empty_tool_call_list() {
    let message: AssistantMessage =
        serde_json::from_str(r#"{"content":"hi","tool_calls":[]}"#).expect("parse");
    assert!(message.requested_tool_calls().is_none());
}
