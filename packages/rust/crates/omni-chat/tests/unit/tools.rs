use serde_json::json;

use super::*;

#[tokio::test]
async fn search_without_key_becomes_unavailable_tool() {
    let config = ToolsConfig::default();
    let tools = build_tool_set(&config, None);
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name(), "search");

    let error = tools[0]
        .execute(json!({"query": "weather"}))
        .await
        .expect_err("unavailable tool must fail");
    let message = format!("{error:#}");
    assert!(message.contains("unavailable"), "{message}");
    assert!(message.contains("SERPAPI_API_KEY"), "{message}");
}

#[test]
fn disabled_config_builds_no_tools() {
    let tools = build_tool_set(&ToolsConfig::disabled(), Some("serp-key"));
    assert!(tools.is_empty());
    assert!(build_image_tool(&ToolsConfig::disabled(), "sk-test").is_none());
}

#[test]
fn enabled_tools_are_built_in_stable_order() {
    let config = ToolsConfig {
        browser_enabled: true,
        image_enabled: true,
        ..ToolsConfig::default()
    };
    let mut tools = build_tool_set(&config, Some("serp-key"));
    tools.extend(build_image_tool(&config, "sk-test"));
    let names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
    assert_eq!(names, vec!["search", "web_browser", "image_generation"]);

    let defs = tool_definitions(&tools);
    assert_eq!(defs.len(), 3);
    assert_eq!(defs[0]["parameters"]["required"][0], "query");
    assert_eq!(defs[1]["parameters"]["required"][0], "url");
}

#[test]
fn required_str_arg_rejects_blank_values() {
    assert!(required_str_arg(&json!({"query": "   "}), "query").is_err());
    assert!(required_str_arg(&json!({}), "query").is_err());
    assert_eq!(
        required_str_arg(&json!({"query": " rust "}), "query").expect("value"),
        "rust"
    );
}

#[test]
fn summarize_prefers_answer_box() {
    let payload = json!({
        "answer_box": {"answer": "31°C"},
        "organic_results": [{"title": "Weather", "snippet": "Hot"}]
    });
    assert_eq!(summarize_search_results(&payload), "31°C");
}

#[test]
fn summarize_falls_back_to_organic_snippets() {
    let payload = json!({
        "organic_results": [
            {"title": "A", "snippet": "first"},
            {"snippet": "second"},
            {"title": "no snippet"},
            {"title": "C", "snippet": "third"},
            {"title": "D", "snippet": "fourth"}
        ]
    });
    assert_eq!(
        summarize_search_results(&payload),
        "A: first\nsecond\nC: third"
    );
}

#[test]
fn summarize_reports_empty_results() {
    assert_eq!(
        summarize_search_results(&json!({})),
        "No good search result found"
    );
}

#[test]
fn html_to_text_strips_scripts_and_tags() {
    let html = r#"<html><head><style>p{color:red}</style><script>alert(1)</script></head>
        <body><h1>Title</h1><p>Hello &amp; welcome</p><div>Second&nbsp;line</div></body></html>"#;
    let text = html_to_text(html).expect("convert");
    assert_eq!(text, "Title\nHello & welcome\nSecond line");
}
