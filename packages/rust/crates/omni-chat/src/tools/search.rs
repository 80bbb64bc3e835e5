//! SerpAPI web search.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, required_str_arg};
use crate::config::ToolsConfig;

pub(super) const SEARCH_TOOL_NAME: &str = "search";
pub(super) const SEARCH_TOOL_DESCRIPTION: &str = "Search the web for current events, facts and anything \
     the assistant does not know. Input is a plain search query.";

const MAX_ORGANIC_RESULTS: usize = 3;

pub struct SearchTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    location: String,
    hl: String,
    gl: String,
}

impl SearchTool {
    pub fn new(api_key: Option<&str>, config: &ToolsConfig) -> anyhow::Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow!("SERPAPI_API_KEY is not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build search http client")?;
        Ok(Self {
            client,
            endpoint: config.search_url.clone(),
            api_key: api_key.to_string(),
            location: config.search_location.clone(),
            hl: config.search_hl.clone(),
            gl: config.search_gl.clone(),
        })
    }
}

/// Reduce a SerpAPI response to the text the model should read.
///
/// Preference order: direct answer box, knowledge graph description, then the top
/// organic snippets.
pub fn summarize_search_results(response: &Value) -> String {
    if let Some(answer_box) = response.get("answer_box") {
        for key in ["answer", "snippet"] {
            if let Some(text) = answer_box.get(key).and_then(Value::as_str)
                && !text.trim().is_empty()
            {
                return text.trim().to_string();
            }
        }
        if let Some(highlighted) = answer_box
            .get("snippet_highlighted_words")
            .and_then(Value::as_array)
            .and_then(|words| words.first())
            .and_then(Value::as_str)
        {
            return highlighted.to_string();
        }
    }

    if let Some(description) = response
        .get("knowledge_graph")
        .and_then(|graph| graph.get("description"))
        .and_then(Value::as_str)
    {
        return description.to_string();
    }

    let snippets = response
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|result| {
                    let snippet = result.get("snippet").and_then(Value::as_str)?;
                    let title = result.get("title").and_then(Value::as_str).unwrap_or("");
                    Some(if title.is_empty() {
                        snippet.to_string()
                    } else {
                        format!("{title}: {snippet}")
                    })
                })
                .take(MAX_ORGANIC_RESULTS)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if snippets.is_empty() {
        return "No good search result found".to_string();
    }
    snippets.join("\n")
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_TOOL_DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = required_str_arg(&args, "query")?;
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("location", self.location.as_str()),
                ("hl", self.hl.as_str()),
                ("gl", self.gl.as_str()),
                ("engine", "google"),
            ])
            .send()
            .await
            .context("search request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("search failed with status {status}: {body}"));
        }
        let payload: Value = response
            .json()
            .await
            .context("search response is not valid json")?;
        if let Some(error) = payload.get("error").and_then(Value::as_str) {
            return Err(anyhow!("search provider error: {error}"));
        }
        Ok(summarize_search_results(&payload))
    }
}
