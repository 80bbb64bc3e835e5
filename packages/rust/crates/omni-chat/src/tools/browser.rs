//! Fetch a web page and hand its readable text to the model.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};

use super::{Tool, required_str_arg};
use crate::config::ToolsConfig;

pub(super) const BROWSER_TOOL_NAME: &str = "web_browser";
pub(super) const BROWSER_TOOL_DESCRIPTION: &str =
    "Open a web page by URL and read its text content. Use after search to read a result.";

pub struct BrowserTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl BrowserTool {
    pub fn new(config: &ToolsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent("omni-chat/0.1 (+web_browser tool)")
            .build()
            .context("failed to build browser http client")?;
        Ok(Self {
            client,
            max_chars: config.browser_max_chars.max(256),
        })
    }
}

/// Convert HTML to whitespace-normalised text, dropping script/style/noscript content.
pub fn html_to_text(html: &str) -> anyhow::Result<String> {
    let non_content = Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)\s*>")?;
    let block_breaks = Regex::new(r"(?i)<(br|/p|/div|/li|/h[1-6]|/tr)\b[^>]*>")?;
    let tags = Regex::new(r"(?s)<[^>]+>")?;
    let blank_runs = Regex::new(r"[ \t\r\f\v]+")?;
    let newline_runs = Regex::new(r"\n\s*\n+")?;

    let text = non_content.replace_all(html, " ");
    let text = block_breaks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, " ");
    let text = decode_entities(&text);
    let text = blank_runs.replace_all(&text, " ");
    let text = newline_runs.replace_all(&text, "\n");
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("\n[truncated]");
    out
}

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        BROWSER_TOOL_NAME
    }

    fn description(&self) -> &str {
        BROWSER_TOOL_DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Absolute http(s) URL to open"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let raw_url = required_str_arg(&args, "url")?;
        let url = reqwest::Url::parse(raw_url).with_context(|| format!("invalid url: {raw_url}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("unsupported url scheme: {}", url.scheme()));
        }
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("failed to fetch {url}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("fetch of {url} failed with status {status}"));
        }
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_none_or(|value| value.contains("html"));
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read body of {url}"))?;
        let text = if is_html { html_to_text(&body)? } else { body };
        Ok(truncate_chars(&text, self.max_chars))
    }
}
