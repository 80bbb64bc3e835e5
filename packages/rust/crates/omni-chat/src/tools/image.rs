//! Image generation through the OpenAI-compatible images API.

use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, required_str_arg};
use crate::config::ToolsConfig;

pub(super) const IMAGE_TOOL_NAME: &str = "image_generation";
pub(super) const IMAGE_TOOL_DESCRIPTION: &str =
    "Generate an image from a text description. Returns a URL to the generated image.";

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

pub struct ImageTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    size: String,
}

impl ImageTool {
    pub fn new(api_key: &str, config: &ToolsConfig) -> anyhow::Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(anyhow!("image generation requires the model api key"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build image http client")?;
        Ok(Self {
            client,
            endpoint: config.image_url.clone(),
            api_key: api_key.to_string(),
            size: config.image_size.clone(),
        })
    }
}

#[async_trait]
impl Tool for ImageTool {
    fn name(&self) -> &str {
        IMAGE_TOOL_NAME
    }

    fn description(&self) -> &str {
        IMAGE_TOOL_DESCRIPTION
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Detailed description of the image to draw"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let prompt = required_str_arg(&args, "prompt")?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "prompt": prompt,
                "n": 1,
                "size": self.size,
            }))
            .send()
            .await
            .context("image generation request failed")?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("failed to read image generation response")?;
        if !status.is_success() {
            return Err(anyhow!("image generation failed with status {status}: {text}"));
        }
        let parsed: ImagesResponse =
            serde_json::from_str(&text).context("image generation response is not valid json")?;
        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("image generation returned no images"))?;
        let url = datum
            .url
            .ok_or_else(|| anyhow!("image generation returned no url"))?;
        Ok(match datum.revised_prompt {
            Some(revised) => format!("Image URL: {url}\nRevised prompt: {revised}"),
            None => format!("Image URL: {url}"),
        })
    }
}
