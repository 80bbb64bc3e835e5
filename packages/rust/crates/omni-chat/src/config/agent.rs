//! Agent binding configuration: inference API, model parameters, persona, tool set.

use serde::{Deserialize, Serialize};

/// OpenAI chat-completions endpoint used when nothing else is configured.
pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
/// OpenAI image-generation endpoint used by the image tool.
pub const OPENAI_IMAGES_DEFAULT_URL: &str = "https://api.openai.com/v1/images/generations";
/// SerpAPI JSON search endpoint used by the search tool.
pub const SERPAPI_DEFAULT_URL: &str = "https://serpapi.com/search.json";

/// Model and persona parameters shared by every session's agent binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chat completions URL (e.g. `https://api.openai.com/v1/chat/completions`).
    #[serde(default = "default_inference_url")]
    pub inference_url: String,
    /// Model id sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Assistant persona name substituted into the initial prompt.
    #[serde(default = "default_persona_name")]
    pub persona_name: String,
    /// Max LLM rounds with tool calls before forcing a plain answer.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    /// Per HTTP request timeout towards the provider.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_inference_url() -> String {
    OPENAI_DEFAULT_URL.to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_persona_name() -> String {
    "Ava".to_string()
}
fn default_max_tool_rounds() -> u32 {
    5
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            inference_url: default_inference_url(),
            model: default_model(),
            temperature: default_temperature(),
            persona_name: default_persona_name(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Which auxiliary tools each session's agent gets, and how they are parameterised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Web search through SerpAPI (needs `SERPAPI_API_KEY`).
    #[serde(default = "default_search_enabled")]
    pub search_enabled: bool,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// SerpAPI `location` parameter.
    #[serde(default = "default_search_location")]
    pub search_location: String,
    /// SerpAPI interface language (`hl`).
    #[serde(default = "default_search_hl")]
    pub search_hl: String,
    /// SerpAPI country (`gl`).
    #[serde(default = "default_search_gl")]
    pub search_gl: String,
    /// Fetch a web page and return its readable text.
    #[serde(default)]
    pub browser_enabled: bool,
    /// Max characters of page text handed back to the model.
    #[serde(default = "default_browser_max_chars")]
    pub browser_max_chars: usize,
    /// Generate images through the provider's image API.
    #[serde(default)]
    pub image_enabled: bool,
    #[serde(default = "default_image_url")]
    pub image_url: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
    /// Per tool HTTP request timeout.
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_enabled() -> bool {
    true
}
fn default_search_url() -> String {
    SERPAPI_DEFAULT_URL.to_string()
}
fn default_search_location() -> String {
    "Ho Chi Minh City,Ho Chi Minh City,Vietnam".to_string()
}
fn default_search_hl() -> String {
    "vi".to_string()
}
fn default_search_gl() -> String {
    "vn".to_string()
}
fn default_browser_max_chars() -> usize {
    8_000
}
fn default_image_url() -> String {
    OPENAI_IMAGES_DEFAULT_URL.to_string()
}
fn default_image_size() -> String {
    "512x512".to_string()
}
fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_enabled: default_search_enabled(),
            search_url: default_search_url(),
            search_location: default_search_location(),
            search_hl: default_search_hl(),
            search_gl: default_search_gl(),
            browser_enabled: false,
            browser_max_chars: default_browser_max_chars(),
            image_enabled: false,
            image_url: default_image_url(),
            image_size: default_image_size(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    /// Configuration with every tool switched off (model-only bindings).
    pub fn disabled() -> Self {
        Self {
            search_enabled: false,
            browser_enabled: false,
            image_enabled: false,
            ..Self::default()
        }
    }
}
