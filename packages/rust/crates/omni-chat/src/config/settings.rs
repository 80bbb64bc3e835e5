//! Runtime settings loader for omni-chat.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/omni-chat.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/omni-chat/settings.yaml`
//!
//! Merge precedence is user over system.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;

use super::{AgentConfig, ToolsConfig};

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/omni-chat.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "omni-chat/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";
static CONFIG_HOME_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub tools: ToolsSettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewaySettings {
    pub bind: Option<String>,
    pub turn_timeout_secs: Option<u64>,
    pub max_concurrent_turns: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSettings {
    pub inference_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub persona_name: Option<String>,
    pub max_tool_rounds: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsSettings {
    pub search_enabled: Option<bool>,
    pub search_url: Option<String>,
    pub search_location: Option<String>,
    pub search_hl: Option<String>,
    pub search_gl: Option<String>,
    pub browser_enabled: Option<bool>,
    pub browser_max_chars: Option<usize>,
    pub image_enabled: Option<bool>,
    pub image_url: Option<String>,
    pub image_size: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersistenceSettings {
    /// `memory` | `valkey` | `none`.
    pub backend: Option<String>,
    pub valkey_url: Option<String>,
    pub key_prefix: Option<String>,
}

impl RuntimeSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            gateway: self.gateway.merge(overlay.gateway),
            agent: self.agent.merge(overlay.agent),
            tools: self.tools.merge(overlay.tools),
            persistence: self.persistence.merge(overlay.persistence),
        }
    }
}

impl GatewaySettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            bind: overlay.bind.or(self.bind),
            turn_timeout_secs: overlay.turn_timeout_secs.or(self.turn_timeout_secs),
            max_concurrent_turns: overlay.max_concurrent_turns.or(self.max_concurrent_turns),
        }
    }
}

impl AgentSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            inference_url: overlay.inference_url.or(self.inference_url),
            model: overlay.model.or(self.model),
            temperature: overlay.temperature.or(self.temperature),
            persona_name: overlay.persona_name.or(self.persona_name),
            max_tool_rounds: overlay.max_tool_rounds.or(self.max_tool_rounds),
            request_timeout_secs: overlay.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    /// Apply the file values over built-in defaults.
    pub fn to_agent_config(&self) -> AgentConfig {
        let defaults = AgentConfig::default();
        AgentConfig {
            inference_url: non_blank(self.inference_url.as_deref())
                .unwrap_or(defaults.inference_url),
            model: non_blank(self.model.as_deref()).unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            persona_name: non_blank(self.persona_name.as_deref())
                .unwrap_or(defaults.persona_name),
            max_tool_rounds: self.max_tool_rounds.unwrap_or(defaults.max_tool_rounds),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        }
    }
}

impl ToolsSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            search_enabled: overlay.search_enabled.or(self.search_enabled),
            search_url: overlay.search_url.or(self.search_url),
            search_location: overlay.search_location.or(self.search_location),
            search_hl: overlay.search_hl.or(self.search_hl),
            search_gl: overlay.search_gl.or(self.search_gl),
            browser_enabled: overlay.browser_enabled.or(self.browser_enabled),
            browser_max_chars: overlay.browser_max_chars.or(self.browser_max_chars),
            image_enabled: overlay.image_enabled.or(self.image_enabled),
            image_url: overlay.image_url.or(self.image_url),
            image_size: overlay.image_size.or(self.image_size),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Apply the file values over built-in defaults.
    pub fn to_tools_config(&self) -> ToolsConfig {
        let defaults = ToolsConfig::default();
        ToolsConfig {
            search_enabled: self.search_enabled.unwrap_or(defaults.search_enabled),
            search_url: non_blank(self.search_url.as_deref()).unwrap_or(defaults.search_url),
            search_location: non_blank(self.search_location.as_deref())
                .unwrap_or(defaults.search_location),
            search_hl: non_blank(self.search_hl.as_deref()).unwrap_or(defaults.search_hl),
            search_gl: non_blank(self.search_gl.as_deref()).unwrap_or(defaults.search_gl),
            browser_enabled: self.browser_enabled.unwrap_or(defaults.browser_enabled),
            browser_max_chars: self
                .browser_max_chars
                .unwrap_or(defaults.browser_max_chars),
            image_enabled: self.image_enabled.unwrap_or(defaults.image_enabled),
            image_url: non_blank(self.image_url.as_deref()).unwrap_or(defaults.image_url),
            image_size: non_blank(self.image_size.as_deref()).unwrap_or(defaults.image_size),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }
}

impl PersistenceSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            backend: overlay.backend.or(self.backend),
            valkey_url: overlay.valkey_url.or(self.valkey_url),
            key_prefix: overlay.key_prefix.or(self.key_prefix),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Load merged runtime settings (user overrides system).
pub fn load_runtime_settings() -> RuntimeSettings {
    let (system_path, user_path) = runtime_settings_paths();
    load_runtime_settings_from_paths(&system_path, &user_path)
}

#[doc(hidden)]
pub fn runtime_settings_paths() -> (PathBuf, PathBuf) {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    (system_path, user_path)
}

#[doc(hidden)]
pub fn load_runtime_settings_from_paths(system: &Path, user: &Path) -> RuntimeSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> RuntimeSettings {
    if !path.exists() {
        return RuntimeSettings::default();
    }
    match read_settings_file(path) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{error:#}"),
                "settings file ignored"
            );
            RuntimeSettings::default()
        }
    }
}

fn read_settings_file(path: &Path) -> anyhow::Result<RuntimeSettings> {
    let raw = std::fs::read_to_string(path).context("read failed")?;
    if raw.trim().is_empty() {
        return Ok(RuntimeSettings::default());
    }
    serde_yaml::from_str(&raw).context("invalid yaml")
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().to_string_lossy().trim().is_empty())
}

fn project_root() -> PathBuf {
    env_path("PRJ_ROOT")
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Set config-home override (used by CLI `--conf`).
///
/// The path can be absolute, or relative to `PRJ_ROOT`/cwd.
pub fn set_config_home_override(path: impl Into<PathBuf>) {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return;
    }
    if CONFIG_HOME_OVERRIDE.set(path.clone()).is_err()
        && let Some(current) = CONFIG_HOME_OVERRIDE.get()
        && current != &path
    {
        tracing::warn!(
            current = %current.display(),
            ignored = %path.display(),
            "config home override already set; ignoring subsequent value"
        );
    }
}

fn resolve_config_home(project_root: &Path) -> PathBuf {
    let config_home = CONFIG_HOME_OVERRIDE
        .get()
        .cloned()
        .or_else(|| env_path("PRJ_CONFIG_HOME"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_HOME_RELATIVE_PATH));
    if config_home.is_absolute() {
        config_home
    } else {
        project_root.join(config_home)
    }
}
