use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use omni_chat::{
    AgentConfig, Credentials, DEFAULT_VALKEY_KEY_PREFIX, HistoryStore, MemoryHistoryStore,
    OpenAiAgentFactory, PersistenceSettings, RuntimeSettings, SessionManager,
    SessionManagerConfig, ToolsConfig, ValkeyHistoryStore,
};

use crate::resolve::{
    non_empty_env, parse_bool_from_env, parse_positive_u32_from_env, parse_temperature_from_env,
    resolve_positive_u64, resolve_string,
};

const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PersistenceBackendMode {
    Memory,
    Valkey,
    Disabled,
}

pub(crate) fn parse_persistence_backend(raw: &str) -> Option<PersistenceBackendMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "memory" => Some(PersistenceBackendMode::Memory),
        "valkey" | "redis" => Some(PersistenceBackendMode::Valkey),
        "none" | "off" | "disabled" => Some(PersistenceBackendMode::Disabled),
        _ => None,
    }
}

fn resolve_persistence_backend(settings_backend: Option<&str>) -> PersistenceBackendMode {
    if let Some(raw) = non_empty_env("OMNI_CHAT_PERSISTENCE_BACKEND") {
        if let Some(mode) = parse_persistence_backend(&raw) {
            return mode;
        }
        tracing::warn!(
            value = %raw,
            "invalid OMNI_CHAT_PERSISTENCE_BACKEND; using settings/default"
        );
    }
    if let Some(raw) = settings_backend {
        if let Some(mode) = parse_persistence_backend(raw) {
            return mode;
        }
        tracing::warn!(
            value = %raw,
            "invalid persistence.backend in settings; using default"
        );
    }
    PersistenceBackendMode::Memory
}

fn build_history_store(settings: &PersistenceSettings) -> Result<Option<Arc<dyn HistoryStore>>> {
    match resolve_persistence_backend(settings.backend.as_deref()) {
        PersistenceBackendMode::Disabled => Ok(None),
        PersistenceBackendMode::Memory => Ok(Some(Arc::new(MemoryHistoryStore::new()))),
        PersistenceBackendMode::Valkey => {
            let url = non_empty_env("VALKEY_URL")
                .or_else(|| {
                    settings
                        .valkey_url
                        .as_deref()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(ToString::to_string)
                })
                .ok_or_else(|| {
                    anyhow!(
                        "persistence backend is valkey but neither VALKEY_URL nor persistence.valkey_url is set"
                    )
                })?;
            let key_prefix = resolve_string(
                None,
                "OMNI_CHAT_VALKEY_PREFIX",
                settings.key_prefix.as_deref(),
                DEFAULT_VALKEY_KEY_PREFIX,
            );
            Ok(Some(Arc::new(ValkeyHistoryStore::new(
                &url,
                Some(key_prefix),
            )?)))
        }
    }
}

fn resolve_agent_config(settings: &RuntimeSettings) -> AgentConfig {
    let mut config = settings.agent.to_agent_config();
    config.inference_url = resolve_string(
        None,
        "OMNI_CHAT_INFERENCE_URL",
        Some(&config.inference_url),
        &config.inference_url,
    );
    config.model = resolve_string(None, "OMNI_CHAT_MODEL", Some(&config.model), &config.model);
    config.persona_name = resolve_string(
        None,
        "OMNI_CHAT_PERSONA_NAME",
        Some(&config.persona_name),
        &config.persona_name,
    );
    if let Some(temperature) = parse_temperature_from_env("OMNI_CHAT_TEMPERATURE") {
        config.temperature = temperature;
    }
    if let Some(rounds) = parse_positive_u32_from_env("OMNI_CHAT_MAX_TOOL_ROUNDS") {
        config.max_tool_rounds = rounds;
    }
    config
}

fn resolve_tools_config(settings: &RuntimeSettings) -> ToolsConfig {
    let mut config = settings.tools.to_tools_config();
    if let Some(enabled) = parse_bool_from_env("OMNI_CHAT_SEARCH_ENABLED") {
        config.search_enabled = enabled;
    }
    if let Some(enabled) = parse_bool_from_env("OMNI_CHAT_BROWSER_ENABLED") {
        config.browser_enabled = enabled;
    }
    if let Some(enabled) = parse_bool_from_env("OMNI_CHAT_IMAGE_ENABLED") {
        config.image_enabled = enabled;
    }
    config
}

/// Build the session manager from CLI flags, environment and settings.
pub(crate) fn build_manager(
    turn_timeout: Option<u64>,
    runtime_settings: &RuntimeSettings,
) -> Result<SessionManager> {
    let agent = resolve_agent_config(runtime_settings);
    let tools = resolve_tools_config(runtime_settings);
    let turn_timeout_secs = resolve_positive_u64(
        turn_timeout,
        "OMNI_CHAT_TURN_TIMEOUT_SECS",
        runtime_settings.gateway.turn_timeout_secs,
        DEFAULT_TURN_TIMEOUT_SECS,
    );
    let history_store = build_history_store(&runtime_settings.persistence)?;
    let config = SessionManagerConfig {
        persona_name: agent.persona_name.clone(),
        turn_timeout: Duration::from_secs(turn_timeout_secs),
    };
    tracing::debug!(
        model = %agent.model,
        persona = %agent.persona_name,
        search = tools.search_enabled,
        browser = tools.browser_enabled,
        image = tools.image_enabled,
        turn_timeout_secs,
        persistence = history_store.as_ref().map_or("none", |store| store.backend_name()),
        "session manager configured"
    );
    Ok(SessionManager::new(
        Arc::new(OpenAiAgentFactory::new(agent, tools)),
        Credentials::from_env(),
        history_store,
        config,
    ))
}

#[cfg(test)]
#[path = "../tests/unit/manager_builder.rs"]
mod tests;
