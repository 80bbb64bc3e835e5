//! Config namespace: agent/tool config and YAML runtime settings.

mod agent;
mod settings;

pub use agent::{
    AgentConfig, OPENAI_DEFAULT_URL, OPENAI_IMAGES_DEFAULT_URL, SERPAPI_DEFAULT_URL, ToolsConfig,
};
pub use settings::{
    AgentSettings, GatewaySettings, PersistenceSettings, RuntimeSettings, ToolsSettings,
    load_runtime_settings, load_runtime_settings_from_paths, runtime_settings_paths,
    set_config_home_override,
};
