use std::time::Duration;

use omni_chat::{RuntimeSettings, run_http};

use crate::manager_builder::build_manager;
use crate::resolve::{resolve_optional_positive_usize, resolve_positive_u64, resolve_string};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

pub(crate) async fn run_gateway_mode(
    bind: Option<String>,
    turn_timeout: Option<u64>,
    max_concurrent: Option<usize>,
    shutdown_grace: Option<u64>,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let manager = build_manager(turn_timeout, runtime_settings)?;
    let bind_addr = resolve_string(
        bind,
        "OMNI_CHAT_BIND",
        runtime_settings.gateway.bind.as_deref(),
        DEFAULT_BIND,
    );
    let max_concurrent = resolve_optional_positive_usize(
        max_concurrent,
        "OMNI_CHAT_MAX_CONCURRENT_TURNS",
        runtime_settings.gateway.max_concurrent_turns,
    );
    let grace_secs = resolve_positive_u64(
        shutdown_grace,
        "OMNI_CHAT_SHUTDOWN_GRACE_SECS",
        None,
        DEFAULT_SHUTDOWN_GRACE_SECS,
    );
    run_http(
        manager,
        &bind_addr,
        max_concurrent,
        Duration::from_secs(grace_secs),
    )
    .await
}
