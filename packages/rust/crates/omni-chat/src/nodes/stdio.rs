use std::time::Duration;

use omni_chat::{RuntimeSettings, run_stdio};

use crate::manager_builder::build_manager;

pub(crate) async fn run_stdio_mode(
    turn_timeout: Option<u64>,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let manager = build_manager(turn_timeout, runtime_settings)?;
    let result = run_stdio(manager.clone()).await;
    manager.shutdown(Duration::from_secs(5)).await;
    result
}
