//! omni-chat CLI: HTTP gateway or a single stdio session.
//!
//! Needs `OPENAI_API_KEY`; `SERPAPI_API_KEY` enables the search tool.
//!
//! Logging: set `RUST_LOG=omni_chat=info` (or `warn`, `debug`) to see logs on stderr.

mod cli;
mod manager_builder;
mod nodes;
mod resolve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use omni_chat::{load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::{run_gateway_mode, run_stdio_mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose() {
            "omni_chat=debug"
        } else {
            "omni_chat=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();

    match cli.command {
        Command::Gateway {
            bind,
            turn_timeout,
            max_concurrent,
            shutdown_grace,
            verbose: _,
        } => {
            run_gateway_mode(
                bind,
                turn_timeout,
                max_concurrent,
                shutdown_grace,
                &runtime_settings,
            )
            .await
        }
        Command::Stdio {
            turn_timeout,
            verbose: _,
        } => run_stdio_mode(turn_timeout, &runtime_settings).await,
    }
}
