use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "omni-chat")]
#[command(about = "Conversational session manager: HTTP chat gateway or a stdio session.")]
pub(crate) struct Cli {
    /// Override config directory (user settings are read from `<conf>/omni-chat/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    pub(crate) fn verbose(&self) -> bool {
        match &self.command {
            Command::Gateway { verbose, .. } | Command::Stdio { verbose, .. } => *verbose,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run HTTP server (POST /chat, /session/{id}, /sessions). Default bind: 0.0.0.0:8080
    Gateway {
        /// Listen address (e.g. 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,

        /// Per-turn agent timeout in seconds (default: 300)
        #[arg(long)]
        turn_timeout: Option<u64>,

        /// Max concurrent chat turns (omit for no limit)
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Seconds to wait for pending history writes on shutdown (default: 10)
        #[arg(long)]
        shutdown_grace: Option<u64>,

        /// Debug-level logs for omni_chat
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// One session over stdin/stdout: greeting first, then one turn per line. Exit on EOF.
    Stdio {
        /// Per-turn agent timeout in seconds (default: 300)
        #[arg(long)]
        turn_timeout: Option<u64>,

        /// Debug-level logs for omni_chat
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}
