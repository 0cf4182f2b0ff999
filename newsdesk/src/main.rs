//! Newsdesk - a terminal client for a news-retrieval assistant.
//!
//! Architecture:
//! - CLI is a thin client that talks to the assistant backend via HTTP
//! - Answers are narrated live from pipeline events on a WebSocket
//! - Nothing is stored locally; tokens come from config or the environment

mod api;
mod auth;
mod chat;
mod cli;
mod config;
mod error;
mod models;
mod pipeline;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli).await
}

/// Log to stderr so command output on stdout stays clean. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "newsdesk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
