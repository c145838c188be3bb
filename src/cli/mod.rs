//! Command line entry points
//!
//! - `serve`: HTTP + WebSocket server (default)
//! - `cache-stats`: inspect the persisted semantic cache and exit

pub mod cache_stats;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Semantic Search Gateway - cached, routed answers over filings, API docs and the web
#[derive(Debug, Parser)]
#[command(name = "semantic-search-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP and WebSocket server
    Serve,

    /// Print semantic cache statistics as JSON
    CacheStats,
}

impl Cli {
    /// Subcommand to run; bare invocation serves
    pub fn selected(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

/// `.env`, then layered config files and environment, then logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
