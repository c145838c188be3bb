use clap::Parser;
use semantic_search_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.selected() {
        Command::Serve => cli::serve::run().await,
        Command::CacheStats => cli::cache_stats::run().await,
    }
}
