use adaptive_rag::cli::{self, Cli, Command};
use adaptive_rag::infrastructure::logging::init_logging;
use adaptive_rag::infrastructure::observability::init_metrics;
use adaptive_rag::AppConfig;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load_with(cli.config.as_deref())?;
    init_logging(&config.logging);
    init_metrics(&config.metrics)?;

    match cli.command {
        Command::Ask(args) => cli::ask::run(args, config).await,
        Command::Chat(args) => cli::chat::run(args, config).await,
        Command::Graph => cli::graph(),
    }
}
