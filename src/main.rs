use anyhow::Result;
use clap::{Parser, Subcommand};
use coinsense::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coinsense::AppCommand {
    fn from(cmd: Commands) -> coinsense::AppCommand {
        match cmd {
            Commands::Report => coinsense::AppCommand::Report,
            Commands::Status => coinsense::AppCommand::Status,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch prices and news, score sentiment, write the report
    Report,
    /// Check reachability of the configured providers
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Bare invocation runs a full report.
    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => coinsense::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            coinsense::run_command(coinsense::AppCommand::Report, cli.config_path.as_deref()).await
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = coinsense::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
cryptocurrencies:
  - symbol: "bitcoin"
    name: "Bitcoin"
    ticker: "BTC"
    search_terms: ["bitcoin", "btc"]
  - symbol: "ethereum"
    name: "Ethereum"
    ticker: "ETH"
    search_terms: ["ethereum", "eth"]
  - symbol: "solana"
    name: "Solana"
    ticker: "SOL"
    search_terms: ["solana"]

# API keys may also come from the NEWSAPI_API_KEY and GUARDIAN_API_KEY
# environment variables.
# providers:
#   newsapi:
#     base_url: "https://newsapi.org"
#     api_key: "your-key"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
