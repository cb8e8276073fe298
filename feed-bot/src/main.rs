//! feed-bot: fills a social feed service with synthetic activity
//!
//! Reads a config file naming how many accounts to create and how much each
//! may post and like, runs the simulation and prints a summary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use feed_bot::{BotConfig, FeedBot};
use feed_client::{ActivityClient, HttpActivityClient, InMemoryFeed};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "feed-bot")]
#[command(about = "Synthetic activity bot for the social feed API")]
struct Cli {
    /// Path to the YAML (or TOML) config file
    #[arg(short, long)]
    config_path: PathBuf,

    /// Feed API base URL (overrides config file)
    #[arg(long, env = "FEED_API_URL")]
    api_url: Option<String>,

    /// RNG seed (overrides config file)
    #[arg(long, env = "FEED_BOT_SEED")]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Run against an in-process feed instead of the API
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("feed_bot={0},feed_client={0}", cli.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = BotConfig::load(&cli.config_path)?;

    // CLI overrides
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    config.validate()?;

    let client: Box<dyn ActivityClient> = if cli.in_memory {
        info!("Using in-memory feed");
        Box::new(InMemoryFeed::new())
    } else {
        info!(api_url = %config.api_url, "Using feed API");
        Box::new(
            HttpActivityClient::new(config.client_config())
                .context("Failed to build HTTP client")?,
        )
    };

    let report = FeedBot::new(config, client.as_ref()).run().await?;

    println!("{}", report.summary());
    for turn in &report.scheduler.turns {
        println!("  {}: {} likes", turn.handle, turn.likes);
    }
    println!("Success!");
    Ok(())
}
