mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunebridge_core::{load_config_or_default, validate_config};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so results on stdout stay machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.config.exists() {
        info!("Loading configuration from {:?}", cli.config);
    } else {
        info!("No configuration at {:?}, using defaults", cli.config);
    }
    let config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Rate limit: {} req/s, burst {}",
        config.rate_limit.requests_per_second, config.rate_limit.burst_size
    );

    match cli.command {
        Commands::Match {
            kind,
            input,
            output,
            metrics,
        } => {
            let engine = commands::build_engine(&config)?;
            commands::cmd_match(&engine, kind, &input, output.as_deref()).await?;
            if metrics {
                commands::print_metrics()?;
            }
        }
        Commands::Cache { action } => commands::cmd_cache(&config, action)?,
    }

    Ok(())
}
