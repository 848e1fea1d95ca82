//! Uniapp CLI - Main entry point

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uniapp_foundation::{RuntimeConfig, RUNTIME_CONFIG_FILE};

/// Uniapp - plugin/service runtime
#[derive(Parser, Debug)]
#[command(name = "uniapp")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (default: ./config.json, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List discovered plugins without activating them
    Plugins {
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Activate plugins and list registered services
    Services,
    /// Bootstrap, start, exercise the calculator and shut down
    Run,
    /// Show event subscriptions after bootstrap
    Events,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = RuntimeConfig::load_or_default(&config_path)?;
    if args.debug {
        config.app.debug = true;
    }

    // Initialize logging
    let log_level = config.effective_log_level();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::debug!("Using configuration {}", config_path.display());

    match args.command {
        Command::Plugins { json } => commands::plugins(config, json),
        Command::Services => commands::services(config),
        Command::Run => commands::run(config).await,
        Command::Events => commands::events(config),
    }
}

/// 현재 디렉토리의 config.json, 없으면 사용자 설정 디렉토리
fn default_config_path() -> PathBuf {
    let local = PathBuf::from(RUNTIME_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("uniapp").join(RUNTIME_CONFIG_FILE))
        .unwrap_or(local)
}
