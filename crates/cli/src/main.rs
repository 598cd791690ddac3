mod config;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result},
    appmonitor_discord::AppMonitorBot,
    appmonitor_store::{ConfigStore, FileStorage},
    clap::Parser,
    tokio_util::sync::CancellationToken,
};

use crate::config::{AppMonitorConfig, DEFAULT_CONFIG_FILE};

/// Discord bot that alerts a role when members apply through membership
/// screening and when their application is approved.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to the TOML config file. Defaults to `appmonitor.toml` in the
    /// working directory, which may be absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for per-guild settings files (overrides the config file).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Discord bot token (overrides the config file).
    #[arg(long, env = "APPMONITOR_DISCORD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.json_logs);

    let (config_path, required) = match args.config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let config = AppMonitorConfig::load(&config_path, required)?
        .with_overrides(args.token, args.data_dir);

    tracing::info!(
        config = %config_path.display(),
        data_dir = %config.storage.data_dir.display(),
        "application monitor starting"
    );

    let storage = Arc::new(FileStorage::new(&config.storage.data_dir));
    let store = Arc::new(ConfigStore::new(storage));
    let bot = AppMonitorBot::new(config.discord, store);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("shutdown signal received"),
            Err(e) => tracing::warn!("failed to listen for shutdown signal: {e}"),
        }
        cancel_on_signal.cancel();
    });

    bot.run(cancel).await.context("discord bot failed")?;
    Ok(())
}
