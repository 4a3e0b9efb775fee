//! # RotaBot — team assignment bot for Telegram
//!
//! Keeps a roster per chat and assigns members to tasks by fair rotation
//! or at random, then posts the assignment and a completion poll to a channel.
//!
//! Usage:
//!   rotabot                              # Run with ~/.rotabot/config.toml
//!   rotabot --config ./rotabot.toml      # Custom config file
//!   rotabot --init-config                # Write a starter config and exit

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use rotabot_bot::Bot;
use rotabot_channels::TelegramChannel;
use rotabot_core::RotaBotConfig;
use rotabot_security::Allowlist;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rotabot",
    version,
    about = "🔁 RotaBot — fair task assignment for Telegram teams"
)]
struct Cli {
    /// Path to the config file (default: ~/.rotabot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Write a default config to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn config_path(cli: &Cli) -> PathBuf {
    match &cli.config {
        Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
        None => RotaBotConfig::default_path(),
    }
}

const CRATES: [&str; 5] = [
    "rotabot",
    "rotabot_bot",
    "rotabot_roster",
    "rotabot_channels",
    "rotabot_security",
];

/// Default log directives when `RUST_LOG` is unset.
fn log_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = log_filter(cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let path = config_path(&cli);

    // --init-config: write defaults and exit
    if cli.init_config {
        if path.exists() {
            println!("⚠️  Config already exists at {}", path.display());
        } else {
            RotaBotConfig::default().save_to(&path)?;
            println!("✅ Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    let mut config = if path.exists() {
        RotaBotConfig::load_from(&path)?
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        RotaBotConfig::default()
    };
    config.apply_env();
    config.validate()?;

    let channel = TelegramChannel::new(config.telegram.clone())?;
    channel.connect().await.context("Telegram connection failed")?;

    let allowlist = Allowlist::new(&config.security);
    let mut updates = channel.start_polling();
    let bot = Bot::new(channel, allowlist, &config.roster)?;

    println!("🔁 RotaBot v{}", env!("CARGO_PKG_VERSION"));
    println!("   ⚙️  Config:  {}", path.display());
    println!("   👥 Default roster: {} participant(s)", config.roster.default.len());
    println!();

    loop {
        tokio::select! {
            next = updates.next() => match next {
                Some(incoming) => bot.handle(incoming).await,
                None => {
                    tracing::warn!("Update stream closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
