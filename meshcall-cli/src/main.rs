use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall_relay::RelayConfig;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall")]
#[command(about = "Signaling relay for mesh video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the call signaling relay.
    Relay {
        /// JSON file with a relay config. Flags override it.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Participants admitted per room.
        #[arg(long)]
        max_participants: Option<usize>,

        #[arg(long, default_value = "info")]
        log: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Relay {
            config,
            bind,
            max_participants,
            log,
        } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log)),
                )
                .init();

            let mut relay_config = match config {
                Some(path) => load_config(&path)?,
                None => RelayConfig::default(),
            };
            if let Some(bind) = bind {
                relay_config.bind = bind;
            }
            if let Some(max) = max_participants {
                relay_config.max_participants = max;
            }

            info!("Relay config: {:?}", relay_config);
            println!("{}", "📡 Starting meshcall relay...".green().bold());
            println!("   🔌 Listening: ws://{}/ws", relay_config.bind);
            println!(
                "   👥 Room capacity: {}",
                relay_config.max_participants.to_string().cyan()
            );

            meshcall_relay::serve(relay_config).await?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<RelayConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid relay config in {}", path.display()))
}
