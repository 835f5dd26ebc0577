//! Beacon Server
//!
//! Run with: cargo run --bin beacon -- serve
//!
//! # Configuration
//!
//! Loaded from `--config`, else the first of
//! `~/.config/beacon/config.toml`, `/etc/beacon/config.toml`,
//! `./config.toml`, else built-in defaults. Environment variables
//! (`BEACON_HOST`, `BEACON_PORT`, `BEACON_SEND_TIMEOUT_MS`,
//! `BEACON_LOG_LEVEL`, `BEACON_LOG_FORMAT`) override the file and `RUST_LOG`
//! overrides the log filter.

use beacon::api::{serve, AppState};
use beacon::config::{generate_default_config, Config, LoggingConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "beacon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time ticket and alert fan-out over WebSocket")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the WebSocket server
    Serve {
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the listener host
        #[arg(long)]
        host: Option<String>,
        /// Override the listener port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print a commented default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig => {
            print!("{}", generate_default_config());
            Ok(())
        }
        Commands::Serve { config, host, port } => {
            let mut config = match config {
                Some(path) => Config::load_with_env(&path)?,
                None => Config::load_default(),
            };
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run(config).await
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&config.logging);

    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));

    let api_config = config.api_config();
    let tickets = config.tickets_channel();
    let alerts = config.alerts_channel();

    for (channel, path) in [
        (&tickets, &api_config.tickets_path),
        (&alerts, &api_config.alerts_path),
    ] {
        tracing::info!(
            channel = %channel.name,
            send_timeout = ?channel.send_timeout,
            outbound_capacity = channel.outbound_capacity,
            "Channel on {}",
            path
        );
    }

    let state = AppState::with_channel_config(api_config.clone(), tickets, alerts);
    serve(state, &api_config).await?;

    tracing::info!("Beacon stopped");
    Ok(())
}

/// Initialize tracing from the logging config; `RUST_LOG` wins when set
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("beacon={},tower_http={}", logging.level, logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
