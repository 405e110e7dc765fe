//! Appliance control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  CONTROL PLANE                   │
//!   Admin request        │  ┌─────────┐    ┌──────────────┐    ┌──────────┐ │
//!   ─────────────────────┼─▶│  http   │───▶│ orchestrator │───▶│validator │ │
//!                        │  │ + auth  │    └──────┬───────┘    └──────────┘ │
//!                        │  └─────────┘           │                         │
//!                        │                        ▼                         │
//!                        │        ┌───────────────────────────────┐         │
//!                        │        │ resolver │ proxy_config │ raw │         │
//!                        │        └───────────────┬───────────────┘         │
//!                        │                        ▼                         │
//!                        │             ┌────────────────────┐               │
//!                        │             │ storage (lock +    │──────────────┼──▶ config files
//!                        │             │ atomic write)      │               │
//!                        │             └─────────┬──────────┘               │
//!                        │                       ▼                          │
//!                        │             ┌────────────────────┐               │
//!                        │             │ services           │──────────────┼──▶ systemctl restart
//!                        │             └────────────────────┘               │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use control_plane::config::load_config;
use control_plane::lifecycle::startup;
use control_plane::observability::logging;

#[derive(Parser)]
#[command(name = "control-plane")]
#[command(about = "Configuration control plane for the analytics appliance", long_about = None)]
struct Cli {
    /// Control plane API config file
    #[arg(
        short,
        long,
        default_value = "/home/ubuntu/snowplow/configs/control-plane-api.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        enrichments_dir = %config.dirs.enrichments.display(),
        config_dir = %config.dirs.config.display(),
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
