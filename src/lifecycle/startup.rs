//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every component from the validated configuration
//! - Start the optional metrics endpoint
//! - Bind the listener last, so traffic only arrives when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use super::{signals::shutdown_on_signal, Shutdown};
use crate::config::ManagedConfig;
use crate::http::HttpServer;
use crate::key_store::{KeyStoreError, PgApiKeyStore};
use crate::observability::metrics;
use crate::orchestrator::ControlPlane;
use crate::services::CommandServiceManager;
use crate::validator::HttpProbe;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build reachability probe: {0}")]
    Probe(#[from] reqwest::Error),

    #[error("failed to configure registry datastore: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Wire the production components and serve until SIGINT/SIGTERM.
pub async fn run(config: ManagedConfig) -> Result<(), StartupError> {
    let config = Arc::new(config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let probe = Arc::new(HttpProbe::new(&config.probe)?);
    let keys = Arc::new(PgApiKeyStore::new(&config.psql)?);
    let services = Arc::new(CommandServiceManager::new(config.services.clone()));
    let control_plane = ControlPlane::new(config.clone(), probe, keys, services);
    let server = HttpServer::new(control_plane);

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
