//! Managed service restarts.
//!
//! # Data Flow
//! ```text
//! orchestrator (after a committed mutation)
//!     → dispatcher.rs (attempts + backoff, metrics, logging)
//!     → ServiceManager::restart (command.rs runs the configured argv)
//! ```
//!
//! # Design Decisions
//! - The set of services is closed; names are dispatch keys, never persisted
//! - Restarts are blocking from the caller's point of view
//! - A failed restart never rolls back the mutation that preceded it

pub mod backoff;
pub mod command;
pub mod dispatcher;

pub use command::CommandServiceManager;
pub use dispatcher::RestartDispatcher;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the long-running processes whose configuration is managed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceName {
    EnrichmentEngine,
    RegistryServer,
    ReverseProxy,
}

impl ServiceName {
    pub const ALL: [ServiceName; 3] = [
        ServiceName::EnrichmentEngine,
        ServiceName::RegistryServer,
        ServiceName::ReverseProxy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::EnrichmentEngine => "enrichment-engine",
            ServiceName::RegistryServer => "registry-server",
            ServiceName::ReverseProxy => "reverse-proxy",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceName::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| format!("unknown service '{}'", s))
    }
}

/// Why a restart action failed.
#[derive(Debug, Error)]
pub enum RestartError {
    #[error("could not run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no restart command configured")]
    NotConfigured,

    #[error("{0}")]
    Other(String),
}

/// The host's process/service manager.
#[async_trait]
pub trait ServiceManager: Send + Sync {
    async fn restart(&self, service: ServiceName) -> Result<(), RestartError>;
}
