//! Service restart dispatch.
//!
//! # Responsibilities
//! - Map a logical service to its restart action and invoke it
//! - Retry a bounded number of times when configured to
//! - Restart the whole managed set in a fixed order

use std::sync::Arc;
use std::time::Instant;

use super::backoff::calculate_backoff;
use super::{ServiceManager, ServiceName};
use crate::config::ServicesConfig;
use crate::error::{ControlPlaneError, Result};
use crate::observability::metrics;

#[derive(Clone)]
pub struct RestartDispatcher {
    manager: Arc<dyn ServiceManager>,
    restart_all: Vec<ServiceName>,
    attempts: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
}

impl RestartDispatcher {
    pub fn new(manager: Arc<dyn ServiceManager>, config: &ServicesConfig) -> Self {
        Self {
            manager,
            restart_all: config.restart_all.clone(),
            attempts: config.restart_attempts.max(1),
            backoff_base_ms: config.restart_backoff_base_ms,
            backoff_max_ms: config.restart_backoff_max_ms,
        }
    }

    /// Restart one service, retrying up to the configured attempt count.
    pub async fn restart_service(&self, service: ServiceName) -> Result<()> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.manager.restart(service).await {
                Ok(()) => {
                    tracing::info!(service = %service, attempt, "Service restarted");
                    metrics::record_restart(service.as_str(), true, start);
                    return Ok(());
                }
                Err(e) if attempt < self.attempts => {
                    let delay = calculate_backoff(attempt, self.backoff_base_ms, self.backoff_max_ms);
                    tracing::warn!(
                        service = %service,
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Restart failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(service = %service, attempt, error = %e, "Restart failed");
                    metrics::record_restart(service.as_str(), false, start);
                    return Err(ControlPlaneError::RestartFailed { service, source: e });
                }
            }
        }
    }

    /// Restart the full managed set in order, stopping at the first failure.
    pub async fn restart_all(&self) -> Result<()> {
        for service in &self.restart_all {
            self.restart_service(*service).await?;
        }
        Ok(())
    }
}
