//! Restarts by running a configured command.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{RestartError, ServiceManager, ServiceName};
use crate::config::ServicesConfig;

/// Runs `services.<name>.command` and waits for it to exit.
pub struct CommandServiceManager {
    config: ServicesConfig,
}

impl CommandServiceManager {
    pub fn new(config: ServicesConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ServiceManager for CommandServiceManager {
    async fn restart(&self, service: ServiceName) -> Result<(), RestartError> {
        let argv = &self.config.command_for(service).command;
        let (program, args) = argv.split_first().ok_or(RestartError::NotConfigured)?;

        tracing::debug!(service = %service, program = %program, ?args, "Running restart command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RestartError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RestartError::Exit {
                program: program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
