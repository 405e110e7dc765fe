//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every managed file name stays inside its directory
//! - Validate value ranges (timeouts > 0, attempts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagedConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ManagedConfig;
use crate::services::ServiceName;

/// One semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ManagedConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dirs.enrichments.as_os_str().is_empty() {
        errors.push(ValidationError::new("dirs.enrichments", "must not be empty"));
    }
    if config.dirs.config.as_os_str().is_empty() {
        errors.push(ValidationError::new("dirs.config", "must not be empty"));
    }

    for (field, name) in [
        ("config_names.iglu_resolver", &config.config_names.iglu_resolver),
        ("config_names.iglu_server", &config.config_names.iglu_server),
        ("config_names.caddy", &config.config_names.caddy),
    ] {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            errors.push(ValidationError::new(field, "must be a plain file name"));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address '{}'", config.listener.bind_address),
        ));
    }

    if matches!(config.admin.api_key.as_deref(), Some("")) {
        errors.push(ValidationError::new("admin.api_key", "must not be empty when set"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.probe.timeout_secs == 0 {
        errors.push(ValidationError::new("probe.timeout_secs", "must be > 0"));
    }

    if config.psql.host_port().is_none() {
        errors.push(ValidationError::new(
            "psql.addr",
            format!("expected host or host:port, got '{}'", config.psql.addr),
        ));
    }
    if config.psql.database.is_empty() {
        errors.push(ValidationError::new("psql.database", "must not be empty"));
    }
    if config.psql.acquire_timeout_secs == 0 {
        errors.push(ValidationError::new("psql.acquire_timeout_secs", "must be > 0"));
    }

    if url::Url::parse(&config.resolver.local_registry_uri).is_err() {
        errors.push(ValidationError::new(
            "resolver.local_registry_uri",
            format!("invalid URI '{}'", config.resolver.local_registry_uri),
        ));
    }

    for service in ServiceName::ALL {
        if config.services.command_for(service).command.is_empty() {
            errors.push(ValidationError::new(
                format!("services.{}.command", service),
                "must name a program",
            ));
        }
    }
    if config.services.restart_all.is_empty() {
        errors.push(ValidationError::new("services.restart_all", "must not be empty"));
    }
    if config.services.restart_attempts == 0 {
        errors.push(ValidationError::new("services.restart_attempts", "must be >= 1"));
    }
    if config.services.restart_backoff_base_ms > config.services.restart_backoff_max_ms {
        errors.push(ValidationError::new(
            "services.restart_backoff_base_ms",
            "must not exceed restart_backoff_max_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
