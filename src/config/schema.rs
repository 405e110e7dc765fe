//! Configuration schema definitions.
//!
//! This module defines the startup configuration of the control plane.
//! All types derive Serde traits for deserialization from the TOML file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::ServiceName;

/// Root configuration, loaded once at startup and never mutated.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagedConfig {
    /// Directories holding the managed artifacts.
    pub dirs: DirsConfig,

    /// Canonical filenames inside `dirs.config`.
    pub config_names: ConfigNames,

    /// Registry server datastore connection info.
    pub psql: PsqlConfig,

    /// File whose content is served by `GET /version`.
    pub version_file_path: PathBuf,

    pub listener: ListenerConfig,

    pub admin: AdminConfig,

    pub limits: LimitsConfig,

    pub timeouts: TimeoutConfig,

    /// Reachability probe settings.
    pub probe: ProbeConfig,

    pub resolver: ResolverConfig,

    /// Restart commands and ordering.
    pub services: ServicesConfig,

    pub observability: ObservabilityConfig,
}

impl ManagedConfig {
    pub fn enrichment_path(&self, filename: &str) -> PathBuf {
        self.dirs.enrichments.join(filename)
    }

    pub fn resolver_path(&self) -> PathBuf {
        self.dirs.config.join(&self.config_names.iglu_resolver)
    }

    pub fn registry_server_config_path(&self) -> PathBuf {
        self.dirs.config.join(&self.config_names.iglu_server)
    }

    pub fn proxy_config_path(&self) -> PathBuf {
        self.dirs.config.join(&self.config_names.caddy)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirsConfig {
    /// One file per uploaded enrichment.
    pub enrichments: PathBuf,

    /// Resolver, registry server and proxy configuration files.
    pub config: PathBuf,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            enrichments: PathBuf::from("/home/ubuntu/snowplow/configs/enrichments"),
            config: PathBuf::from("/home/ubuntu/snowplow/configs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigNames {
    pub iglu_resolver: String,
    pub iglu_server: String,
    pub caddy: String,
}

impl Default for ConfigNames {
    fn default() -> Self {
        Self {
            iglu_resolver: "iglu-resolver.json".to_string(),
            iglu_server: "iglu-server.conf".to_string(),
            caddy: "Caddyfile".to_string(),
        }
    }
}

/// Datastore credentials of the local registry.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PsqlConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    /// `host:port`; the port defaults to 5432.
    pub addr: String,
    /// How long key registration waits for a database connection.
    pub acquire_timeout_secs: u64,
}

impl PsqlConfig {
    pub fn host_port(&self) -> Option<(&str, u16)> {
        match self.addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => Some((host, port.parse().ok()?)),
            Some(_) => None,
            None if !self.addr.is_empty() => Some((self.addr.as_str(), 5432)),
            None => None,
        }
    }
}

impl Default for PsqlConfig {
    fn default() -> Self {
        Self {
            user: "snowplow".to_string(),
            password: String::new(),
            database: "iglu".to_string(),
            addr: "localhost:5432".to_string(),
            acquire_timeout_secs: 5,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for PsqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsqlConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("addr", &self.addr)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10000".to_string(),
        }
    }
}

/// Admin authentication.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token required on every route. `None` leaves authentication to
    /// the fronting proxy.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body, uploads included.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 32 << 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one admin request, restart included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// What to do when an external registry with the same vendor prefix and URI
/// is already listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Always add a new record.
    #[default]
    Append,
    /// Replace the existing record in place.
    Upsert,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// URI identifying the local registry stanza in the resolver document.
    pub local_registry_uri: String,

    pub on_duplicate: DuplicatePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            local_registry_uri: "http://localhost:8081/api".to_string(),
            on_duplicate: DuplicatePolicy::Append,
        }
    }
}

/// How to restart one managed service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestartCommand {
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl RestartCommand {
    fn systemctl(unit: &str) -> Self {
        Self {
            command: vec![
                "systemctl".to_string(),
                "restart".to_string(),
                unit.to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Keyed by service name, like the values of `restart_all`.
    #[serde(rename = "enrichment-engine")]
    pub enrichment_engine: RestartCommand,
    #[serde(rename = "registry-server")]
    pub registry_server: RestartCommand,
    #[serde(rename = "reverse-proxy")]
    pub reverse_proxy: RestartCommand,

    /// Order used by `PUT /restart-services`.
    pub restart_all: Vec<ServiceName>,

    /// Attempts per restart; 1 disables retrying.
    pub restart_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    pub restart_backoff_base_ms: u64,

    pub restart_backoff_max_ms: u64,
}

impl ServicesConfig {
    pub fn command_for(&self, service: ServiceName) -> &RestartCommand {
        match service {
            ServiceName::EnrichmentEngine => &self.enrichment_engine,
            ServiceName::RegistryServer => &self.registry_server,
            ServiceName::ReverseProxy => &self.reverse_proxy,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            enrichment_engine: RestartCommand::systemctl("snowplow_stream_enrich"),
            registry_server: RestartCommand::systemctl("iglu_server"),
            reverse_proxy: RestartCommand::systemctl("caddy_init"),
            restart_all: vec![
                ServiceName::RegistryServer,
                ServiceName::EnrichmentEngine,
                ServiceName::ReverseProxy,
            ],
            restart_attempts: 1,
            restart_backoff_base_ms: 500,
            restart_backoff_max_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
