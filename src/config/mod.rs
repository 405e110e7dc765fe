//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! control-plane-api.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ManagedConfig (validated, immutable)
//!     → shared via Arc to every component constructor
//! ```
//!
//! # Design Decisions
//! - Config is loaded once; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, DirsConfig, DuplicatePolicy, ManagedConfig, ObservabilityConfig, ProbeConfig,
    PsqlConfig, ResolverConfig, RestartCommand, ServicesConfig,
};
