//! Control plane for a single-node analytics appliance.
//!
//! Accepts administrative requests, rewrites the configuration of the managed
//! services (enrichments, schema-registry resolver, registry server, reverse
//! proxy) crash-safely, then restarts the service that owns the file. API keys
//! for the local registry are also registered in its datastore.

pub mod config;
pub mod error;
pub mod http;
pub mod key_store;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod proxy_config;
pub mod resolver;
pub mod services;
pub mod storage;
pub mod validator;

pub use config::ManagedConfig;
pub use error::ControlPlaneError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::ControlPlane;
