//! Registry API key registration.
//!
//! # Data Flow
//! ```text
//! orchestrator (POST /local-iglu-apikey, after validation)
//!     → ApiKeyStore::register (postgres.rs inserts into the registry's datastore)
//!     → resolver edit
//!     → enrichment engine restart
//! ```
//!
//! A key written into the resolver but unknown to the registry server is
//! useless, so registration happens first and a failure stops the request.

pub mod postgres;

pub use postgres::PgApiKeyStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("invalid datastore address '{0}'")]
    InvalidAddress(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

/// Where the local registry server looks up its API keys.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Grant `api_key` full rights on the registry. Registering a key that is
    /// already known succeeds.
    async fn register(&self, api_key: &str) -> Result<(), KeyStoreError>;
}
