//! Admin input validation.
//!
//! # Data Flow
//! ```text
//! form / multipart fields
//!     → input.rs (pure syntactic checks: JSON, UUID, domain, priority, ...)
//!     → probe.rs (network reachability of registry URIs)
//!     → orchestrator (only then touches the filesystem)
//! ```
//!
//! # Design Decisions
//! - Every check runs before any mutation; the first failure aborts
//! - Reachability is a trait so the orchestrator never depends on the network
//!   in tests

pub mod input;
pub mod probe;

pub use input::{
    check_credential, check_enrichment_filename, check_host_domain_name, is_json, is_valid_uuid,
    parse_priority, MAX_DOMAIN_LEN, MAX_LABEL_LEN,
};
pub use probe::{HttpProbe, UrlProbe};

use thiserror::Error;

/// Client-side input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("JSON is not valid")]
    InvalidJson,

    #[error("Priority must be an integer")]
    InvalidPriority,

    #[error("Given URL is not reachable")]
    UnreachableUrl,

    #[error("Given apikey is not a valid UUID")]
    InvalidUuid,

    #[error("invalid domain name: {0}")]
    InvalidDomain(&'static str),

    #[error("invalid filename: {0}")]
    InvalidFilename(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidCredential {
        field: &'static str,
        reason: &'static str,
    },

    /// The local registry is managed through its API key, never as an
    /// external entry.
    #[error("uri {0} belongs to the local registry")]
    LocalRegistryUri(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
