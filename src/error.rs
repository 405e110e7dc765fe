//! Error taxonomy shared by every mutating operation.
//!
//! # Status Mapping
//! ```text
//! Validation               → 400 (client fault)
//! MalformedDocument        → 500 (on-disk file does not look as expected)
//! DirectiveNotFound        → 500
//! DuplicateDirective       → 500
//! ReadFailed / WriteFailed → 500 (I/O, OS error preserved)
//! KeyRegistrationFailed    → 500 (registry datastore unreachable or refused)
//! RestartFailed            → 500 (mutation already committed)
//! ```
//!
//! `/domain-name` overrides the mapping and answers 405 for everything that
//! happens before the restart; see `http::handlers`.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::key_store::KeyStoreError;
use crate::services::{RestartError, ServiceName};
use crate::validator::ValidationError;

/// Errors produced by control plane operations.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Admin input rejected before any side effect.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The configuration document does not have the expected structure.
    #[error("malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    /// A directive that must exist exactly once is missing.
    #[error("directive `{directive}` not found in {path}")]
    DirectiveNotFound { path: PathBuf, directive: &'static str },

    /// A directive that must exist exactly once appears several times.
    #[error("directive `{directive}` appears {count} times in {path}")]
    DuplicateDirective {
        path: PathBuf,
        directive: &'static str,
        count: usize,
    },

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisting a file failed; the target still holds its previous content.
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register API key with the registry datastore: {source}")]
    KeyRegistrationFailed {
        #[source]
        source: KeyStoreError,
    },

    /// The managed service did not come back. The file mutation is kept.
    #[error("failed to restart {service}: {source}")]
    RestartFailed {
        service: ServiceName,
        #[source]
        source: RestartError,
    },
}

pub type Result<T> = std::result::Result<T, ControlPlaneError>;

impl ControlPlaneError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlPlaneError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlPlaneError::Validation(_) => "validation",
            ControlPlaneError::MalformedDocument { .. } => "malformed_document",
            ControlPlaneError::DirectiveNotFound { .. } => "directive_not_found",
            ControlPlaneError::DuplicateDirective { .. } => "duplicate_directive",
            ControlPlaneError::ReadFailed { .. } => "read_failed",
            ControlPlaneError::WriteFailed { .. } => "write_failed",
            ControlPlaneError::KeyRegistrationFailed { .. } => "key_registration_failed",
            ControlPlaneError::RestartFailed { .. } => "restart_failed",
        }
    }

    pub fn is_restart_failure(&self) -> bool {
        matches!(self, ControlPlaneError::RestartFailed { .. })
    }
}

impl IntoResponse for ControlPlaneError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
