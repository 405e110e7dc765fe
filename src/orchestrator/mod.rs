//! Request orchestration.
//!
//! # Data Flow
//! ```text
//! handler
//!     → ControlPlane operation
//!     → validator (no side effects on failure)
//!     → FileLocks + editor / atomic writer (exactly one artifact)
//!     → RestartDispatcher (exactly one service, or the full set)
//! ```
//!
//! # Guarantees
//! - Validation failure: no file touched, no restart
//! - Mutation failure: no restart
//! - Restart failure: the new configuration stays on disk; the error is
//!   reported and the admin re-issues the restart

pub mod control_plane;
pub mod forms;

pub use control_plane::ControlPlane;
pub use forms::{CredentialsForm, DomainNameForm, ExternalRegistryForm, LocalApiKeyForm};
