//! HTTP surface of the control plane.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, body limit)
//!     → auth.rs (optional bearer token)
//!     → handlers.rs (extract form / multipart fields)
//!     → orchestrator::ControlPlane
//!     → status code + plain-text body
//! ```

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
