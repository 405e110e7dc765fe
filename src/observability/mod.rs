//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! orchestrator, dispatcher, HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (journald on the appliance)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP trace span
//! - Credentials and API keys are never logged

pub mod logging;
pub mod metrics;
