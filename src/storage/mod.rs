//! Persistence primitives shared by every editor.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → locks.rs (acquire the file's lock)
//!     → editor computes new content
//!     → atomic.rs (temp file, fsync, rename)
//!     → lock released on guard drop
//! ```

pub mod atomic;
pub mod locks;

pub use atomic::{write_atomic, write_atomic_with};
pub use locks::{FileLockGuard, FileLocks};
