//! Reverse-proxy configuration file.
//!
//! # Responsibilities
//! - Rotate the single basic-auth credential pair
//! - Rebind the single site block to a new domain name
//!
//! # Design Decisions
//! - Line-targeted substitution, not a full parse: unrelated directives are
//!   preserved byte for byte
//! - Exactly one match is required; zero or several matches abort the edit

pub mod editor;

pub use editor::{change_credentials, change_domain_name, rewrite_credentials, rewrite_domain_name};
