//! Schema-registry resolver document.
//!
//! # Responsibilities
//! - Add external registry entries (append or upsert)
//! - Replace the local registry's API key
//! - Leave everything else in the document intact
//!
//! Inputs are validated by the caller; nothing here re-checks UUIDs or URIs.

pub mod document;

pub use document::{
    add_external_registry, set_local_registry_api_key, EntryChange, RegistryEntry,
    ResolverDocument,
};
