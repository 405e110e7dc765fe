//! Resolver document editing.
//!
//! The resolver file is a self-describing JSON document:
//!
//! ```text
//! {
//!   "schema": "iglu:com.snowplowanalytics.iglu/resolver-config/jsonschema/1-0-1",
//!   "data": {
//!     "cacheSize": 500,
//!     "repositories": [
//!       { "name": ..., "priority": 0, "vendorPrefixes": ["com.acme"],
//!         "connection": { "http": { "uri": ..., "apikey": ... } } },
//!       ...
//!     ]
//!   }
//! }
//! ```
//!
//! Only `data.repositories` is touched. Every other key, and key order, is
//! carried through unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::config::DuplicatePolicy;
use crate::error::{ControlPlaneError, Result};
use crate::storage::write_atomic;

/// One external schema registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub vendor_prefix: String,
    pub uri: String,
    /// Already validated as a UUID when present.
    pub api_key: Option<String>,
    pub name: String,
    pub priority: i64,
}

impl RegistryEntry {
    fn to_record(&self) -> Value {
        let mut http = Map::new();
        http.insert("uri".to_string(), Value::String(self.uri.clone()));
        if let Some(key) = &self.api_key {
            http.insert("apikey".to_string(), Value::String(key.clone()));
        }

        json!({
            "name": self.name,
            "priority": self.priority,
            "vendorPrefixes": [self.vendor_prefix],
            "connection": { "http": Value::Object(http) },
        })
    }

    /// Vendor prefix plus endpoint is the identity of an entry.
    fn same_identity(&self, record: &Value) -> bool {
        let has_prefix = record
            .get("vendorPrefixes")
            .and_then(Value::as_array)
            .is_some_and(|prefixes| {
                prefixes
                    .iter()
                    .any(|p| p.as_str() == Some(self.vendor_prefix.as_str()))
            });
        has_prefix && record_uri(record).is_some_and(|uri| same_uri(uri, &self.uri))
    }
}

/// What `add_external_registry` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryChange {
    Appended,
    Replaced { index: usize },
}

fn record_uri(record: &Value) -> Option<&str> {
    record.pointer("/connection/http/uri").and_then(Value::as_str)
}

fn same_uri(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// An in-memory resolver document bound to its file.
#[derive(Debug, Clone)]
pub struct ResolverDocument {
    path: PathBuf,
    root: Value,
}

impl ResolverDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ControlPlaneError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).map_err(|e| ControlPlaneError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("not valid JSON: {}", e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    fn malformed(&self, reason: impl Into<String>) -> ControlPlaneError {
        ControlPlaneError::MalformedDocument {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    pub fn repositories(&self) -> Result<&Vec<Value>> {
        self.root
            .pointer("/data/repositories")
            .and_then(Value::as_array)
            .ok_or_else(|| self.malformed("missing data.repositories list"))
    }

    fn repositories_mut(&mut self) -> Result<&mut Vec<Value>> {
        let err = self.malformed("missing data.repositories list");
        self.root
            .pointer_mut("/data/repositories")
            .and_then(Value::as_array_mut)
            .ok_or(err)
    }

    pub fn add_external_registry(
        &mut self,
        entry: &RegistryEntry,
        policy: DuplicatePolicy,
    ) -> Result<EntryChange> {
        let record = entry.to_record();
        let repositories = self.repositories_mut()?;

        if policy == DuplicatePolicy::Upsert {
            if let Some(index) = repositories.iter().position(|r| entry.same_identity(r)) {
                repositories[index] = record;
                return Ok(EntryChange::Replaced { index });
            }
        }

        repositories.push(record);
        Ok(EntryChange::Appended)
    }

    fn local_registry_index(&self, local_uri: &str) -> Result<usize> {
        let matches: Vec<usize> = self
            .repositories()?
            .iter()
            .enumerate()
            .filter(|(_, r)| record_uri(r).is_some_and(|uri| same_uri(uri, local_uri)))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [index] => Ok(*index),
            [] => Err(self.malformed(format!("no local registry entry for {}", local_uri))),
            many => Err(self.malformed(format!(
                "{} local registry entries for {}",
                many.len(),
                local_uri
            ))),
        }
    }

    pub fn local_registry_api_key(&self, local_uri: &str) -> Result<Option<&str>> {
        let index = self.local_registry_index(local_uri)?;
        Ok(self.repositories()?[index]
            .pointer("/connection/http/apikey")
            .and_then(Value::as_str))
    }

    pub fn set_local_registry_api_key(&mut self, local_uri: &str, api_key: &str) -> Result<()> {
        let index = self.local_registry_index(local_uri)?;
        let err = self.malformed("local registry entry has no connection.http object");
        let http = self.repositories_mut()?[index]
            .pointer_mut("/connection/http")
            .and_then(Value::as_object_mut)
            .ok_or(err)?;
        http.insert("apikey".to_string(), Value::String(api_key.to_string()));
        Ok(())
    }

    pub fn to_pretty_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.root)
            .map_err(|e| self.malformed(format!("cannot serialize: {}", e)))?;
        text.push('\n');
        Ok(text)
    }

    /// Persist through the atomic writer.
    pub fn save(&self) -> Result<()> {
        let text = self.to_pretty_string()?;
        write_atomic(&self.path, text.as_bytes())
    }
}

/// Load, add `entry`, save.
pub fn add_external_registry(
    path: &Path,
    entry: &RegistryEntry,
    policy: DuplicatePolicy,
) -> Result<EntryChange> {
    let mut document = ResolverDocument::load(path)?;
    let change = document.add_external_registry(entry, policy)?;
    document.save()?;
    tracing::info!(
        path = %path.display(),
        vendor_prefix = %entry.vendor_prefix,
        uri = %entry.uri,
        change = ?change,
        "External registry added"
    );
    Ok(change)
}

/// Load, replace the local registry's API key, save.
pub fn set_local_registry_api_key(path: &Path, local_uri: &str, api_key: &str) -> Result<()> {
    let mut document = ResolverDocument::load(path)?;
    document.set_local_registry_api_key(local_uri, api_key)?;
    document.save()?;
    tracing::info!(path = %path.display(), "Local registry API key replaced");
    Ok(())
}
