//! Per-file mutual exclusion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Named locks keyed by configuration file path.
///
/// Holding the guard serializes read-modify-write cycles on one file. Guards
/// release on drop, so every exit path unlocks. An entry lives only while
/// someone holds or waits for it.
#[derive(Clone, Default)]
pub struct FileLocks {
    inner: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, path: &Path) -> FileLockGuard {
        // Clone the Arc out so the DashMap shard is not held across the await.
        let mutex = self
            .inner
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        FileLockGuard {
            guard: Some(mutex.lock_owned().await),
            path: path.to_path_buf(),
            locks: self.inner.clone(),
        }
    }

    /// Number of paths currently locked or waited on.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exclusive hold on one path.
pub struct FileLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    path: PathBuf,
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // The map's reference is the last one: no holder, no waiter.
        self.locks
            .remove_if(&self.path, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
