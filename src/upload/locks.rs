//! Per-destination-path serialization.
//!
//! Requests mapping to the same output file take turns; the last writer
//! still wins. Entries are dropped once nobody holds or waits on them,
//! either by the last guard or by the next `acquire` when a waiter was
//! cancelled.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

type PathLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Debug, Default, Clone)]
pub struct PathLocks {
    inner: Arc<Mutex<HashMap<PathBuf, PathLock>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `path` is free and hold it until the guard drops
    pub async fn acquire(&self, path: &Path) -> PathGuard {
        let lock = {
            let mut map = self.inner.lock();
            // Only the map still references these
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(path.to_path_buf()).or_default().clone()
        };
        let guard = lock.clone().lock_owned().await;
        PathGuard {
            locks: self.inner.clone(),
            path: path.to_path_buf(),
            lock,
            guard: Some(guard),
        }
    }

    /// Number of paths currently tracked
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct PathGuard {
    locks: Arc<Mutex<HashMap<PathBuf, PathLock>>>,
    path: PathBuf,
    lock: PathLock,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        // Release before inspecting the count: the owned guard holds a clone
        self.guard.take();
        let mut map = self.locks.lock();
        // One reference in the map, one in this guard
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.path);
        }
    }
}
