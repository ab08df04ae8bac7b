use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type LockMap = HashMap<PathBuf, Arc<AsyncMutex<()>>>;

/// Serializes operations that mutate the same working tree.
///
/// Two syncs against one repository would fight over HEAD and the stash,
/// so each path gets its own async mutex. Different repositories proceed
/// in parallel. A path's entry lives only while a guard holds it or a
/// caller waits on it.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one repository operation
#[derive(Debug)]
pub struct RepositoryGuard {
    path: PathBuf,
    locks: Arc<Mutex<LockMap>>,
    _guard: OwnedMutexGuard<()>,
}

impl RepositoryGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepositoryGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // The map and this guard hold the only references: nobody is waiting
        let idle = locks
            .get(&self.path)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2);
        if idle {
            locks.remove(&self.path);
        }
    }
}

impl RepositoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`
    pub async fn acquire(&self, path: &Path) -> RepositoryGuard {
        let (key, lock) = self.lock_for(path);
        debug!("waiting for repository lock on {}", key.display());
        let guard = lock.lock_owned().await;
        RepositoryGuard {
            path: key,
            locks: Arc::clone(&self.inner),
            _guard: guard,
        }
    }

    /// Take the lock only if nobody holds it
    pub fn try_acquire(&self, path: &Path) -> Option<RepositoryGuard> {
        let (key, lock) = self.lock_for(path);
        lock.try_lock_owned().ok().map(|guard| RepositoryGuard {
            path: key,
            locks: Arc::clone(&self.inner),
            _guard: guard,
        })
    }

    /// Number of repositories currently locked or waited on
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_for(&self, path: &Path) -> (PathBuf, Arc<AsyncMutex<()>>) {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(key.clone()).or_default().clone();
        (key, lock)
    }
}
