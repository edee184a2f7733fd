//! Shared holder of the client state.
//!
//! Handlers and timers all write through [`StateStore::modify`]; each call
//! is one atomic step and counts as one redraw for whoever holds a
//! [`StateWatcher`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard, watch};

/// The single copy of what the user sees. Clones share it.
pub struct StateStore<T> {
    inner: Arc<StateStoreInner<T>>,
}

struct StateStoreInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
    version_tx: watch::Sender<u64>,
}

/// Wakes the renderer after a write. Several writes between two waits
/// collapse into one wake-up.
pub struct StateWatcher {
    version_rx: watch::Receiver<u64>,
}

impl<T> StateStore<T> {
    pub fn new(initial: T) -> Self {
        let (version_tx, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(StateStoreInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
                version_tx,
            }),
        }
    }

    /// Overwrite the whole state.
    pub async fn update(&self, value: T) {
        self.modify(|state| *state = value).await;
    }

    /// Run `f` under the write lock. Readers never see a half-applied `f`.
    pub async fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.data.write().await;
        let out = f(&mut guard);
        let new_version = self.inner.version.fetch_add(1, Ordering::Relaxed) + 1;
        // Unlock first so a woken renderer can read right away.
        drop(guard);
        self.inner.version_tx.send_replace(new_version);
        out
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    /// Number of mutations applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> StateWatcher {
        StateWatcher {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

impl<T: Clone> StateStore<T> {
    /// Clone out the current value.
    pub async fn snapshot(&self) -> T {
        self.inner.data.read().await.clone()
    }
}

impl<T> Clone for StateStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl StateWatcher {
    /// Resolve after the next write; `Err` once every store handle is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.version_rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_modify_bumps_version_and_notifies() {
        let store = StateStore::new(0u32);
        let mut watcher = store.subscribe();

        let doubled = store
            .modify(|n| {
                *n += 21;
                *n * 2
            })
            .await;
        assert_eq!(doubled, 42);
        assert_eq!(store.version(), 1);

        watcher.changed().await.unwrap();
        assert_eq!(*store.read().await, 21);

        store.update(7).await;
        assert_eq!(store.version(), 2);
        assert_eq!(store.snapshot().await, 7);
    }

    #[tokio::test]
    async fn test_writes_between_waits_wake_once() {
        let store = StateStore::new(String::new());
        store.modify(|s| s.push('a')).await;
        let mut watcher = store.subscribe();

        store.modify(|s| s.push('b')).await;
        store.modify(|s| s.push('c')).await;
        watcher.changed().await.unwrap();
        assert_eq!(store.read().await.as_str(), "abc");
        assert_eq!(store.version(), 3);

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            watcher.changed(),
        )
        .await;
        assert!(pending.is_err());

        drop(store);
        assert!(watcher.changed().await.is_err());
    }
}
