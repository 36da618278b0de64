//! Multicast callback lists.
//!
//! Adding and removing observers takes the write lock. [`ObserverList::notify`]
//! copies the current callbacks under the read lock and calls them after
//! releasing it, so a callback may itself add or remove observers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handle returned by [`ObserverList::add`], used to remove the observer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct ObserverList<T: ?Sized> {
    next_id: AtomicU64,
    observers: RwLock<Vec<(ObserverId, Callback<T>)>>,
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Callback<T> = Arc::new(callback);
        self.write().push((id, callback));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Call every observer registered at the time of the call, in
    /// registration order.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self.read().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in snapshot {
            callback(value);
        }
    }

    // Poisoning is ignored: a push or retain cannot leave the Vec half-updated.
    fn read(&self) -> RwLockReadGuard<'_, Vec<(ObserverId, Callback<T>)>> {
        self.observers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(ObserverId, Callback<T>)>> {
        self.observers.write().unwrap_or_else(|e| e.into_inner())
    }
}
