//! Change subscriptions on the cache store.
//!
//! Callbacks run on the writer's task right after a write commits, in
//! registration order. A [`Subscription`] unregisters its callback when
//! dropped or when [`Subscription::unsubscribe`] is called.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::model::Item;

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// The item list was written; carries the full new list.
    Items(Vec<Item>),
    /// The record was removed entirely.
    Removed,
}

type Callback = Arc<dyn Fn(&StoreChange) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Watchers {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<u64, Callback>>,
}

impl std::fmt::Debug for Watchers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchers").field("count", &self.len()).finish()
    }
}

impl Watchers {
    pub(crate) fn subscribe(self: &Arc<Self>, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.insert(id, callback);
        }
        Subscription { id, watchers: Arc::downgrade(self) }
    }

    pub(crate) fn notify(&self, change: &StoreChange) {
        // Snapshot first so callbacks may subscribe or unsubscribe.
        let callbacks: Vec<Callback> = match self.callbacks.lock() {
            Ok(callbacks) => callbacks.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn remove(&self, id: u64) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.remove(&id);
        }
    }
}

/// Handle returned by `CacheStore::watch`.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    watchers: Weak<Watchers>,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(watchers) = self.watchers.upgrade() {
            watchers.remove(self.id);
        }
    }
}
