use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use std::sync::Arc;

use crate::subscription::{Subscription, SubscriptionInfo};

/// Key → subscription map shared by registrants and both dispatch loops.
///
/// One mutex guards every mutation and snapshot. Iteration is copy-on-read:
/// `snapshot` clones the current records (cheap, they are `Arc`s) so the
/// loops match and deliver without holding the lock, and live registration
/// or unregistration never invalidates an in-progress scan.
#[derive(Default)]
pub(crate) struct Registry {
    inner: Mutex<BTreeMap<String, Arc<Subscription>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a record; an existing record with the same key is replaced
    /// (last registration wins).
    pub(crate) fn add(&self, subscription: Arc<Subscription>) {
        let key = subscription.key().to_string();
        let replaced = self.lock().insert(key, subscription);
        if let Some(old) = replaced {
            tracing::debug!(key = old.key(), "subscription replaced");
        }
    }

    /// Remove every record whose key starts with `prefix`. Returns how many
    /// were removed; zero is a no-op, not an error.
    pub(crate) fn remove_like(&self, prefix: &str) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|key, _| !key.starts_with(prefix));
        before - map.len()
    }

    /// Clone-on-read view of all current records.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Subscription>> {
        self.lock().values().cloned().collect()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn infos(&self) -> Vec<SubscriptionInfo> {
        self.lock().values().map(|s| s.info()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Arc<Subscription>>> {
        // A poisoned registry only means a panic elsewhere while holding the
        // lock; the map itself is still valid.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
