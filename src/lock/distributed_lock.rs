use std::{fmt, time::Duration};

use crate::{LOCK_PREFIX, LOCK_SENTINEL, SharedStore, TripwireError, namespaced_key};

/// Mutual exclusion over one named resource, shared by every process using the same store.
///
/// The lock is a sentinel value stored at `blocks://<id>` with a time-to-live.
/// Presence means held, absence means free. The lock carries no owner: any
/// holder of a `DistributedLock` for the same id can release it, and an
/// unreleased lock frees itself when its TTL lapses.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use std::time::Duration;
/// use tripwire::{DistributedLock, MemoryStore};
///
/// let store = MemoryStore::new();
/// let lock = DistributedLock::new(store.clone(), "report-42", Duration::from_secs(30));
///
/// assert!(lock.acquire().await.unwrap());
/// assert!(!lock.acquire().await.unwrap());
///
/// lock.release().await;
/// assert!(!lock.is_held().await.unwrap());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DistributedLock<S> {
    store: S,
    id: String,
    key: String,
    ttl: Duration,
}

impl<S: SharedStore> DistributedLock<S> {
    /// Create a lock on `id` that expires `ttl` after acquisition.
    pub fn new(store: S, id: impl Into<String>, ttl: Duration) -> Self {
        let id = id.into();
        let key = namespaced_key(LOCK_PREFIX, &id);

        Self {
            store,
            id,
            key,
            ttl,
        }
    } // end constructor

    /// Caller-supplied resource id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Namespaced store key, `blocks://<id>`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Time-to-live applied on acquisition.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Try once to take the lock.
    ///
    /// Returns `Ok(false)` when anyone already holds it. Errors only on store failure.
    pub async fn acquire(&self) -> Result<bool, TripwireError> {
        self.store
            .create_if_absent_with_ttl(&self.key, LOCK_SENTINEL.as_bytes(), self.ttl)
            .await
    }

    /// Delete the lock key. Failures are logged and never returned.
    pub async fn release(&self) {
        if let Err(err) = self.store.delete(&self.key).await {
            tracing::error!(error = ?err, key = %self.key, "Failed to release lock");
        }
    }

    /// Whether the lock is currently held by anyone.
    ///
    /// A missing key is `Ok(false)`; store failures propagate.
    pub async fn is_held(&self) -> Result<bool, TripwireError> {
        let value = self.store.get(&self.key).await?;

        Ok(value.is_some_and(|value| value == LOCK_SENTINEL.as_bytes()))
    }
}

impl<S> fmt::Display for DistributedLock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
