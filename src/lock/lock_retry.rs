use std::{future::Future, time::Duration};

use crate::{LOCK_SENTINEL, SharedStore, TripwireError, runtime};

/// Retry policy for [`with_lock`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockRetryOptions {
    /// Acquisition attempts before giving up. `0` is treated as `1`.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
    /// Time-to-live of the lock once taken.
    pub ttl: Duration,
}

impl Default for LockRetryOptions {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(100),
            ttl: Duration::from_secs(15),
        }
    }
}

/// Run `action` while holding the lock at `key`.
///
/// Acquisition is retried per `options`; if the lock never frees up the call
/// fails with [`TripwireError::LockUnavailable`] and `action` does not run. A
/// store error during acquisition aborts immediately. Once `action` completes
/// the key is deleted best-effort and the action's result is returned as is.
///
/// `key` is used verbatim; pass [`DistributedLock::key`](crate::DistributedLock::key)
/// to share a lock with [`DistributedLock`](crate::DistributedLock) users.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use tripwire::{LockRetryOptions, MemoryStore, TripwireError, with_lock};
///
/// let store = MemoryStore::new();
/// let total = with_lock(&store, "jobs:nightly", &LockRetryOptions::default(), || async {
///     Ok::<_, TripwireError>(40 + 2)
/// })
/// .await
/// .unwrap();
///
/// assert_eq!(total, 42);
/// # });
/// ```
pub async fn with_lock<S, F, Fut, T, E>(
    store: &S,
    key: &str,
    options: &LockRetryOptions,
    action: F,
) -> Result<T, E>
where
    S: SharedStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<TripwireError>,
{
    try_lock(store, key, options).await?;

    let result = action().await;

    if let Err(err) = store.delete(key).await {
        tracing::error!(error = ?err, key, "Failed to release lock");
    }

    result
}

async fn try_lock<S>(store: &S, key: &str, options: &LockRetryOptions) -> Result<(), TripwireError>
where
    S: SharedStore + ?Sized,
{
    let attempts = options.attempts.max(1);

    for attempt in 1..=attempts {
        if store
            .create_if_absent_with_ttl(key, LOCK_SENTINEL.as_bytes(), options.ttl)
            .await?
        {
            return Ok(());
        }

        if attempt < attempts {
            runtime::sleep(options.delay).await;
        }
    }

    Err(TripwireError::LockUnavailable(key.to_string()))
}
