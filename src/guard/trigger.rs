use async_trait::async_trait;

use crate::{DistributedLock, SharedStore, TripwireError};

/// Something that can be tripped, queried and re-armed.
///
/// Decouples "a guard tripped" from how the tripped state is stored.
#[async_trait]
pub trait Trigger: Send + Sync {
    /// Transition to tripped.
    ///
    /// Fails with [`TripwireError::LockFailure`] if the trigger was already
    /// fired, e.g. by a concurrent guard that won the race.
    async fn fire(&self) -> Result<(), TripwireError>;

    /// Whether the trigger is currently tripped.
    async fn is_fired(&self) -> Result<bool, TripwireError>;

    /// Re-arm the trigger. Best-effort; failures are not reported.
    async fn reset(&self);
}

/// [`Trigger`] whose tripped state is a [`DistributedLock`].
///
/// Firing acquires the lock, so the trip lasts for the lock's TTL unless reset.
#[derive(Debug, Clone)]
pub struct LockTrigger<S> {
    lock: DistributedLock<S>,
}

impl<S: SharedStore> LockTrigger<S> {
    /// Back a trigger with `lock`.
    pub fn new(lock: DistributedLock<S>) -> Self {
        Self { lock }
    }

    /// The backing lock.
    pub fn lock(&self) -> &DistributedLock<S> {
        &self.lock
    }
}

#[async_trait]
impl<S: SharedStore> Trigger for LockTrigger<S> {
    async fn fire(&self) -> Result<(), TripwireError> {
        if self.lock.acquire().await? {
            Ok(())
        } else {
            Err(TripwireError::LockFailure)
        }
    }

    async fn is_fired(&self) -> Result<bool, TripwireError> {
        self.lock.is_held().await
    }

    async fn reset(&self) {
        self.lock.release().await;
    }
}
