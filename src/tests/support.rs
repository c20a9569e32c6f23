//! Test doubles shared by the unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{MemoryStore, SharedStore, Trigger, TripwireError};

fn unavailable() -> TripwireError {
    TripwireError::Store("store unavailable".to_string())
}

#[derive(Default)]
struct Faults {
    get: AtomicBool,
    set: AtomicBool,
    create: AtomicBool,
    delete: AtomicBool,
}

/// Delegates to a [`MemoryStore`] but fails chosen operations on demand.
#[derive(Clone, Default)]
pub(super) struct FaultyStore {
    pub inner: MemoryStore,
    faults: Arc<Faults>,
}

impl FaultyStore {
    pub fn fail_get(&self, fail: bool) {
        self.faults.get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.faults.set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.faults.create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.faults.delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SharedStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TripwireError> {
        if self.faults.get.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get(key).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), TripwireError> {
        if self.faults.set.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn create_if_absent_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, TripwireError> {
        if self.faults.create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.create_if_absent_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), TripwireError> {
        if self.faults.delete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete(key).await
    }
}

/// What a [`ScriptedTrigger`] does when fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FireOutcome {
    /// Becomes fired.
    Fires,
    /// Reports that someone else fired first, without ever reporting fired.
    LostRace,
    /// Fails like an unreachable store.
    StoreDown,
}

/// In-memory [`Trigger`] that counts calls.
#[derive(Clone)]
pub(super) struct ScriptedTrigger {
    outcome: FireOutcome,
    fired: Arc<AtomicBool>,
    fire_calls: Arc<AtomicUsize>,
    reset_calls: Arc<AtomicUsize>,
}

impl ScriptedTrigger {
    pub fn new(outcome: FireOutcome) -> Self {
        Self {
            outcome,
            fired: Arc::new(AtomicBool::new(false)),
            fire_calls: Arc::new(AtomicUsize::new(0)),
            reset_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_fired(&self, fired: bool) {
        self.fired.store(fired, Ordering::SeqCst);
    }

    pub fn fire_calls(&self) -> usize {
        self.fire_calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) -> usize {
        self.reset_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Trigger for ScriptedTrigger {
    async fn fire(&self) -> Result<(), TripwireError> {
        self.fire_calls.fetch_add(1, Ordering::SeqCst);

        match self.outcome {
            FireOutcome::Fires => {
                self.fired.store(true, Ordering::SeqCst);
                Ok(())
            }
            FireOutcome::LostRace => Err(TripwireError::LockFailure),
            FireOutcome::StoreDown => Err(unavailable()),
        }
    }

    async fn is_fired(&self) -> Result<bool, TripwireError> {
        Ok(self.fired.load(Ordering::SeqCst))
    }

    async fn reset(&self) {
        self.reset_calls.fetch_add(1, Ordering::SeqCst);
        self.fired.store(false, Ordering::SeqCst);
    }
}

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub(super) use decider::ScriptedDecider;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod decider {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;

    use crate::{LimitSpec, RateDecider, RateDecision, TripwireError};

    /// Denies the first `denials` calls, then admits; or fails every call.
    pub(in crate::tests) struct ScriptedDecider {
        denials: usize,
        retry_after: Duration,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedDecider {
        pub fn denying(denials: usize, retry_after: Duration) -> Self {
            Self {
                denials,
                retry_after,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always_denying(retry_after: Duration) -> Self {
            Self::denying(usize::MAX, retry_after)
        }

        pub fn failing() -> Self {
            Self {
                denials: 0,
                retry_after: Duration::ZERO,
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateDecider for ScriptedDecider {
        async fn allow(
            &self,
            _id: &str,
            limit: &LimitSpec,
        ) -> Result<RateDecision, TripwireError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(TripwireError::Store("decider unavailable".to_string()));
            }

            if call < self.denials {
                return Ok(RateDecision {
                    allowed: 0,
                    remaining: 0,
                    retry_after: self.retry_after,
                    reset_after: self.retry_after,
                });
            }

            Ok(RateDecision {
                allowed: 1,
                remaining: i64::from(limit.burst()) - 1,
                retry_after: Duration::ZERO,
                reset_after: limit.period(),
            })
        }
    }
}

/// Write `expirations` as a stored attempt record at `key`.
pub(super) async fn seed_attempts(store: &impl SharedStore, key: &str, expirations: &[i64]) {
    let value = serde_json::to_vec(expirations).unwrap();
    store
        .set_with_ttl(key, &value, Duration::from_secs(600))
        .await
        .unwrap();
}

/// Read the stored attempt record at `key`, if any.
pub(super) async fn stored_attempts(store: &impl SharedStore, key: &str) -> Option<Vec<i64>> {
    store
        .get(key)
        .await
        .unwrap()
        .map(|value| serde_json::from_slice(&value).unwrap())
}
