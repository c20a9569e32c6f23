use std::time::Duration;

use crate::{
    ATTEMPT_PREFIX, DistributedLock, LockTrigger, SharedStore, Threshold, Trigger, TripwireError,
    common::{unix_expiry_after, unix_now},
    namespaced_key,
};

/// Per-identity sliding-window attempt counter with a one-shot breaker.
///
/// Each recorded attempt stores the Unix second at which it stops counting.
/// The list lives at `lock-count://<id>` as a JSON array of integers and
/// expires one window after its last write.
///
/// # Two-phase protocol
///
/// 1. [`record_attempt`](Self::record_attempt) checks the trigger and, if not
///    tripped, reads the stored list and appends one attempt in memory.
/// 2. [`evaluate`](Self::evaluate) prunes, compares against the threshold and
///    either trips (firing the trigger, running the side effect, deleting the
///    stored list) or persists the list.
///
/// Splitting the phases lets a caller charge one event against several
/// guards, e.g. per-IP and per-user, before any of them evaluates and trips.
///
/// # Pruning
///
/// Expired attempts are discarded only when the list already holds at least
/// `threshold` entries before pruning. Below the threshold nothing is pruned.
///
/// # Semantics & Limitations
///
/// - **One instance per flow:** the tripped flag and pending list are plain
///   fields of this value. Create a guard per request; do not share one
///   across concurrent flows.
/// - **Best-effort counting:** the read in `record_attempt` and the write in
///   `evaluate` are not one transaction. Concurrent evaluators of the same id
///   may under- or over-count. The guard damps abuse; it is not an audit log.
/// - **One side effect per instance:** once an instance knows it is tripped,
///   further evaluations return `true` without running the side effect again.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use std::time::Duration;
/// use tripwire::{AttemptGuard, MemoryStore, Threshold};
///
/// let store = MemoryStore::new();
/// let threshold = Threshold::try_from(3).unwrap();
///
/// for attempt in 1..=3 {
///     let mut guard = AttemptGuard::new(store.clone(), "user1", threshold, Duration::from_secs(300));
///     guard.record_attempt().await.unwrap();
///
///     let tripped = guard.evaluate().await.unwrap();
///     assert_eq!(tripped, attempt == 3);
/// }
/// # });
/// ```
pub struct AttemptGuard<S> {
    store: S,
    id: String,
    key: String,
    threshold: Threshold,
    window: Duration,
    trigger: Box<dyn Trigger>,
    expirations: Vec<i64>,
    tripped: bool,
}

impl<S> AttemptGuard<S>
where
    S: SharedStore + Clone + 'static,
{
    /// Create a guard whose trigger is a lock on the same `id`, held for one `window`.
    pub fn new(store: S, id: impl Into<String>, threshold: Threshold, window: Duration) -> Self {
        let id = id.into();
        let trigger = LockTrigger::new(DistributedLock::new(store.clone(), id.clone(), window));

        Self::with_trigger(store, id, threshold, window, trigger)
    }
}

impl<S: SharedStore> AttemptGuard<S> {
    /// Create a guard with a caller-supplied [`Trigger`].
    pub fn with_trigger(
        store: S,
        id: impl Into<String>,
        threshold: Threshold,
        window: Duration,
        trigger: impl Trigger + 'static,
    ) -> Self {
        let id = id.into();
        let key = namespaced_key(ATTEMPT_PREFIX, &id);

        Self {
            store,
            id,
            key,
            threshold,
            window,
            trigger: Box::new(trigger),
            expirations: Vec::with_capacity(threshold.as_usize()),
            tripped: false,
        }
    } // end constructor

    /// Caller-supplied identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Namespaced key of the stored attempt record, `lock-count://<id>`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Attempts within one window that trip the guard.
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Window length; also the TTL of the stored attempt record.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Last tripped state known to this instance.
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Attempts held in memory, including the one recorded but not yet evaluated.
    pub fn pending_attempts(&self) -> usize {
        self.expirations.len()
    }

    /// Charge one attempt against this identity.
    ///
    /// Returns `Ok(true)` without touching the attempt list if the trigger is
    /// already fired. Otherwise appends an attempt to the in-memory list (read
    /// from the store) and returns `Ok(false)`. Nothing is written until
    /// [`evaluate`](Self::evaluate).
    pub async fn record_attempt(&mut self) -> Result<bool, TripwireError> {
        if self.trigger.is_fired().await? {
            self.tripped = true;
            return Ok(true);
        }

        self.tripped = false;

        let mut expirations = self.load().await?;
        expirations.push(unix_expiry_after(self.window));
        self.expirations = expirations;

        Ok(false)
    } // end method record_attempt

    /// Decide whether the recorded attempts trip the guard.
    ///
    /// Same as [`evaluate_with`](Self::evaluate_with) without a side effect.
    pub async fn evaluate(&mut self) -> Result<bool, TripwireError> {
        self.evaluate_with(|| {}).await
    }

    /// Decide whether the recorded attempts trip the guard, running `on_trip` if they do.
    ///
    /// Returns `Ok(true)` immediately, without running `on_trip`, when this
    /// instance already knows it is tripped. When the threshold is reached
    /// the trigger is fired, `on_trip` runs exactly once, and the stored
    /// attempt record is deleted. Losing the race to fire the trigger still
    /// counts as a trip. Otherwise the list is persisted for one window and
    /// `Ok(false)` is returned.
    pub async fn evaluate_with<F>(&mut self, on_trip: F) -> Result<bool, TripwireError>
    where
        F: FnOnce(),
    {
        if self.tripped {
            return Ok(true);
        }

        let expirations = self.prune(unix_now());

        if expirations.len() >= self.threshold.as_usize() {
            match self.trigger.fire().await {
                Ok(()) => {
                    tracing::info!(key = %self.key, attempts = expirations.len(), "Attempt guard tripped");
                }
                Err(err) if err.is_lock_failure() => {
                    tracing::debug!(key = %self.key, "Attempt guard already tripped by a concurrent caller");
                }
                Err(err) => return Err(err),
            }

            self.tripped = true;
            on_trip();
            self.clear_record().await;

            return Ok(true);
        }

        if !expirations.is_empty() {
            let value = serde_json::to_vec(&expirations)?;
            self.store
                .set_with_ttl(&self.key, &value, self.window)
                .await?;
        }

        self.tripped = false;
        self.expirations = expirations;

        Ok(false)
    } // end method evaluate_with

    /// Forget this identity: delete the stored record, reset the trigger and
    /// clear instance state.
    ///
    /// Store failures are logged, never returned.
    pub async fn clear(&mut self) {
        self.clear_record().await;
        self.trigger.reset().await;
        self.tripped = false;
    }

    async fn load(&self) -> Result<Vec<i64>, TripwireError> {
        match self.store.get(&self.key).await? {
            Some(value) => Ok(serde_json::from_slice(&value)?),
            None => Ok(Vec::with_capacity(self.threshold.as_usize())),
        }
    }

    fn prune(&self, now: i64) -> Vec<i64> {
        if self.expirations.len() < self.threshold.as_usize() {
            return self.expirations.clone();
        }

        self.expirations
            .iter()
            .copied()
            .filter(|expires_at| *expires_at > now)
            .collect()
    }

    async fn clear_record(&mut self) {
        if let Err(err) = self.store.delete(&self.key).await {
            tracing::error!(error = ?err, key = %self.key, "Failed to clear attempt record");
        }

        self.expirations.clear();
    }
}
