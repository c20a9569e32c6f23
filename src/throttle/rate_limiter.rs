use std::future::Future;

use crate::{LimitSpec, RateDecider, TripwireError, runtime};

/// Configuration for [`RateLimiter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimiterOptions {
    /// Decisions requested per call before giving up with
    /// [`TripwireError::Overflow`], unless the call overrides it.
    pub retry_max: u32,
}

impl Default for RateLimiterOptions {
    fn default() -> Self {
        Self { retry_max: 5 }
    }
}

/// Runs actions under a shared quota, waiting out denials a bounded number of times.
///
/// Each call asks the [`RateDecider`] for admission up to `retry_max` times.
/// After a denial the caller sleeps for the provider's `retry_after` hint and
/// asks again. Admission runs the action and returns its result; running out
/// of retries fails with [`TripwireError::Overflow`] and the action never runs;
/// a provider error aborts at once, also without running the action.
///
/// # Semantics & Limitations
///
/// - **Not cancellation-aware:** backoff waits on a runtime timer and ignores
///   any caller-side deadline. Dropping the returned future is the only way
///   to stop it early.
/// - **Sleep after every denial:** including the last one, so an overflowing
///   call takes roughly the sum of the suggested delays.
///
/// # Examples
///
/// ```ignore
/// let store = RedisStore::open("redis://127.0.0.1:6379/").await?;
/// let limiter = RateLimiter::new(RedisGcraDecider::new(store));
///
/// let body = limiter
///     .limit("partner-api", 3, || async { fetch_report().await }, None)
///     .await?;
/// ```
#[derive(Debug)]
pub struct RateLimiter<D> {
    decider: D,
    retry_max: u32,
}

impl<D: RateDecider> RateLimiter<D> {
    /// Create a limiter with default options.
    pub fn new(decider: D) -> Self {
        Self::with_options(decider, RateLimiterOptions::default())
    }

    /// Create a limiter with explicit options.
    pub fn with_options(decider: D, options: RateLimiterOptions) -> Self {
        Self {
            decider,
            retry_max: options.retry_max,
        }
    }

    /// The decision provider.
    pub fn decider(&self) -> &D {
        &self.decider
    }

    /// Default retry maximum used when a call passes `None`.
    pub fn retry_max(&self) -> u32 {
        self.retry_max
    }

    /// Change the default retry maximum. `0` is ignored.
    pub fn set_retry_max(&mut self, retry_max: u32) {
        if retry_max > 0 {
            self.retry_max = retry_max;
        }
    }

    /// Run `action` under a quota of `rate` events per second for `id`.
    ///
    /// See [`limit_per`](Self::limit_per).
    pub async fn limit<F, Fut, T, E>(
        &self,
        id: &str,
        rate: u32,
        action: F,
        retry_max: Option<u32>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TripwireError>,
    {
        let limit = LimitSpec::per_second(rate)?;
        self.limit_per(id, &limit, action, retry_max).await
    }

    /// Run `action` once `id` is admitted under `limit`.
    ///
    /// `retry_max` overrides the limiter's default for this call; `Some(0)`
    /// overflows without consulting the provider.
    pub async fn limit_per<F, Fut, T, E>(
        &self,
        id: &str,
        limit: &LimitSpec,
        action: F,
        retry_max: Option<u32>,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TripwireError>,
    {
        let retry_max = retry_max.unwrap_or(self.retry_max);
        self.wait_for_admission(id, limit, retry_max).await?;

        action().await
    } // end method limit_per

    async fn wait_for_admission(
        &self,
        id: &str,
        limit: &LimitSpec,
        retry_max: u32,
    ) -> Result<(), TripwireError> {
        for _ in 0..retry_max {
            let decision = self.decider.allow(id, limit).await?;

            if decision.is_allowed() {
                return Ok(());
            }

            tracing::trace!(
                id,
                allowed = decision.allowed,
                remaining = decision.remaining,
                retry_after = ?decision.retry_after,
                reset_after = ?decision.reset_after,
                "Rate limit denied, backing off"
            );

            runtime::sleep(decision.retry_after).await;
        }

        Err(TripwireError::Overflow)
    }
}
