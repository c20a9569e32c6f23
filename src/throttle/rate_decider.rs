use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::TripwireError;

/// A quota: `rate` events per `period`, with up to `burst` admitted back to back.
///
/// # Validation
///
/// - `rate` ≥ 1
/// - `burst` ≥ 1
/// - `period` > 0
///
/// ```
/// use std::time::Duration;
/// use tripwire::LimitSpec;
///
/// let limit = LimitSpec::per_second(10).unwrap();
/// assert_eq!(limit.rate(), 10);
/// assert_eq!(limit.burst(), 10);
/// assert_eq!(limit.period(), Duration::from_secs(1));
///
/// assert!(LimitSpec::per_minute(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LimitSpec {
    rate: u32,
    burst: u32,
    period: Duration,
}

impl LimitSpec {
    /// Build a limit from its parts.
    pub fn new(rate: u32, burst: u32, period: Duration) -> Result<Self, TripwireError> {
        if rate == 0 {
            return Err(TripwireError::InvalidLimit("Rate must be greater than 0"));
        }
        if burst == 0 {
            return Err(TripwireError::InvalidLimit("Burst must be greater than 0"));
        }
        if period.is_zero() {
            return Err(TripwireError::InvalidLimit("Period must be greater than 0"));
        }

        Ok(Self {
            rate,
            burst,
            period,
        })
    }

    /// `rate` per second, burst equal to rate.
    pub fn per_second(rate: u32) -> Result<Self, TripwireError> {
        Self::new(rate, rate, Duration::from_secs(1))
    }

    /// `rate` per minute, burst equal to rate.
    pub fn per_minute(rate: u32) -> Result<Self, TripwireError> {
        Self::new(rate, rate, Duration::from_secs(60))
    }

    /// `rate` per hour, burst equal to rate.
    pub fn per_hour(rate: u32) -> Result<Self, TripwireError> {
        Self::new(rate, rate, Duration::from_secs(3600))
    }

    /// Events admitted per period.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Events admitted back to back.
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Length of one period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// One admission decision, consumed transiently and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Events admitted by this decision; `0` means denied.
    pub allowed: i64,
    /// Events still admissible right now.
    pub remaining: i64,
    /// Suggested wait before asking again. Zero when admitted or unknown.
    pub retry_after: Duration,
    /// Time until the quota is fully replenished.
    pub reset_after: Duration,
}

impl RateDecision {
    /// `true` if at least one event was admitted.
    pub fn is_allowed(&self) -> bool {
        self.allowed > 0
    }
}

/// External rate-limit decision provider.
///
/// The algorithm (token bucket, GCRA, sliding window) is the provider's
/// business; callers only consume the decision and its timing hints.
#[async_trait]
pub trait RateDecider: Send + Sync {
    /// Ask whether one event for `id` is admitted under `limit`.
    async fn allow(&self, id: &str, limit: &LimitSpec) -> Result<RateDecision, TripwireError>;
}

#[async_trait]
impl<D> RateDecider for Arc<D>
where
    D: RateDecider + ?Sized,
{
    async fn allow(&self, id: &str, limit: &LimitSpec) -> Result<RateDecision, TripwireError> {
        (**self).allow(id, limit).await
    }
}
