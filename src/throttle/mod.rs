//! Quota-bounded execution with bounded retry and backoff.
//!
//! A [`RateDecider`] answers "may `id` proceed under this limit right now?".
//! [`RateLimiter`] asks it repeatedly, sleeping for the suggested delay after
//! each denial, and runs the caller's action once admitted.

mod rate_decider;
pub use rate_decider::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
mod rate_limiter;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use rate_limiter::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
mod redis_gcra_decider;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use redis_gcra_decider::*;
