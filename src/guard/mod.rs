//! Windowed attempt counting with a one-shot breaker.
//!
//! An [`AttemptGuard`] counts "bad" events (failed logins, rejected tokens)
//! per identity and trips a [`Trigger`] once a threshold is reached inside a
//! time window. The default trigger is a [`LockTrigger`], so the tripped state
//! is a [`DistributedLock`](crate::DistributedLock) that expires on its own.

mod trigger;
pub use trigger::*;

mod attempt_guard;
pub use attempt_guard::*;
