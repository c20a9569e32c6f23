use std::{
    ops::Deref,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Key prefix for mutual-exclusion locks and lock-backed triggers.
pub const LOCK_PREFIX: &str = "blocks";

/// Key prefix for attempt records kept by [`AttemptGuard`](crate::AttemptGuard).
pub const ATTEMPT_PREFIX: &str = "lock-count";

/// Value written at a lock key while the lock is held.
///
/// Only its presence matters; no other payload is ever read back.
pub const LOCK_SENTINEL: &str = "1";

/// Render a store key as `<prefix>://<id>`.
///
/// Namespacing keeps lock keys, attempt records and application data apart
/// when they share one store.
///
/// ```
/// assert_eq!(tripwire::namespaced_key("blocks", "user1"), "blocks://user1");
/// ```
pub fn namespaced_key(prefix: &str, id: &str) -> String {
    format!("{prefix}://{id}")
}

/// Number of attempts inside one window that trips an [`AttemptGuard`](crate::AttemptGuard).
///
/// # Validation
///
/// Must be at least 1.
///
/// ```
/// use tripwire::Threshold;
///
/// let threshold = Threshold::try_from(5).unwrap();
/// assert_eq!(*threshold, 5);
/// assert!(Threshold::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(u32);

impl Deref for Threshold {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u32> for Threshold {
    type Error = &'static str;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            Err("Threshold must be at least 1")
        } else {
            Ok(Self(value))
        }
    }
}

impl Threshold {
    pub(crate) fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// Current Unix time in whole seconds.
pub(crate) fn unix_now() -> i64 {
    unix_seconds(SystemTime::now())
}

/// Unix time in whole seconds at which an attempt recorded now stops counting.
pub(crate) fn unix_expiry_after(window: Duration) -> i64 {
    let now = SystemTime::now();
    let expiry = now.checked_add(window).unwrap_or(now);

    unix_seconds(expiry)
}

fn unix_seconds(at: SystemTime) -> i64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
