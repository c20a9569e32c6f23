//! Mutual exclusion over named resources.
//!
//! [`DistributedLock`] is a single non-blocking attempt built on the store's
//! create-if-absent primitive. [`with_lock`] wraps acquisition in a bounded
//! retry loop with a fixed delay for callers that want to wait.

mod distributed_lock;
pub use distributed_lock::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
mod lock_retry;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use lock_retry::*;
