//! Shared key-value store abstraction.
//!
//! Every coordination primitive in this crate is built on four store
//! operations. Cross-process coordination goes through the store's atomic
//! `create_if_absent_with_ttl`; there is no other consensus layer.
//!
//! - [`MemoryStore`]: process-local, for single-process deployments and tests
//! - [`RedisStore`]: Redis-backed, shared by a fleet of processes

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::TripwireError;

mod memory_store;
pub use memory_store::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
#[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
mod redis_store;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use redis_store::*;

/// A key-value store reachable by all coordinating processes.
///
/// A missing key is never an error: `get` reports it as `Ok(None)`, which
/// callers must keep distinct from real store failures.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read the value at `key`, or `None` if it is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TripwireError>;

    /// Unconditionally write `value` at `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration)
    -> Result<(), TripwireError>;

    /// Write `value` at `key` only if no live value exists there.
    ///
    /// Returns `true` if this call created the key.
    async fn create_if_absent_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, TripwireError>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), TripwireError>;
}

#[async_trait]
impl<S> SharedStore for Arc<S>
where
    S: SharedStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TripwireError> {
        (**self).get(key).await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), TripwireError> {
        (**self).set_with_ttl(key, value, ttl).await
    }

    async fn create_if_absent_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, TripwireError> {
        (**self).create_if_absent_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), TripwireError> {
        (**self).delete(key).await
    }
}
