/// Error type for this crate.
///
/// `LockFailure` and `Overflow` are expected, recoverable outcomes rather than
/// faults; use [`TripwireError::is_lock_failure`] and
/// [`TripwireError::is_overflow`] to branch on them.
#[derive(Debug, thiserror::Error)]
pub enum TripwireError {
    /// Redis error.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
    #[error("redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    /// Transport or I/O failure reported by a non-Redis store.
    #[error("store error: {0}")]
    Store(String),

    /// A stored attempt record could not be encoded or decoded.
    #[error("attempt record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The resource is already held, or a trigger was already fired by someone else.
    #[error("lock failure")]
    LockFailure,

    /// A lock could not be acquired within the allotted retries.
    #[error("lock unavailable: {0}")]
    LockUnavailable(String),

    /// Rate limiter retries were exhausted; the guarded action did not run.
    #[error("limit has been exceeded")]
    Overflow,

    /// Invalid connection count for a Redis store.
    #[error("invalid redis client connection count: {0}")]
    InvalidRedisClientConnectionCount(String),

    /// Invalid rate limit specification.
    #[error("invalid limit: {0}")]
    InvalidLimit(&'static str),

    /// A store script replied with a value this crate does not understand.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl TripwireError {
    /// `true` when the error means "already held" or "already tripped".
    pub fn is_lock_failure(&self) -> bool {
        matches!(self, Self::LockFailure)
    }

    /// `true` when rate limiter retries ran out.
    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow)
    }
}
