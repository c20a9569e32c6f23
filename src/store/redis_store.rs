use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};

use crate::{SharedStore, TripwireError, runtime};

/// Configuration for [`RedisStore`].
#[derive(Clone, Debug)]
pub struct RedisStoreOptions {
    /// Number of [`ConnectionManager`]s opened and handed out round-robin.
    ///
    /// Must be greater than 0.
    pub connection_count: usize,
}

impl Default for RedisStoreOptions {
    fn default() -> Self {
        Self {
            connection_count: 1,
        }
    }
}

/// [`SharedStore`] backed by Redis.
///
/// Holds one or more [`redis::aio::ConnectionManager`]s (automatic reconnection)
/// and rotates through them per command. Cloning is cheap and shares the
/// connections and the rotation.
///
/// | operation                   | command        |
/// |-----------------------------|----------------|
/// | `get`                       | `GET`          |
/// | `set_with_ttl`              | `SET .. PX`    |
/// | `create_if_absent_with_ttl` | `SET .. NX PX` |
/// | `delete`                    | `DEL`          |
///
/// TTLs are sent in milliseconds and rounded up to at least 1 ms.
///
/// # Examples
///
/// ```ignore
/// let store = RedisStore::open("redis://127.0.0.1:6379/").await?;
/// store.wait_for_activation(20, Duration::from_millis(200)).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    connection_managers: Arc<Vec<ConnectionManager>>,
    track_index: Arc<AtomicUsize>,
}

impl RedisStore {
    /// Open a store with default options against the Redis server at `url`.
    pub async fn open(url: &str) -> Result<Self, TripwireError> {
        let client = Client::open(url)?;
        Self::from_client(client, RedisStoreOptions::default()).await
    }

    /// Create a store from a [`redis::Client`], opening `options.connection_count` connections.
    pub async fn from_client(
        client: Client,
        options: RedisStoreOptions,
    ) -> Result<Self, TripwireError> {
        if options.connection_count == 0 {
            return Err(TripwireError::InvalidRedisClientConnectionCount(
                "connection count must be > 0".to_string(),
            ));
        }

        let mut connection_managers = Vec::with_capacity(options.connection_count);

        for _ in 0..options.connection_count {
            connection_managers.push(client.get_connection_manager().await?);
        }

        Ok(Self {
            connection_managers: Arc::new(connection_managers),
            track_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Wrap an already established [`ConnectionManager`].
    pub fn from_connection_manager(connection_manager: ConnectionManager) -> Self {
        Self {
            connection_managers: Arc::new(vec![connection_manager]),
            track_index: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get a [`ConnectionManager`] from the pool.
    pub(crate) fn connection(&self) -> ConnectionManager {
        self.connection_managers[self.next_index()].clone()
    } // end method connection

    /// Pool slot for the next command; clones share the rotation.
    pub(crate) fn next_index(&self) -> usize {
        self.track_index.fetch_add(1, Ordering::Relaxed) % self.connection_managers.len()
    }

    /// Send a `PING`.
    pub async fn ping(&self) -> Result<(), TripwireError> {
        let mut connection = self.connection();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;

        Ok(())
    }

    /// Ping until the server answers, up to `attempts` times with `delay` in between.
    ///
    /// Returns the last ping error if the server never answers.
    pub async fn wait_for_activation(
        &self,
        attempts: u32,
        delay: Duration,
    ) -> Result<(), TripwireError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.ping().await {
                Ok(()) => return Ok(()),
                Err(err) if attempt >= attempts => return Err(err),
                Err(err) => {
                    tracing::debug!(error = ?err, attempt, "redis not ready yet");
                    runtime::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection_count", &self.connection_managers.len())
            .finish_non_exhaustive()
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    ttl.as_millis().clamp(1, u64::MAX as u128) as u64
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TripwireError> {
        let mut connection = self.connection();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), TripwireError> {
        let mut connection = self.connection();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await?;

        Ok(())
    }

    async fn create_if_absent_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, TripwireError> {
        let mut connection = self.connection();
        // nil reply when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await?;

        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), TripwireError> {
        let mut connection = self.connection();
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}
