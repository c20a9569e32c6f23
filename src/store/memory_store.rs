use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{SharedStore, TripwireError};

#[derive(Debug)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn new(value: &[u8], now: Instant, ttl: Duration) -> Self {
        Self {
            value: value.to_vec(),
            // An unrepresentable deadline is as good as never expiring.
            expires_at: now
                .checked_add(ttl)
                .unwrap_or_else(|| now + Duration::from_secs(u32::MAX as u64)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-local [`SharedStore`] backed by a [`DashMap`].
///
/// Entries carry a deadline and expire lazily: an expired entry is invisible to
/// reads and is reclaimed by the next read or conditional write touching its
/// key, or by [`MemoryStore::purge_expired`].
///
/// An expired key that is never touched again stays in the map. Long-running
/// processes must call [`purge_expired`](MemoryStore::purge_expired)
/// periodically to bound memory.
///
/// Clones share the same underlying map, so one store can back any number of
/// locks and guards. State is not shared across processes.
///
/// # Examples
///
/// ```
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// use std::time::Duration;
/// use tripwire::{MemoryStore, SharedStore};
///
/// let store = MemoryStore::new();
/// let ttl = Duration::from_secs(60);
///
/// assert!(store.create_if_absent_with_ttl("k", b"1", ttl).await.unwrap());
/// assert!(!store.create_if_absent_with_ttl("k", b"1", ttl).await.unwrap());
/// assert_eq!(store.get("k").await.unwrap(), Some(b"1".to_vec()));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));

        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TripwireError> {
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        // the read guard above must be dropped before removing
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));

        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), TripwireError> {
        self.entries
            .insert(key.to_string(), MemoryEntry::new(value, Instant::now(), ttl));

        Ok(())
    }

    async fn create_if_absent_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, TripwireError> {
        let now = Instant::now();

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Ok(false);
                }

                occupied.insert(MemoryEntry::new(value, now, ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MemoryEntry::new(value, now, ttl));
                Ok(true)
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), TripwireError> {
        self.entries.remove(key);

        Ok(())
    }
}
