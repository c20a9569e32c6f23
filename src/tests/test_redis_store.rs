use std::env;

use super::runtime;
use crate::{RedisStore, RedisStoreOptions};

fn redis_url() -> Option<String> {
    env::var("REDIS_URL").ok()
}

async fn pooled_store(url: &str, connection_count: usize) -> RedisStore {
    let client = redis::Client::open(url).unwrap();
    RedisStore::from_client(client, RedisStoreOptions { connection_count })
        .await
        .unwrap()
}

#[test]
fn clones_share_round_robin_rotation() {
    let Some(url) = redis_url() else {
        return;
    };

    runtime::block_on(async {
        let store = pooled_store(&url, 3).await;
        let guard_copy = store.clone();
        let trigger_copy = store.clone();

        assert_eq!(store.next_index(), 0);
        assert_eq!(guard_copy.next_index(), 1);
        assert_eq!(trigger_copy.next_index(), 2);
        assert_eq!(store.next_index(), 0);
    });
}

#[test]
fn debug_reports_connection_count() {
    let Some(url) = redis_url() else {
        return;
    };

    runtime::block_on(async {
        let store = pooled_store(&url, 2).await;

        assert_eq!(format!("{store:?}"), "RedisStore { connection_count: 2, .. }");
    });
}
