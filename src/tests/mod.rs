mod support;

mod test_common_validation;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod test_redis_store;
