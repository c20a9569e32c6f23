use std::time::Duration;

use async_trait::async_trait;

use crate::{LimitSpec, RateDecider, RateDecision, RedisStore, TripwireError};

/// Default key prefix for GCRA state, `rate:<id>`.
pub const DEFAULT_RATE_PREFIX: &str = "rate:";

// GCRA allowN. Replies {allowed, remaining, retry_after, reset_after}; the two
// durations are strings of float seconds, retry_after is -1 when admitted.
const GCRA_ALLOW_N_LUA: &str = r#"
redis.replicate_commands()

local rate_limit_key = KEYS[1]
local burst = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local period = tonumber(ARGV[3])
local cost = tonumber(ARGV[4])

local emission_interval = period / rate
local increment = emission_interval * cost
local burst_offset = emission_interval * burst

-- epoch shifted to 2017-01-01 to keep float precision
local jan_1_2017 = 1483228800
local now = redis.call("TIME")
now = (now[1] - jan_1_2017) + (now[2] / 1000000)

local tat = redis.call("GET", rate_limit_key)

if not tat then
  tat = now
else
  tat = tonumber(tat)
end

tat = math.max(tat, now)

local new_tat = tat + increment
local allow_at = new_tat - burst_offset

local diff = now - allow_at
local remaining = diff / emission_interval

if remaining < 0 then
  local reset_after = tat - now
  local retry_after = diff * -1
  return {
    0,
    0,
    tostring(retry_after),
    tostring(reset_after),
  }
end

local reset_after = new_tat - now
if reset_after > 0 then
  redis.call("SET", rate_limit_key, new_tat, "EX", math.ceil(reset_after))
end
local retry_after = -1
return {cost, remaining, tostring(retry_after), tostring(reset_after)}
"#;

/// [`RateDecider`] running the generic cell rate algorithm inside Redis.
///
/// Each decision is one atomic Lua script execution against `rate:<id>`,
/// which stores the theoretical arrival time of the next event. The script
/// and its reply shape match the widely deployed `redis_rate` allowN script,
/// so limits are shared with other services using it on the same keys.
pub struct RedisGcraDecider {
    store: RedisStore,
    prefix: String,
    script: redis::Script,
}

impl RedisGcraDecider {
    /// Create a decider with the default `rate:` key prefix.
    pub fn new(store: RedisStore) -> Self {
        Self::with_prefix(store, DEFAULT_RATE_PREFIX)
    }

    /// Create a decider storing state under `<prefix><id>`.
    pub fn with_prefix(store: RedisStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            script: redis::Script::new(GCRA_ALLOW_N_LUA),
        }
    }

    /// Key holding GCRA state for `id`.
    pub fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }
}

fn parse_seconds(value: &str) -> Result<Duration, TripwireError> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| TripwireError::UnexpectedReply(format!("not a number of seconds: {value}")))?;

    // -1 means "no wait"
    Ok(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO))
}

#[async_trait]
impl RateDecider for RedisGcraDecider {
    async fn allow(&self, id: &str, limit: &LimitSpec) -> Result<RateDecision, TripwireError> {
        let mut connection = self.store.connection();

        let (allowed, remaining, retry_after, reset_after): (i64, i64, String, String) = self
            .script
            .key(self.key(id))
            .arg(limit.burst())
            .arg(limit.rate())
            .arg(limit.period().as_secs_f64())
            .arg(1u32)
            .invoke_async(&mut connection)
            .await?;

        Ok(RateDecision {
            allowed,
            remaining,
            retry_after: parse_seconds(&retry_after)?,
            reset_after: parse_seconds(&reset_after)?,
        })
    } // end method allow
}
