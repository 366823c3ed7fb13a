use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};

/// Fixed-window request budgets for the public ingestion surface.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Count one request from `ip`. Err(AppError::RateLimited) once over budget.
    async fn check_ip(&self, ip: &str) -> AppResult<()>;

    /// Count one ingestion under an API key, identified by its hash.
    async fn check_api_key(&self, key_hash: &str) -> AppResult<()>;
}

/// Lua script for atomic increment with TTL.
/// Returns the new count after increment.
/// If the key doesn't exist, it's created with TTL.
/// A key left without a TTL gets one on its next hit.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

/// Redis-backed rate limiter for production use.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    max_per_api_key: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        max_per_ip: u64,
        max_per_api_key: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        let script = Script::new(INCR_WITH_TTL_SCRIPT);
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            max_per_api_key,
            script,
        })
    }

    async fn bump(&self, key: &str, limit: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let current: u64 = self
            .script
            .key(key)
            .arg(self.window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            tracing::debug!(key, current, limit, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }

        Ok(())
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check_ip(&self, ip: &str) -> AppResult<()> {
        self.bump(&format!("rate:ip:{ip}"), self.max_per_ip).await
    }

    async fn check_api_key(&self, key_hash: &str) -> AppResult<()> {
        self.bump(&format!("rate:key:{key_hash}"), self.max_per_api_key)
            .await
    }
}
