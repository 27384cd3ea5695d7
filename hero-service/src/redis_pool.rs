//! Redis connection pool

use std::time::Duration;

use deadpool_redis::{Config as DeadpoolConfig, Pool, Runtime};

use crate::backoff::retry_with_backoff;
use crate::config::RedisConfig;
use crate::error::{Error, Result};

/// Connect to Redis, retrying with exponential backoff
pub async fn create_pool(config: &RedisConfig) -> Result<Pool> {
    let pool = retry_with_backoff(
        "Redis",
        config.max_retries,
        Duration::from_secs(config.retry_delay_secs),
        || try_create_pool(config),
    )
    .await?;

    tracing::info!(
        "Redis connection pool created: max_connections={}",
        config.max_connections
    );
    Ok(pool)
}

async fn try_create_pool(config: &RedisConfig) -> Result<Pool> {
    let pool = DeadpoolConfig::from_url(&config.url)
        .builder()
        .map_err(|e| Error::Redis(format!("Failed to build Redis pool: {}", e)))?
        .max_size(config.max_connections)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| Error::Redis(format!("Failed to create Redis pool: {}", e)))?;

    // Pools connect lazily; check out one connection to fail fast.
    let conn = pool
        .get()
        .await
        .map_err(|e| Error::Redis(format!("Failed to get Redis connection: {}", e)))?;
    drop(conn);

    Ok(pool)
}
