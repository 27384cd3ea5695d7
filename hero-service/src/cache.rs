//! Single-entity cache keyed by SuperHero id
//!
//! The command service reads through this cache in `find_one` and evicts the
//! key after every write. Backends:
//!
//! - [`InMemoryEntityCache`]: process-local `DashMap` with optional TTL
//! - [`NoopEntityCache`]: never stores anything
//! - [`RedisEntityCache`]: JSON values in Redis with `SETEX` (feature `cache`)
//!
//! Backend errors are reported as [`CacheError`]; callers decide whether to
//! degrade or fail.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::{CacheBackend, Config};
use crate::domain::SuperHeroDto;
use crate::error;

/// Cache backend failure
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend unreachable or rejected the command
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Stored value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for cache calls
pub type CacheResult<T> = Result<T, CacheError>;

/// Storage for single SuperHero lookups
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Cached value for `id`, `None` on miss
    async fn get(&self, id: i64) -> CacheResult<Option<SuperHeroDto>>;

    /// Store a value for `id`
    async fn put(&self, id: i64, value: &SuperHeroDto) -> CacheResult<()>;

    /// Drop the value for `id`; evicting a missing key succeeds
    async fn evict(&self, id: i64) -> CacheResult<()>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Shared handle to a cache backend
pub type SharedEntityCache = Arc<dyn EntityCache>;

#[derive(Debug, Clone)]
struct Entry {
    value: SuperHeroDto,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct InMemoryEntityCache {
    entries: DashMap<i64, Entry>,
    ttl: Option<Duration>,
}

impl InMemoryEntityCache {
    /// Cache without expiry
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries expire `ttl` after insertion
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a live entry exists for `id`
    pub fn contains(&self, id: i64) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }
}

#[async_trait]
impl EntityCache for InMemoryEntityCache {
    async fn get(&self, id: i64) -> CacheResult<Option<SuperHeroDto>> {
        let now = Instant::now();
        let hit = self.entries.get(&id).map(|entry| entry.clone());
        match hit {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove_if(&id, |_, entry| entry.is_expired(now));
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn put(&self, id: i64, value: &SuperHeroDto) -> CacheResult<()> {
        let entry = Entry {
            value: value.clone(),
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(id, entry);
        Ok(())
    }

    async fn evict(&self, id: i64) -> CacheResult<()> {
        self.entries.remove(&id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Cache that never hits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEntityCache;

#[async_trait]
impl EntityCache for NoopEntityCache {
    async fn get(&self, _id: i64) -> CacheResult<Option<SuperHeroDto>> {
        Ok(None)
    }

    async fn put(&self, _id: i64, _value: &SuperHeroDto) -> CacheResult<()> {
        Ok(())
    }

    async fn evict(&self, _id: i64) -> CacheResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}

/// Build the cache selected by `[cache]`
///
/// A disabled cache becomes [`NoopEntityCache`]. The Redis backend needs the
/// `cache` feature and a `[redis]` section; when either is missing, or Redis is
/// unreachable and `redis.optional` is set, the in-memory cache is used.
pub async fn build_entity_cache(config: &Config) -> error::Result<SharedEntityCache> {
    if !config.cache.enabled {
        tracing::info!("Entity cache disabled");
        return Ok(Arc::new(NoopEntityCache));
    }
    let cache = match config.cache.backend {
        CacheBackend::Memory => memory_cache(config),
        CacheBackend::Redis => redis_cache(config).await?,
    };
    tracing::info!(backend = cache.backend(), ttl_secs = config.cache.ttl_secs, "Entity cache ready");
    Ok(cache)
}

fn memory_cache(config: &Config) -> SharedEntityCache {
    match config.cache.ttl() {
        Some(ttl) => Arc::new(InMemoryEntityCache::with_ttl(ttl)),
        None => Arc::new(InMemoryEntityCache::new()),
    }
}

#[cfg(feature = "cache")]
async fn redis_cache(config: &Config) -> error::Result<SharedEntityCache> {
    let Some(redis) = &config.redis else {
        tracing::warn!("cache.backend is redis but no [redis] section is configured, using memory");
        return Ok(memory_cache(config));
    };
    match crate::redis_pool::create_pool(redis).await {
        Ok(pool) => Ok(Arc::new(RedisEntityCache::new(
            pool,
            config.cache.key_prefix.clone(),
            config.cache.ttl_secs,
        ))),
        Err(e) if redis.optional => {
            tracing::warn!("Redis unavailable ({}), using in-memory cache", e);
            Ok(memory_cache(config))
        }
        Err(e) => Err(e),
    }
}

#[cfg(not(feature = "cache"))]
async fn redis_cache(config: &Config) -> error::Result<SharedEntityCache> {
    tracing::warn!("cache.backend is redis but the `cache` feature is disabled, using memory");
    Ok(memory_cache(config))
}

#[cfg(feature = "cache")]
pub use redis_backend::RedisEntityCache;

#[cfg(feature = "cache")]
mod redis_backend {
    use async_trait::async_trait;
    use deadpool_redis::Pool;

    use super::{CacheError, CacheResult, EntityCache};
    use crate::domain::SuperHeroDto;

    /// Redis-backed cache storing JSON-encoded DTOs
    ///
    /// Values are written with `SETEX`, or plain `SET` when `ttl_secs` is 0.
    #[derive(Clone)]
    pub struct RedisEntityCache {
        pool: Pool,
        key_prefix: String,
        ttl_secs: u64,
    }

    impl RedisEntityCache {
        /// Create a cache over an existing pool
        pub fn new(pool: Pool, key_prefix: impl Into<String>, ttl_secs: u64) -> Self {
            Self {
                pool,
                key_prefix: key_prefix.into(),
                ttl_secs,
            }
        }

        pub(crate) fn key(&self, id: i64) -> String {
            format!("{}{}", self.key_prefix, id)
        }

        async fn conn(&self) -> CacheResult<deadpool_redis::Connection> {
            self.pool
                .get()
                .await
                .map_err(|e| CacheError::Backend(format!("Failed to get Redis connection: {}", e)))
        }
    }

    #[async_trait]
    impl EntityCache for RedisEntityCache {
        async fn get(&self, id: i64) -> CacheResult<Option<SuperHeroDto>> {
            use deadpool_redis::redis::AsyncCommands;

            let mut conn = self.conn().await?;
            let json: Option<String> = conn
                .get(self.key(id))
                .await
                .map_err(|e| CacheError::Backend(format!("Redis GET failed: {}", e)))?;
            json.map(|json| serde_json::from_str(&json))
                .transpose()
                .map_err(CacheError::from)
        }

        async fn put(&self, id: i64, value: &SuperHeroDto) -> CacheResult<()> {
            use deadpool_redis::redis::AsyncCommands;

            let json = serde_json::to_string(value)?;
            let mut conn = self.conn().await?;
            if self.ttl_secs == 0 {
                return conn
                    .set::<_, _, ()>(self.key(id), json)
                    .await
                    .map_err(|e| CacheError::Backend(format!("Redis SET failed: {}", e)));
            }
            conn.set_ex::<_, _, ()>(self.key(id), json, self.ttl_secs)
                .await
                .map_err(|e| CacheError::Backend(format!("Redis SETEX failed: {}", e)))
        }

        async fn evict(&self, id: i64) -> CacheResult<()> {
            use deadpool_redis::redis::AsyncCommands;

            let mut conn = self.conn().await?;
            conn.del::<_, ()>(self.key(id))
                .await
                .map_err(|e| CacheError::Backend(format!("Redis DEL failed: {}", e)))
        }

        fn backend(&self) -> &'static str {
            "redis"
        }
    }
}
