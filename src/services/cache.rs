// src/services/cache.rs
use async_trait::async_trait;
use log::{debug, info, warn};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::{AppConfig, CacheBackend};
use crate::BoxError;

/// String key/value store with per-entry expiry.
///
/// Failures inside an implementation are logged and reported as a miss, so a
/// broken cache only costs an extra upstream call.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, ttl: Duration);
}

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => {
                debug!("Cache hit: {}", key);
                Some(value.clone())
            }
            // Expired entries stay until overwritten
            _ => {
                debug!("Cache miss: {}", key);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
    }
}

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, BoxError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => {
                debug!("Redis {} for {}", if value.is_some() { "hit" } else { "miss" }, key);
                value
            }
            Err(e) => {
                warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        // SET EX takes whole seconds
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, seconds).await {
            warn!("Redis SET {} failed: {}", key, e);
        }
    }
}

/// Used when caching is switched off.
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) {}
}

pub async fn build_cache(config: &AppConfig) -> Arc<dyn Cache> {
    match config.cache_backend {
        CacheBackend::Memory => {
            info!("Using in-memory cache (ttl {:?})", config.cache_ttl);
            Arc::new(MemoryCache::new())
        }
        CacheBackend::None => {
            info!("Caching disabled");
            Arc::new(NoCache)
        }
        CacheBackend::Redis => match RedisCache::connect(&config.redis_url).await {
            Ok(cache) => {
                info!("Connected to Redis cache (ttl {:?})", config.cache_ttl);
                Arc::new(cache)
            }
            Err(e) => {
                warn!("Could not connect to Redis ({}), falling back to in-memory cache", e);
                Arc::new(MemoryCache::new())
            }
        },
    }
}
