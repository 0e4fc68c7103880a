//! # Cache
//!
//! Key/value cache with per-entry TTL, backed by Redis in production.
//!
//! ```text
//! key:   "{kind}:{id}"         e.g. "sale:9f0c…"
//! value: JSON of the record    (audit fields flattened)
//! ttl:   7 days by default     (reset on every write)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use crate::error::DbResult;

/// A string cache with expiring entries.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Writes the entry, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()>;

    /// Removes the entry. Evicting an absent key succeeds.
    async fn evict(&self, key: &str) -> DbResult<()>;
}

/// Redis-backed [`Cache`].
///
/// `ConnectionManager` is cheap to clone and reconnects on its own, so each
/// call works on a clone.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to `redis://host:port[/db]`.
    pub async fn connect(url: &str) -> DbResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis");
        Ok(RedisCache { conn })
    }

    /// A handle on the same connection, for queue producers.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Checks that Redis answers a PING.
    pub async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await?;
        Ok(())
    }

    async fn evict(&self, key: &str) -> DbResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
