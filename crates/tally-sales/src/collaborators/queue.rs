//! Redis list used as the receipt delivery queue.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tally_db::RedisCache;

use super::{CollaboratorResult, DeliveryQueue};
use crate::error::CollaboratorError;

/// `RPUSH {queue} {payload}` on the cache's Redis connection.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn from_cache(cache: &RedisCache) -> Self {
        Self::new(cache.connection())
    }
}

#[async_trait]
impl DeliveryQueue for RedisQueue {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> CollaboratorResult<()> {
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| CollaboratorError::Transport {
                service: "delivery queue",
                reason: e.to_string(),
            })
    }
}
