//! # In-Process Backends
//!
//! [`MemoryTable`] and [`MemoryCache`] implement the same traits as the
//! PostgreSQL and Redis backends, so the cache-aside rules and every service
//! above them can be exercised without a server.
//!
//! Both carry switches that make the next calls fail, for testing the
//! fallback and consistency paths:
//!
//! ```text
//! MemoryTable::fail_writes(true)    insert / insert_all / update / delete fail
//! MemoryCache::fail_reads(true)     get fails         (store fallback)
//! MemoryCache::fail_writes(true)    set fails         (update surfaces error)
//! MemoryCache::fail_evictions(true) evict fails       (delete surfaces error)
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use tally_core::pagination::PageWindow;
use tally_core::tenancy::ScopeFilter;
use tally_core::Record;

use crate::cache::Cache;
use crate::error::{DbError, DbResult};
use crate::store::RecordStore;

// =============================================================================
// Memory Table
// =============================================================================

/// Vec-backed [`RecordStore`] keeping insertion order.
pub struct MemoryTable<T> {
    rows: RwLock<Vec<T>>,
    failing: AtomicBool,
}

impl<T: Record> Default for MemoryTable<T> {
    fn default() -> Self {
        MemoryTable {
            rows: RwLock::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }
}

impl<T: Record> MemoryTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table already holding `rows`.
    pub fn with_rows(rows: Vec<T>) -> Self {
        MemoryTable {
            rows: RwLock::new(rows),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every write fail until switched back.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Snapshot of every row in insertion order.
    pub async fn rows(&self) -> Vec<T> {
        self.rows.read().await.clone()
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed(format!(
                "{} table is rejecting writes",
                T::KIND
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryTable<T> {
    async fn insert(&self, record: &T) -> DbResult<()> {
        self.insert_all(std::slice::from_ref(record)).await
    }

    async fn insert_all(&self, records: &[T]) -> DbResult<()> {
        self.check_writable()?;
        let mut rows = self.rows.write().await;
        for (i, record) in records.iter().enumerate() {
            let id = record.id();
            let clash = rows.iter().any(|row| row.id() == id)
                || records[..i].iter().any(|earlier| earlier.id() == id);
            if clash {
                return Err(DbError::duplicate(T::KIND, id.to_string()));
            }
        }
        rows.extend(records.iter().cloned());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> DbResult<Option<T>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn update(&self, record: &T) -> DbResult<()> {
        self.check_writable()?;
        let mut rows = self.rows.write().await;
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == record.id())
            .ok_or_else(|| DbError::not_found(T::KIND, record.id()))?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.check_writable()?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(DbError::not_found(T::KIND, id));
        }
        Ok(())
    }

    async fn page(
        &self,
        filter: &ScopeFilter,
        window: Option<PageWindow>,
    ) -> DbResult<(Vec<T>, i64)> {
        let rows = self.rows.read().await;
        let mut matching: Vec<T> = rows
            .iter()
            .filter(|row| filter.matches(&row.scope()))
            .cloned()
            .collect();
        matching.sort_by_key(|row| row.audit().created_at);
        let total = matching.len() as i64;

        let records = match window {
            Some(window) => matching
                .into_iter()
                .skip(window.offset.max(0) as usize)
                .take(window.limit.max(0) as usize)
                .collect(),
            None => matching,
        };
        Ok((records, total))
    }
}

// =============================================================================
// Memory Cache
// =============================================================================

/// HashMap-backed [`Cache`] that remembers the TTL of each entry.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Duration)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_evictions: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn fail_evictions(&self, failing: bool) {
        self.fail_evictions.store(failing, Ordering::SeqCst);
    }

    /// Plants a raw value, bypassing serialization.
    pub async fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), Duration::ZERO));
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.read().await.get(key).map(|(_, ttl)| *ttl)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn unavailable(operation: &str) -> DbError {
    DbError::Cache(format!("cache unavailable during {}", operation))
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> DbResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable("get"));
        }
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("set"));
        }
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn evict(&self, key: &str) -> DbResult<()> {
        if self.fail_evictions.load(Ordering::SeqCst) {
            return Err(unavailable("evict"));
        }
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
