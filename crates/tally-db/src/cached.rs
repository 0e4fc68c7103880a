//! # Cache-Aside Store
//!
//! Read-through / write-through persistence used by every entity.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create(record)   store.insert            cache untouched              │
//! │                                           (first read populates it)    │
//! │                                                                         │
//! │  read(id)         cache.get ── hit ──────────────────────► record      │
//! │                      │                                                  │
//! │                      ├─ miss / unavailable / undecodable               │
//! │                      ▼                                                  │
//! │                   store.fetch ── none ──► NotFound                     │
//! │                      │                                                  │
//! │                      ├─► cache.set(ttl)   failure logged only          │
//! │                      ▼                                                  │
//! │                   record                                               │
//! │                                                                         │
//! │  update(record)   store.update ──► cache.set(ttl)   failure surfaced   │
//! │                                                                         │
//! │  delete(id)       store.delete ──► cache.evict      failure surfaced   │
//! │                   (store failure → cache left as it was)               │
//! │                                                                         │
//! │  read_all_paged   store.page(tenant filter, window) ──► Page<T>        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use tally_core::pagination::{Page, Pagination};
use tally_core::tenancy::ScopeFilter;
use tally_core::Record;

use crate::cache::Cache;
use crate::error::{DbError, DbResult};
use crate::store::RecordStore;

/// Cache-aside store for one entity kind.
pub struct CachedStore<T: Record> {
    store: Arc<dyn RecordStore<T>>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl<T: Record> Clone for CachedStore<T> {
    fn clone(&self) -> Self {
        CachedStore {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            ttl: self.ttl,
        }
    }
}

impl<T: Record> CachedStore<T> {
    pub fn new(store: Arc<dyn RecordStore<T>>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        CachedStore { store, cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self, record: &T) -> DbResult<()> {
        self.store.insert(record).await?;
        debug!(entity = T::KIND, id = %record.id(), "Record created");
        Ok(())
    }

    /// Creates every record in one transaction.
    pub async fn create_all(&self, records: &[T]) -> DbResult<()> {
        self.store.insert_all(records).await?;
        debug!(entity = T::KIND, rows = records.len(), "Records created");
        Ok(())
    }

    pub async fn read(&self, id: Uuid) -> DbResult<T> {
        let key = T::cache_key(id);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(record) => {
                    debug!(entity = T::KIND, %id, "Cache hit");
                    return Ok(record);
                }
                Err(e) => {
                    warn!(entity = T::KIND, %id, error = %e, "Undecodable cache entry, reading from store");
                }
            },
            Ok(None) => debug!(entity = T::KIND, %id, "Cache miss"),
            Err(e) => {
                warn!(entity = T::KIND, %id, error = %e, "Cache unavailable, reading from store");
            }
        }

        let record = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::KIND, id))?;

        if let Err(e) = self.populate(&key, &record).await {
            warn!(entity = T::KIND, %id, error = %e, "Failed to re-populate cache");
        }

        Ok(record)
    }

    pub async fn update(&self, record: &T) -> DbResult<()> {
        self.store.update(record).await?;
        self.populate(&T::cache_key(record.id()), record).await?;
        debug!(entity = T::KIND, id = %record.id(), "Record updated");
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        self.store.delete(id).await?;
        self.cache.evict(&T::cache_key(id)).await?;
        debug!(entity = T::KIND, %id, "Record deleted");
        Ok(())
    }

    /// One page of the rows the filter selects; see [`Pagination`] for the
    /// zero-limit policy.
    pub async fn read_all_paged(
        &self,
        filter: &ScopeFilter,
        pagination: Pagination,
    ) -> DbResult<Page<T>> {
        let (records, total) = self.store.page(filter, pagination.window()).await?;
        Ok(Page::new(records, total, pagination))
    }

    async fn populate(&self, key: &str, record: &T) -> DbResult<()> {
        let raw = serde_json::to_string(record)?;
        self.cache.set(key, &raw, self.ttl).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryCache, MemoryTable};
    use chrono::Duration as ChronoDuration;
    use tally_core::money::Money;
    use tally_core::record::{timestamp_now, Audit};
    use tally_core::tenancy::ScopeLevel;
    use tally_core::Sale;

    const TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    struct Fixture {
        table: Arc<MemoryTable<Sale>>,
        cache: Arc<MemoryCache>,
        store: CachedStore<Sale>,
    }

    fn fixture() -> Fixture {
        let table = Arc::new(MemoryTable::<Sale>::new());
        let cache = Arc::new(MemoryCache::new());
        let store = CachedStore::new(table.clone(), cache.clone(), TTL);
        Fixture { table, cache, store }
    }

    fn sale(store_id: Uuid, seconds_ago: i64) -> Sale {
        let at = timestamp_now() - ChronoDuration::seconds(seconds_ago);
        let actor = Uuid::new_v4();
        Sale {
            sale_id: Uuid::new_v4(),
            receipt_id: "501".to_string(),
            product_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            quantity: 1,
            price: Money::from_cents(1250),
            total_price: Money::from_cents(1250),
            sale_date: at,
            company_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            store_id,
            cashier_id: actor,
            payment_method_id: Uuid::new_v4(),
            audit: Audit::new(actor, at),
        }
    }

    #[tokio::test]
    async fn test_read_after_create_matches_from_store_and_cache() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        assert!(f.cache.is_empty().await);

        let from_store = f.store.read(s.sale_id).await.unwrap();
        assert_eq!(from_store, s);
        assert_eq!(f.cache.ttl_of(&Sale::cache_key(s.sale_id)).await, Some(TTL));

        let from_cache = f.store.read(s.sale_id).await.unwrap();
        assert_eq!(from_cache, s);
    }

    #[tokio::test]
    async fn test_read_after_delete_is_not_found() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        f.store.read(s.sale_id).await.unwrap();

        f.store.delete(s.sale_id).await.unwrap();
        assert!(!f.cache.contains(&Sale::cache_key(s.sale_id)).await);
        assert!(f.store.read(s.sale_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failed_store_delete_keeps_cache_entry() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        f.store.read(s.sale_id).await.unwrap();

        f.table.fail_writes(true);
        assert!(f.store.delete(s.sale_id).await.is_err());
        assert!(f.cache.contains(&Sale::cache_key(s.sale_id)).await);
    }

    #[tokio::test]
    async fn test_eviction_failure_is_surfaced() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        f.cache.fail_evictions(true);
        assert!(matches!(
            f.store.delete(s.sale_id).await.unwrap_err(),
            DbError::Cache(_)
        ));
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_to_store() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();

        f.cache.fail_reads(true);
        f.cache.fail_writes(true);
        assert_eq!(f.store.read(s.sale_id).await.unwrap(), s);
    }

    #[tokio::test]
    async fn test_undecodable_entry_falls_back_and_is_replaced() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        let key = Sale::cache_key(s.sale_id);
        f.cache.put_raw(&key, "{not json").await;

        assert_eq!(f.store.read(s.sale_id).await.unwrap(), s);
        assert_eq!(f.cache.ttl_of(&key).await, Some(TTL));
    }

    #[tokio::test]
    async fn test_update_overwrites_cache_and_surfaces_write_failure() {
        let f = fixture();
        let mut s = sale(Uuid::new_v4(), 0);
        f.store.create(&s).await.unwrap();
        f.store.read(s.sale_id).await.unwrap();

        s.customer_id = Uuid::new_v4();
        f.store.update(&s).await.unwrap();
        assert_eq!(f.store.read(s.sale_id).await.unwrap().customer_id, s.customer_id);

        f.cache.fail_writes(true);
        s.customer_id = Uuid::new_v4();
        assert!(matches!(
            f.store.update(&s).await.unwrap_err(),
            DbError::Cache(_)
        ));
    }

    #[tokio::test]
    async fn test_update_of_missing_record_is_not_found() {
        let f = fixture();
        let s = sale(Uuid::new_v4(), 0);
        assert!(f.store.update(&s).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_second_page_of_twenty_five_rows() {
        let f = fixture();
        let store_id = Uuid::new_v4();
        let mut created = Vec::new();
        for i in 0..25 {
            // Oldest first: row i was created (25 - i) seconds ago.
            let s = sale(store_id, 25 - i);
            f.store.create(&s).await.unwrap();
            created.push(s);
        }
        f.store.create(&sale(Uuid::new_v4(), 0)).await.unwrap();

        let filter = ScopeFilter {
            level: ScopeLevel::Store,
            value: store_id,
        };
        let page = f
            .store
            .read_all_paged(&filter, Pagination::new(2, 10))
            .await
            .unwrap();

        assert_eq!(page.total_records, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.records, created[10..20].to_vec());
    }

    #[tokio::test]
    async fn test_zero_limit_returns_every_scoped_row() {
        let f = fixture();
        let store_id = Uuid::new_v4();
        for i in 0..4 {
            f.store.create(&sale(store_id, i)).await.unwrap();
        }
        let filter = ScopeFilter {
            level: ScopeLevel::Store,
            value: store_id,
        };
        let page = f
            .store
            .read_all_paged(&filter, Pagination::new(1, 0))
            .await
            .unwrap();
        assert_eq!(page.records.len(), 4);
        assert_eq!(page.total_pages, 1);

        let empty = ScopeFilter {
            level: ScopeLevel::Store,
            value: Uuid::new_v4(),
        };
        let page = f
            .store
            .read_all_paged(&empty, Pagination::new(0, 0))
            .await
            .unwrap();
        assert_eq!(page.total_records, 0);
        assert_eq!(page.total_pages, 0);
    }
}
