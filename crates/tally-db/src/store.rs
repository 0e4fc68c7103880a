//! # Record Store
//!
//! The relational half of the cache-aside store: one trait every entity
//! table implements, and the PostgreSQL implementation shared by all of them.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RecordStore<T>  (trait)                                               │
//! │  ├── insert / insert_all (one transaction)                             │
//! │  ├── fetch                                                             │
//! │  ├── update / delete      (zero rows touched → NotFound)               │
//! │  └── page                 (tenant filter + optional LIMIT/OFFSET)      │
//! │         │                                                               │
//! │         ├── PgTable<T: Table>   PostgreSQL, statements built from      │
//! │         │                       Table::TABLE and Table::COLUMNS        │
//! │         │                                                               │
//! │         └── MemoryTable<T>      in-process, for tests (memory.rs)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements are built at runtime from column lists rather than checked
//! with `query!`, so one generic implementation serves every entity.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, Postgres};
use tracing::debug;
use uuid::Uuid;

use tally_core::pagination::PageWindow;
use tally_core::record::Audit;
use tally_core::tenancy::ScopeFilter;
use tally_core::Record;

use crate::error::{DbError, DbResult};

/// A positional query awaiting its bind values.
pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

// =============================================================================
// Record Store
// =============================================================================

/// Durable storage for one entity kind.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    async fn insert(&self, record: &T) -> DbResult<()>;

    /// Inserts every record or none of them.
    async fn insert_all(&self, records: &[T]) -> DbResult<()>;

    async fn fetch(&self, id: Uuid) -> DbResult<Option<T>>;

    /// Overwrites the stored row (last writer wins).
    async fn update(&self, record: &T) -> DbResult<()>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;

    /// Rows matching the tenant filter, oldest first, plus the unpaged count.
    async fn page(&self, filter: &ScopeFilter, window: Option<PageWindow>)
        -> DbResult<(Vec<T>, i64)>;
}

// =============================================================================
// Table Mapping
// =============================================================================

/// Columns shared by every table, bound last.
pub const AUDIT_COLUMNS: &[&str] = &["created_at", "created_by", "updated_at", "updated_by"];

/// How an entity maps onto its PostgreSQL table.
///
/// `COLUMNS` starts with the primary key and ends with [`AUDIT_COLUMNS`];
/// `bind_row` binds values in exactly that order.
pub trait Table: Record + for<'r> FromRow<'r, PgRow> + Unpin {
    const TABLE: &'static str;

    const COLUMNS: &'static [&'static str];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

/// Binds the audit block in [`AUDIT_COLUMNS`] order.
pub fn bind_audit<'q>(query: PgQuery<'q>, audit: &'q Audit) -> PgQuery<'q> {
    query
        .bind(audit.created_at)
        .bind(audit.created_by)
        .bind(audit.updated_at)
        .bind(audit.updated_by)
}

fn key_column<T: Table>() -> &'static str {
    T::COLUMNS[0]
}

pub(crate) fn insert_sql<T: Table>() -> String {
    let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

pub(crate) fn update_sql<T: Table>() -> String {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = $1",
        T::TABLE,
        assignments.join(", "),
        key_column::<T>()
    )
}

pub(crate) fn select_by_id_sql<T: Table>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        T::COLUMNS.join(", "),
        T::TABLE,
        key_column::<T>()
    )
}

pub(crate) fn delete_sql<T: Table>() -> String {
    format!("DELETE FROM {} WHERE {} = $1", T::TABLE, key_column::<T>())
}

pub(crate) fn count_sql<T: Table>(filter: &ScopeFilter) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1",
        T::TABLE,
        filter.level.column()
    )
}

pub(crate) fn page_sql<T: Table>(filter: &ScopeFilter, paged: bool) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} = $1 ORDER BY created_at, {}",
        T::COLUMNS.join(", "),
        T::TABLE,
        filter.level.column(),
        key_column::<T>()
    );
    if paged {
        sql.push_str(" LIMIT $2 OFFSET $3");
    }
    sql
}

// =============================================================================
// PostgreSQL Table
// =============================================================================

/// PostgreSQL-backed [`RecordStore`] for any [`Table`].
#[derive(Debug)]
pub struct PgTable<T> {
    pool: PgPool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for PgTable<T> {
    fn clone(&self) -> Self {
        PgTable {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Table> PgTable<T> {
    pub fn new(pool: PgPool) -> Self {
        PgTable {
            pool,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Table> RecordStore<T> for PgTable<T> {
    async fn insert(&self, record: &T) -> DbResult<()> {
        debug!(entity = T::KIND, id = %record.id(), "Inserting row");
        let sql = insert_sql::<T>();
        record
            .bind_row(sqlx::query(&sql))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_all(&self, records: &[T]) -> DbResult<()> {
        debug!(entity = T::KIND, rows = records.len(), "Inserting rows in one transaction");
        let sql = insert_sql::<T>();
        let mut tx = self.pool.begin().await?;
        for record in records {
            record.bind_row(sqlx::query(&sql)).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> DbResult<Option<T>> {
        let sql = select_by_id_sql::<T>();
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, record: &T) -> DbResult<()> {
        let sql = update_sql::<T>();
        let result = record
            .bind_row(sqlx::query(&sql))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::KIND, record.id()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let sql = delete_sql::<T>();
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found(T::KIND, id));
        }
        Ok(())
    }

    async fn page(
        &self,
        filter: &ScopeFilter,
        window: Option<PageWindow>,
    ) -> DbResult<(Vec<T>, i64)> {
        let count = count_sql::<T>(filter);
        let total: i64 = sqlx::query_scalar(&count)
            .bind(filter.value)
            .fetch_one(&self.pool)
            .await?;

        let sql = page_sql::<T>(filter, window.is_some());
        let mut query = sqlx::query_as::<_, T>(&sql).bind(filter.value);
        if let Some(window) = window {
            query = query.bind(window.limit).bind(window.offset);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok((rows, total))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
