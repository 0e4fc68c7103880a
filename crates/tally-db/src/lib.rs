//! # tally-db: Storage Layer for Tally POS
//!
//! PostgreSQL tables for every sales entity, a Redis cache, and the
//! cache-aside store that combines them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  SaleOrchestrator / RecordService (tally-sales)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ CachedStore<T>│───►│  PgTable<T>   │    │  Migrations  │  │   │
//! │  │   │ (cached.rs)   │    │  (store.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │               │───►│  RedisCache   │    │ 0001_init    │  │   │
//! │  │   │               │    │  (cache.rs)   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  ┌──────────────┐              ┌──────────────┐                        │
//! │  │  PostgreSQL  │              │    Redis     │                        │
//! │  └──────────────┘              └──────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`store`] - `RecordStore` trait and the generic PostgreSQL table
//! - [`repository`] - Column mappings per entity
//! - [`cache`] - `Cache` trait and the Redis backend
//! - [`cached`] - The cache-aside store
//! - [`memory`] - In-process backends for tests
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_db::{CachedStore, Database, DbConfig, RedisCache};
//!
//! let db = Database::new(DbConfig::new(url)).await?;
//! let cache = Arc::new(RedisCache::connect("redis://localhost:6379").await?);
//!
//! let sales = CachedStore::<Sale>::new(Arc::new(db.table()), cache, ttl);
//! let sale = sales.read(sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod cached;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{Cache, RedisCache};
pub use cached::CachedStore;
pub use error::{DbError, DbResult};
pub use memory::{MemoryCache, MemoryTable};
pub use pool::{Database, DbConfig};
pub use store::{PgTable, RecordStore, Table};
