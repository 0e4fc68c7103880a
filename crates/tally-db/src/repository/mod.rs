//! # Repository Module
//!
//! Table mappings for every entity of the sales core.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service (tally-sales)                                                 │
//! │       │                                                                 │
//! │       │  store.read(id) / store.update(record)                         │
//! │       ▼                                                                 │
//! │  CachedStore<T>       cache keys, TTL, fallback rules                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PgTable<T>           one generic implementation                       │
//! │       │                                                                 │
//! │       │  Table::TABLE, Table::COLUMNS, Table::bind_row                 │
//! │       ▼                                                                 │
//! │  THIS MODULE          one impl per entity                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tables
//!
//! - `sale` - `pos_sales`
//! - `ledger` - `pos_cash_drawers`, `pos_invoices`, `pos_online_payments`
//! - `reference` - `pos_customers`, `pos_payment_methods`, `pos_returns`

pub mod ledger;
pub mod reference;
pub mod sale;
