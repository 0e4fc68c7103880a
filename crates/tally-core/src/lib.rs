//! # tally-core: Pure Sales Domain for Tally POS
//!
//! Entities, money, tenancy and the pure halves of pricing, settlement and
//! receipt assembly. Nothing in this crate performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tally POS Sales Core                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-sales (services)                       │   │
//! │  │  TenantGuard ─ PricingResolver ─ SettlementRouter ─ Orchestrator│   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │   │ types   │ │ tenancy │ │ pricing │ │settlement│ │receipt │ │   │
//! │  │   │ Sale    │ │ Claims  │ │ Discount│ │  Kind    │ │Digital │ │   │
//! │  │   │ Invoice │ │ Role    │ │ Totals  │ │  Record  │ │Receipt │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                tally-db (PostgreSQL + Redis)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Persisted entities (Sale, CashDrawerEntry, Invoice, ...)
//! - [`record`] - The `Record` trait and audit stamps
//! - [`tenancy`] - Claims, roles, scope levels, access policies
//! - [`money`] - Integer-cent money parsed from decimal text
//! - [`pricing`] - Discount math and receipt totals
//! - [`settlement`] - Settlement kind selection and ledger records
//! - [`receipt`] - Digital receipt document
//! - [`pagination`] - Offset/limit math with the zero-limit policy
//! - [`validation`] - Checkout batch validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::settlement::{SettlementKind, SettlementSentinels};
//!
//! let sentinels = SettlementSentinels::new("Cash", "Pay Later");
//! assert_eq!(SettlementKind::classify("Cash", &sentinels), SettlementKind::Cash);
//!
//! let ten_percent = Money::from_cents(10000).portion_bps(1000);
//! assert_eq!(ten_percent.to_string(), "10.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pagination;
pub mod pricing;
pub mod receipt;
pub mod record;
pub mod settlement;
pub mod tenancy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::Money;
pub use pagination::{Page, PageWindow, Pagination};
pub use pricing::{CatalogProduct, DiscountRate, PricedLine, Promotion, SaleTotals};
pub use receipt::DigitalReceipt;
pub use record::{timestamp_now, Audit, Record};
pub use settlement::{SettlementKind, SettlementRecord, SettlementRequest, SettlementSentinels};
pub use tenancy::{
    AccessPolicy, Caller, Claims, Operation, Role, RoleTaxonomy, ScopeFilter, ScopeLevel,
    TenantScope,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items accepted in one checkout.
pub const MAX_SALE_LINES: usize = 200;

/// Queue the digital receipt is pushed to when none is configured.
pub const DEFAULT_RECEIPT_QUEUE: &str = "email_queue";

/// Time-to-live of a cache entry: seven days.
pub const CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
