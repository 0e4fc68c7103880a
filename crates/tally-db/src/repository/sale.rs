//! # Sale Table
//!
//! Column mapping for `pos_sales`.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CHECKOUT                                                           │
//! │     └── insert_all(rows) → N rows, one receipt_id, one transaction     │
//! │                                                                         │
//! │  2. SETTLEMENT (outside the transaction)                               │
//! │     └── exactly one cash drawer entry, invoice or online payment       │
//! │                                                                         │
//! │  3. (OPTIONAL) CORRECTION                                              │
//! │     └── update() → only customer_id and sale_date change               │
//! │                                                                         │
//! │  4. (OPTIONAL) ADMIN DELETE                                            │
//! │     └── delete() → row and cache entry removed                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::Sale;

use crate::store::{bind_audit, PgQuery, Table};

impl Table for Sale {
    const TABLE: &'static str = "pos_sales";

    const COLUMNS: &'static [&'static str] = &[
        "sale_id",
        "receipt_id",
        "product_id",
        "customer_id",
        "quantity",
        "price",
        "total_price",
        "sale_date",
        "company_id",
        "branch_id",
        "store_id",
        "cashier_id",
        "payment_method_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.sale_id)
            .bind(&self.receipt_id)
            .bind(self.product_id)
            .bind(self.customer_id)
            .bind(self.quantity)
            .bind(self.price)
            .bind(self.total_price)
            .bind(self.sale_date)
            .bind(self.company_id)
            .bind(self.branch_id)
            .bind(self.store_id)
            .bind(self.cashier_id)
            .bind(self.payment_method_id);
        bind_audit(query, &self.audit)
    }
}
