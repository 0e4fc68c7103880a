//! # Settlement Ledger Tables
//!
//! Column mappings for the three tables a receipt can settle into:
//! `pos_cash_drawers`, `pos_invoices` and `pos_online_payments`.

use tally_core::{CashDrawerEntry, Invoice, OnlinePayment};

use crate::store::{bind_audit, PgQuery, Table};

impl Table for CashDrawerEntry {
    const TABLE: &'static str = "pos_cash_drawers";

    const COLUMNS: &'static [&'static str] = &[
        "drawer_id",
        "receipt_id",
        "employee_id",
        "role_id",
        "cash_in",
        "amount",
        "cash_out",
        "transaction_time",
        "description",
        "company_id",
        "branch_id",
        "store_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.drawer_id)
            .bind(&self.receipt_id)
            .bind(self.employee_id)
            .bind(self.role_id)
            .bind(self.cash_in)
            .bind(self.amount)
            .bind(self.cash_out)
            .bind(self.transaction_time)
            .bind(&self.description)
            .bind(self.company_id)
            .bind(self.branch_id)
            .bind(self.store_id);
        bind_audit(query, &self.audit)
    }
}

impl Table for Invoice {
    const TABLE: &'static str = "pos_invoices";

    const COLUMNS: &'static [&'static str] = &[
        "invoice_id",
        "receipt_id",
        "date",
        "amount",
        "discounts",
        "taxes",
        "due_date",
        "company_id",
        "branch_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.invoice_id)
            .bind(&self.receipt_id)
            .bind(self.date)
            .bind(self.amount)
            .bind(self.discounts)
            .bind(self.taxes)
            .bind(self.due_date)
            .bind(self.company_id)
            .bind(self.branch_id);
        bind_audit(query, &self.audit)
    }
}

impl Table for OnlinePayment {
    const TABLE: &'static str = "pos_online_payments";

    const COLUMNS: &'static [&'static str] = &[
        "payment_id",
        "receipt_id",
        "employee_id",
        "role_id",
        "payment_date",
        "amount",
        "payment_method",
        "company_id",
        "branch_id",
        "store_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.payment_id)
            .bind(&self.receipt_id)
            .bind(self.employee_id)
            .bind(self.role_id)
            .bind(self.payment_date)
            .bind(self.amount)
            .bind(self.payment_method)
            .bind(self.company_id)
            .bind(self.branch_id)
            .bind(self.store_id);
        bind_audit(query, &self.audit)
    }
}
