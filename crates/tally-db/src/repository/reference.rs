//! # Reference and After-Sale Tables
//!
//! Column mappings for `pos_customers`, `pos_payment_methods` and
//! `pos_returns`.

use tally_core::{Customer, PaymentMethod, SaleReturn};

use crate::store::{bind_audit, PgQuery, Table};

impl Table for Customer {
    const TABLE: &'static str = "pos_customers";

    const COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "first_name",
        "last_name",
        "email",
        "phone_number",
        "date_of_birth",
        "registration_date",
        "address",
        "city",
        "country",
        "company_id",
        "branch_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.customer_id)
            .bind(&self.first_name)
            .bind(&self.last_name)
            .bind(&self.email)
            .bind(&self.phone_number)
            .bind(self.date_of_birth)
            .bind(self.registration_date)
            .bind(&self.address)
            .bind(&self.city)
            .bind(&self.country)
            .bind(self.company_id)
            .bind(self.branch_id);
        bind_audit(query, &self.audit)
    }
}

impl Table for PaymentMethod {
    const TABLE: &'static str = "pos_payment_methods";

    const COLUMNS: &'static [&'static str] = &[
        "payment_method_id",
        "method_name",
        "company_id",
        "created_at",
        "created_by",
        "updated_at",
        "updated_by",
    ];

    fn bind_row<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        let query = query
            .bind(self.payment_method_id)
            .bind(&self.method_name)
            .bind(self.company_id);
        bind_audit(query, &self.audit)
    }
}

impl Table for SaleReturn {
    const TABLE: &'static str = "pos_returns";

    const COLUMNS: &'static [&'static str] = &[
        "return_id",
        "receipt_id",
        "product_id",
        "quantity",
        "price",
        "amount",
        "return_date",
        "reason",
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
            .bind(self.return_id)
            .bind(&self.receipt_id)
            .bind(self.product_id)
            .bind(self.quantity)
            .bind(self.price)
            .bind(self.amount)
            .bind(self.return_date)
            .bind(&self.reason)
            .bind(self.company_id)
            .bind(self.branch_id)
            .bind(self.store_id);
        bind_audit(query, &self.audit)
    }
}
