//! # Sale Orchestrator
//!
//! One checkout: a batch of line items that become sale rows sharing one
//! receipt id, one settlement record, and one queued receipt.
//!
//! ## Stages
//! ```text
//! ┌────────────┐   ┌────────┐   ┌───────────┐   ┌─────────┐   ┌───────────┐
//! │ Authorized │──►│ Priced │──►│ Persisted │──►│ Settled │──►│ Receipted │──► Done
//! └─────┬──────┘   └───┬────┘   └─────┬─────┘   └────┬────┘   └─────┬─────┘
//!       │              │              │              │              │
//!       ▼              ▼              ▼              ▼              ▼
//!    Failed         Failed         Failed     Failed (rows stay committed:
//!  (no side      (inventory     (nothing          Consistency error)
//!   effects)      already        committed)
//!                 notified)
//! ```
//!
//! Line items are priced and reported to inventory one at a time, in
//! submission order. All sale rows are inserted in one transaction. The
//! settlement record and the receipt are not part of that transaction.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::receipt::ReceiptParties;
use tally_core::validation::{validate_sale_batch, validate_store_scope};
use tally_core::{
    timestamp_now, Audit, Caller, Customer, DigitalReceipt, Operation, PaymentMethod, PricedLine,
    Record, Sale, SaleLineRequest, SaleTotals, SettlementRecord, SettlementRequest,
    ValidationError,
};
use tally_db::CachedStore;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::collaborators::{
    IdentityDirectory, InventoryLedger, ReceiptNumbering, StockMovement, StoreDirectory,
};
use crate::error::{SalesError, SalesResult};
use crate::guard::TenantGuard;
use crate::pricing::PricingResolver;
use crate::receipt::ReceiptPublisher;
use crate::settlement::SettlementRouter;

/// Stages of one checkout, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStage {
    Authorized,
    Priced,
    Persisted,
    Settled,
    Receipted,
    Done,
}

impl SaleStage {
    /// Whether the sale rows are already committed when this stage runs.
    pub fn after_commit(&self) -> bool {
        *self > SaleStage::Persisted
    }
}

impl fmt::Display for SaleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            SaleStage::Authorized => "authorization",
            SaleStage::Priced => "pricing",
            SaleStage::Persisted => "persistence",
            SaleStage::Settled => "settlement",
            SaleStage::Receipted => "receipt",
            SaleStage::Done => "done",
        };
        f.write_str(step)
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSales {
    pub receipt_id: String,
    /// Stored rows in submission order.
    pub sales: Vec<Sale>,
    pub totals: SaleTotals,
    pub settlement: SettlementRecord,
}

/// Store-scoped ids every row of the checkout carries.
#[derive(Debug, Clone, Copy)]
struct Till {
    company_id: Uuid,
    branch_id: Uuid,
    store_id: Uuid,
}

pub struct SaleOrchestrator {
    guard: TenantGuard,
    pricing: PricingResolver,
    settlement: SettlementRouter,
    receipts: ReceiptPublisher,
    inventory: Arc<dyn InventoryLedger>,
    numbering: Arc<dyn ReceiptNumbering>,
    identity: Arc<dyn IdentityDirectory>,
    stores: Arc<dyn StoreDirectory>,
    sales: CachedStore<Sale>,
    payment_methods: CachedStore<PaymentMethod>,
    customers: CachedStore<Customer>,
}

/// Remote collaborators used directly by the orchestrator.
#[derive(Clone)]
pub struct CheckoutServices {
    pub inventory: Arc<dyn InventoryLedger>,
    pub numbering: Arc<dyn ReceiptNumbering>,
    pub identity: Arc<dyn IdentityDirectory>,
    pub stores: Arc<dyn StoreDirectory>,
}

/// Tables read or written by a checkout.
#[derive(Clone)]
pub struct CheckoutTables {
    pub sales: CachedStore<Sale>,
    pub payment_methods: CachedStore<PaymentMethod>,
    pub customers: CachedStore<Customer>,
}

impl SaleOrchestrator {
    pub fn new(
        guard: TenantGuard,
        pricing: PricingResolver,
        settlement: SettlementRouter,
        receipts: ReceiptPublisher,
        services: CheckoutServices,
        tables: CheckoutTables,
    ) -> Self {
        Self {
            guard,
            pricing,
            settlement,
            receipts,
            inventory: services.inventory,
            numbering: services.numbering,
            identity: services.identity,
            stores: services.stores,
            sales: tables.sales,
            payment_methods: tables.payment_methods,
            customers: tables.customers,
        }
    }

    /// Runs one checkout for a store-scoped caller.
    pub async fn create_sales(
        &self,
        caller: &Caller,
        lines: &[SaleLineRequest],
    ) -> SalesResult<CreatedSales> {
        let started = timestamp_now();

        // Authorized: role, batch shape, store scope, payment method, customers
        let (till, method, customer_email) = self
            .admit(caller, lines)
            .await
            .map_err(|e| fail(SaleStage::Authorized, None, e))?;
        let kind = self.settlement.classify(&method);
        debug!(
            stage = %SaleStage::Authorized,
            store_id = %till.store_id,
            lines = lines.len(),
            settlement = %kind,
            "Checkout admitted"
        );

        // Priced: one line at a time, inventory notified per line
        let mut priced = Vec::with_capacity(lines.len());
        let mut rows = Vec::with_capacity(lines.len());
        let mut totals = SaleTotals::default();
        for line in lines {
            let (priced_line, row) = self
                .price_line(caller, till, line, method.payment_method_id, started)
                .await
                .map_err(|e| fail(SaleStage::Priced, None, e))?;
            totals.add_line(&priced_line);
            priced.push(priced_line);
            rows.push(row);
        }
        debug!(
            stage = %SaleStage::Priced,
            subtotal = %totals.subtotal,
            discount = %totals.discount,
            total = %totals.total,
            "Lines priced"
        );

        // Persisted: one receipt id, one transaction
        let receipt_id = self
            .persist(caller, till, &mut rows)
            .await
            .map_err(|e| fail(SaleStage::Persisted, None, e))?;
        debug!(stage = %SaleStage::Persisted, receipt_id = %receipt_id, rows = rows.len(), "Sale rows committed");

        // Settled
        let request = SettlementRequest {
            kind,
            payment_method_id: method.payment_method_id,
            receipt_id: receipt_id.clone(),
            totals,
            scope: caller.claims.scope(),
            cashier_id: caller.claims.user_id,
            role_id: caller.claims.role_id,
            at: started,
        };
        let settlement = self
            .settlement
            .settle(&request)
            .await
            .map_err(|e| fail(SaleStage::Settled, Some(&receipt_id), e))?;
        debug!(stage = %SaleStage::Settled, receipt_id = %receipt_id, "Receipt settled");

        // Receipted
        self.send_receipt(caller, till, &receipt_id, customer_email, &priced, totals, started)
            .await
            .map_err(|e| fail(SaleStage::Receipted, Some(&receipt_id), e))?;
        debug!(stage = %SaleStage::Receipted, receipt_id = %receipt_id, "Receipt published");

        info!(
            receipt_id = %receipt_id,
            lines = rows.len(),
            total = %totals.total,
            settlement = %settlement.kind(),
            "Sales created"
        );
        debug!(stage = %SaleStage::Done, receipt_id = %receipt_id, "Checkout complete");

        Ok(CreatedSales {
            receipt_id,
            sales: rows,
            totals,
            settlement,
        })
    }

    /// Checks everything that can be checked before any side effect.
    /// Returns the receipt e-mail of the first line's customer.
    async fn admit(
        &self,
        caller: &Caller,
        lines: &[SaleLineRequest],
    ) -> SalesResult<(Till, PaymentMethod, String)> {
        let role = self
            .guard
            .admit(caller, &Sale::POLICY, Operation::Create)
            .await?;

        let payment_method_id = validate_sale_batch(lines)?;
        let scope = caller.claims.scope();
        validate_store_scope(&scope)?;
        let (Some(branch_id), Some(store_id)) = (scope.branch_id, scope.store_id) else {
            return Err(ValidationError::required("store_id").into());
        };

        let method = self.payment_methods.read(payment_method_id).await?;
        self.guard.check_record(&role, caller, &method)?;

        let mut customer_email = None;
        let mut seen = HashSet::new();
        for line in lines {
            if !seen.insert(line.customer_id) {
                continue;
            }
            let customer = self.customers.read(line.customer_id).await?;
            self.guard.check_record(&role, caller, &customer)?;
            customer_email.get_or_insert(customer.email);
        }

        Ok((
            Till {
                company_id: scope.company_id,
                branch_id,
                store_id,
            },
            method,
            customer_email.unwrap_or_default(),
        ))
    }

    async fn price_line(
        &self,
        caller: &Caller,
        till: Till,
        line: &SaleLineRequest,
        payment_method_id: Uuid,
        started: DateTime<Utc>,
    ) -> SalesResult<(PricedLine, Sale)> {
        let sale_date = line.sale_date.unwrap_or(started);
        let priced = self
            .pricing
            .price(caller, line.product_id, line.quantity, sale_date.date_naive())
            .await?;

        self.inventory
            .record_movement(
                caller,
                &StockMovement {
                    product_id: line.product_id,
                    store_id: till.store_id,
                    branch_id: till.branch_id,
                    company_id: till.company_id,
                    quantity: -line.quantity,
                    date: sale_date,
                },
            )
            .await?;

        let row = Sale {
            sale_id: Uuid::new_v4(),
            receipt_id: String::new(),
            product_id: line.product_id,
            customer_id: line.customer_id,
            quantity: line.quantity,
            price: priced.unit_price,
            total_price: priced.line_total,
            sale_date,
            company_id: till.company_id,
            branch_id: till.branch_id,
            store_id: till.store_id,
            cashier_id: caller.claims.user_id,
            payment_method_id,
            audit: Audit::new(caller.claims.user_id, started),
        };
        Ok((priced, row))
    }

    async fn persist(&self, caller: &Caller, till: Till, rows: &mut [Sale]) -> SalesResult<String> {
        let receipt_id = self.numbering.next_receipt_id(caller, till.store_id).await?;
        for row in rows.iter_mut() {
            row.receipt_id = receipt_id.clone();
        }
        self.sales.create_all(rows).await?;
        Ok(receipt_id)
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_receipt(
        &self,
        caller: &Caller,
        till: Till,
        receipt_id: &str,
        customer_email: String,
        priced: &[PricedLine],
        totals: SaleTotals,
        at: DateTime<Utc>,
    ) -> SalesResult<()> {
        let cashier = self.identity.user(caller, caller.claims.user_id).await?;
        let store = self.stores.store(caller, till.store_id).await?;

        let receipt = DigitalReceipt::assemble(
            ReceiptParties {
                customer_email,
                store_name: store.store_name,
                store_address: store.location,
                cashier_name: cashier.username,
            },
            receipt_id,
            at,
            priced,
            totals,
        );
        self.receipts.publish(&receipt).await
    }
}

/// Logs a failed stage; failures after commit become consistency errors.
fn fail(stage: SaleStage, receipt_id: Option<&str>, err: SalesError) -> SalesError {
    error!(
        stage = %stage,
        receipt_id = receipt_id.unwrap_or(""),
        error = %err,
        "Checkout failed"
    );
    match receipt_id {
        Some(receipt_id) if stage.after_commit() => SalesError::Consistency {
            stage,
            receipt_id: receipt_id.to_string(),
            detail: err.to_string(),
        },
        _ => err,
    }
}
