//! Settlement Router.
//!
//! ```text
//! method name ──► SettlementKind::classify
//!                    │
//!      ┌─────────────┼───────────────┐
//!      ▼             ▼               ▼
//!    Cash          Credit        Electronic
//!  pos_cash_     pos_invoices   pos_online_
//!  drawers                       payments
//! ```
//!
//! Exactly one record is written per receipt.

use tally_core::{
    CashDrawerEntry, Invoice, OnlinePayment, PaymentMethod, SettlementKind, SettlementRecord,
    SettlementRequest, SettlementSentinels,
};
use tally_db::CachedStore;
use tracing::info;

use crate::error::SalesResult;

#[derive(Clone)]
pub struct SettlementRouter {
    sentinels: SettlementSentinels,
    cash_drawers: CachedStore<CashDrawerEntry>,
    invoices: CachedStore<Invoice>,
    online_payments: CachedStore<OnlinePayment>,
}

impl SettlementRouter {
    pub fn new(
        sentinels: SettlementSentinels,
        cash_drawers: CachedStore<CashDrawerEntry>,
        invoices: CachedStore<Invoice>,
        online_payments: CachedStore<OnlinePayment>,
    ) -> Self {
        Self {
            sentinels,
            cash_drawers,
            invoices,
            online_payments,
        }
    }

    pub fn classify(&self, method: &PaymentMethod) -> SettlementKind {
        SettlementKind::classify(&method.method_name, &self.sentinels)
    }

    /// Builds and stores the single settlement record for a receipt.
    pub async fn settle(&self, request: &SettlementRequest) -> SalesResult<SettlementRecord> {
        let record = SettlementRecord::build(request);

        match &record {
            SettlementRecord::CashDrawer(entry) => self.cash_drawers.create(entry).await?,
            SettlementRecord::Invoice(invoice) => self.invoices.create(invoice).await?,
            SettlementRecord::OnlinePayment(payment) => self.online_payments.create(payment).await?,
        }

        info!(
            receipt_id = %record.receipt_id(),
            kind = %record.kind(),
            settlement_id = %record.id(),
            amount = %record.amount(),
            "Settlement recorded"
        );
        Ok(record)
    }
}
