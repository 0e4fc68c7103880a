//! # Settlement
//!
//! Chooses and builds the single ledger record that collects a receipt.
//!
//! ## Kind Selection
//! ```text
//! PaymentMethod.method_name
//!      │
//!      ▼
//! SettlementKind::classify(name, sentinels)   ← the ONLY string comparison
//!      │
//!      ├── == sentinels.cash_method       → Cash       → CashDrawerEntry
//!      ├── == sentinels.pay_later_method  → Credit     → Invoice
//!      └── anything else                  → Electronic → OnlinePayment
//! ```
//!
//! Downstream code matches on [`SettlementKind`] exhaustively; adding a
//! ledger means adding a variant and fixing every match the compiler flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::Money;
use crate::pricing::SaleTotals;
use crate::record::{Audit, Record};
use crate::tenancy::TenantScope;
use crate::types::{CashDrawerEntry, Invoice, OnlinePayment};

// =============================================================================
// Settlement Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Cash,
    Credit,
    Electronic,
}

/// Payment method names that select the cash and pay-later ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSentinels {
    pub cash_method: String,
    pub pay_later_method: String,
}

impl SettlementSentinels {
    pub fn new(cash_method: impl Into<String>, pay_later_method: impl Into<String>) -> Self {
        SettlementSentinels {
            cash_method: cash_method.into(),
            pay_later_method: pay_later_method.into(),
        }
    }
}

impl SettlementKind {
    /// Resolves the kind from a payment method name by exact match.
    pub fn classify(method_name: &str, sentinels: &SettlementSentinels) -> Self {
        if method_name == sentinels.cash_method {
            SettlementKind::Cash
        } else if method_name == sentinels.pay_later_method {
            SettlementKind::Credit
        } else {
            SettlementKind::Electronic
        }
    }
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementKind::Cash => "cash",
            SettlementKind::Credit => "credit",
            SettlementKind::Electronic => "electronic",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Settlement Request
// =============================================================================

/// Everything needed to settle one receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequest {
    pub kind: SettlementKind,
    pub payment_method_id: Uuid,
    pub receipt_id: String,
    pub totals: SaleTotals,
    pub scope: TenantScope,
    pub cashier_id: Uuid,
    pub role_id: Uuid,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Settlement Record
// =============================================================================

/// The ledger entry that collected a receipt. Exactly one per receipt id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementRecord {
    CashDrawer(CashDrawerEntry),
    Invoice(Invoice),
    OnlinePayment(OnlinePayment),
}

impl SettlementRecord {
    /// Builds the record for the request's kind.
    ///
    /// ```text
    /// Cash        cash_in = subtotal, amount = total, cash_out = 0
    /// Credit      amount = total, discounts = discount, taxes = 0
    /// Electronic  amount = total, payment_method = method id
    /// ```
    pub fn build(request: &SettlementRequest) -> Self {
        let audit = Audit::new(request.cashier_id, request.at);
        let scope = request.scope;
        let totals = request.totals;

        match request.kind {
            SettlementKind::Cash => SettlementRecord::CashDrawer(CashDrawerEntry {
                drawer_id: Uuid::new_v4(),
                receipt_id: request.receipt_id.clone(),
                employee_id: request.cashier_id,
                role_id: request.role_id,
                cash_in: totals.subtotal,
                amount: totals.total,
                cash_out: Money::zero(),
                transaction_time: request.at,
                description: format!("Sales Receipt ID {}", request.receipt_id),
                company_id: scope.company_id,
                branch_id: scope.branch_id,
                store_id: scope.store_id,
                audit,
            }),
            SettlementKind::Credit => SettlementRecord::Invoice(Invoice {
                invoice_id: Uuid::new_v4(),
                receipt_id: request.receipt_id.clone(),
                date: request.at,
                amount: totals.total,
                discounts: totals.discount,
                taxes: Money::zero(),
                due_date: None,
                company_id: scope.company_id,
                branch_id: scope.branch_id.unwrap_or_default(),
                audit,
            }),
            SettlementKind::Electronic => SettlementRecord::OnlinePayment(OnlinePayment {
                payment_id: Uuid::new_v4(),
                receipt_id: request.receipt_id.clone(),
                employee_id: request.cashier_id,
                role_id: request.role_id,
                payment_date: request.at,
                amount: totals.total,
                payment_method: request.payment_method_id,
                company_id: scope.company_id,
                branch_id: scope.branch_id.unwrap_or_default(),
                store_id: scope.store_id.unwrap_or_default(),
                audit,
            }),
        }
    }

    pub fn kind(&self) -> SettlementKind {
        match self {
            SettlementRecord::CashDrawer(_) => SettlementKind::Cash,
            SettlementRecord::Invoice(_) => SettlementKind::Credit,
            SettlementRecord::OnlinePayment(_) => SettlementKind::Electronic,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            SettlementRecord::CashDrawer(entry) => entry.id(),
            SettlementRecord::Invoice(invoice) => invoice.id(),
            SettlementRecord::OnlinePayment(payment) => payment.id(),
        }
    }

    pub fn receipt_id(&self) -> &str {
        match self {
            SettlementRecord::CashDrawer(entry) => &entry.receipt_id,
            SettlementRecord::Invoice(invoice) => &invoice.receipt_id,
            SettlementRecord::OnlinePayment(payment) => &payment.receipt_id,
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            SettlementRecord::CashDrawer(entry) => entry.amount,
            SettlementRecord::Invoice(invoice) => invoice.amount,
            SettlementRecord::OnlinePayment(payment) => payment.amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
