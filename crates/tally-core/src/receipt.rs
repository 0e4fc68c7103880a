//! # Digital Receipt
//!
//! The document handed to the delivery queue after a sale is settled.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ receipt_receiver   customer e-mail       │
//! ├──────────────────────────────────────────┤
//! │ receipt_header     store, address,       │
//! │                    cashier, receipt id,  │
//! │                    transaction date      │
//! ├──────────────────────────────────────────┤
//! │ receipt_body       items[]               │
//! ├──────────────────────────────────────────┤
//! │ receipt_summary    subtotal, discount,   │
//! │                    tax, total, cash,     │
//! │                    change                │
//! └──────────────────────────────────────────┘
//! ```
//! Amounts are integer cents, like every other amount in the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::{PricedLine, SaleTotals};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptReceiver {
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptHeader {
    pub store_name: String,
    pub store_address: String,
    pub cashier_name: String,
    pub receipt_id: String,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub product_name: String,
    pub quantity: i32,
    pub price: Money,
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptBody {
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub sub_total_amount: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub cash_amount: Money,
    pub change_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalReceipt {
    pub receipt_receiver: ReceiptReceiver,
    pub receipt_header: ReceiptHeader,
    pub receipt_body: ReceiptBody,
    pub receipt_summary: ReceiptSummary,
}

/// Who and where, for the receipt header.
#[derive(Debug, Clone)]
pub struct ReceiptParties {
    pub customer_email: String,
    pub store_name: String,
    pub store_address: String,
    pub cashier_name: String,
}

impl DigitalReceipt {
    /// Assembles a receipt from priced lines in submission order.
    ///
    /// Tax is not computed by this service; the amount tendered equals the
    /// total, so change is always zero.
    pub fn assemble(
        parties: ReceiptParties,
        receipt_id: &str,
        at: DateTime<Utc>,
        lines: &[PricedLine],
        totals: SaleTotals,
    ) -> Self {
        let items = lines
            .iter()
            .map(|line| ReceiptItem {
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                price: line.unit_price,
                total_price: line.line_total,
            })
            .collect();

        DigitalReceipt {
            receipt_receiver: ReceiptReceiver {
                email_address: parties.customer_email,
            },
            receipt_header: ReceiptHeader {
                store_name: parties.store_name,
                store_address: parties.store_address,
                cashier_name: parties.cashier_name,
                receipt_id: receipt_id.to_string(),
                transaction_date: at,
            },
            receipt_body: ReceiptBody { items },
            receipt_summary: ReceiptSummary {
                sub_total_amount: totals.subtotal,
                discount_amount: totals.discount,
                tax_amount: Money::zero(),
                total_amount: totals.total,
                cash_amount: totals.total,
                change_amount: Money::zero(),
            },
        }
    }

    /// JSON bytes for the delivery queue.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
