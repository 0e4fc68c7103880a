//! # Domain Types
//!
//! Every persisted entity of the sales core.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐          one receipt_id per checkout               │
//! │  │      Sale       │ ×N ─────────────────┐                              │
//! │  │  sale_id        │                     ▼                              │
//! │  │  receipt_id     │        exactly ONE settlement record:             │
//! │  │  price, total   │   ┌──────────────┬─────────────┬───────────────┐  │
//! │  └─────────────────┘   │CashDrawerEntry│   Invoice   │ OnlinePayment │  │
//! │                        │ cash_in/out   │ discounts   │ payment_method│  │
//! │                        └──────────────┴─────────────┴───────────────┘  │
//! │                                                                         │
//! │  Reference data: Customer, PaymentMethod        After-sale: SaleReturn │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries its tenant scope columns and an [`Audit`] block, and
//! implements [`Record`] so the generic store and services can handle it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::record::{carry_identity, present, Audit, Record};
use crate::tenancy::{AccessPolicy, ScopeLevel, TenantScope};

use ScopeLevel::{Branch, Company, Store};

const ALL_LEVELS: &[ScopeLevel] = &[Company, Branch, Store];

fn require_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Money) -> ValidationResult<()> {
    if value.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Sale
// =============================================================================

/// One sold line: a product at a realized price, grouped by receipt id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub sale_id: Uuid,
    pub receipt_id: String,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub quantity: i32,
    /// Post-discount unit price.
    pub price: Money,
    /// `price × quantity`.
    pub total_price: Money,
    pub sale_date: DateTime<Utc>,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub store_id: Uuid,
    pub cashier_id: Uuid,
    pub payment_method_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for Sale {
    const KIND: &'static str = "sale";
    const SCOPE_LEVELS: &'static [ScopeLevel] = ALL_LEVELS;
    const REQUIRED_SCOPE: &'static [ScopeLevel] = ALL_LEVELS;
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Store],
        read: ALL_LEVELS,
        update: &[Branch],
        delete: &[Branch],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.sale_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.sale_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: present(self.branch_id),
            store_id: present(self.store_id),
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if let Some(branch) = scope.branch_id {
            self.branch_id = branch;
        }
        if let Some(store) = scope.store_id {
            self.store_id = store;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity"));
        }
        require_non_negative("price", self.price)
    }

    /// Only the customer and the sale date may change once a sale exists;
    /// quantity and money fields stay as they were settled.
    fn carry_over(&mut self, stored: &Self) {
        carry_identity(self, stored);
        self.receipt_id = stored.receipt_id.clone();
        self.product_id = stored.product_id;
        self.quantity = stored.quantity;
        self.price = stored.price;
        self.total_price = stored.total_price;
        self.cashier_id = stored.cashier_id;
        self.payment_method_id = stored.payment_method_id;
    }
}

/// One line of a checkout as submitted by the till.
///
/// Price, receipt id and scope are never taken from the client; they are
/// resolved server-side when the line becomes a [`Sale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: Uuid,
    pub customer_id: Uuid,
    pub quantity: i32,
    pub payment_method_id: Uuid,
    /// Defaults to the time of the request.
    #[serde(default)]
    pub sale_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Cash Drawer Entry
// =============================================================================

/// Cash movement recorded against a store's drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashDrawerEntry {
    pub drawer_id: Uuid,
    pub receipt_id: String,
    pub employee_id: Uuid,
    pub role_id: Uuid,
    pub cash_in: Money,
    pub amount: Money,
    pub cash_out: Money,
    pub transaction_time: DateTime<Utc>,
    pub description: String,
    pub company_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for CashDrawerEntry {
    const KIND: &'static str = "cash_drawer";
    const SCOPE_LEVELS: &'static [ScopeLevel] = ALL_LEVELS;
    const REQUIRED_SCOPE: &'static [ScopeLevel] = &[Company, Store];
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Branch, Store],
        read: ALL_LEVELS,
        update: &[Branch],
        delete: &[Branch],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.drawer_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.drawer_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: self.branch_id,
            store_id: self.store_id,
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if scope.branch_id.is_some() {
            self.branch_id = scope.branch_id;
        }
        if scope.store_id.is_some() {
            self.store_id = scope.store_id;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        require_non_negative("cash_in", self.cash_in)?;
        require_non_negative("cash_out", self.cash_out)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Pay-later settlement owed by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub receipt_id: String,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub discounts: Money,
    pub taxes: Money,
    pub due_date: Option<DateTime<Utc>>,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for Invoice {
    const KIND: &'static str = "invoice";
    const SCOPE_LEVELS: &'static [ScopeLevel] = &[Company, Branch];
    const REQUIRED_SCOPE: &'static [ScopeLevel] = &[Company, Branch];
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Branch, Store],
        read: ALL_LEVELS,
        update: &[Branch],
        delete: &[Branch],
        list: &[Company, Branch],
    };

    fn id(&self) -> Uuid {
        self.invoice_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.invoice_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: present(self.branch_id),
            store_id: None,
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if let Some(branch) = scope.branch_id {
            self.branch_id = branch;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        require_non_negative("amount", self.amount)?;
        require_non_negative("discounts", self.discounts)?;
        require_non_negative("taxes", self.taxes)
    }
}

// =============================================================================
// Online Payment
// =============================================================================

/// Electronic settlement through a non-cash, non-credit payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OnlinePayment {
    pub payment_id: Uuid,
    pub receipt_id: String,
    pub employee_id: Uuid,
    pub role_id: Uuid,
    pub payment_date: DateTime<Utc>,
    pub amount: Money,
    /// Id of the [`PaymentMethod`] used.
    pub payment_method: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub store_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for OnlinePayment {
    const KIND: &'static str = "online_payment";
    const SCOPE_LEVELS: &'static [ScopeLevel] = ALL_LEVELS;
    const REQUIRED_SCOPE: &'static [ScopeLevel] = ALL_LEVELS;
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Store],
        read: ALL_LEVELS,
        update: &[Branch],
        delete: &[Branch],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.payment_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.payment_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: present(self.branch_id),
            store_id: present(self.store_id),
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if let Some(branch) = scope.branch_id {
            self.branch_id = branch;
        }
        if let Some(store) = scope.store_id {
            self.store_id = store;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        require_non_negative("amount", self.amount)
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub customer_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub registration_date: Option<NaiveDate>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Record for Customer {
    const KIND: &'static str = "customer";
    const SCOPE_LEVELS: &'static [ScopeLevel] = &[Company, Branch];
    const REQUIRED_SCOPE: &'static [ScopeLevel] = &[Company, Branch];
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Branch, Store],
        read: ALL_LEVELS,
        update: &[Branch, Store],
        delete: &[Company, Branch],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.customer_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.customer_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: present(self.branch_id),
            store_id: None,
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if let Some(branch) = scope.branch_id {
            self.branch_id = branch;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A company-wide payment method. Its `method_name` decides which
/// settlement ledger a sale lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethod {
    pub payment_method_id: Uuid,
    pub method_name: String,
    pub company_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for PaymentMethod {
    const KIND: &'static str = "payment_method";
    const SCOPE_LEVELS: &'static [ScopeLevel] = &[Company];
    const REQUIRED_SCOPE: &'static [ScopeLevel] = &[Company];
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Company],
        read: ALL_LEVELS,
        update: &[Company],
        delete: &[Company],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.payment_method_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.payment_method_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope::company(self.company_id)
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("method_name", &self.method_name)
    }
}

// =============================================================================
// Sale Return
// =============================================================================

/// Goods brought back against an earlier receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleReturn {
    pub return_id: Uuid,
    pub receipt_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Money,
    pub amount: Money,
    pub return_date: DateTime<Utc>,
    pub reason: String,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub store_id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub audit: Audit,
}

impl Record for SaleReturn {
    const KIND: &'static str = "return";
    const SCOPE_LEVELS: &'static [ScopeLevel] = ALL_LEVELS;
    const REQUIRED_SCOPE: &'static [ScopeLevel] = ALL_LEVELS;
    const POLICY: AccessPolicy = AccessPolicy {
        create: &[Branch, Store],
        read: ALL_LEVELS,
        update: &[Branch],
        delete: &[Branch],
        list: ALL_LEVELS,
    };

    fn id(&self) -> Uuid {
        self.return_id
    }

    fn set_id(&mut self, id: Uuid) {
        self.return_id = id;
    }

    fn scope(&self) -> TenantScope {
        TenantScope {
            company_id: self.company_id,
            branch_id: present(self.branch_id),
            store_id: present(self.store_id),
        }
    }

    fn set_scope(&mut self, scope: &TenantScope) {
        self.company_id = scope.company_id;
        if let Some(branch) = scope.branch_id {
            self.branch_id = branch;
        }
        if let Some(store) = scope.store_id {
            self.store_id = store;
        }
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.quantity <= 0 {
            return Err(ValidationError::must_be_positive("quantity"));
        }
        require_text("receipt_id", &self.receipt_id)?;
        require_non_negative("price", self.price)?;
        require_non_negative("amount", self.amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
