//! # Validation Module
//!
//! Checks run on a checkout batch before anything leaves the process.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization                                              │
//! │  └── uuids, dates, integer quantities                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── batch not empty, not oversized                                    │
//! │  ├── every quantity > 0                                                │
//! │  ├── one payment method for the whole batch                            │
//! │  └── caller carries a full company/branch/store scope                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PostgreSQL                                                   │
//! │  └── NOT NULL / CHECK (quantity > 0) constraints                       │
//! │                                                                         │
//! │  A rejected batch performs NO remote call and NO write.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};
use crate::tenancy::{ScopeLevel, TenantScope};
use crate::types::SaleLineRequest;
use crate::MAX_SALE_LINES;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ```rust
/// use tally_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-4).is_err());
/// ```
pub fn validate_quantity(qty: i32) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }
    Ok(())
}

// =============================================================================
// Batch Validators
// =============================================================================

/// Validates a checkout batch and returns its shared payment method id.
///
/// ## User Workflow
/// ```text
/// Till submits 3 lines
///      │
///      ▼
/// validate_sale_batch ← THIS FUNCTION
///      │
///      ├── empty?                        → "line_items is required"
///      ├── more than MAX_SALE_LINES?     → "line_items ... too many"
///      ├── any quantity <= 0?            → "quantity must be positive"
///      ├── payment methods differ?       → "all line items must share ..."
///      │
///      └── OK(payment_method_id) → pricing starts
/// ```
pub fn validate_sale_batch(lines: &[SaleLineRequest]) -> ValidationResult<Uuid> {
    let first = lines
        .first()
        .ok_or_else(|| ValidationError::required("line_items"))?;

    if lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::InvalidFormat {
            field: "line_items".to_string(),
            reason: format!("at most {} lines per receipt", MAX_SALE_LINES),
        });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
    }

    if lines
        .iter()
        .any(|line| line.payment_method_id != first.payment_method_id)
    {
        return Err(ValidationError::Mixed {
            field: "payment_method_id".to_string(),
        });
    }

    Ok(first.payment_method_id)
}

/// Validates that a store-level caller carries every scope level a sale row
/// needs.
pub fn validate_store_scope(scope: &TenantScope) -> ValidationResult<()> {
    scope.require(&[ScopeLevel::Company, ScopeLevel::Branch, ScopeLevel::Store])
}
