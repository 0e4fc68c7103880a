//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Tenancy and domain rule failures               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - PostgreSQL / Redis failures                    │
//! │                                                                         │
//! │  tally-sales errors                                                    │
//! │  ├── CollaboratorError - Remote service failures                       │
//! │  └── SalesError        - What callers see (Authorization, Validation,  │
//! │                          NotFound, Dependency, Consistency)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SalesError → FailureResponse      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule failures detected without touching any I/O.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The caller's role is not in the allow-list of the operation.
    #[error("role '{role}' is not permitted to {operation}")]
    Forbidden { role: String, operation: String },

    /// The target record belongs to a different tenant than the caller.
    ///
    /// ## User Workflow
    /// ```text
    /// Store A cashier reads sale X (owned by Store B)
    ///      │
    ///      ▼
    /// record.store_id != claims.store_id
    ///      │
    ///      ▼
    /// ScopeMismatch ← reported as an authorization failure, never not-found
    /// ```
    #[error("{entity} {id} is outside the caller's tenant scope")]
    ScopeMismatch { entity: String, id: String },

    /// The role name resolved by the identity service is not one the
    /// taxonomy knows how to scope.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any side effect so a rejected request leaves no trace.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (bad uuid, bad date, bad decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A batch mixes values that must be shared by every element.
    #[error("all line items must share the same {field}")]
    Mixed { field: String },

    /// Field may not be changed after creation.
    #[error("{field} cannot be changed")]
    Immutable { field: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
