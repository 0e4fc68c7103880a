//! Error types for the sales services.
//!
//! ```text
//! CollaboratorError ──┐
//! ValidationError  ───┤
//! CoreError        ───┼──► SalesError ──► FailureResponse { message, detail, code }
//! DbError          ───┘
//! ```

use serde::{Deserialize, Serialize};
use tally_core::{CoreError, Operation, Record, ValidationError};
use tally_db::DbError;

use crate::orchestrator::SaleStage;

/// Fixed messages paired with the error detail in a [`FailureResponse`].
mod messages {
    use tally_core::{Operation, Record, Sale};

    const CREATE_SALES: &str = "failed to create sales";
    const READ_SALE: &str = "failed to get sale";
    const UPDATE_SALE: &str = "failed to update sale";
    const DELETE_SALE: &str = "failed to delete sale";
    const LIST_SALES: &str = "failed to get sales";

    const CREATE_RECORD: &str = "failed to create record";
    const READ_RECORD: &str = "failed to get record";
    const UPDATE_RECORD: &str = "failed to update record";
    const DELETE_RECORD: &str = "failed to delete record";
    const LIST_RECORDS: &str = "failed to get records";

    pub(super) fn for_operation<T: Record>(operation: Operation) -> &'static str {
        let sale = T::KIND == Sale::KIND;
        match operation {
            Operation::Create if sale => CREATE_SALES,
            Operation::Read if sale => READ_SALE,
            Operation::Update if sale => UPDATE_SALE,
            Operation::Delete if sale => DELETE_SALE,
            Operation::List if sale => LIST_SALES,
            Operation::Create => CREATE_RECORD,
            Operation::Read => READ_RECORD,
            Operation::Update => UPDATE_RECORD,
            Operation::Delete => DELETE_RECORD,
            Operation::List => LIST_RECORDS,
        }
    }
}

// =============================================================================
// Collaborator Error
// =============================================================================

/// A call to a remote collaborator failed.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} request failed: {reason}")]
    Transport { service: &'static str, reason: String },

    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} has no {what} {id}")]
    NotFound {
        service: &'static str,
        what: &'static str,
        id: String,
    },

    #[error("{service} rejected the request: {message}")]
    Rejected { service: &'static str, message: String },

    #[error("{service} sent an unreadable response: {reason}")]
    Decode { service: &'static str, reason: String },

    #[error("could not encode payload for {service}: {reason}")]
    Encode { service: &'static str, reason: String },
}

// =============================================================================
// Sales Error
// =============================================================================

/// What a caller of the sales core can see go wrong.
#[derive(Debug, thiserror::Error)]
pub enum SalesError {
    /// Role not permitted, unknown role, or record outside the caller's scope.
    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("dependency failed: {0}")]
    Dependency(#[from] CollaboratorError),

    /// A step after the sale rows were committed failed; the rows stay.
    #[error("sales for receipt {receipt_id} were committed but the {stage} step failed: {detail}")]
    Consistency {
        stage: SaleStage,
        receipt_id: String,
        detail: String,
    },

    #[error("storage failed: {0}")]
    Storage(DbError),
}

impl From<DbError> for SalesError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SalesError::NotFound { entity, id },
            other => SalesError::Storage(other),
        }
    }
}

impl From<CoreError> for SalesError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => SalesError::Validation(v),
            other => SalesError::Authorization(other.to_string()),
        }
    }
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthorizationFailed,
    ValidationFailed,
    NotFound,
    DependencyFailed,
    PartiallyCommitted,
    StorageFailed,
}

/// Structured failure handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub message: String,
    pub detail: String,
    pub code: ErrorCode,
}

impl SalesError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SalesError::Authorization(_) => ErrorCode::AuthorizationFailed,
            SalesError::Validation(_) => ErrorCode::ValidationFailed,
            SalesError::NotFound { .. } => ErrorCode::NotFound,
            SalesError::Dependency(_) => ErrorCode::DependencyFailed,
            SalesError::Consistency { .. } => ErrorCode::PartiallyCommitted,
            SalesError::Storage(_) => ErrorCode::StorageFailed,
        }
    }

    /// Failure response for `operation` on entity `T`, with the fixed
    /// message for that pair.
    pub fn into_failure<T: Record>(self, operation: Operation) -> FailureResponse {
        FailureResponse {
            message: messages::for_operation::<T>(operation).to_string(),
            detail: self.to_string(),
            code: self.code(),
        }
    }
}

pub type SalesResult<T> = Result<T, SalesError>;
