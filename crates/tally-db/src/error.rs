//! # Storage Error Types
//!
//! Error types for PostgreSQL and Redis operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / redis::RedisError / serde_json::Error                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalesError (tally-sales) ← NotFound stays NotFound, rest is Storage   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FailureResponse { message, detail }                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// PostgreSQL SQLSTATE for `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in the store.
    ///
    /// ## When This Occurs
    /// - cache miss and no row for the id
    /// - UPDATE / DELETE touched zero rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate primary key).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Pool or server connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Cache backend failure.
    ///
    /// ## When This Occurs
    /// - Redis unreachable or timed out
    /// - SET / DEL rejected
    #[error("Cache error: {0}")]
    Cache(String),

    /// A record could not be encoded to, or decoded from, its cache form.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal storage error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity kind and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound     → DbError::NotFound
/// sqlx::Error::Database 23505  → DbError::UniqueViolation
/// sqlx::Error::Database 23503  → DbError::ForeignKeyViolation
/// sqlx::Error::PoolTimedOut    → DbError::PoolExhausted
/// Other                        → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("record", "unknown"),

            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => DbError::UniqueViolation {
                    field: db_err.constraint().unwrap_or("unknown").to_string(),
                    value: db_err.table().unwrap_or("unknown").to_string(),
                },
                Some(PG_FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<redis::RedisError> for DbError {
    fn from(err: redis::RedisError) -> Self {
        DbError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
