//! # Store Error Types
//!
//! Errors for storage operations and for the ledger services built on them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / MigrateError / serde_json::Error                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError ← Adds context and categorization                          │
//! │       │                         CoreError (retail-core)                │
//! │       │                               │                                 │
//! │       ▼                               ▼                                 │
//! │  LedgerError::Store(..)      LedgerError::Domain(..)                   │
//! │       │                               │                                 │
//! │       └───────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │  ErrorNotice { code, message } ← Serialized for the dashboards         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use retail_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Store Error
// =============================================================================

/// Key/value store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database file could not be opened or created.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Embedded migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQL statement failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// All pooled connections are busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A value could not be encoded before writing.
    #[error("Could not serialize value for '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Anything else reported by the driver.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn serialization(key: impl Into<String>, err: serde_json::Error) -> Self {
        StoreError::Serialization {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → StoreError::QueryFailed
/// sqlx::Error::PoolTimedOut   → StoreError::PoolExhausted
/// sqlx::Error::PoolClosed     → StoreError::ConnectionFailed
/// Other                       → StoreError::Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Error returned by the ledger services: a business rule or a storage fault.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Domain(CoreError::Validation(err))
    }
}

impl LedgerError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Domain(e) => Some(e),
            LedgerError::Store(_) => None,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Error Notice
// =============================================================================

/// What the dashboards show in their blocking notification.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for PROD_001 (v_n_1): available 5, requested 6" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorNotice {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    EmptyCart,
    RegisterNotOpen,
    AlreadyOpen,
    InvalidAmount,
    MissingReason,
    AuthFailed,
    StorageError,
}

impl ErrorNotice {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorNotice {
            code,
            message: message.into(),
        }
    }
}

impl From<&CoreError> for ErrorNotice {
    fn from(err: &CoreError) -> Self {
        let code = match err {
            CoreError::ProductNotFound(_)
            | CoreError::VariantNotFound { .. }
            | CoreError::ClientNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::RegisterNotOpen => ErrorCode::RegisterNotOpen,
            CoreError::AlreadyOpen(_) => ErrorCode::AlreadyOpen,
            CoreError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            CoreError::MissingReason => ErrorCode::MissingReason,
            CoreError::UnknownUser(_) | CoreError::InvalidPassword | CoreError::RoleMismatch { .. } => {
                ErrorCode::AuthFailed
            }
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ErrorNotice::new(code, err.to_string())
    }
}

/// Storage faults are logged and shown generically.
impl From<LedgerError> for ErrorNotice {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(e) => ErrorNotice::from(&e),
            LedgerError::Store(e) => {
                tracing::error!(error = %e, "Storage operation failed");
                ErrorNotice::new(ErrorCode::StorageError, "Storage operation failed")
            }
        }
    }
}

impl std::fmt::Display for ErrorNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}
