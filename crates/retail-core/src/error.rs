//! # Error Types
//!
//! Domain-specific error types for retail-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  retail-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger, register and session rule violations   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  retail-store errors (separate crate)                                  │
//! │  ├── StoreError       - Key/value store failures                       │
//! │  └── LedgerError      - CoreError | StoreError                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → ErrorNotice → UI    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is returned as a value. None of them is retried
//! automatically; the dashboards show them as a blocking notification.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the ledger, register and session code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has no variant with this id.
    #[error("Variant {variant_id} not found on product {product_id}")]
    VariantNotFound {
        product_id: String,
        variant_id: String,
    },

    /// Not enough units to cover the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Commit sale (Nike Air Max 42 Rouge × 6)
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "PROD_001", variant_id: Some("v_n_1"), .. }
    ///      │
    ///      ▼
    /// Whole sale rejected, no stock touched
    /// ```
    #[error(
        "Insufficient stock for {product_id}{}: available {available}, requested {requested}",
        variant_suffix(.variant_id)
    )]
    InsufficientStock {
        product_id: String,
        variant_id: Option<String>,
        available: i64,
        requested: i64,
    },

    /// A sale was submitted without any line.
    #[error("Cart is empty")]
    EmptyCart,

    /// Client id does not exist in the directory.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// A register operation needs an open register and none is open.
    #[error("Cash register is not open")]
    RegisterNotOpen,

    /// `open` was called while a register is already open.
    #[error("Cash register {0} is already open")]
    AlreadyOpen(String),

    /// Amount is negative, or zero where a positive amount is required.
    #[error("Invalid amount for {field}: {amount}")]
    InvalidAmount { field: String, amount: i64 },

    /// A withdrawal was submitted without a reason.
    #[error("A reason is required for cash withdrawals")]
    MissingReason,

    /// Login with an email no user has.
    #[error("No user with email {0}")]
    UnknownUser(String),

    /// Login with the wrong password.
    #[error("Incorrect password")]
    InvalidPassword,

    /// Login succeeded but the account does not have the requested role.
    #[error("Account does not have the {role} role")]
    RoleMismatch { role: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidAmount error.
    pub fn invalid_amount(field: impl Into<String>, amount: i64) -> Self {
        CoreError::InvalidAmount {
            field: field.into(),
            amount,
        }
    }
}

fn variant_suffix(variant_id: &Option<String>) -> String {
    variant_id
        .as_deref()
        .map(|v| format!(" ({v})"))
        .unwrap_or_default()
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad SKU characters, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
