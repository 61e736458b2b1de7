//! # Validation Module
//!
//! Input validation for RetailOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard forms (browser)                                    │
//! │  ├── Empty fields, number inputs                                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: retail-store services                                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger rules (CoreError)                                     │
//! │  ├── Stock availability                                                │
//! │  └── Register open/closed state                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use retail_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("NIK-270-RED").unwrap();
//! validate_quantity(2).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use retail_core::validation::validate_sku;
///
/// assert!(validate_sku("ADI-ULT-BLK").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name (1 to 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a client first or last name (1 to 100 characters).
pub fn validate_person_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_text(field, name, 100)
}

/// Validates a withdrawal reason.
///
/// Blank is `Required`, which the register reports as `MissingReason`.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    validate_text("reason", reason, 500)
}

/// Loose email check: one `@` with something on both sides.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        }),
    }
}

/// Validates a search query and returns it trimmed. Empty is allowed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Seller dashboard: "+" on a cart line                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(n) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── n <= 0?  → "quantity must be positive"                       │
/// │       ├── n > 999? → "quantity must be between 1 and 999"              │
/// │       └── OK → Cart checks the stock cap                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    validate_units(qty)?;

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit count taken from stock. Only positivity is checked:
/// the 999 cap is for cart entry, not for stock movements.
pub fn validate_units(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (gift items).
///
/// ## Example
/// ```rust
/// use retail_core::validation::validate_price;
///
/// assert!(validate_price(15000).is_ok());
/// assert!(validate_price(0).is_ok());
/// assert!(validate_price(-100).is_err());
/// ```
pub fn validate_price(amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock count (never negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0 to 10000).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more distinct line fits in the cart (max MAX_CART_ITEMS).
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("NIK-270-RED").is_ok());
        assert!(validate_sku("TSH_WHT").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("T-Shirt Cotton Basic").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());

        assert!(validate_person_name("firstName", "Marie").is_ok());
        let err = validate_person_name("lastName", "  ").unwrap_err();
        assert_eq!(err.to_string(), "lastName is required");
    }

    #[test]
    fn test_validate_reason() {
        assert!(validate_reason("fuel").is_ok());
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("sarah@store.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("sarah").is_err());
        assert!(validate_email("@store.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_units_has_no_cap() {
        assert!(validate_units(1000).is_ok());
        assert!(validate_units(1).is_ok());
        assert!(matches!(validate_units(0), Err(ValidationError::MustBePositive { .. })));
        assert!(validate_units(-3).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(-1).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-3).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1925).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}
