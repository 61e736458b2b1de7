//! # Domain Types
//!
//! Records persisted in the key/value store.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │     Client      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, sku        │   │  id, date       │   │  id, names      │       │
//! │  │  price          │   │  items[]        │   │  type           │       │
//! │  │  variants[]     │   │  subtotal/tax   │   │  total_spent    │       │
//! │  │  stock (cache)  │   │  total          │   │  purchase_count │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Variant      │   │  PaymentMethod  │   │      User       │       │
//! │  │  size, color    │   │  Cash           │   │  email, role    │       │
//! │  │  stock ≥ 0      │   │  Card / Mobile  │   │  (demo login)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All records use camelCase JSON keys. Seller fields keep the store's
//! `vendeuseId` / `vendeuseName` keys so existing data stays readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A size/color variant with its own stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variant {
    pub id: String,
    pub size: String,
    pub color: String,
    pub stock: i64,
}

impl Variant {
    /// Label used on sale lines, e.g. `42 / Rouge`.
    pub fn label(&self) -> String {
        format!("{} / {}", self.size, self.color)
    }
}

/// A product in the catalog.
///
/// ## Stock Invariant
/// When `variants` is non-empty, `stock` is a cache of the variant sum and
/// is recomputed on every variant change. Without variants, `stock` is the
/// only stock figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub price: Money,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Product {
    #[inline]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Finds a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Recomputes the cached total from the variants.
    ///
    /// No-op for products without variants.
    pub fn recompute_stock(&mut self) {
        if self.has_variants() {
            self.stock = self.variants.iter().map(|v| v.stock).sum();
        }
    }

    /// Units available for a line.
    ///
    /// Variant-level when `variant_id` is given, top-level `stock` otherwise.
    /// A product with variants must be addressed through one of them: its
    /// `stock` is only the cached sum.
    pub fn available_stock(&self, variant_id: Option<&str>) -> CoreResult<i64> {
        match variant_id {
            Some(vid) => self
                .variant(vid)
                .map(|v| v.stock)
                .ok_or_else(|| CoreError::VariantNotFound {
                    product_id: self.id.clone(),
                    variant_id: vid.to_string(),
                }),
            None if self.has_variants() => Err(ValidationError::Required {
                field: "variantId".to_string(),
            }
            .into()),
            None => Ok(self.stock),
        }
    }

    /// Fails with `InsufficientStock` if `quantity` exceeds what is available.
    pub fn check_stock(&self, variant_id: Option<&str>, quantity: i64) -> CoreResult<()> {
        let available = self.available_stock(variant_id)?;
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                product_id: self.id.clone(),
                variant_id: variant_id.map(str::to_string),
                available,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Removes `quantity` units, keeping the cached total in sync.
    ///
    /// Checks first, so a failed call leaves the product untouched.
    pub fn deduct_stock(&mut self, variant_id: Option<&str>, quantity: i64) -> CoreResult<()> {
        self.check_stock(variant_id, quantity)?;

        match variant_id {
            Some(vid) => {
                if let Some(variant) = self.variants.iter_mut().find(|v| v.id == vid) {
                    variant.stock -= quantity;
                }
                self.recompute_stock();
            }
            None => self.stock -= quantity,
        }
        Ok(())
    }

    /// True when any variant (or the product itself, without variants) is
    /// below `threshold` units.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        if self.has_variants() {
            self.variants.iter().any(|v| v.stock < threshold)
        } else {
            self.stock < threshold
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash.
    #[default]
    Cash,
    /// Card on an external terminal.
    Card,
    /// Mobile money.
    Mobile,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parsing of the labels the dashboards submit.
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s.contains("card") || s.contains("carte") {
            Ok(PaymentMethod::Card)
        } else if s.contains("mobile") {
            Ok(PaymentMethod::Mobile)
        } else if s == "cash" || s == "especes" || s == "espèces" {
            Ok(PaymentMethod::Cash)
        } else {
            Err(ValidationError::InvalidFormat {
                field: "paymentMethod".to_string(),
                reason: format!("unknown payment method '{s}'"),
            })
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Sales are only ever appended in the completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleStatus {
    #[default]
    Completed,
}

/// A line of a completed sale. Name and price are frozen at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    /// Product id.
    pub id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
    pub total: Money,
}

/// An immutable sale record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    #[serde(rename = "vendeuseId")]
    pub seller_id: String,
    #[serde(rename = "vendeuseName")]
    pub seller_name: String,
    pub client_id: Option<String>,
    pub client_name: String,
    #[serde(default)]
    pub status: SaleStatus,
}

impl Sale {
    /// Units sold across all lines.
    pub fn units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientType {
    #[serde(rename = "VIP")]
    Vip,
    Regular,
    #[default]
    Client,
}

/// A known customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub client_type: ClientType,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub total_spent: Money,
    #[serde(default)]
    pub purchase_count: i64,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub last_visit: Option<DateTime<Utc>>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Accumulates a completed sale into the client's counters.
    pub fn record_purchase(&mut self, total: Money, at: DateTime<Utc>) {
        self.total_spent += total;
        self.purchase_count += 1;
        self.last_visit = Some(at);
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    /// Sales floor staff.
    Vendeuse,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Vendeuse => "vendeuse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staff account. Demo model: the password is stored as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// The logged-in user as stored under `currentUser` (never holds the password).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[ts(as = "String")]
    pub session_start: DateTime<Utc>,
}

impl SessionUser {
    pub fn from_user(user: &User, session_start: DateTime<Utc>) -> Self {
        SessionUser {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            session_start,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sneaker() -> Product {
        Product {
            id: "PROD_001".to_string(),
            name: "Nike Air Max 270".to_string(),
            sku: "NIK-270-RED".to_string(),
            category: "Chaussures".to_string(),
            brand: "Nike".to_string(),
            price: Money::new(120000),
            active: true,
            variants: vec![
                Variant {
                    id: "v_n_1".to_string(),
                    size: "42".to_string(),
                    color: "Rouge".to_string(),
                    stock: 5,
                },
                Variant {
                    id: "v_n_2".to_string(),
                    size: "43".to_string(),
                    color: "Rouge".to_string(),
                    stock: 3,
                },
            ],
            stock: 8,
            image: None,
        }
    }

    #[test]
    fn test_variant_deduction_updates_cached_total() {
        let mut product = sneaker();
        product.deduct_stock(Some("v_n_1"), 2).unwrap();

        assert_eq!(product.variant("v_n_1").unwrap().stock, 3);
        assert_eq!(product.stock, 6);
    }

    #[test]
    fn test_deduction_beyond_stock_leaves_product_untouched() {
        let mut product = sneaker();
        let before = product.clone();

        let err = product.deduct_stock(Some("v_n_2"), 4).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(product, before);
    }

    #[test]
    fn test_unknown_variant() {
        let product = sneaker();
        let err = product.check_stock(Some("nope"), 1).unwrap_err();
        assert!(matches!(err, CoreError::VariantNotFound { .. }));
    }

    #[test]
    fn test_product_with_variants_needs_a_variant_id() {
        let mut product = sneaker();
        let before = product.clone();

        let err = product.deduct_stock(None, 3).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
        assert!(product.check_stock(None, 1).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn test_plain_product_stock() {
        let mut product = sneaker();
        product.variants.clear();
        product.stock = 2;

        assert!(product.check_stock(None, 2).is_ok());
        assert!(product.check_stock(None, 3).is_err());
        product.deduct_stock(None, 2).unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_low_stock() {
        let product = sneaker();
        assert!(product.is_low_stock(5)); // v_n_2 has 3
        assert!(!product.is_low_stock(3));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Carte".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("mobile money".parse::<PaymentMethod>().unwrap(), PaymentMethod::Mobile);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_client_json_keys() {
        let json = r#"{
            "id": "CLIENT_001",
            "firstName": "Marie",
            "lastName": "Dubois",
            "phone": "+33612345678",
            "type": "VIP",
            "totalSpent": 1250000,
            "lastVisit": "2024-01-15T14:30:00Z"
        }"#;
        let client: Client = serde_json::from_str(json).unwrap();

        assert_eq!(client.client_type, ClientType::Vip);
        assert_eq!(client.total_spent, Money::new(1250000));
        assert_eq!(client.purchase_count, 0);
        assert_eq!(client.full_name(), "Marie Dubois");
    }

    #[test]
    fn test_sale_uses_seller_keys() {
        let sale = Sale {
            id: "SALE_1".to_string(),
            date: Utc::now(),
            items: vec![],
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
            payment_method: PaymentMethod::Mobile,
            seller_id: "v_001".to_string(),
            seller_name: "Sarah Jenkins".to_string(),
            client_id: None,
            client_name: "Walk-in customer".to_string(),
            status: SaleStatus::Completed,
        };
        let value = serde_json::to_value(&sale).unwrap();

        assert_eq!(value["vendeuseId"], "v_001");
        assert_eq!(value["paymentMethod"], "mobile");
        assert_eq!(value["clientId"], serde_json::Value::Null);
        assert_eq!(value["status"], "completed");
    }
}
