//! # Cart Module
//!
//! The draft of a sale, assembled on the seller dashboard.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Seller Action            Cart Method             Effect                │
//! │  ─────────────            ───────────             ──────                │
//! │                                                                         │
//! │  Click product ──────────► add(product, None, 1) ► line qty + 1        │
//! │  Pick size/color ────────► add(product, Some(v)) ► variant line         │
//! │  +/- on a line ──────────► update_quantity() ────► qty = n (0 removes)  │
//! │  Trash icon ─────────────► remove() ─────────────► line dropped         │
//! │  "Vider le panier" ──────► clear() ──────────────► empty                │
//! │                                                                         │
//! │  Pay ────────────────────► Sale Ledger commit (retail-store)           │
//! │                                                                         │
//! │  NOTE: Nothing here is persisted. Dropping a cart has no effect.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! A line copies the product price when it is first added. The committed
//! sale uses that frozen price, so the total the seller showed the customer
//! is the total that gets recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::{PaymentMethod, Product, Sale, SaleItem, SaleStatus};
use crate::validation::{validate_cart_size, validate_quantity, validate_tax_rate_bps};
use crate::GUEST_CLIENT_NAME;

// =============================================================================
// Cart Line
// =============================================================================

/// One product (or product variant) in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Display name, with the variant label appended: `Nike Air Max 270 (42 - Rouge)`.
    pub name: String,
    /// Frozen at add time.
    pub unit_price: Money,
    pub quantity: i64,
    /// Stock available when the line was added. Caps `quantity` in the draft.
    pub max_stock: i64,
}

impl CartLine {
    /// Builds a single-unit line from a product, checking the variant exists.
    pub fn from_product(product: &Product, variant_id: Option<&str>) -> CoreResult<Self> {
        let (name, max_stock) = match variant_id {
            Some(vid) => {
                let variant = product
                    .variant(vid)
                    .ok_or_else(|| CoreError::VariantNotFound {
                        product_id: product.id.clone(),
                        variant_id: vid.to_string(),
                    })?;
                (
                    format!("{} ({} - {})", product.name, variant.size, variant.color),
                    variant.stock,
                )
            }
            None => (product.name.clone(), product.available_stock(None)?),
        };

        Ok(CartLine {
            product_id: product.id.clone(),
            variant_id: variant_id.map(str::to_string),
            name,
            unit_price: product.price,
            quantity: 0,
            max_stock,
        })
    }

    /// `unit_price × quantity`. Fails instead of wrapping on overflow.
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(|| amount_overflow("lineTotal"))
    }

    fn matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }

    fn over_stock(&self, requested: i64) -> CoreError {
        CoreError::InsufficientStock {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
            available: self.max_stock,
            requested,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The draft sale.
///
/// ## Invariants
/// - Lines are unique by `(product_id, variant_id)`; adding again increases quantity
/// - `0 < quantity ≤ max_stock` for every line built through the methods
/// - At most `MAX_CART_ITEMS` lines
///
/// A cart received from outside (deserialized) may break these; the Sale
/// Ledger re-checks stock against the catalog before committing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds `quantity` units of a product (or one of its variants).
    ///
    /// Products with variants must be added through a variant.
    pub fn add(&mut self, product: &Product, variant_id: Option<&str>, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if variant_id.is_none() && product.has_variants() {
            return Err(ValidationError::Required {
                field: "variantId".to_string(),
            }
            .into());
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(&product.id, variant_id))
        {
            let new_qty = line.quantity + quantity;
            if new_qty > line.max_stock {
                return Err(line.over_stock(new_qty));
            }
            validate_quantity(new_qty)?;
            line.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.lines.len())?;

        let mut line = CartLine::from_product(product, variant_id)?;
        if quantity > line.max_stock {
            return Err(line.over_stock(quantity));
        }
        line.quantity = quantity;
        self.lines.push(line);
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes it.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity == 0 {
            self.remove(product_id, variant_id);
            return Ok(());
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if quantity > line.max_stock {
            return Err(line.over_stock(quantity));
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Drops a line, returning it if it was present.
    pub fn remove(&mut self, product_id: &str, variant_id: Option<&str>) -> Option<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.matches(product_id, variant_id))?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().fold(0, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Totals at the given tax rate. Same function the ledger commits with.
    pub fn totals(&self, tax_rate: TaxRate) -> CoreResult<CartTotals> {
        compute_totals(&self.lines, tax_rate)
    }

    /// Units requested per `(product_id, variant_id)`, summed across lines,
    /// in first-appearance order.
    pub fn demand(&self) -> Vec<StockDemand> {
        let mut demand: Vec<StockDemand> = Vec::new();
        for line in &self.lines {
            match demand
                .iter_mut()
                .find(|d| d.product_id == line.product_id && d.variant_id == line.variant_id)
            {
                Some(d) => d.quantity = d.quantity.saturating_add(line.quantity),
                None => demand.push(StockDemand {
                    product_id: line.product_id.clone(),
                    variant_id: line.variant_id.clone(),
                    quantity: line.quantity,
                }),
            }
        }
        demand
    }
}

/// Aggregated units needed from one stock bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDemand {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals for display and commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// `subtotal = Σ price × qty`, `tax = subtotal × rate` (half up), `total = subtotal + tax`.
///
/// Tax is computed once on the subtotal, not per line. An amount that does
/// not fit in `i64` is an `OutOfRange` validation error, never a wrap.
///
/// ## Example
/// ```rust
/// use retail_core::cart::{compute_totals, CartLine};
/// use retail_core::money::{Money, TaxRate};
///
/// let line = |price, quantity| CartLine {
///     product_id: "P".into(),
///     variant_id: None,
///     name: "P".into(),
///     unit_price: Money::new(price),
///     quantity,
///     max_stock: 10,
/// };
/// let totals = compute_totals(&[line(1000, 2), line(500, 1)], TaxRate::from_bps(800)).unwrap();
///
/// assert_eq!(totals.subtotal.amount(), 2500);
/// assert_eq!(totals.tax.amount(), 200);
/// assert_eq!(totals.total.amount(), 2700);
/// ```
pub fn compute_totals(lines: &[CartLine], tax_rate: TaxRate) -> CoreResult<CartTotals> {
    // Keeps tax <= subtotal, so the i128 result always fits back in i64.
    validate_tax_rate_bps(tax_rate.bps())?;

    let mut subtotal = Money::zero();
    for line in lines {
        subtotal = subtotal
            .checked_add(line.line_total()?)
            .ok_or_else(|| amount_overflow("subtotal"))?;
    }
    let tax = subtotal.calculate_tax(tax_rate);
    let total = subtotal
        .checked_add(tax)
        .ok_or_else(|| amount_overflow("total"))?;

    Ok(CartTotals {
        item_count: lines.len(),
        total_quantity: lines.iter().fold(0, |acc, l| acc.saturating_add(l.quantity)),
        subtotal,
        tax,
        total,
    })
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Sale Context
// =============================================================================

/// Who sells, to whom, how it is paid, and at what tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleContext {
    pub seller_id: String,
    pub seller_name: String,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Shown on the receipt. Defaults to the guest label when absent.
    #[serde(default)]
    pub client_name: Option<String>,
    pub payment_method: PaymentMethod,
    pub tax_rate: TaxRate,
}

impl SaleContext {
    /// Walk-in customer, no tax.
    pub fn new(seller_id: impl Into<String>, seller_name: impl Into<String>, payment_method: PaymentMethod) -> Self {
        SaleContext {
            seller_id: seller_id.into(),
            seller_name: seller_name.into(),
            client_id: None,
            client_name: None,
            payment_method,
            tax_rate: TaxRate::zero(),
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>, client_name: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_name = Some(client_name.into());
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }
}

/// Builds the immutable sale record for a cart.
///
/// Pure: stock is neither checked nor touched here.
pub fn build_sale(cart: &Cart, context: &SaleContext, id: String, date: DateTime<Utc>) -> CoreResult<Sale> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = cart.totals(context.tax_rate)?;
    let items = cart
        .lines()
        .iter()
        .map(|line| -> CoreResult<SaleItem> {
            Ok(SaleItem {
                id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                price: line.unit_price,
                total: line.line_total()?,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(Sale {
        id,
        date,
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        payment_method: context.payment_method,
        seller_id: context.seller_id.clone(),
        seller_name: context.seller_name.clone(),
        client_id: context.client_id.clone(),
        client_name: context
            .client_name
            .clone()
            .unwrap_or_else(|| GUEST_CLIENT_NAME.to_string()),
        status: SaleStatus::Completed,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            category: "Vêtements".to_string(),
            brand: "Uniqlo".to_string(),
            price: Money::new(price),
            active: true,
            variants: vec![],
            stock,
            image: None,
        }
    }

    fn with_variant(mut p: Product, vid: &str, stock: i64) -> Product {
        p.variants.push(Variant {
            id: vid.to_string(),
            size: "M".to_string(),
            color: "Blanc".to_string(),
            stock,
        });
        p.recompute_stock();
        p
    }

    #[test]
    fn test_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 10);

        cart.add(&p, None, 2).unwrap();
        cart.add(&p, None, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_caps_at_stock() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 2);

        cart.add(&p, None, 2).unwrap();
        let err = cart.add(&p, None, 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 2, requested: 3, .. }));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_variant_lines_are_separate() {
        let p = with_variant(with_variant(product("3", 15000, 0), "v_t_1", 20), "v_t_2", 1);
        let mut cart = Cart::new();

        cart.add(&p, Some("v_t_1"), 2).unwrap();
        cart.add(&p, Some("v_t_2"), 1).unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.lines()[0].name, "Product 3 (M - Blanc)");
        assert!(cart.add(&p, Some("v_t_2"), 1).is_err());
    }

    #[test]
    fn test_product_with_variants_needs_a_variant() {
        let p = with_variant(product("3", 15000, 0), "v_t_1", 20);
        let mut cart = Cart::new();

        let err = cart.add(&p, None, 1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Required { .. })));
        assert!(matches!(
            cart.add(&p, Some("nope"), 1).unwrap_err(),
            CoreError::VariantNotFound { .. }
        ));
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        let p = product("1", 1000, 5);
        cart.add(&p, None, 1).unwrap();

        cart.update_quantity("1", None, 4).unwrap();
        assert_eq!(cart.total_quantity(), 4);

        assert!(cart.update_quantity("1", None, 6).is_err());
        assert!(cart.update_quantity("1", None, -1).is_err());

        cart.update_quantity("1", None, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_is_frozen() {
        let mut cart = Cart::new();
        let mut p = product("1", 1000, 5);
        cart.add(&p, None, 1).unwrap();

        p.price = Money::new(9999);
        cart.add(&p, None, 1).unwrap();

        assert_eq!(cart.lines()[0].unit_price, Money::new(1000));
    }

    #[test]
    fn test_totals_with_eight_percent_tax() {
        let mut cart = Cart::new();
        cart.add(&product("a", 1000, 10), None, 2).unwrap();
        cart.add(&product("b", 500, 10), None, 1).unwrap();

        let totals = cart.totals(TaxRate::from_bps(800)).unwrap();
        assert_eq!(totals.subtotal, Money::new(2500));
        assert_eq!(totals.tax, Money::new(200));
        assert_eq!(totals.total, Money::new(2700));
        assert_eq!(totals.total_quantity, 3);
    }

    #[test]
    fn test_demand_aggregates_duplicate_lines() {
        let json = r#"{"lines": [
            {"productId": "1", "variantId": null, "name": "A", "unitPrice": 100, "quantity": 2, "maxStock": 5},
            {"productId": "1", "variantId": null, "name": "A", "unitPrice": 100, "quantity": 3, "maxStock": 5},
            {"productId": "1", "variantId": "v", "name": "A", "unitPrice": 100, "quantity": 1, "maxStock": 5}
        ]}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        let demand = cart.demand();

        assert_eq!(demand.len(), 2);
        assert_eq!(demand[0].quantity, 5);
        assert_eq!(demand[1].variant_id.as_deref(), Some("v"));
    }

    #[test]
    fn test_build_sale() {
        let mut cart = Cart::new();
        cart.add(&product("a", 1000, 10), None, 2).unwrap();
        let context = SaleContext::new("v_001", "Sarah Jenkins", PaymentMethod::Cash)
            .with_tax_rate(TaxRate::from_bps(800));

        let sale = build_sale(&cart, &context, "SALE_1".to_string(), Utc::now()).unwrap();

        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].total, Money::new(2000));
        assert_eq!(sale.tax, Money::new(160));
        assert_eq!(sale.total, Money::new(2160));
        assert_eq!(sale.client_name, GUEST_CLIENT_NAME);
        assert_eq!(sale.client_id, None);
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let cart: Cart = serde_json::from_value(serde_json::json!({"lines": [
            {"productId": "1", "variantId": null, "name": "A", "unitPrice": 9_000_000_000_000_000_000_i64, "quantity": 2, "maxStock": 5}
        ]}))
        .unwrap();

        let err = cart.totals(TaxRate::zero()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let context = SaleContext::new("v_001", "Sarah Jenkins", PaymentMethod::Cash);
        assert!(build_sale(&cart, &context, "SALE_1".to_string(), Utc::now()).is_err());
    }

    #[test]
    fn test_totals_overflow_across_lines() {
        let mut cart = Cart::new();
        cart.add(&product("a", i64::MAX / 2 + 1, 10), None, 1).unwrap();
        cart.add(&product("b", i64::MAX / 2 + 1, 10), None, 1).unwrap();

        assert!(cart.totals(TaxRate::zero()).is_err());
    }

    #[test]
    fn test_build_sale_rejects_empty_cart() {
        let context = SaleContext::new("v_001", "Sarah Jenkins", PaymentMethod::Card);
        let err = build_sale(&Cart::new(), &context, "SALE_1".to_string(), Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::EmptyCart);
    }
}
