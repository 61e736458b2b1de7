//! # Money Module
//!
//! Integer amounts and tax rates.
//!
//! Every amount in RetailOS is an `i64` in the smallest unit of the store
//! currency. The default currency (XAF, franc CFA) has no minor unit, so a
//! pair of sneakers at `120000` is exactly 120 000 FCFA. Nothing in the
//! ledger ever touches a float.
//!
//! ## Usage
//! ```rust
//! use retail_core::money::{Money, TaxRate};
//!
//! let price = Money::new(1000);
//! let subtotal = price * 2 + Money::new(500);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
//!
//! assert_eq!(subtotal.amount(), 2500);
//! assert_eq!(tax.amount(), 200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: register differences can be negative (cash short)
/// - **Newtype**: serializes as a bare JSON number, same as the stored records
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► CartLine.unit_price ──► SaleItem.total               │
/// │                                                                         │
/// │  Cart subtotal ──► tax ──► Sale.total ──► CashRegister.sales_total      │
/// │                                     └───► Client.total_spent            │
/// │                                                                         │
/// │  CashRegister.initial + sales − withdrawals = expected vs counted       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an amount in the smallest currency unit.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates tax on this amount.
    ///
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// An i128 intermediate keeps large baskets from overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use retail_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::new(2500);
    /// assert_eq!(subtotal.calculate_tax(TaxRate::from_bps(800)).amount(), 200);
    ///
    /// // 1 × 8% = 0.08 → rounds to 0
    /// assert_eq!(Money::new(1).calculate_tax(TaxRate::from_bps(800)).amount(), 0);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(tax as i64)
    }

    /// Multiplies money by a quantity. `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(amount) => Some(Money(amount)),
            None => None,
        }
    }
}

/// Plain amount, no currency. Use `Settings::format_currency` for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%).
///
/// 800 bps = 8%. The rate is always passed in by the caller; the ledger has
/// no built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `8.0` or `19.25`.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::new(1000);
        let b = Money::new(500);

        assert_eq!((a + b).amount(), 1500);
        assert_eq!((a - b).amount(), 500);
        assert_eq!((a * 3).amount(), 3000);
        assert_eq!((-a).amount(), -1000);
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Money::new(15000).checked_multiply_quantity(2), Some(Money::new(30000)));
        assert_eq!(Money::new(9_000_000_000_000_000_000).checked_multiply_quantity(2), None);
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(1).checked_add(Money::new(2)), Some(Money::new(3)));
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::new(2000), Money::new(500), Money::new(200)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.amount(), 2700);
    }

    #[test]
    fn test_tax_at_eight_percent() {
        let subtotal = Money::new(2500);
        let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
        assert_eq!(tax.amount(), 200);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 1250 × 0.04% = 0.5 → 1
        let tax = Money::new(1250).calculate_tax(TaxRate::from_bps(4));
        assert_eq!(tax.amount(), 1);
    }

    #[test]
    fn test_zero_rate() {
        let tax = Money::new(120000).calculate_tax(TaxRate::zero());
        assert!(tax.is_zero());
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.0).bps(), 800);
        assert_eq!(TaxRate::from_percentage(19.25).bps(), 1925);
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::new(120000)).unwrap();
        assert_eq!(json, "120000");
    }
}
