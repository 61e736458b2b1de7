//! # Store Settings
//!
//! Store-wide preferences edited on the admin dashboard and persisted under
//! the `settings` key.
//!
//! Missing fields fall back to the defaults below, so a settings record
//! written by an older dashboard still loads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::validation::{validate_email, validate_tax_rate_bps, ValidationResult};

/// Most minor-unit digits any ISO 4217 currency uses.
pub const MAX_CURRENCY_DECIMALS: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Settings {
    /// Displayed in the header and on receipts.
    pub store_name: String,
    /// Contact email.
    pub email: String,
    /// ISO 4217 code.
    pub currency: String,
    /// Minor-unit digits of `currency` (0 for XAF).
    pub currency_decimals: u8,
    /// Tax applied to new sales, in basis points.
    pub tax_rate_bps: u32,
    pub dark_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_name: "RetailOS Store".to_string(),
            email: "contact@retailos.com".to_string(),
            currency: "XAF".to_string(),
            currency_decimals: 0,
            tax_rate_bps: 0,
            dark_mode: false,
        }
    }
}

impl Settings {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if self.store_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "storeName".to_string(),
            });
        }
        validate_email(&self.email)?;
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a 3-letter ISO 4217 code".to_string(),
            });
        }
        if self.currency_decimals > MAX_CURRENCY_DECIMALS {
            return Err(ValidationError::OutOfRange {
                field: "currencyDecimals".to_string(),
                min: 0,
                max: MAX_CURRENCY_DECIMALS as i64,
            });
        }
        validate_tax_rate_bps(self.tax_rate_bps)
    }

    /// Display symbol for the configured currency.
    pub fn currency_symbol(&self) -> &str {
        match self.currency.as_str() {
            "XAF" | "XOF" => "FCFA",
            "EUR" => "€",
            "USD" => "$",
            "GBP" => "£",
            other => other,
        }
    }

    /// Formats an amount French-style: space thousands separator, comma
    /// decimals, symbol last. Decimals beyond `MAX_CURRENCY_DECIMALS` are
    /// clamped, so a bad stored record still formats.
    ///
    /// ## Example
    /// ```rust
    /// use retail_core::money::Money;
    /// use retail_core::settings::Settings;
    ///
    /// let settings = Settings::default();
    /// assert_eq!(settings.format_currency(Money::new(120000)), "120 000 FCFA");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let decimals = self.currency_decimals.min(MAX_CURRENCY_DECIMALS);
        let cents = amount.amount();
        let divisor = 10_i64.pow(u32::from(decimals));
        let whole = (cents / divisor).unsigned_abs();
        let frac = (cents % divisor).unsigned_abs();

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }

        let sign = if cents < 0 { "-" } else { "" };
        if decimals > 0 {
            format!(
                "{sign}{grouped},{frac:0width$} {}",
                self.currency_symbol(),
                width = usize::from(decimals)
            )
        } else {
            format!("{sign}{grouped} {}", self.currency_symbol())
        }
    }
}
