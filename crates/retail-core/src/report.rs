//! # Reporting Aggregates
//!
//! KPIs shown on the admin, manager and seller dashboards, computed from
//! the sale ledger and the catalog. Rendering (tables, CSV, charts) is the
//! dashboards' job; this module only produces numbers.
//!
//! ## Periods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Period   Sale is included when (all UTC)                               │
//! │  ──────   ───────────────────────────────────                           │
//! │  day      same calendar day as `now`                                    │
//! │  week     on or after Monday 00:00 of the week containing `now`         │
//! │  month    same year and month as `now`                                  │
//! │  year     same year as `now`                                            │
//! │  all      always                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PaymentMethod, Product, Sale};

// =============================================================================
// Period
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::All => "all",
        }
    }

    /// True when `date` falls in this period relative to `now`.
    pub fn contains(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Period::Day => date.date_naive() == now.date_naive(),
            Period::Week => date.date_naive() >= week_start(now),
            Period::Month => date.year() == now.year() && date.month() == now.month(),
            Period::Year => date.year() == now.year(),
            Period::All => true,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("unknown period '{other}'"),
            }),
        }
    }
}

fn week_start(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today - Duration::days(today.weekday().num_days_from_monday() as i64)
}

/// Sales that fall in `period`, in ledger order.
pub fn filter_by_period(sales: &[Sale], period: Period, now: DateTime<Utc>) -> Vec<&Sale> {
    sales
        .iter()
        .filter(|s| period.contains(s.date, now))
        .collect()
}

// =============================================================================
// Sales Report
// =============================================================================

/// Revenue per payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentBreakdown {
    pub cash: Money,
    pub card: Money,
    pub mobile: Money,
}

impl PaymentBreakdown {
    fn add(&mut self, method: PaymentMethod, amount: Money) {
        match method {
            PaymentMethod::Cash => self.cash += amount,
            PaymentMethod::Card => self.card += amount,
            PaymentMethod::Mobile => self.mobile += amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductStat {
    pub product_id: String,
    /// Name of the first line seen for this product.
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientStat {
    pub client_id: String,
    pub name: String,
    pub total: Money,
    pub count: i64,
}

/// KPIs for the admin reports page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReport {
    pub period: Period,
    pub revenue: Money,
    pub count: usize,
    /// `revenue / count`, truncated. Zero without sales.
    pub average_basket: Money,
    pub by_payment: PaymentBreakdown,
    /// Most units sold. Ties go to the product sold first.
    pub best_product: Option<ProductStat>,
    /// Highest spend among sales tied to a client id.
    pub best_client: Option<ClientStat>,
}

impl SalesReport {
    pub fn build(sales: &[Sale], period: Period, now: DateTime<Utc>) -> Self {
        let sales = filter_by_period(sales, period, now);

        let revenue: Money = sales.iter().map(|s| s.total).sum();
        let count = sales.len();

        let mut by_payment = PaymentBreakdown::default();
        let mut clients: Vec<ClientStat> = Vec::new();
        for sale in &sales {
            by_payment.add(sale.payment_method, sale.total);

            if let Some(client_id) = &sale.client_id {
                match clients.iter_mut().find(|c| &c.client_id == client_id) {
                    Some(stat) => {
                        stat.total += sale.total;
                        stat.count += 1;
                    }
                    None => clients.push(ClientStat {
                        client_id: client_id.clone(),
                        name: sale.client_name.clone(),
                        total: sale.total,
                        count: 1,
                    }),
                }
            }
        }

        let best_product = product_stats(sales.iter().copied())
            .into_iter()
            .fold(None, |best: Option<ProductStat>, stat| match best {
                Some(b) if b.quantity >= stat.quantity => Some(b),
                _ => Some(stat),
            });
        let best_client = clients
            .into_iter()
            .fold(None, |best: Option<ClientStat>, stat| match best {
                Some(b) if b.total >= stat.total => Some(b),
                _ => Some(stat),
            });

        SalesReport {
            period,
            revenue,
            count,
            average_basket: average(revenue, count),
            by_payment,
            best_product,
            best_client,
        }
    }
}

fn average(total: Money, count: usize) -> Money {
    if count == 0 {
        Money::zero()
    } else {
        Money::new(total.amount() / count as i64)
    }
}

/// Per-product quantity and revenue, in first-sold order.
fn product_stats<'a>(sales: impl Iterator<Item = &'a Sale>) -> Vec<ProductStat> {
    let mut stats: Vec<ProductStat> = Vec::new();
    for item in sales.flat_map(|s| s.items.iter()) {
        match stats.iter_mut().find(|p| p.product_id == item.id) {
            Some(stat) => {
                stat.quantity += item.quantity;
                stat.revenue += item.total;
            }
            None => stats.push(ProductStat {
                product_id: item.id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                revenue: item.total,
            }),
        }
    }
    stats
}

/// Best sellers by units, at most `limit` entries.
pub fn top_products(sales: &[Sale], limit: usize) -> Vec<ProductStat> {
    let mut stats = product_stats(sales.iter());
    // stable: equal quantities keep first-sold order
    stats.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    stats.truncate(limit);
    stats
}

/// One point of the revenue chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total: Money,
}

/// Revenue for each of the last `days` days, oldest first, today included.
pub fn daily_revenue(sales: &[Sale], days: u32, now: DateTime<Utc>) -> Vec<DailyRevenue> {
    let today = now.date_naive();
    (0..days as i64)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let total = sales
                .iter()
                .filter(|s| s.date.date_naive() == date)
                .map(|s| s.total)
                .sum();
            DailyRevenue { date, total }
        })
        .collect()
}

// =============================================================================
// Inventory Summary
// =============================================================================

/// Stock KPIs for the manager dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySummary {
    pub product_count: usize,
    pub total_units: i64,
    /// Products with any variant (or, without variants, the product) below
    /// `LOW_STOCK_THRESHOLD` units.
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

impl InventorySummary {
    pub fn from_products(products: &[Product]) -> Self {
        let units = |p: &Product| -> i64 {
            if p.has_variants() {
                p.variants.iter().map(|v| v.stock).sum()
            } else {
                p.stock
            }
        };

        InventorySummary {
            product_count: products.len(),
            total_units: products.iter().map(units).sum(),
            low_stock_count: products
                .iter()
                .filter(|p| p.is_low_stock(crate::LOW_STOCK_THRESHOLD))
                .count(),
            out_of_stock_count: products.iter().filter(|p| units(p) <= 0).count(),
        }
    }
}

// =============================================================================
// Seller Summary
// =============================================================================

/// The seller dashboard's KPI cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SellerSummary {
    pub seller_id: String,
    pub today_revenue: Money,
    pub today_count: usize,
    pub lifetime_revenue: Money,
    pub lifetime_count: usize,
    /// Over all of the seller's sales.
    pub average_basket: Money,
}

impl SellerSummary {
    pub fn build(sales: &[Sale], seller_id: &str, now: DateTime<Utc>) -> Self {
        let mine: Vec<&Sale> = sales.iter().filter(|s| s.seller_id == seller_id).collect();
        let today: Vec<&&Sale> = mine
            .iter()
            .filter(|s| Period::Day.contains(s.date, now))
            .collect();

        let lifetime_revenue: Money = mine.iter().map(|s| s.total).sum();

        SellerSummary {
            seller_id: seller_id.to_string(),
            today_revenue: today.iter().map(|s| s.total).sum(),
            today_count: today.len(),
            lifetime_revenue,
            lifetime_count: mine.len(),
            average_basket: average(lifetime_revenue, mine.len()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SaleItem, SaleStatus, Variant};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn sale(id: &str, date: DateTime<Utc>, total: i64, method: PaymentMethod) -> Sale {
        Sale {
            id: id.to_string(),
            date,
            items: vec![SaleItem {
                id: "PROD_003".to_string(),
                variant_id: None,
                name: "T-Shirt Cotton Basic".to_string(),
                quantity: 1,
                price: Money::new(total),
                total: Money::new(total),
            }],
            subtotal: Money::new(total),
            tax: Money::zero(),
            total: Money::new(total),
            payment_method: method,
            seller_id: "v_001".to_string(),
            seller_name: "Sarah Jenkins".to_string(),
            client_id: None,
            client_name: "Client invité".to_string(),
            status: SaleStatus::Completed,
        }
    }

    #[test]
    fn test_week_starts_monday() {
        // 2024-03-14 is a Thursday
        let now = at(2024, 3, 14, 12);
        assert!(Period::Week.contains(at(2024, 3, 11, 0), now));
        assert!(!Period::Week.contains(at(2024, 3, 10, 23), now));

        // Sunday belongs to the week that started the previous Monday
        let sunday = at(2024, 3, 17, 9);
        assert!(Period::Week.contains(at(2024, 3, 11, 8), sunday));
    }

    #[test]
    fn test_periods() {
        let now = at(2024, 3, 14, 12);
        assert!(Period::Day.contains(at(2024, 3, 14, 0), now));
        assert!(!Period::Day.contains(at(2024, 3, 13, 23), now));
        assert!(Period::Month.contains(at(2024, 3, 1, 0), now));
        assert!(!Period::Month.contains(at(2023, 3, 14, 0), now));
        assert!(Period::Year.contains(at(2024, 1, 1, 0), now));
        assert!(Period::All.contains(at(1999, 1, 1, 0), now));
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        assert!("quarter".parse::<Period>().is_err());
    }

    #[test]
    fn test_sales_report() {
        let now = at(2024, 3, 14, 12);
        let mut with_client = sale("S3", at(2024, 3, 2, 10), 30000, PaymentMethod::Mobile);
        with_client.client_id = Some("CLIENT_001".to_string());
        with_client.client_name = "Marie Dubois".to_string();
        with_client.items[0].id = "PROD_001".to_string();
        with_client.items[0].quantity = 3;

        let sales = vec![
            sale("S1", at(2024, 3, 14, 9), 15000, PaymentMethod::Cash),
            sale("S2", at(2024, 3, 13, 9), 15000, PaymentMethod::Card),
            with_client,
            sale("S4", at(2024, 2, 28, 9), 99999, PaymentMethod::Cash),
        ];

        let report = SalesReport::build(&sales, Period::Month, now);
        assert_eq!(report.count, 3);
        assert_eq!(report.revenue, Money::new(60000));
        assert_eq!(report.average_basket, Money::new(20000));
        assert_eq!(report.by_payment.cash, Money::new(15000));
        assert_eq!(report.by_payment.card, Money::new(15000));
        assert_eq!(report.by_payment.mobile, Money::new(30000));

        let best = report.best_product.unwrap();
        assert_eq!(best.product_id, "PROD_001");
        assert_eq!(best.quantity, 3);
        assert_eq!(report.best_client.unwrap().name, "Marie Dubois");
    }

    #[test]
    fn test_empty_report() {
        let report = SalesReport::build(&[], Period::Day, at(2024, 3, 14, 12));
        assert_eq!(report.count, 0);
        assert!(report.average_basket.is_zero());
        assert!(report.best_product.is_none());
        assert!(report.best_client.is_none());
    }

    #[test]
    fn test_top_products_and_daily_revenue() {
        let now = at(2024, 3, 14, 12);
        let sales = vec![
            sale("S1", at(2024, 3, 14, 9), 15000, PaymentMethod::Cash),
            sale("S2", at(2024, 3, 12, 9), 5000, PaymentMethod::Cash),
        ];

        let top = top_products(&sales, 5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].quantity, 2);

        let chart = daily_revenue(&sales, 3, now);
        let totals: Vec<i64> = chart.iter().map(|d| d.total.amount()).collect();
        assert_eq!(totals, vec![5000, 0, 15000]);
        assert_eq!(chart[2].date, now.date_naive());
    }

    #[test]
    fn test_inventory_summary() {
        let variant = |id: &str, stock| Variant {
            id: id.to_string(),
            size: "42".to_string(),
            color: "Noir".to_string(),
            stock,
        };
        let base = Product {
            id: "P".to_string(),
            name: "P".to_string(),
            sku: "P".to_string(),
            category: String::new(),
            brand: String::new(),
            price: Money::new(1000),
            active: true,
            variants: vec![],
            stock: 0,
            image: None,
        };

        let healthy = Product {
            variants: vec![variant("a", 8)],
            stock: 8,
            ..base.clone()
        };
        let low_variant = Product {
            variants: vec![variant("a", 10), variant("b", 2)],
            stock: 12,
            ..base.clone()
        };
        let empty = Product { stock: 0, ..base.clone() };

        let summary = InventorySummary::from_products(&[healthy, low_variant, empty]);
        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.total_units, 20);
        assert_eq!(summary.low_stock_count, 2);
        assert_eq!(summary.out_of_stock_count, 1);
    }

    #[test]
    fn test_seller_summary() {
        let now = at(2024, 3, 14, 12);
        let mut other = sale("S3", at(2024, 3, 14, 10), 70000, PaymentMethod::Cash);
        other.seller_id = "v_002".to_string();

        let sales = vec![
            sale("S1", at(2024, 3, 14, 9), 15000, PaymentMethod::Cash),
            sale("S2", at(2024, 3, 1, 9), 5000, PaymentMethod::Card),
            other,
        ];

        let summary = SellerSummary::build(&sales, "v_001", now);
        assert_eq!(summary.today_revenue, Money::new(15000));
        assert_eq!(summary.today_count, 1);
        assert_eq!(summary.lifetime_revenue, Money::new(20000));
        assert_eq!(summary.lifetime_count, 2);
        assert_eq!(summary.average_basket, Money::new(10000));
    }
}
