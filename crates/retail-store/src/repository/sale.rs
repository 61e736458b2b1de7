//! # Sale Ledger
//!
//! Turns a draft cart into an immutable sale record, atomically with the
//! stock deduction.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(cart, context)                                             │
//! │       │                                                                 │
//! │       ├── empty cart ─────────────────────────────► EmptyCart           │
//! │       ├── quantity <= 0 or price < 0 ──────────────► Validation          │
//! │       │                                                                 │
//! │       ▼  ── store write lock held from here ──                          │
//! │  1. demand = Σ quantity per (product, variant)                          │
//! │  2. check every demand against current stock ────► Insufficient/       │
//! │       │                                             NotFound, nothing   │
//! │       │                                             written             │
//! │  3. deduct all, write `products` once                                   │
//! │  4. build Sale, append to `sales`                                       │
//! │  5. register.sales_total += total   (skipped when no till is open)      │
//! │  6. client counters                 (skipped with warn! when unknown)   │
//! │       │                                                                 │
//! │       ▼  ── lock released ──                                            │
//! │  Sale                                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are append-only. Nothing in this crate updates or removes one.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{LedgerResult, StoreResult};
use crate::ids;
use crate::kv::keys;
use crate::pool::Store;
use retail_core::cart::build_sale;
use retail_core::report::{daily_revenue, top_products, DailyRevenue, Period, ProductStat, SalesReport, SellerSummary};
use retail_core::validation::{validate_price, validate_units};
use retail_core::{Cart, CoreError, Sale, SaleContext};

#[derive(Debug, Clone)]
pub struct SaleLedger {
    store: Store,
}

impl SaleLedger {
    pub fn new(store: Store) -> Self {
        SaleLedger { store }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Commits a cart as a completed sale.
    ///
    /// Stock for every line is checked before anything is written; a single
    /// shortfall rejects the whole cart and leaves every product untouched.
    /// Totals come from the same function the cart displays with.
    ///
    /// ## Errors
    /// - `EmptyCart`
    /// - `Validation` for a non-positive quantity, a negative price, a missing
    ///   variant on a product with variants, or totals that overflow
    /// - `ProductNotFound` / `VariantNotFound` for a line the catalog no longer has
    /// - `InsufficientStock` when the summed quantity exceeds current stock
    pub async fn commit_sale(&self, cart: &Cart, context: &SaleContext) -> LedgerResult<Sale> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        for line in cart.lines() {
            validate_units(line.quantity)?;
            validate_price(line.unit_price.amount())?;
        }

        let demand = cart.demand();

        let _guard = self.store.lock_writes().await;

        let catalog = self.store.catalog();
        let mut products = catalog.list_products().await?;

        for need in &demand {
            let product = products
                .iter()
                .find(|p| p.id == need.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(need.product_id.clone()))?;
            product.check_stock(need.variant_id.as_deref(), need.quantity)?;
        }

        let date = Utc::now();
        let sale = build_sale(cart, context, ids::sale_id(), date)?;

        for need in &demand {
            if let Some(product) = products.iter_mut().find(|p| p.id == need.product_id) {
                product.deduct_stock(need.variant_id.as_deref(), need.quantity)?;
            }
        }
        catalog.write_all(&products).await?;

        let mut sales = self.get_all_sales().await?;
        sales.push(sale.clone());
        self.store.kv().set(keys::SALES, &sales).await?;

        let in_till = self.store.register().record_sale_locked(sale.total).await?;

        if let Some(client_id) = &sale.client_id {
            self.store
                .clients()
                .record_purchase_locked(client_id, sale.total, date)
                .await?;
        }

        info!(
            id = %sale.id,
            seller = %sale.seller_id,
            items = sale.items.len(),
            total = sale.total.amount(),
            method = %sale.payment_method,
            in_till,
            "Sale committed"
        );
        Ok(sale)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every sale, oldest first.
    pub async fn get_all_sales(&self) -> StoreResult<Vec<Sale>> {
        self.store.kv().get_or_default(keys::SALES).await
    }

    pub async fn get_sales_for_seller(&self, seller_id: &str) -> StoreResult<Vec<Sale>> {
        debug!(seller_id, "Loading seller sales");
        let mut sales = self.get_all_sales().await?;
        sales.retain(|s| s.seller_id == seller_id);
        Ok(sales)
    }

    pub async fn get_sales_for_client(&self, client_id: &str) -> StoreResult<Vec<Sale>> {
        let mut sales = self.get_all_sales().await?;
        sales.retain(|s| s.client_id.as_deref() == Some(client_id));
        Ok(sales)
    }

    pub async fn get_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        let sales = self.get_all_sales().await?;
        Ok(sales.into_iter().find(|s| s.id == id))
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub async fn sales_report(&self, period: Period) -> StoreResult<SalesReport> {
        let sales = self.get_all_sales().await?;
        Ok(SalesReport::build(&sales, period, Utc::now()))
    }

    pub async fn seller_summary(&self, seller_id: &str) -> StoreResult<SellerSummary> {
        let sales = self.get_all_sales().await?;
        Ok(SellerSummary::build(&sales, seller_id, Utc::now()))
    }

    /// Revenue per day for the last `days` days, oldest first.
    pub async fn daily_revenue(&self, days: u32) -> StoreResult<Vec<DailyRevenue>> {
        let sales = self.get_all_sales().await?;
        Ok(daily_revenue(&sales, days, Utc::now()))
    }

    pub async fn top_products(&self, limit: usize) -> StoreResult<Vec<ProductStat>> {
        let sales = self.get_all_sales().await?;
        Ok(top_products(&sales, limit))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
