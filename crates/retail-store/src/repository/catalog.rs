//! # Product Catalog
//!
//! Reads and writes the `products` key, including per-variant stock.
//!
//! ## Stock Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Who Touches Stock                                 │
//! │                                                                         │
//! │  Admin "Produits" page ──► save_product()   full record, any stock     │
//! │                                                                         │
//! │  Sale Ledger commit ─────► check_and_reserve() per line                │
//! │                            commit_deduction()  per line                │
//! │                            (both under the store write lock)           │
//! │                                                                         │
//! │  Nothing else decrements stock.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole product list lives under one key, so every write replaces the
//! list. `stock` is recomputed from the variants before each write.

use tracing::{debug, info};

use crate::error::{LedgerResult, StoreResult};
use crate::kv::keys;
use crate::pool::Store;
use retail_core::report::InventorySummary;
use retail_core::validation::{
    validate_price, validate_product_name, validate_search_query, validate_sku, validate_stock,
    validate_units,
};
use retail_core::{CoreError, Product, ValidationError};

/// Access to the `products` key.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = store.catalog();
///
/// let nike = catalog.get_product("PROD_001").await?;
/// catalog.check_and_reserve("PROD_001", Some("v_n_1"), 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    store: Store,
}

impl CatalogRepository {
    pub fn new(store: Store) -> Self {
        CatalogRepository { store }
    }

    /// Every product, in stored order.
    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.store.kv().get_or_default(keys::PRODUCTS).await
    }

    /// Products shown on the POS grid.
    pub async fn list_active(&self) -> StoreResult<Vec<Product>> {
        let mut products = self.list_products().await?;
        products.retain(|p| p.active);
        Ok(products)
    }

    pub async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let products = self.list_products().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    /// The product, or `ProductNotFound`.
    pub async fn get_product(&self, id: &str) -> LedgerResult<Product> {
        self.find_product(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Checks that `quantity` units are available right now.
    ///
    /// Variant-level when `variant_id` is given, top-level `stock` otherwise.
    /// A product with variants requires a `variant_id`. Nothing is held: only a check under the write lock followed by
    /// `commit_deduction` under the same lock is race-free.
    pub async fn check_and_reserve(
        &self,
        id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> LedgerResult<()> {
        validate_units(quantity)?;
        let product = self.get_product(id).await?;
        product.check_stock(variant_id, quantity)?;
        Ok(())
    }

    /// Decrements stock and persists the product.
    ///
    /// A variant deduction also recomputes the cached total. Fails without
    /// writing when the stock does not cover `quantity`.
    pub async fn commit_deduction(
        &self,
        id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> LedgerResult<Product> {
        validate_units(quantity)?;
        let _guard = self.store.lock_writes().await;

        let mut products = self.list_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        product.deduct_stock(variant_id, quantity)?;
        let updated = product.clone();

        self.write_all(&products).await?;
        debug!(id, ?variant_id, quantity, stock = updated.stock, "Stock deducted");
        Ok(updated)
    }

    /// Inserts or replaces a product by id.
    ///
    /// ## Rules
    /// - Valid SKU and name, price ≥ 0, every stock ≥ 0
    /// - SKU unique across other products
    /// - `stock` is recomputed when the product has variants
    pub async fn save_product(&self, product: Product) -> LedgerResult<Product> {
        let mut product = product;
        validate_product(&product)?;
        product.recompute_stock();

        let _guard = self.store.lock_writes().await;
        let mut products = self.list_products().await?;

        if products
            .iter()
            .any(|p| p.id != product.id && p.sku.eq_ignore_ascii_case(&product.sku))
        {
            return Err(ValidationError::Duplicate {
                field: "sku".to_string(),
                value: product.sku.clone(),
            }
            .into());
        }

        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product.clone(),
            None => products.push(product.clone()),
        }
        self.write_all(&products).await?;

        info!(id = %product.id, sku = %product.sku, stock = product.stock, "Product saved");
        Ok(product)
    }

    /// Removes a product. Returns whether it existed.
    ///
    /// Past sales keep their frozen line names and prices.
    pub async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.store.lock_writes().await;
        let mut products = self.list_products().await?;

        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }

        self.write_all(&products).await?;
        info!(id, "Product deleted");
        Ok(true)
    }

    /// Case-insensitive match on name, SKU, brand or category.
    ///
    /// An empty query returns the active products.
    pub async fn search(&self, query: &str) -> LedgerResult<Vec<Product>> {
        let query = validate_search_query(query)?.to_lowercase();

        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return Ok(self.list_active().await?);
        }

        let products = self.list_products().await?;
        Ok(products
            .into_iter()
            .filter(|p| {
                [&p.name, &p.sku, &p.brand, &p.category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&query))
            })
            .collect())
    }

    /// Stock KPIs over the whole catalog.
    pub async fn inventory_summary(&self) -> StoreResult<InventorySummary> {
        let products = self.list_products().await?;
        Ok(InventorySummary::from_products(&products))
    }

    /// Replaces the product list. Caller holds the write lock.
    pub(crate) async fn write_all(&self, products: &[Product]) -> StoreResult<()> {
        self.store.kv().set(keys::PRODUCTS, products).await
    }
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    if product.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }
    validate_sku(&product.sku)?;
    validate_product_name(&product.name)?;
    validate_price(product.price.amount())?;
    if product.has_variants() {
        for variant in &product.variants {
            validate_stock(variant.stock)?;
        }
    } else {
        validate_stock(product.stock)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::StoreConfig;
    use retail_core::{Money, Variant};

    async fn seeded() -> Store {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        store.init().await.unwrap();
        store
    }

    fn plain(id: &str, sku: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: "Casquette".to_string(),
            sku: sku.to_string(),
            category: "Accessoires".to_string(),
            brand: "New Era".to_string(),
            price: Money::new(12000),
            active: true,
            variants: vec![],
            stock,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_get_product() {
        let store = seeded().await;
        let catalog = store.catalog();

        let nike = catalog.get_product("PROD_001").await.unwrap();
        assert_eq!(nike.stock, 12);

        let err = catalog.get_product("PROD_999").await.unwrap_err();
        assert!(matches!(err, LedgerError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_check_and_reserve() {
        let store = seeded().await;
        let catalog = store.catalog();

        catalog.check_and_reserve("PROD_001", Some("v_n_1"), 5).await.unwrap();

        let err = catalog
            .check_and_reserve("PROD_001", Some("v_n_1"), 6)
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::InsufficientStock { available: 5, requested: 6, .. })
        ));

        let err = catalog
            .check_and_reserve("PROD_001", Some("v_zz"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::VariantNotFound { .. })));
    }

    #[tokio::test]
    async fn test_commit_deduction_recomputes_total() {
        let store = seeded().await;
        let catalog = store.catalog();

        let updated = catalog
            .commit_deduction("PROD_001", Some("v_n_2"), 3)
            .await
            .unwrap();
        assert_eq!(updated.variant("v_n_2").unwrap().stock, 0);
        assert_eq!(updated.stock, 9);

        let reloaded = catalog.get_product("PROD_001").await.unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn test_failed_deduction_writes_nothing() {
        let store = seeded().await;
        let catalog = store.catalog();
        let before = catalog.list_products().await.unwrap();

        assert!(catalog
            .commit_deduction("PROD_002", Some("v_a_1"), 9)
            .await
            .is_err());
        assert_eq!(catalog.list_products().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_variant_product_needs_variant_id() {
        let store = seeded().await;
        let catalog = store.catalog();
        let before = catalog.get_product("PROD_002").await.unwrap();

        let err = catalog.commit_deduction("PROD_002", None, 3).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(catalog.check_and_reserve("PROD_002", None, 1).await.is_err());

        let after = catalog.get_product("PROD_002").await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.stock, 8);
    }

    #[tokio::test]
    async fn test_plain_product_deduction() {
        let store = seeded().await;
        let catalog = store.catalog();

        let jean = catalog.commit_deduction("PROD_004", None, 5).await.unwrap();
        assert_eq!(jean.stock, 15);
        assert!(jean.variants.is_empty());
    }

    #[tokio::test]
    async fn test_large_deduction_is_not_capped_at_cart_limit() {
        let store = seeded().await;
        let catalog = store.catalog();
        catalog.save_product(plain("PROD_010", "CAP-NE", 1500)).await.unwrap();

        catalog.check_and_reserve("PROD_010", None, 1000).await.unwrap();
        let updated = catalog.commit_deduction("PROD_010", None, 1000).await.unwrap();
        assert_eq!(updated.stock, 500);

        let err = catalog.commit_deduction("PROD_010", None, 0).await.unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_save_product() {
        let store = seeded().await;
        let catalog = store.catalog();

        catalog.save_product(plain("PROD_010", "CAP-NE", 7)).await.unwrap();
        assert_eq!(catalog.list_products().await.unwrap().len(), 5);

        // same id replaces
        catalog.save_product(plain("PROD_010", "CAP-NE", 2)).await.unwrap();
        assert_eq!(catalog.get_product("PROD_010").await.unwrap().stock, 2);

        // duplicate SKU on another id
        let err = catalog
            .save_product(plain("PROD_011", "nik-270-red", 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[tokio::test]
    async fn test_save_product_recomputes_cached_stock() {
        let store = seeded().await;
        let catalog = store.catalog();

        let mut product = plain("PROD_006", "SOCK-01", 999);
        product.variants = vec![
            Variant {
                id: "s1".to_string(),
                size: "S".to_string(),
                color: "Noir".to_string(),
                stock: 4,
            },
            Variant {
                id: "s2".to_string(),
                size: "M".to_string(),
                color: "Noir".to_string(),
                stock: 6,
            },
        ];

        let saved = catalog.save_product(product).await.unwrap();
        assert_eq!(saved.stock, 10);

        let mut negative = saved.clone();
        negative.variants[0].stock = -1;
        assert!(catalog.save_product(negative).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_search() {
        let store = seeded().await;
        let catalog = store.catalog();

        assert_eq!(catalog.search("nike").await.unwrap().len(), 1);
        assert_eq!(catalog.search("chaussures").await.unwrap().len(), 2);
        assert_eq!(catalog.search("TSH").await.unwrap().len(), 1);
        assert_eq!(catalog.search("jean").await.unwrap().len(), 1);
        assert_eq!(catalog.search("vêtements").await.unwrap().len(), 2);
        assert_eq!(catalog.search("").await.unwrap().len(), 4);

        assert!(catalog.delete_product("PROD_003").await.unwrap());
        assert!(!catalog.delete_product("PROD_003").await.unwrap());
        assert!(catalog.search("uniqlo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inventory_summary() {
        let store = seeded().await;
        let summary = store.catalog().inventory_summary().await.unwrap();

        assert_eq!(summary.product_count, 4);
        assert_eq!(summary.total_units, 90);
        // Nike v_n_2 (3) and v_n_3 (4) are below 5
        assert_eq!(summary.low_stock_count, 1);
    }
}
