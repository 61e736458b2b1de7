//! # Demo Data
//!
//! First-run seeding and full reset of the store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init()    users     seeded when absent or empty                        │
//! │            products  seeded when absent                                 │
//! │            clients   seeded when absent                                 │
//! │            sales     []  when absent                                    │
//! │                                                                         │
//! │  reset()   clear every key, then init()                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Demo accounts:
//!
//! | Handle    | Email             | Password    | Role     |
//! |-----------|-------------------|-------------|----------|
//! | admin     | admin@store.com   | admin123    | admin    |
//! | vendeuse1 | sarah@store.com   | vendeuse123 | vendeuse |
//! | vendeuse2 | marie@store.com   | vendeuse123 | vendeuse |
//! | manager   | manager@store.com | manager123  | manager  |

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::StoreResult;
use crate::kv::keys;
use crate::pool::Store;
use retail_core::{Client, ClientType, Money, Product, Role, Sale, User, Variant};

const AVATAR_URL: &str = "https://ui-avatars.com/api/";

fn user(id: &str, email: &str, password: &str, role: Role, name: &str, avatar_query: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
        name: name.to_string(),
        avatar: Some(format!("{AVATAR_URL}?{avatar_query}")),
    }
}

/// The four demo accounts, keyed by handle.
pub fn demo_users() -> BTreeMap<String, User> {
    BTreeMap::from([
        (
            "admin".to_string(),
            user(
                "admin_001",
                "admin@store.com",
                "admin123",
                Role::Admin,
                "Administrateur",
                "name=Admin&background=137fec&color=fff",
            ),
        ),
        (
            "vendeuse1".to_string(),
            user(
                "v_001",
                "sarah@store.com",
                "vendeuse123",
                Role::Vendeuse,
                "Sarah Jenkins",
                "name=Sarah+Jenkins&background=random",
            ),
        ),
        (
            "vendeuse2".to_string(),
            user(
                "v_002",
                "marie@store.com",
                "vendeuse123",
                Role::Vendeuse,
                "Marie Dupont",
                "name=Marie+Dupont&background=random",
            ),
        ),
        (
            "manager".to_string(),
            user(
                "mgr_001",
                "manager@store.com",
                "manager123",
                Role::Manager,
                "Sophie Manager",
                "name=Sophie+Manager&background=random",
            ),
        ),
    ])
}

fn variant(id: &str, size: &str, color: &str, stock: i64) -> Variant {
    Variant {
        id: id.to_string(),
        size: size.to_string(),
        color: color.to_string(),
        stock,
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: &str,
    name: &str,
    sku: &str,
    brand: &str,
    category: &str,
    price: i64,
    variants: Vec<Variant>,
    image: &str,
) -> Product {
    let mut product = Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        category: category.to_string(),
        brand: brand.to_string(),
        price: Money::new(price),
        active: true,
        variants,
        stock: 0,
        image: Some(format!(
            "https://images.unsplash.com/{image}?auto=format&fit=crop&q=80&w=300&h=300"
        )),
    };
    product.recompute_stock();
    product
}

/// Four demo products: three with variants, one plain.
pub fn demo_products() -> Vec<Product> {
    let mut jean = product(
        "PROD_004",
        "Jean Slim Fit",
        "JEA-BLU-32",
        "",
        "Vêtements",
        35000,
        vec![],
        "photo-1542272454315-4c01d7abdf4a",
    );
    jean.stock = 20;

    vec![
        product(
            "PROD_001",
            "Nike Air Max 270",
            "NIK-270-RED",
            "Nike",
            "Chaussures",
            120000,
            vec![
                variant("v_n_1", "42", "Rouge", 5),
                variant("v_n_2", "43", "Rouge", 3),
                variant("v_n_3", "42", "Noir", 4),
            ],
            "photo-1542291026-7eec264c27ff",
        ),
        product(
            "PROD_002",
            "Adidas Ultraboost",
            "ADI-ULT-BLK",
            "Adidas",
            "Chaussures",
            180000,
            vec![variant("v_a_1", "42", "Noir", 8)],
            "photo-1595950653106-6c9ebd614d3a",
        ),
        product(
            "PROD_003",
            "T-Shirt Cotton Basic",
            "TSH-WHT",
            "Uniqlo",
            "Vêtements",
            15000,
            vec![
                variant("v_t_1", "M", "Blanc", 20),
                variant("v_t_2", "L", "Blanc", 15),
                variant("v_t_3", "S", "Blanc", 15),
            ],
            "photo-1521572163474-6864f9cf17ab",
        ),
        jean,
    ]
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single()
}

/// Two demo clients with purchase history totals.
pub fn demo_clients() -> Vec<Client> {
    vec![
        Client {
            id: "CLIENT_001".to_string(),
            first_name: "Marie".to_string(),
            last_name: "Dubois".to_string(),
            phone: "+33612345678".to_string(),
            email: "marie.d@email.com".to_string(),
            client_type: ClientType::Vip,
            created_by: Some("v_001".to_string()),
            created_at: utc(2024, 1, 1, 10, 0),
            notes: "Préfère les baskets Nike".to_string(),
            total_spent: Money::new(1250000),
            purchase_count: 0,
            last_visit: utc(2024, 1, 15, 14, 30),
        },
        Client {
            id: "CLIENT_002".to_string(),
            first_name: "Sophie".to_string(),
            last_name: "Martin".to_string(),
            phone: "+33698765432".to_string(),
            email: "sophie.m@email.com".to_string(),
            client_type: ClientType::Regular,
            created_by: Some("v_002".to_string()),
            created_at: utc(2024, 2, 10, 11, 20),
            notes: String::new(),
            total_spent: Money::new(320000),
            purchase_count: 0,
            last_visit: utc(2024, 2, 28, 16, 15),
        },
    ]
}

impl Store {
    /// Seeds demo data into keys that are not set yet. Idempotent.
    pub async fn init(&self) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        self.seed_missing().await
    }

    /// Clears every key and seeds again.
    pub async fn reset(&self) -> StoreResult<()> {
        let _guard = self.lock_writes().await;

        let removed = self.kv().clear().await?;
        info!(removed, "Store cleared");

        self.seed_missing().await
    }

    async fn seed_missing(&self) -> StoreResult<()> {
        let kv = self.kv();
        let mut seeded = Vec::new();

        let users: BTreeMap<String, User> = kv.get_or_default(keys::USERS).await?;
        if users.is_empty() {
            kv.set(keys::USERS, &demo_users()).await?;
            seeded.push(keys::USERS);
        }

        if !kv.contains(keys::PRODUCTS).await? {
            kv.set(keys::PRODUCTS, &demo_products()).await?;
            seeded.push(keys::PRODUCTS);
        }

        if !kv.contains(keys::CLIENTS).await? {
            kv.set(keys::CLIENTS, &demo_clients()).await?;
            seeded.push(keys::CLIENTS);
        }

        if !kv.contains(keys::SALES).await? {
            kv.set(keys::SALES, &Vec::<Sale>::new()).await?;
            seeded.push(keys::SALES);
        }

        if !seeded.is_empty() {
            info!(keys = ?seeded, "Seeded demo data");
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;

    async fn store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_demo_products_stock_matches_variants() {
        for product in demo_products().iter().filter(|p| p.has_variants()) {
            let sum: i64 = product.variants.iter().map(|v| v.stock).sum();
            assert_eq!(product.stock, sum, "{}", product.id);
        }
        let stocks: Vec<i64> = demo_products().iter().map(|p| p.stock).collect();
        assert_eq!(stocks, vec![12, 8, 50, 20]);
        assert!(!demo_products()[3].has_variants());
    }

    #[tokio::test]
    async fn test_init_seeds_cold_store() {
        let store = store().await;
        store.init().await.unwrap();

        assert_eq!(store.users().list_users().await.unwrap().len(), 4);
        assert_eq!(store.catalog().list_products().await.unwrap().len(), 4);
        assert_eq!(store.clients().list_clients().await.unwrap().len(), 2);
        assert!(store.ledger().get_all_sales().await.unwrap().is_empty());
        assert!(store.register().get_register().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_data() {
        let store = store().await;
        store.init().await.unwrap();
        store.catalog().delete_product("PROD_002").await.unwrap();

        store.init().await.unwrap();
        assert_eq!(store.catalog().list_products().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reset() {
        let store = store().await;
        store.init().await.unwrap();
        store.catalog().delete_product("PROD_002").await.unwrap();
        store
            .register()
            .open(Money::new(1000), "v_001", "Sarah Jenkins")
            .await
            .unwrap();

        store.reset().await.unwrap();

        assert_eq!(store.catalog().list_products().await.unwrap().len(), 4);
        assert!(store.register().get_register().await.unwrap().is_none());
        assert!(store.register().get_history().await.unwrap().is_empty());
    }
}
