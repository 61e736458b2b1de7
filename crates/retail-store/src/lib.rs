//! # retail-store: Storage and Ledger Services for RetailOS
//!
//! Persists the shop's state as JSON documents in a SQLite key/value table
//! and runs every multi-key mutation (sale commit, till lifecycle) under one
//! write lock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RetailOS Data Flow                               │
//! │                                                                         │
//! │  Seller / manager / admin dashboards                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   retail-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Store      │    │   Services    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleLedger    │    │ 001_kv_      │  │   │
//! │  │   │ write lock    │    │ CashRegister  │    │  entries.sql │  │   │
//! │  │   │ KvStore       │    │ Catalog, ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                               │                                 │   │
//! │  │                               ▼                                 │   │
//! │  │                     retail-core (cart, register, reports)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file   (RETAIL_DB_PATH, or the platform data directory)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Store handle, configuration, write lock
//! - [`kv`] - Key/value access and the key layout
//! - [`repository`] - Typed services (catalog, ledger, register, ...)
//! - [`migrations`] - Embedded schema migration
//! - [`seed`] - Demo data, `init` and `reset`
//! - [`error`] - Store and ledger error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use retail_core::{Cart, PaymentMethod, SaleContext};
//! use retail_store::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::from_env()?).await?;
//! store.init().await?;
//!
//! let nike = store.catalog().get_product("PROD_001").await?;
//! let mut cart = Cart::new();
//! cart.add(&nike, Some("v_n_1"), 1)?;
//!
//! let settings = store.settings().load_settings().await?;
//! let context = SaleContext::new("v_001", "Sarah Jenkins", PaymentMethod::Cash)
//!     .with_tax_rate(settings.tax_rate());
//! let sale = store.ledger().commit_sale(&cart, &context).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ErrorCode, ErrorNotice, LedgerError, LedgerResult, StoreError, StoreResult};
pub use kv::KvStore;
pub use pool::{Store, StoreConfig, DB_PATH_ENV};

pub use repository::{
    CashRegisterService, CatalogRepository, ClientRepository, NewClient, SaleLedger, SettingsRepository,
    UserRepository,
};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// ## Log Levels
/// - `RUST_LOG` when set
/// - otherwise `info`, with `debug` for the retail crates and `warn` for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,retail=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}
