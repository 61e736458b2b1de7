//! # Store Handle
//!
//! Connection pool, configuration, and the write lock shared by every
//! service.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store Handle                                    │
//! │                                                                         │
//! │  StoreConfig::from_env() / ::new(path) / ::in_memory()                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Store::open(config).await ← pool + migrations                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────────────────────────────┐                      │
//! │  │  Store (Clone)                               │                      │
//! │  │   ├── SqlitePool        (kv_entries table)   │                      │
//! │  │   └── Arc<Mutex<()>>    write lock, shared   │                      │
//! │  └──────────────────────────────────────────────┘                      │
//! │       │                                                                 │
//! │       ├── store.catalog()    products                                  │
//! │       ├── store.clients()    clients                                   │
//! │       ├── store.users()      users, currentUser                        │
//! │       ├── store.settings()   settings                                  │
//! │       ├── store.ledger()     sales (+ products, clients, register)     │
//! │       └── store.register()   cashRegister, cashHistory                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Lock
//! Every read-modify-write of a key goes through `Store::lock_writes`. The
//! sale commit holds it from the first stock check to the register update,
//! so two terminals on the same process can never both sell the last unit.

use directories::ProjectDirs;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use crate::migrations;
use crate::repository::{
    CashRegisterService, CatalogRepository, ClientRepository, SaleLedger, SettingsRepository,
    UserRepository,
};

/// Overrides the store file location.
pub const DB_PATH_ENV: &str = "RETAIL_DB_PATH";

// =============================================================================
// Configuration
// =============================================================================

/// Store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("./data/retailos.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite file. Created if missing.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Pool acquire timeout. Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before a connection is closed. `None` keeps connections
    /// forever (required in memory, where closing the last connection drops
    /// the data).
    pub idle_timeout: Option<Duration>,

    /// Default: true
    pub run_migrations: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory store, isolated per `Store::open`. For tests.
    pub fn in_memory() -> Self {
        StoreConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // in-memory requires a single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    /// `RETAIL_DB_PATH` when set, the platform data directory otherwise.
    pub fn from_env() -> StoreResult<Self> {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(StoreConfig::new(path));
            }
        }
        Ok(StoreConfig::new(Self::default_path()?))
    }

    /// Platform-specific store file location.
    ///
    /// - **macOS**: `~/Library/Application Support/com.retailos.ledger/retailos.db`
    /// - **Windows**: `%APPDATA%\retailos\ledger\data\retailos.db`
    /// - **Linux**: `~/.local/share/ledger/retailos.db`
    pub fn default_path() -> StoreResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "retailos", "ledger").ok_or_else(|| {
            StoreError::ConnectionFailed("Could not determine app data directory".to_string())
        })?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(data_dir.join("retailos.db"))
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// Store
// =============================================================================

/// Handle to the key/value store. Cheap to clone; clones share the pool and
/// the write lock.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Opens the pool and applies pending migrations.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. WAL journal, NORMAL synchronous
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening key/value store"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let mut connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);
        if !config.is_in_memory() {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(None::<Duration>)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Store pool created");

        let store = Store {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };

        if config.run_migrations {
            store.run_migrations().await?;
        }

        Ok(store)
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// For diagnostics. Prefer the typed accessors.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serializes read-modify-write sequences across all clones.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Untyped key/value access.
    pub fn kv(&self) -> KvStore {
        KvStore::new(self.pool.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.clone())
    }

    /// Users and the current session.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.clone())
    }

    /// The Sale Ledger.
    pub fn ledger(&self) -> SaleLedger {
        SaleLedger::new(self.clone())
    }

    /// The Cash Register.
    pub fn register(&self) -> CashRegisterService {
        CashRegisterService::new(self.clone())
    }

    pub async fn close(&self) {
        info!("Closing key/value store");
        self.pool.close().await;
    }

    /// True when the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();

        assert!(store.health_check().await);
        let (total, applied) = migrations::migration_status(store.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        let other = store.clone();

        store.kv().set("settings", &serde_json::json!({"storeName": "A"})).await.unwrap();
        assert!(other.kv().contains("settings").await.unwrap());
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new("/tmp/retailos.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(StoreConfig::in_memory().is_in_memory());
    }
}
