//! # Key/Value Store
//!
//! A persistent map from flat string keys to JSON documents, backed by the
//! `kv_entries` table.
//!
//! ## Read Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get::<T>(key)                                                          │
//! │       │                                                                 │
//! │       ├── SQL error          → Err(StoreError)        (propagated)      │
//! │       ├── no row             → Ok(None)                                 │
//! │       ├── JSON doesn't fit T → Ok(None) + warn!       (degraded)        │
//! │       └── decoded            → Ok(Some(value))                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cold store on first run therefore reads as empty everywhere.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// The persisted key layout.
pub mod keys {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const CLIENTS: &str = "clients";
    pub const SALES: &str = "sales";
    pub const CASH_REGISTER: &str = "cashRegister";
    pub const CASH_HISTORY: &str = "cashHistory";
    pub const CURRENT_USER: &str = "currentUser";
    pub const SETTINGS: &str = "settings";

    pub const ALL: [&str; 8] = [
        USERS,
        PRODUCTS,
        CLIENTS,
        SALES,
        CASH_REGISTER,
        CASH_HISTORY,
        CURRENT_USER,
        SETTINGS,
    ];
}

/// One row of `kv_entries`.
#[derive(Debug, Clone, FromRow)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Untyped access to the key/value table.
#[derive(Debug, Clone)]
pub struct KvStore {
    pool: SqlitePool,
}

impl KvStore {
    pub fn new(pool: SqlitePool) -> Self {
        KvStore { pool }
    }

    /// The raw row for `key`.
    pub async fn entry(&self, key: &str) -> StoreResult<Option<KvEntry>> {
        let entry = sqlx::query_as::<_, KvEntry>(
            "SELECT key, value, updated_at FROM kv_entries WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Decoded value for `key`. Undecodable JSON reads as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(entry) = self.entry(key).await? else {
            debug!(key, "Key not set");
            return Ok(None);
        };

        match serde_json::from_str::<T>(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Stored value could not be decoded, using default");
                Ok(None)
            }
        }
    }

    /// Decoded value for `key`, or `T::default()`.
    pub async fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> StoreResult<T> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    /// Replaces the whole value under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StoreError::serialization(key, e))?;

        debug!(key, bytes = json.len(), "Writing key");

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes `key`. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key, removed = result.rows_affected() > 0, "Removed key");
        Ok(result.rows_affected() > 0)
    }

    /// Deletes every key. Returns how many were removed.
    pub async fn clear(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM kv_entries")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// All keys, sorted.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }

    pub async fn contains(&self, key: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_entries WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
