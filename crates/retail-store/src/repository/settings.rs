//! Store settings over the `settings` key.

use tracing::{info, warn};

use crate::error::{LedgerResult, StoreResult};
use crate::kv::keys;
use crate::pool::Store;
use retail_core::Settings;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    store: Store,
}

impl SettingsRepository {
    pub fn new(store: Store) -> Self {
        SettingsRepository { store }
    }

    /// Stored settings, defaults filling any missing field.
    ///
    /// A stored record that fails validation (written around `save_settings`)
    /// is replaced by the defaults with a warning.
    pub async fn load_settings(&self) -> StoreResult<Settings> {
        let settings: Settings = self.store.kv().get_or_default(keys::SETTINGS).await?;
        match settings.validate() {
            Ok(()) => Ok(settings),
            Err(error) => {
                warn!(%error, "Stored settings are invalid, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Validates and replaces the settings.
    pub async fn save_settings(&self, settings: Settings) -> LedgerResult<Settings> {
        settings.validate()?;

        let _guard = self.store.lock_writes().await;
        self.store.kv().set(keys::SETTINGS, &settings).await?;

        info!(
            store_name = %settings.store_name,
            currency = %settings.currency,
            tax_rate_bps = settings.tax_rate_bps,
            "Settings saved"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;
    use retail_core::{CoreError, ValidationError};

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        assert_eq!(store.settings().load_settings().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_partial_record_merges_defaults() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        store
            .kv()
            .set(keys::SETTINGS, &serde_json::json!({ "storeName": "Black LBV Girls" }))
            .await
            .unwrap();

        let settings = store.settings().load_settings().await.unwrap();
        assert_eq!(settings.store_name, "Black LBV Girls");
        assert_eq!(settings.currency, "XAF");
    }

    #[tokio::test]
    async fn test_invalid_record_falls_back_to_defaults() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        store
            .kv()
            .set(
                keys::SETTINGS,
                &serde_json::json!({ "currency": "EUR", "currencyDecimals": 30, "taxRateBps": 800 }),
            )
            .await
            .unwrap();

        let settings = store.settings().load_settings().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.format_currency(retail_core::Money::new(120000)), "120 000 FCFA");
    }

    #[tokio::test]
    async fn test_save_settings() {
        let store = Store::open(StoreConfig::in_memory()).await.unwrap();
        let repo = store.settings();

        let settings = Settings {
            tax_rate_bps: 1925,
            ..Settings::default()
        };
        repo.save_settings(settings.clone()).await.unwrap();
        assert_eq!(repo.load_settings().await.unwrap(), settings);

        let err = repo
            .save_settings(Settings {
                tax_rate_bps: 10001,
                ..Settings::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }
}
