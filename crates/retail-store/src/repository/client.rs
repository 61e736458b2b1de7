//! Client directory over the `clients` key.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{LedgerResult, StoreResult};
use crate::ids;
use crate::kv::keys;
use crate::pool::Store;
use retail_core::validation::{validate_email, validate_person_name};
use retail_core::{Client, ClientType, CoreError, Money};

/// Fields the "Nouveau client" form collects.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub client_type: ClientType,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    store: Store,
}

impl ClientRepository {
    pub fn new(store: Store) -> Self {
        ClientRepository { store }
    }

    pub async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        self.store.kv().get_or_default(keys::CLIENTS).await
    }

    pub async fn find_client(&self, id: &str) -> StoreResult<Option<Client>> {
        let clients = self.list_clients().await?;
        Ok(clients.into_iter().find(|c| c.id == id))
    }

    /// The client, or `ClientNotFound`.
    pub async fn get_client(&self, id: &str) -> LedgerResult<Client> {
        self.find_client(id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(id.to_string()).into())
    }

    /// Inserts or replaces a client by id.
    pub async fn save_client(&self, client: Client) -> LedgerResult<Client> {
        validate_person_name("firstName", &client.first_name)?;
        validate_person_name("lastName", &client.last_name)?;

        let _guard = self.store.lock_writes().await;
        self.upsert(&client).await?;

        debug!(id = %client.id, "Client saved");
        Ok(client)
    }

    /// Registers a new client created by `created_by`, counters at zero.
    pub async fn add_client(&self, new: NewClient, created_by: &str) -> LedgerResult<Client> {
        validate_person_name("firstName", &new.first_name)?;
        validate_person_name("lastName", &new.last_name)?;
        let email = new.email.trim().to_string();
        if !email.is_empty() {
            validate_email(&email)?;
        }

        let client = Client {
            id: ids::client_id(),
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            phone: new.phone.trim().to_string(),
            email,
            client_type: new.client_type,
            created_by: Some(created_by.to_string()),
            created_at: Some(Utc::now()),
            notes: new.notes,
            total_spent: Money::zero(),
            purchase_count: 0,
            last_visit: None,
        };

        let _guard = self.store.lock_writes().await;
        let mut clients = self.list_clients().await?;
        clients.push(client.clone());
        self.store.kv().set(keys::CLIENTS, &clients).await?;

        info!(id = %client.id, name = %client.full_name(), created_by, "Client added");
        Ok(client)
    }

    /// Folds a sale into the client's counters. Caller holds the write lock.
    ///
    /// An unknown id is logged and skipped; returns whether a client was updated.
    pub(crate) async fn record_purchase_locked(
        &self,
        client_id: &str,
        total: Money,
        at: chrono::DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut clients = self.list_clients().await?;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            warn!(client_id, "Sale references an unknown client, counters not updated");
            return Ok(false);
        };

        client.record_purchase(total, at);
        debug!(
            client_id,
            total_spent = client.total_spent.amount(),
            purchase_count = client.purchase_count,
            "Client counters updated"
        );

        self.store.kv().set(keys::CLIENTS, &clients).await?;
        Ok(true)
    }

    async fn upsert(&self, client: &Client) -> StoreResult<()> {
        let mut clients = self.list_clients().await?;
        match clients.iter_mut().find(|c| c.id == client.id) {
            Some(existing) => *existing = client.clone(),
            None => clients.push(client.clone()),
        }
        self.store.kv().set(keys::CLIENTS, &clients).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
