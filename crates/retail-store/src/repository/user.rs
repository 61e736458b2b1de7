//! # Users & Session
//!
//! Staff accounts under `users` (a map keyed by account handle, e.g.
//! `admin`, `vendeuse1`) and the logged-in user under `currentUser`.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(email, password, role)                                           │
//! │       │                                                                 │
//! │       ├── no account with email   → UnknownUser                         │
//! │       ├── password differs        → InvalidPassword                     │
//! │       ├── account role ≠ role     → RoleMismatch                        │
//! │       └── ok → currentUser = SessionUser { .., sessionStart: now }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Demo authentication: passwords are stored and compared as entered.

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{LedgerResult, StoreResult};
use crate::kv::keys;
use crate::pool::Store;
use retail_core::validation::validate_email;
use retail_core::{CoreError, Role, SessionUser, User, ValidationError};

#[derive(Debug, Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    pub fn new(store: Store) -> Self {
        UserRepository { store }
    }

    /// All accounts by handle.
    pub async fn list_users(&self) -> StoreResult<BTreeMap<String, User>> {
        self.store.kv().get_or_default(keys::USERS).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.trim();
        let users = self.list_users().await?;
        Ok(users.into_values().find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Inserts or replaces an account.
    ///
    /// An account with the same id keeps its handle; a new one is stored
    /// under its id. Emails are unique.
    pub async fn save_user(&self, user: User) -> LedgerResult<User> {
        validate_email(&user.email)?;
        if user.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }

        let _guard = self.store.lock_writes().await;
        let mut users = self.list_users().await?;

        if users
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: user.email.clone(),
            }
            .into());
        }

        let handle = users
            .iter()
            .find(|(_, u)| u.id == user.id)
            .map(|(handle, _)| handle.clone())
            .unwrap_or_else(|| user.id.clone());
        users.insert(handle.clone(), user.clone());
        self.store.kv().set(keys::USERS, &users).await?;

        info!(handle = %handle, id = %user.id, role = %user.role, "User saved");
        Ok(user)
    }

    /// Checks credentials and opens a session for `role`.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> LedgerResult<SessionUser> {
        let Some(user) = self.get_user_by_email(email).await? else {
            warn!(email, "Login with unknown email");
            return Err(CoreError::UnknownUser(email.trim().to_string()).into());
        };

        if user.password != password {
            warn!(id = %user.id, "Login with wrong password");
            return Err(CoreError::InvalidPassword.into());
        }

        if user.role != role {
            warn!(id = %user.id, account_role = %user.role, requested = %role, "Login with wrong role");
            return Err(CoreError::RoleMismatch {
                role: role.to_string(),
            }
            .into());
        }

        let session = SessionUser::from_user(&user, Utc::now());
        self.store.kv().set(keys::CURRENT_USER, &session).await?;

        info!(id = %session.id, role = %session.role, "User logged in");
        Ok(session)
    }

    pub async fn current_user(&self) -> StoreResult<Option<SessionUser>> {
        self.store.kv().get(keys::CURRENT_USER).await
    }

    /// Ends the session. Returns whether one was open.
    pub async fn logout(&self) -> StoreResult<bool> {
        let removed = self.store.kv().remove(keys::CURRENT_USER).await?;
        debug!(removed, "Logged out");
        Ok(removed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
