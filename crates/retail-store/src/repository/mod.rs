//! # Repository Module
//!
//! Typed services over the key/value store.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Services and Their Keys                            │
//! │                                                                         │
//! │  Dashboard action                                                       │
//! │       │                                                                 │
//! │       │  store.ledger().commit_sale(&cart, &context)                    │
//! │       ▼                                                                 │
//! │  SaleLedger ───────────┬──► CatalogRepository     products              │
//! │                        ├──► CashRegisterService   cashRegister          │
//! │                        └──► ClientRepository      clients               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  KvStore  (kv_entries table, one JSON document per key)                │
//! │                                                                         │
//! │  UserRepository      users, currentUser                                 │
//! │  SettingsRepository  settings                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each service holds a `Store` clone. Services that write take the store
//! write lock; the `*_locked` helpers are for a caller that already holds it.
//!
//! ## Available Services
//!
//! - [`CatalogRepository`] - Products, stock checks and deductions
//! - [`SaleLedger`] - Sale commit, sale queries, sales reports
//! - [`CashRegisterService`] - Till lifecycle and cash history
//! - [`ClientRepository`] - Client directory
//! - [`UserRepository`] - Staff accounts and the session
//! - [`SettingsRepository`] - Store settings

pub mod catalog;
pub mod client;
pub mod register;
pub mod sale;
pub mod settings;
pub mod user;

pub use catalog::CatalogRepository;
pub use client::{ClientRepository, NewClient};
pub use register::CashRegisterService;
pub use sale::SaleLedger;
pub use settings::SettingsRepository;
pub use user::UserRepository;
