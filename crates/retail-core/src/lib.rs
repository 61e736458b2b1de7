//! # retail-core: Pure Business Logic for RetailOS
//!
//! Everything in the Sale & Cash-Register Ledger that can be decided without
//! touching storage: record types, money and tax math, the draft cart, the
//! cash-register state machine and the dashboard KPIs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RetailOS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboards (admin / manager / seller)              │   │
//! │  │    POS grid ──► Cart panel ──► Pay ──► Caisse ──► Reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    retail-store (services)                      │   │
//! │  │    SaleLedger, CashRegisterService, Catalog, Clients, Session   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ retail-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ register │ │ report │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ open/    │ │  KPIs  │  │   │
//! │  │   │  Sale   │ │ TaxRate │ │ totals  │ │ close    │ │        │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO CLOCK • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Sale, Client, User records
//! - [`money`] - Integer money and basis-point tax rates
//! - [`cart`] - Draft sale, totals, sale record construction
//! - [`register`] - Cash register transitions and history entries
//! - [`report`] - Period filters and dashboard aggregates
//! - [`settings`] - Store settings and currency formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use retail_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::new(1000) * 2 + Money::new(500);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
//!
//! assert_eq!((subtotal + tax).amount(), 2700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod register;
pub mod report;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, SaleContext};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use register::{CashEventKind, CashHistoryEntry, CashRegister, ClosedSummary, RegisterStatus, Withdrawal};
pub use settings::Settings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single cart line.
///
/// Catches typos such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// A product (or any of its variants) under this many units counts as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// `clientName` recorded on sales without a client.
pub const GUEST_CLIENT_NAME: &str = "Client invité";
