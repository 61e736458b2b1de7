//! # Cash Register
//!
//! The till lifecycle, as pure state transitions.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cash Register State Machine                          │
//! │                                                                         │
//! │     (none) ──── open(initial) ────► OPEN ──── close(counted) ──► (none) │
//! │                                      │  ▲                               │
//! │                       record_sale(t) │  │ withdraw(a, reason)           │
//! │                                      └──┘                               │
//! │                                                                         │
//! │  While open:                                                            │
//! │    current = initial + sales_total − Σ withdrawals                     │
//! │                                                                         │
//! │  At close:                                                              │
//! │    expected   = initial + sales_total − Σ withdrawals                  │
//! │    difference = counted − expected   (> 0 surplus, < 0 short)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence (the `cashRegister` singleton and the `cashHistory` log) is
//! handled by `retail-store`. Ids and timestamps are passed in so every
//! transition here is deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::validate_reason;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RegisterStatus {
    Open,
    Closed,
}

/// Cash taken out of an open register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Withdrawal {
    pub id: String,
    pub amount: Money,
    pub reason: String,
    pub user_id: String,
    pub user_name: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

/// The till. At most one is open at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    pub status: RegisterStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    pub opened_by_name: String,
    pub initial_amount: Money,
    pub current_amount: Money,
    pub sales_total: Money,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_by: Option<String>,
    #[serde(default)]
    pub closed_by_name: Option<String>,
    #[serde(default)]
    pub expected_amount: Money,
    #[serde(default)]
    pub final_amount: Money,
    #[serde(default)]
    pub difference: Money,
}

/// Returned by a successful close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClosedSummary {
    /// The register in its final, closed state.
    pub register: CashRegister,
    pub expected: Money,
    pub counted: Money,
    pub difference: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CashEventKind {
    Open,
    Withdrawal,
    Close,
}

/// One entry of the append-only `cashHistory` log.
///
/// `amount` is the opening float, the withdrawn amount or the counted cash,
/// depending on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashHistoryEntry {
    #[serde(rename = "type")]
    pub kind: CashEventKind,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Register snapshot right after the event.
    pub register: CashRegister,
}

// =============================================================================
// Transitions
// =============================================================================

impl CashRegister {
    /// Opens a fresh register with `initial` in the drawer.
    pub fn open(
        id: String,
        initial: Money,
        user_id: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if initial.is_negative() {
            return Err(CoreError::invalid_amount("initialAmount", initial.amount()));
        }

        Ok(CashRegister {
            id,
            status: RegisterStatus::Open,
            opened_at: now,
            opened_by: user_id.to_string(),
            opened_by_name: user_name.to_string(),
            initial_amount: initial,
            current_amount: initial,
            sales_total: Money::zero(),
            withdrawals: Vec::new(),
            closed_at: None,
            closed_by: None,
            closed_by_name: None,
            expected_amount: Money::zero(),
            final_amount: Money::zero(),
            difference: Money::zero(),
        })
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }

    pub fn withdrawals_total(&self) -> Money {
        self.withdrawals.iter().map(|w| w.amount).sum()
    }

    /// `initial + sales_total − Σ withdrawals`.
    pub fn expected(&self) -> Money {
        self.initial_amount + self.sales_total - self.withdrawals_total()
    }

    /// Adds a sale total to the drawer. Returns false (and changes nothing)
    /// when the register is not open.
    pub fn record_sale(&mut self, amount: Money) -> bool {
        if !self.is_open() {
            return false;
        }
        self.sales_total += amount;
        self.current_amount += amount;
        true
    }

    /// Takes cash out of the drawer.
    ///
    /// Checked in order: register open, amount positive, reason present
    /// (at most 500 characters once trimmed).
    /// No overdraft check: the drawer may go below zero on paper.
    pub fn withdraw(
        &mut self,
        id: String,
        amount: Money,
        reason: &str,
        user_id: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Withdrawal> {
        if !self.is_open() {
            return Err(CoreError::RegisterNotOpen);
        }
        if !amount.is_positive() {
            return Err(CoreError::invalid_amount("amount", amount.amount()));
        }
        validate_reason(reason).map_err(|e| match e {
            ValidationError::Required { .. } => CoreError::MissingReason,
            other => other.into(),
        })?;
        let reason = reason.trim();

        let withdrawal = Withdrawal {
            id,
            amount,
            reason: reason.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            date: now,
        };
        self.withdrawals.push(withdrawal.clone());
        self.current_amount -= amount;
        Ok(withdrawal)
    }

    /// Closes the register against the counted cash.
    pub fn close(
        mut self,
        counted: Money,
        user_id: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<ClosedSummary> {
        if !self.is_open() {
            return Err(CoreError::RegisterNotOpen);
        }
        if counted.is_negative() {
            return Err(CoreError::invalid_amount("finalAmount", counted.amount()));
        }

        let expected = self.expected();
        let difference = counted - expected;

        self.status = RegisterStatus::Closed;
        self.closed_at = Some(now);
        self.closed_by = Some(user_id.to_string());
        self.closed_by_name = Some(user_name.to_string());
        self.expected_amount = expected;
        self.final_amount = counted;
        self.difference = difference;

        Ok(ClosedSummary {
            register: self,
            expected,
            counted,
            difference,
        })
    }

    /// Snapshot entry for the history log.
    pub fn history_entry(
        &self,
        kind: CashEventKind,
        amount: Money,
        reason: Option<String>,
        user_id: &str,
        user_name: &str,
        date: DateTime<Utc>,
    ) -> CashHistoryEntry {
        CashHistoryEntry {
            kind,
            date,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            amount,
            reason,
            register: self.clone(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
