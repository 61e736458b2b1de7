//! # Cash Register Service
//!
//! Persists the till singleton (`cashRegister`) and its event log
//! (`cashHistory`).
//!
//! ## Persisted Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cashRegister   CashRegister        present only while a till is open  │
//! │                                                                         │
//! │  cashHistory    [CashHistoryEntry]  append-only                        │
//! │                   open        → amount = initial                       │
//! │                   withdrawal  → amount = withdrawn, reason             │
//! │                   close       → amount = counted, snapshot of closure  │
//! │                                                                         │
//! │  Sales add to the till but never add a history entry.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every public mutation holds the store write lock from read to write.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{LedgerResult, StoreResult};
use crate::ids;
use crate::kv::keys;
use crate::pool::Store;
use retail_core::{CashEventKind, CashHistoryEntry, CashRegister, ClosedSummary, CoreError, Money, Withdrawal};

#[derive(Debug, Clone)]
pub struct CashRegisterService {
    store: Store,
}

impl CashRegisterService {
    pub fn new(store: Store) -> Self {
        CashRegisterService { store }
    }

    /// The open register, if any.
    pub async fn get_register(&self) -> StoreResult<Option<CashRegister>> {
        let register: Option<CashRegister> = self.store.kv().get(keys::CASH_REGISTER).await?;
        Ok(register.filter(CashRegister::is_open))
    }

    /// The full event log, oldest first.
    pub async fn get_history(&self) -> StoreResult<Vec<CashHistoryEntry>> {
        self.store.kv().get_or_default(keys::CASH_HISTORY).await
    }

    /// Opens a new till with `initial` in the drawer.
    ///
    /// Fails with `AlreadyOpen` while another register is open.
    pub async fn open(&self, initial: Money, user_id: &str, user_name: &str) -> LedgerResult<CashRegister> {
        let _guard = self.store.lock_writes().await;

        if let Some(current) = self.get_register().await? {
            return Err(CoreError::AlreadyOpen(current.id).into());
        }

        let now = Utc::now();
        let register = CashRegister::open(ids::register_id(), initial, user_id, user_name, now)?;

        self.store.kv().set(keys::CASH_REGISTER, &register).await?;
        self.append_history(register.history_entry(
            CashEventKind::Open,
            initial,
            None,
            user_id,
            user_name,
            now,
        ))
        .await?;

        info!(
            id = %register.id,
            initial = initial.amount(),
            user = user_id,
            "Cash register opened"
        );
        Ok(register)
    }

    /// Adds a sale total to the open till. Returns false when none is open.
    pub async fn record_sale(&self, amount: Money) -> StoreResult<bool> {
        let _guard = self.store.lock_writes().await;
        self.record_sale_locked(amount).await
    }

    /// Takes `amount` out of the drawer.
    ///
    /// ## Errors
    /// - `RegisterNotOpen` when no till is open (nothing is logged)
    /// - `InvalidAmount` when `amount ≤ 0`
    /// - `MissingReason` when `reason` is blank
    pub async fn withdraw(
        &self,
        amount: Money,
        reason: &str,
        user_id: &str,
        user_name: &str,
    ) -> LedgerResult<Withdrawal> {
        let _guard = self.store.lock_writes().await;

        let mut register = self.get_register().await?.ok_or(CoreError::RegisterNotOpen)?;

        let now = Utc::now();
        let withdrawal = register.withdraw(ids::withdrawal_id(), amount, reason, user_id, user_name, now)?;

        self.store.kv().set(keys::CASH_REGISTER, &register).await?;
        self.append_history(register.history_entry(
            CashEventKind::Withdrawal,
            amount,
            Some(withdrawal.reason.clone()),
            user_id,
            user_name,
            now,
        ))
        .await?;

        info!(
            id = %register.id,
            amount = amount.amount(),
            reason = %withdrawal.reason,
            current = register.current_amount.amount(),
            "Cash withdrawn"
        );
        Ok(withdrawal)
    }

    /// Closes the till against the counted cash and clears the singleton.
    pub async fn close(&self, counted: Money, user_id: &str, user_name: &str) -> LedgerResult<ClosedSummary> {
        let _guard = self.store.lock_writes().await;

        let register = self.get_register().await?.ok_or(CoreError::RegisterNotOpen)?;

        let now = Utc::now();
        let summary = register.close(counted, user_id, user_name, now)?;

        self.append_history(summary.register.history_entry(
            CashEventKind::Close,
            counted,
            None,
            user_id,
            user_name,
            now,
        ))
        .await?;
        self.store.kv().remove(keys::CASH_REGISTER).await?;

        if !summary.difference.is_zero() {
            warn!(
                id = %summary.register.id,
                difference = summary.difference.amount(),
                "Cash register closed with a difference"
            );
        }
        info!(
            id = %summary.register.id,
            expected = summary.expected.amount(),
            counted = counted.amount(),
            "Cash register closed"
        );
        Ok(summary)
    }

    /// `record_sale` for callers already holding the write lock.
    pub(crate) async fn record_sale_locked(&self, amount: Money) -> StoreResult<bool> {
        let Some(mut register) = self.get_register().await? else {
            debug!(amount = amount.amount(), "No open register, sale not added to the till");
            return Ok(false);
        };

        register.record_sale(amount);
        self.store.kv().set(keys::CASH_REGISTER, &register).await?;

        debug!(
            id = %register.id,
            amount = amount.amount(),
            sales_total = register.sales_total.amount(),
            "Sale added to the till"
        );
        Ok(true)
    }

    async fn append_history(&self, entry: CashHistoryEntry) -> StoreResult<()> {
        let mut history = self.get_history().await?;
        history.push(entry);
        self.store.kv().set(keys::CASH_HISTORY, &history).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;

    async fn service() -> CashRegisterService {
        Store::open(StoreConfig::in_memory()).await.unwrap().register()
    }

    #[tokio::test]
    async fn test_full_day_reconciles() {
        let till = service().await;

        till.open(Money::new(50000), "v_001", "Sarah Jenkins").await.unwrap();
        assert!(till.record_sale(Money::new(2700)).await.unwrap());
        till.withdraw(Money::new(1000), "fuel", "v_001", "Sarah Jenkins")
            .await
            .unwrap();

        let current = till.get_register().await.unwrap().unwrap();
        assert_eq!(current.current_amount, Money::new(51700));

        let summary = till.close(Money::new(51700), "v_001", "Sarah Jenkins").await.unwrap();
        assert_eq!(summary.expected, Money::new(51700));
        assert_eq!(summary.difference, Money::zero());
        assert_eq!(summary.register.withdrawals_total(), Money::new(1000));
    }

    #[tokio::test]
    async fn test_history_entries() {
        let till = service().await;

        till.open(Money::new(10000), "admin_001", "Administrateur").await.unwrap();
        till.record_sale(Money::new(500)).await.unwrap();
        till.withdraw(Money::new(200), "  change  ", "admin_001", "Administrateur")
            .await
            .unwrap();
        till.close(Money::new(10000), "admin_001", "Administrateur").await.unwrap();

        let history = till.get_history().await.unwrap();
        let kinds: Vec<CashEventKind> = history.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![CashEventKind::Open, CashEventKind::Withdrawal, CashEventKind::Close]
        );
        assert_eq!(history[1].reason.as_deref(), Some("change"));
        assert_eq!(history[2].register.difference, Money::new(-300));
    }

    #[tokio::test]
    async fn test_withdraw_without_register() {
        let till = service().await;

        let err = till
            .withdraw(Money::new(1000), "fuel", "v_001", "Sarah Jenkins")
            .await
            .unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::RegisterNotOpen)));
        assert!(till.get_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_validation() {
        let till = service().await;
        till.open(Money::new(1000), "v_001", "Sarah Jenkins").await.unwrap();

        let err = till.withdraw(Money::zero(), "fuel", "v_001", "Sarah").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::InvalidAmount { .. })));

        let err = till.withdraw(Money::new(100), "   ", "v_001", "Sarah").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::MissingReason)));

        // only the open entry
        assert_eq!(till.get_history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_twice() {
        let till = service().await;
        let first = till.open(Money::new(1000), "v_001", "Sarah").await.unwrap();

        let err = till.open(Money::new(2000), "v_002", "Marie").await.unwrap_err();
        match err.domain() {
            Some(CoreError::AlreadyOpen(id)) => assert_eq!(id, &first.id),
            other => panic!("expected AlreadyOpen, got {other:?}"),
        }

        let err = service().await.open(Money::new(-1), "v_001", "Sarah").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_close_clears_singleton() {
        let till = service().await;

        let err = till.close(Money::zero(), "v_001", "Sarah").await.unwrap_err();
        assert!(matches!(err.domain(), Some(CoreError::RegisterNotOpen)));

        let first = till.open(Money::new(5000), "v_001", "Sarah").await.unwrap();
        till.record_sale(Money::new(800)).await.unwrap();
        till.close(Money::new(5800), "v_001", "Sarah").await.unwrap();
        assert!(till.get_register().await.unwrap().is_none());

        let second = till.open(Money::new(3000), "v_001", "Sarah").await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.sales_total, Money::zero());
        assert!(second.withdrawals.is_empty());
        assert_eq!(second.current_amount, Money::new(3000));
    }

    #[tokio::test]
    async fn test_record_sale_without_register() {
        let till = service().await;

        assert!(!till.record_sale(Money::new(2700)).await.unwrap());
        assert!(till.get_register().await.unwrap().is_none());
        assert!(till.get_history().await.unwrap().is_empty());
    }
}
