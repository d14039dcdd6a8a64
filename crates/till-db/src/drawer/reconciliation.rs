//! # Reconciliation Engine
//!
//! Replays a drawer's transaction history to rebuild its aggregates,
//! verify balance integrity, and surface discrepancies.
//!
//! All the arithmetic lives in `till_core::ledger`; this module supplies
//! the rows and the atomic write-back.
//!
//! ## Two Folds, Two Starting Points
//! ```text
//! verify_balance:            fold from opening_balance ── compare stored
//! discrepancy_transactions:  fold from zero ──────────── compare snapshots
//! ```
//! The asymmetry is inherited behavior; see `till_core::ledger`.

use chrono::Utc;
use tracing::info;

use crate::drawer::{DrawerLedger, LedgerResult};
use crate::repository::drawer::DrawerRepository;
use till_core::{ledger, CoreError, Drawer, DrawerTransaction, Money};

pub use till_core::ledger::LedgerLine;

/// Replays and verifies drawer history.
pub struct ReconciliationEngine {
    ledger: DrawerLedger,
}

impl ReconciliationEngine {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        ReconciliationEngine { ledger }
    }

    /// Rebuilds the drawer's aggregates from its full history.
    ///
    /// Zeroes every aggregate, then replays each entry in timestamp
    /// order, re-deriving the running balance (same rule the processor
    /// used, including the Open reset) and the sales / expense /
    /// supplier-payment totals. The cash counters are reset and not
    /// re-derived by the replay.
    ///
    /// Idempotent: a second run over unchanged history writes identical
    /// values.
    ///
    /// ## Errors
    /// - `DrawerNotFound` when the id does not exist
    pub async fn recalculate_totals(&self, drawer_id: &str) -> LedgerResult<Drawer> {
        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let mut drawer = DrawerRepository::get_by_id_in(&mut tx, drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;
        let transactions =
            DrawerRepository::transactions_for_drawer_in(&mut tx, drawer_id).await?;

        drawer.reset_totals();
        let mut running = drawer.opening_balance;
        for t in &transactions {
            ledger::apply_replay_totals(&mut drawer, t.kind, t.amount);
            running = ledger::next_balance(t.kind, running, t.amount);
        }

        drawer.current_balance = running;
        drawer.recompute_net();
        drawer.last_updated = Utc::now();

        DrawerRepository::update_drawer_in(&mut tx, &drawer).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            drawer_id,
            balance = %drawer.current_balance,
            "Drawer totals recalculated"
        );
        self.ledger
            .publish("Recalculation", Money::zero(), "Drawer totals recalculated");

        Ok(drawer)
    }

    /// Verifies the stored balance against a replay from the opening
    /// balance, within one cent.
    ///
    /// ## Errors
    /// - `DrawerNotFound` when the id does not exist
    pub async fn verify_balance(&self, drawer_id: &str) -> LedgerResult<bool> {
        let repo = self.ledger.repository();
        let drawer = repo
            .get_by_id(drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;
        let transactions = repo.transactions_for_drawer(drawer_id).await?;

        let calculated = ledger::fold_balance(drawer.opening_balance, &transactions);
        Ok(calculated.approx_eq(drawer.current_balance))
    }

    /// Returns every entry whose recorded balance snapshot disagrees
    /// with the replayed value by more than one cent, newest first.
    pub async fn discrepancy_transactions(
        &self,
        drawer_id: &str,
    ) -> LedgerResult<Vec<DrawerTransaction>> {
        let transactions = self
            .ledger
            .repository()
            .transactions_for_drawer(drawer_id)
            .await?;
        Ok(ledger::find_discrepancies(&transactions))
    }

    /// The drawer's full history with display-reconstructed running
    /// balances, oldest first.
    pub async fn drawer_history(&self, drawer_id: &str) -> LedgerResult<Vec<LedgerLine>> {
        let transactions = self
            .ledger
            .repository()
            .transactions_for_drawer(drawer_id)
            .await?;
        Ok(ledger::running_balances(&transactions))
    }

    /// The balance the drawer should hold by cash flow:
    /// opening + cash_in - cash_out.
    pub async fn expected_balance(&self, drawer_id: &str) -> LedgerResult<Money> {
        let drawer = self.require_drawer(drawer_id).await?;
        Ok(drawer.expected_balance())
    }

    /// The stored current balance.
    pub async fn actual_balance(&self, drawer_id: &str) -> LedgerResult<Money> {
        let drawer = self.require_drawer(drawer_id).await?;
        Ok(drawer.current_balance)
    }

    /// Actual minus expected.
    pub async fn balance_difference(&self, drawer_id: &str) -> LedgerResult<Money> {
        let drawer = self.require_drawer(drawer_id).await?;
        Ok(drawer.current_balance - drawer.expected_balance())
    }

    async fn require_drawer(&self, drawer_id: &str) -> LedgerResult<Drawer> {
        Ok(self
            .ledger
            .repository()
            .get_by_id(drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::drawer::{DrawerLedger, LedgerError};
    use crate::events::NullPublisher;
    use crate::pool::{Database, DbConfig};
    use till_core::{CoreError, Money, TransactionKind};

    async fn ledger_with_activity() -> (DrawerLedger, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(Arc::new(NullPublisher));
        let drawer = ledger
            .session()
            .open(Money::from_cents(10000), "C1", "Alice")
            .await
            .unwrap();
        ledger
            .processor()
            .process_cash_sale(Money::from_cents(5000), "R1")
            .await
            .unwrap();
        ledger
            .processor()
            .process_expense(Money::from_cents(3000), "Rent", "rent")
            .await
            .unwrap();
        ledger
            .processor()
            .process_supplier_payment(Money::from_cents(1000), "Acme", "INV-1")
            .await
            .unwrap();
        (ledger, drawer.id)
    }

    #[tokio::test]
    async fn test_recalculate_rebuilds_totals_and_balance() {
        let (ledger, drawer_id) = ledger_with_activity().await;

        let drawer = ledger
            .reconciliation()
            .recalculate_totals(&drawer_id)
            .await
            .unwrap();

        assert_eq!(drawer.current_balance, Money::from_cents(11000));
        assert_eq!(drawer.total_sales, Money::from_cents(5000));
        assert_eq!(drawer.total_expenses, Money::from_cents(4000));
        assert_eq!(drawer.total_supplier_payments, Money::from_cents(1000));
        assert_eq!(drawer.net_cash_flow, Money::from_cents(1000));
        // The replay rebuilds totals only; cash counters stay reset.
        assert!(drawer.cash_in.is_zero());
        assert!(drawer.cash_out.is_zero());
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() {
        let (ledger, drawer_id) = ledger_with_activity().await;
        let engine = ledger.reconciliation();

        let first = engine.recalculate_totals(&drawer_id).await.unwrap();
        let second = engine.recalculate_totals(&drawer_id).await.unwrap();

        assert_eq!(first.current_balance, second.current_balance);
        assert_eq!(first.total_sales, second.total_sales);
        assert_eq!(first.total_expenses, second.total_expenses);
        assert_eq!(
            first.total_supplier_payments,
            second.total_supplier_payments
        );
    }

    #[tokio::test]
    async fn test_verify_after_recalculate_holds() {
        let (ledger, drawer_id) = ledger_with_activity().await;
        let engine = ledger.reconciliation();

        engine.recalculate_totals(&drawer_id).await.unwrap();
        assert!(engine.verify_balance(&drawer_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_detects_tampered_aggregate() {
        let (ledger, drawer_id) = ledger_with_activity().await;

        sqlx::query("UPDATE drawers SET current_balance_cents = current_balance_cents + 777")
            .execute(ledger.repository().pool())
            .await
            .unwrap();

        assert!(!ledger
            .reconciliation()
            .verify_balance(&drawer_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_discrepancy_scan_finds_tampered_snapshots() {
        let (ledger, drawer_id) = ledger_with_activity().await;
        let engine = ledger.reconciliation();

        assert!(engine
            .discrepancy_transactions(&drawer_id)
            .await
            .unwrap()
            .is_empty());

        // Tamper with one recorded snapshot.
        sqlx::query(
            "UPDATE drawer_transactions SET balance_cents = balance_cents + 500 WHERE kind = ?1",
        )
        .bind(TransactionKind::CashSale.as_str())
        .execute(ledger.repository().pool())
        .await
        .unwrap();

        let found = engine.discrepancy_transactions(&drawer_id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, TransactionKind::CashSale);
    }

    #[tokio::test]
    async fn test_drawer_history_reconstructs_balances() {
        let (ledger, drawer_id) = ledger_with_activity().await;

        let lines = ledger
            .reconciliation()
            .drawer_history(&drawer_id)
            .await
            .unwrap();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].resulting_balance, Money::from_cents(10000));
        assert_eq!(lines[1].resulting_balance, Money::from_cents(15000));
        assert_eq!(lines[2].resulting_balance, Money::from_cents(12000));
        assert_eq!(lines[3].resulting_balance, Money::from_cents(11000));
    }

    #[tokio::test]
    async fn test_balance_difference() {
        let (ledger, drawer_id) = ledger_with_activity().await;
        let engine = ledger.reconciliation();

        // expected = 100.00 + 50.00 - 40.00 = 110.00, actual = 110.00
        assert_eq!(
            engine.expected_balance(&drawer_id).await.unwrap(),
            Money::from_cents(11000)
        );
        assert_eq!(
            engine.actual_balance(&drawer_id).await.unwrap(),
            Money::from_cents(11000)
        );
        assert_eq!(
            engine.balance_difference(&drawer_id).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_unknown_drawer_fails() {
        let (ledger, _) = ledger_with_activity().await;

        let err = ledger
            .reconciliation()
            .recalculate_totals("missing")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::DrawerNotFound(_))
        ));
    }
}
