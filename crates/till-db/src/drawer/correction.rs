//! # Correction Handler
//!
//! Adjusts previously recorded aggregates when an external sale or
//! expense is modified after the fact.
//!
//! A correction never edits the original ledger entry. It applies the
//! signed delta to the drawer and appends a new entry tagged
//! `Transaction Modification`, preserving the audit trail.

use chrono::Utc;
use tracing::{debug, info};

use crate::drawer::{new_transaction, DrawerLedger, LedgerResult};
use crate::repository::drawer::DrawerRepository;
use till_core::{ledger, ActionCategory, CoreError, Money, BALANCE_EPSILON};

/// Handles post-hoc corrections for modified external transactions.
pub struct CorrectionHandler {
    ledger: DrawerLedger,
}

impl CorrectionHandler {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        CorrectionHandler { ledger }
    }

    /// Reconciles the drawer with a sale/expense whose amount changed
    /// from `old_amount` to `new_amount`.
    ///
    /// ## Returns
    /// - `Ok(true)` when the correction was applied, or when the delta
    ///   is below one cent (nothing to do)
    /// - `Ok(false)` when no ledger entry references `transaction_id`;
    ///   a missing correction target is a result, not an error
    ///
    /// ## What Gets Adjusted
    /// The delta moves the balance always; by the kind of the matched
    /// entry it also moves sales + cash-in (cash sale) or expenses +
    /// cash-out (expense, supplier payment). Any other kind adjusts the
    /// balance only.
    pub async fn update_for_modified_sale(
        &self,
        transaction_id: &str,
        old_amount: Money,
        new_amount: Money,
        description: &str,
    ) -> LedgerResult<bool> {
        let delta = new_amount - old_amount;
        if delta.abs() < BALANCE_EPSILON {
            debug!(
                transaction_id,
                "Correction delta below tolerance, nothing to do"
            );
            return Ok(true);
        }

        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let mut drawer = DrawerRepository::open_drawer_in(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenDrawer)?;

        let matches =
            DrawerRepository::transactions_by_reference_in(&mut tx, transaction_id).await?;
        let Some(original) = matches.first() else {
            debug!(transaction_id, "No ledger entry references this id");
            return Ok(false);
        };

        ledger::apply_modification(&mut drawer, original.kind, delta);
        drawer.last_updated = Utc::now();

        let mut entry = new_transaction(
            &drawer.id,
            original.kind,
            delta,
            drawer.current_balance,
            ledger::modification_description(description, transaction_id),
            format!("Transaction #{transaction_id} (Modified)"),
        );
        entry.action = ActionCategory::TransactionModification;

        DrawerRepository::insert_transaction_in(&mut tx, &entry).await?;
        DrawerRepository::update_drawer_in(&mut tx, &drawer).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            drawer_id = %drawer.id,
            transaction_id,
            delta = %delta,
            "Correction applied"
        );
        self.ledger.publish(
            ActionCategory::TransactionModification.label(),
            delta,
            &entry.description,
        );

        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::drawer::DrawerLedger;
    use crate::events::NullPublisher;
    use crate::pool::{Database, DbConfig};
    use till_core::{ActionCategory, Money, TransactionKind};

    async fn open_ledger() -> DrawerLedger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(Arc::new(NullPublisher));
        ledger
            .session()
            .open(Money::from_cents(10000), "C1", "Alice")
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_modified_sale_adjusts_aggregates_and_appends_entry() {
        let ledger = open_ledger().await;
        ledger
            .processor()
            .process_cash_sale(Money::from_cents(5000), "42")
            .await
            .unwrap();

        let applied = ledger
            .corrections()
            .update_for_modified_sale(
                "42",
                Money::from_cents(5000),
                Money::from_cents(7000),
                "price correction",
            )
            .await
            .unwrap();
        assert!(applied);

        let drawer = ledger.session().current_drawer().await.unwrap().unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(17000));
        assert_eq!(drawer.total_sales, Money::from_cents(7000));
        assert_eq!(drawer.cash_in, Money::from_cents(7000));

        let entries = ledger
            .repository()
            .transactions_for_drawer(&drawer.id)
            .await
            .unwrap();
        let modification = entries
            .iter()
            .find(|t| t.action == ActionCategory::TransactionModification)
            .unwrap();
        assert_eq!(modification.kind, TransactionKind::CashSale);
        assert_eq!(modification.amount, Money::from_cents(2000));
        assert_eq!(modification.balance, Money::from_cents(17000));
        assert_eq!(modification.reference, "Transaction #42 (Modified)");
        assert_eq!(
            modification.description,
            "price correction (Transaction #42)"
        );
    }

    #[tokio::test]
    async fn test_modified_expense_moves_expense_totals() {
        let ledger = open_ledger().await;
        ledger
            .processor()
            .process_expense(Money::from_cents(3000), "Rent", "7")
            .await
            .unwrap();

        let applied = ledger
            .corrections()
            .update_for_modified_sale("7", Money::from_cents(3000), Money::from_cents(2500), "")
            .await
            .unwrap();
        assert!(applied);

        let drawer = ledger.session().current_drawer().await.unwrap().unwrap();
        // Expense shrank by 5.00, so the balance and totals come back down.
        assert_eq!(drawer.current_balance, Money::from_cents(6500));
        assert_eq!(drawer.total_expenses, Money::from_cents(2500));
        assert_eq!(drawer.cash_out, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_sub_cent_delta_is_a_no_op() {
        let ledger = open_ledger().await;
        ledger
            .processor()
            .process_cash_sale(Money::from_cents(5000), "42")
            .await
            .unwrap();
        let before = ledger.session().current_drawer().await.unwrap().unwrap();
        let entry_count = ledger
            .repository()
            .transactions_for_drawer(&before.id)
            .await
            .unwrap()
            .len();

        let applied = ledger
            .corrections()
            .update_for_modified_sale(
                "42",
                Money::from_cents(5000),
                Money::from_cents(5000),
                "no change",
            )
            .await
            .unwrap();
        assert!(applied);

        let after = ledger.session().current_drawer().await.unwrap().unwrap();
        assert_eq!(after.current_balance, before.current_balance);
        assert_eq!(after.total_sales, before.total_sales);
        assert_eq!(
            ledger
                .repository()
                .transactions_for_drawer(&after.id)
                .await
                .unwrap()
                .len(),
            entry_count
        );
    }

    #[tokio::test]
    async fn test_unmatched_reference_returns_false() {
        let ledger = open_ledger().await;

        let applied = ledger
            .corrections()
            .update_for_modified_sale(
                "999",
                Money::from_cents(1000),
                Money::from_cents(2000),
                "orphan",
            )
            .await
            .unwrap();
        assert!(!applied);

        // Nothing changed.
        let drawer = ledger.session().current_drawer().await.unwrap().unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(10000));
    }

    #[tokio::test]
    async fn test_matches_formatted_reference_form() {
        let ledger = open_ledger().await;
        // The sale was recorded with the formatted reference.
        ledger
            .processor()
            .process_cash_sale(Money::from_cents(4000), "Transaction #88")
            .await
            .unwrap();

        let applied = ledger
            .corrections()
            .update_for_modified_sale(
                "88",
                Money::from_cents(4000),
                Money::from_cents(4500),
                "repriced",
            )
            .await
            .unwrap();
        assert!(applied);

        let drawer = ledger.session().current_drawer().await.unwrap().unwrap();
        assert_eq!(drawer.total_sales, Money::from_cents(4500));
    }
}
