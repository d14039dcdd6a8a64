//! # Drawer Audit
//!
//! The audit trail beside the ledger: action logging, manual balance
//! adjustments, and cashier access validation.
//!
//! Audit records go to `drawer_history`, not the transaction ledger, so
//! the ledger keeps holding only real cash movements and lifecycle
//! anchors while category reports read the history table.

use chrono::Utc;
use tracing::{info, warn};

use crate::drawer::{new_history_entry, DrawerLedger, LedgerError, LedgerResult};
use crate::repository::drawer::DrawerRepository;
use till_core::{ActionCategory, CoreError, Drawer, Money};

/// Audit-trail operations for drawers.
pub struct DrawerAudit {
    ledger: DrawerLedger,
}

impl DrawerAudit {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        DrawerAudit { ledger }
    }

    /// Logs a zero-amount action against a drawer at its current balance
    /// and publishes an event.
    ///
    /// ## Errors
    /// - `DrawerNotFound` when the id does not exist
    pub async fn log_action(
        &self,
        drawer_id: &str,
        category: ActionCategory,
        description: &str,
    ) -> LedgerResult<()> {
        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let drawer = DrawerRepository::get_by_id_in(&mut tx, drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;

        let entry = new_history_entry(
            drawer_id,
            category,
            Money::zero(),
            drawer.current_balance,
            description.to_string(),
        );
        DrawerRepository::insert_history_in(&mut tx, &entry).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        self.ledger
            .publish(category.label(), Money::zero(), description);
        Ok(())
    }

    /// Convenience wrapper: logs an audit-category note.
    pub async fn log_audit(
        &self,
        drawer_id: &str,
        action: &str,
        description: &str,
    ) -> LedgerResult<()> {
        self.log_action(
            drawer_id,
            ActionCategory::Audit,
            &format!("{action}: {description}"),
        )
        .await
    }

    /// Overrides a drawer's balance, recording the delta in the audit
    /// trail.
    ///
    /// ## Errors
    /// - `DrawerNotFound` when the id does not exist
    pub async fn adjust_balance(
        &self,
        drawer_id: &str,
        new_balance: Money,
        reason: &str,
    ) -> LedgerResult<Drawer> {
        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let mut drawer = DrawerRepository::get_by_id_in(&mut tx, drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;

        let adjustment = new_balance - drawer.current_balance;
        drawer.current_balance = new_balance;
        drawer.last_updated = Utc::now();

        DrawerRepository::update_drawer_in(&mut tx, &drawer).await?;
        let entry = new_history_entry(
            drawer_id,
            ActionCategory::BalanceAdjustment,
            adjustment,
            new_balance,
            reason.to_string(),
        );
        DrawerRepository::insert_history_in(&mut tx, &entry).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            drawer_id,
            adjustment = %adjustment,
            new_balance = %new_balance,
            "Drawer balance adjusted"
        );
        self.ledger
            .publish(ActionCategory::BalanceAdjustment.label(), adjustment, reason);

        Ok(drawer)
    }

    /// Checks that a cashier owns a drawer, failing otherwise.
    ///
    /// A mismatch records an Audit history entry before the error is
    /// reported, so unauthorized attempts leave a trail.
    ///
    /// ## Errors
    /// - `DrawerNotFound` when the id does not exist
    /// - `UnauthorizedAccess` when the drawer belongs to another cashier
    pub async fn require_access(&self, cashier_id: &str, drawer_id: &str) -> LedgerResult<()> {
        let drawer = self
            .ledger
            .repository()
            .get_by_id(drawer_id)
            .await?
            .ok_or_else(|| CoreError::DrawerNotFound(drawer_id.to_string()))?;

        if drawer.cashier_id == cashier_id {
            return Ok(());
        }

        warn!(
            cashier_id,
            drawer_id, "Unauthorized drawer access attempt"
        );
        self.log_audit(
            drawer_id,
            "Access Validation",
            &format!("Unauthorized access attempt by cashier {cashier_id}"),
        )
        .await?;

        Err(CoreError::UnauthorizedAccess {
            cashier_id: cashier_id.to_string(),
            drawer_id: drawer_id.to_string(),
        }
        .into())
    }

    /// Boolean form of [`DrawerAudit::require_access`]: false for an
    /// unknown drawer or a cashier mismatch, never an access error.
    pub async fn validate_access(&self, cashier_id: &str, drawer_id: &str) -> LedgerResult<bool> {
        match self.require_access(cashier_id, drawer_id).await {
            Ok(()) => Ok(true),
            Err(LedgerError::Core(
                CoreError::UnauthorizedAccess { .. } | CoreError::DrawerNotFound(_),
            )) => Ok(false),
            Err(other) => Err(other),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use crate::drawer::{DrawerLedger, LedgerError};
    use crate::events::NullPublisher;
    use crate::pool::{Database, DbConfig};
    use till_core::{ActionCategory, CoreError, Money};

    async fn open_ledger() -> (DrawerLedger, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(Arc::new(NullPublisher));
        let drawer = ledger
            .session()
            .open(Money::from_cents(10000), "C1", "Alice")
            .await
            .unwrap();
        (ledger, drawer.id)
    }

    #[tokio::test]
    async fn test_log_action_requires_existing_drawer() {
        let (ledger, _) = open_ledger().await;

        let err = ledger
            .audit()
            .log_action("missing", ActionCategory::Audit, "note")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::DrawerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_adjust_balance_records_delta() {
        let (ledger, drawer_id) = open_ledger().await;

        let drawer = ledger
            .audit()
            .adjust_balance(&drawer_id, Money::from_cents(9500), "shortfall at count")
            .await
            .unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(9500));

        let start = Utc::now() - Duration::hours(1);
        let end = Utc::now() + Duration::hours(1);
        let entries = ledger
            .reports()
            .history_by_category(ActionCategory::BalanceAdjustment, start, end)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, Money::from_cents(-500));
        assert_eq!(entries[0].balance, Money::from_cents(9500));
    }

    #[tokio::test]
    async fn test_require_access_fails_for_other_cashier() {
        let (ledger, drawer_id) = open_ledger().await;
        let audit = ledger.audit();

        audit.require_access("C1", &drawer_id).await.unwrap();

        let err = audit.require_access("C2", &drawer_id).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::UnauthorizedAccess { .. })
        ));

        let err = audit.require_access("C1", "missing").await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::DrawerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_access() {
        let (ledger, drawer_id) = open_ledger().await;
        let audit = ledger.audit();

        assert!(audit.validate_access("C1", &drawer_id).await.unwrap());
        assert!(!audit.validate_access("C2", &drawer_id).await.unwrap());
        assert!(!audit.validate_access("C1", "missing").await.unwrap());

        // The rejected attempt left an audit entry.
        let start = Utc::now() - Duration::hours(1);
        let end = Utc::now() + Duration::hours(1);
        let entries = ledger
            .reports()
            .history_by_category(ActionCategory::Audit, start, end)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]
            .description
            .contains("Unauthorized access attempt by cashier C2"));
    }
}
