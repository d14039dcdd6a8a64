//! # Drawer Session Manager
//!
//! Owns the open/close lifecycle of the single active drawer.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Drawer Lifecycle                                  │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open(float, cashier) → Drawer { status: Open }                 │
//! │     └── anchoring "Open" entry (amount = balance = float)              │
//! │                                                                         │
//! │  2. TRANSACT (TransactionProcessor)                                    │
//! │     └── sales, expenses, cash in/out append entries                    │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close(counted, notes) → Drawer { status: Closed }              │
//! │     └── "Close" entry (unless one exists), discrepancy event           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use crate::drawer::{new_transaction, DrawerLedger, LedgerResult};
use crate::repository::drawer::DrawerRepository;
use till_core::{
    validation, CoreError, Drawer, DrawerStatus, Money, TransactionKind,
};

/// Manages the open/close lifecycle of the active drawer.
pub struct DrawerSessionManager {
    ledger: DrawerLedger,
}

impl DrawerSessionManager {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        DrawerSessionManager { ledger }
    }

    /// Opens a new drawer session.
    ///
    /// Creates the drawer with current = opening balance, zeroed
    /// aggregates, and appends the anchoring "Open" entry whose amount
    /// and balance both equal the opening balance, all in one
    /// transaction.
    ///
    /// ## Errors
    /// - `Validation` when cashier id or name is empty
    /// - `DrawerAlreadyOpen` when any open drawer exists (backstopped by
    ///   the partial unique index, so a racing open loses cleanly)
    pub async fn open(
        &self,
        opening_balance: Money,
        cashier_id: &str,
        cashier_name: &str,
    ) -> LedgerResult<Drawer> {
        validation::validate_cashier_id(cashier_id)?;
        validation::validate_cashier_name(cashier_name)?;

        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        if DrawerRepository::open_drawer_in(&mut tx).await?.is_some() {
            return Err(CoreError::DrawerAlreadyOpen.into());
        }

        let now = Utc::now();
        let drawer = Drawer {
            id: uuid::Uuid::new_v4().to_string(),
            status: DrawerStatus::Open,
            opening_balance,
            current_balance: opening_balance,
            opened_at: now,
            closed_at: None,
            cashier_id: cashier_id.to_string(),
            cashier_name: cashier_name.to_string(),
            notes: None,
            total_sales: Money::zero(),
            total_expenses: Money::zero(),
            total_supplier_payments: Money::zero(),
            cash_in: Money::zero(),
            cash_out: Money::zero(),
            net_sales: Money::zero(),
            net_cash_flow: Money::zero(),
            last_updated: now,
        };

        DrawerRepository::insert_drawer_in(&mut tx, &drawer)
            .await
            .map_err(|e| match e {
                // A concurrent open slipped past the pre-check; the
                // partial unique index caught it.
                crate::error::DbError::UniqueViolation { .. } => {
                    crate::drawer::LedgerError::Core(CoreError::DrawerAlreadyOpen)
                }
                other => other.into(),
            })?;

        let description = format!("Drawer opened by {cashier_name}");
        let opening_entry = new_transaction(
            &drawer.id,
            TransactionKind::Open,
            opening_balance,
            opening_balance,
            description.clone(),
            String::new(),
        );
        DrawerRepository::insert_transaction_in(&mut tx, &opening_entry).await?;

        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            drawer_id = %drawer.id,
            cashier = %cashier_name,
            opening_balance = %opening_balance,
            "Drawer opened"
        );
        self.ledger
            .publish(TransactionKind::Open.label(), opening_balance, &description);

        Ok(drawer)
    }

    /// Closes the open drawer session.
    ///
    /// Appends a "Close" entry (amount = balance = counted final
    /// balance) unless one already exists for this drawer, marks the
    /// session Closed, and publishes a close event describing the
    /// surplus or shortage against the expected balance.
    ///
    /// ## Errors
    /// - `NoOpenDrawer` when no session is open
    pub async fn close(&self, final_balance: Money, notes: Option<&str>) -> LedgerResult<Drawer> {
        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let mut drawer = DrawerRepository::open_drawer_in(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenDrawer)?;

        if !DrawerRepository::has_close_transaction_in(&mut tx, &drawer.id).await? {
            let description = format!(
                "Drawer closed by {} with final balance of {}",
                drawer.cashier_name, final_balance
            );
            let closing_entry = new_transaction(
                &drawer.id,
                TransactionKind::Close,
                final_balance,
                final_balance,
                description,
                String::new(),
            );
            DrawerRepository::insert_transaction_in(&mut tx, &closing_entry).await?;
        }

        let now = Utc::now();
        drawer.current_balance = final_balance;
        drawer.closed_at = Some(now);
        drawer.status = DrawerStatus::Closed;
        drawer.notes = notes.map(str::to_string);
        drawer.last_updated = now;

        DrawerRepository::update_drawer_in(&mut tx, &drawer).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        // Discrepancy against cash flow: counted minus (opening + in - out).
        let difference = final_balance - drawer.expected_balance();
        let description = format!(
            "Drawer closed by {} with {} of {}",
            drawer.cashier_name,
            if difference.is_negative() {
                "shortage"
            } else {
                "surplus"
            },
            difference.abs()
        );

        info!(
            drawer_id = %drawer.id,
            final_balance = %final_balance,
            difference = %difference,
            "Drawer closed"
        );
        self.ledger
            .publish(TransactionKind::Close.label(), difference, &description);

        Ok(drawer)
    }

    /// Gets the open drawer, if any.
    pub async fn current_drawer(&self) -> LedgerResult<Option<Drawer>> {
        Ok(self.ledger.repository().open_drawer().await?)
    }

    /// Gets the open drawer's balance, or zero when none is open.
    pub async fn current_balance(&self) -> LedgerResult<Money> {
        Ok(self
            .current_drawer()
            .await?
            .map(|d| d.current_balance)
            .unwrap_or_default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
