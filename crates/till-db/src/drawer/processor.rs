//! # Transaction Processor
//!
//! Validates and applies a single ledger entry, updates the drawer
//! aggregates, and persists both atomically.
//!
//! ## The One Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_transaction(amount, kind, description, reference)             │
//! │                                                                         │
//! │  1. Fetch the open drawer            → NoOpenDrawer                    │
//! │  2. amount > 0                       → InvalidAmount                   │
//! │     outgoing ⇒ amount ≤ balance      → InsufficientFunds               │
//! │  3. adjusted = ±|amount| by classification                             │
//! │  4. new balance (Open kind RESETS to |amount|)                         │
//! │  5. build immutable entry (reference-enhanced description)             │
//! │  6. update aggregates (sales / expenses / cash counters)               │
//! │  7. persist entry + drawer together, commit                            │
//! │  8. publish (kind, adjusted, description)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Receipts and supplier invoices run through this exact path too; they
//! are wrappers, not parallel implementations, so they share the guards
//! and the atomic boundary.

use chrono::Utc;
use tracing::info;

use crate::drawer::{new_transaction, DrawerLedger, LedgerResult};
use crate::repository::drawer::DrawerRepository;
use till_core::{ledger, CoreError, Drawer, Money, TransactionKind};

/// Applies ledger entries to the open drawer.
pub struct TransactionProcessor {
    ledger: DrawerLedger,
}

impl TransactionProcessor {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        TransactionProcessor { ledger }
    }

    /// Validates and applies one ledger entry against the open drawer.
    ///
    /// ## Errors
    /// - `NoOpenDrawer` when no session is open
    /// - `InvalidAmount` when `amount` is not positive
    /// - `InsufficientFunds` when an outgoing amount exceeds the balance
    pub async fn process_transaction(
        &self,
        amount: Money,
        kind: TransactionKind,
        description: &str,
        reference: &str,
    ) -> LedgerResult<Drawer> {
        let _gate = self.ledger.lock_writes().await;
        let mut tx = self.ledger.begin().await?;

        let mut drawer = DrawerRepository::open_drawer_in(&mut tx)
            .await?
            .ok_or(CoreError::NoOpenDrawer)?;

        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount.into());
        }
        let config = kind.config();
        if !config.is_incoming && amount.abs() > drawer.current_balance {
            return Err(CoreError::InsufficientFunds {
                requested: amount.abs(),
                available: drawer.current_balance,
            }
            .into());
        }

        let adjusted = ledger::adjusted_amount(kind, amount);
        let new_balance = ledger::next_balance(kind, drawer.current_balance, adjusted);
        let description = ledger::enhance_description(description, reference);

        let entry = new_transaction(
            &drawer.id,
            kind,
            adjusted,
            new_balance,
            description.clone(),
            reference.to_string(),
        );

        ledger::apply_transaction_totals(&mut drawer, kind, amount);
        drawer.current_balance = new_balance;
        drawer.last_updated = Utc::now();

        DrawerRepository::insert_transaction_in(&mut tx, &entry).await?;
        DrawerRepository::update_drawer_in(&mut tx, &drawer).await?;
        tx.commit().await.map_err(crate::error::DbError::from)?;

        info!(
            drawer_id = %drawer.id,
            kind = %kind,
            amount = %adjusted,
            balance = %new_balance,
            "Ledger entry applied"
        );
        self.ledger.publish(kind.label(), adjusted, &description);

        Ok(drawer)
    }

    // -------------------------------------------------------------------------
    // Typed wrappers
    // -------------------------------------------------------------------------

    /// Records a cash sale.
    pub async fn process_cash_sale(&self, amount: Money, reference: &str) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::CashSale,
            "Cash sale transaction",
            reference,
        )
        .await
    }

    /// Records a general expense; `expense_type` rides along as the
    /// reference for later correlation.
    pub async fn process_expense(
        &self,
        amount: Money,
        expense_type: &str,
        description: &str,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(amount, TransactionKind::Expense, description, expense_type)
            .await
    }

    /// Records a payment to a supplier.
    pub async fn process_supplier_payment(
        &self,
        amount: Money,
        supplier_name: &str,
        reference: &str,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::SupplierPayment,
            &format!("Payment to supplier: {supplier_name}"),
            reference,
        )
        .await
    }

    /// Records a payment received against a quote.
    pub async fn process_quote_payment(
        &self,
        amount: Money,
        customer_name: &str,
        quote_number: &str,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::QuotePayment,
            &format!("Quote payment from {customer_name}"),
            quote_number,
        )
        .await
    }

    /// Records a payment received against a customer account.
    pub async fn process_cash_receipt(
        &self,
        amount: Money,
        description: &str,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(amount, TransactionKind::CashReceipt, description, "")
            .await
    }

    /// Records a supplier invoice settled in cash from the drawer.
    pub async fn process_supplier_invoice(
        &self,
        amount: Money,
        supplier_name: &str,
        reference: &str,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::Expense,
            &format!("Supplier Invoice Payment: {supplier_name}"),
            reference,
        )
        .await
    }

    /// Adds loose cash to the drawer (float top-up, change run).
    pub async fn process_cash_in(
        &self,
        amount: Money,
        description: Option<&str>,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::CashIn,
            description.unwrap_or("Cash added to drawer"),
            "",
        )
        .await
    }

    /// Removes loose cash from the drawer (bank drop, till skim).
    pub async fn process_cash_out(
        &self,
        amount: Money,
        description: Option<&str>,
    ) -> LedgerResult<Drawer> {
        self.process_transaction(
            amount,
            TransactionKind::CashOut,
            description.unwrap_or("Cash removed from drawer"),
            "",
        )
        .await
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

    async fn open_ledger(opening_cents: i64) -> DrawerLedger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(Arc::new(NullPublisher));
        ledger
            .session()
            .open(Money::from_cents(opening_cents), "C1", "Alice")
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_cash_sale_updates_balance_and_totals() {
        let ledger = open_ledger(10000).await;

        let drawer = ledger
            .processor()
            .process_cash_sale(Money::from_cents(5000), "R1")
            .await
            .unwrap();

        assert_eq!(drawer.current_balance, Money::from_cents(15000));
        assert_eq!(drawer.total_sales, Money::from_cents(5000));
        assert_eq!(drawer.cash_in, Money::from_cents(5000));
        assert_eq!(drawer.net_sales, Money::from_cents(5000));
        assert_eq!(drawer.net_cash_flow, Money::from_cents(5000));

        let entries = ledger
            .repository()
            .transactions_for_drawer(&drawer.id)
            .await
            .unwrap();
        let sale = entries
            .iter()
            .find(|t| t.kind == TransactionKind::CashSale)
            .unwrap();
        assert_eq!(sale.amount, Money::from_cents(5000));
        assert_eq!(sale.balance, Money::from_cents(15000));
        assert_eq!(sale.description, "Cash sale transaction (R1)");
        assert_eq!(sale.reference, "R1");
    }

    #[tokio::test]
    async fn test_expense_updates_balance_and_totals() {
        let ledger = open_ledger(15000).await;

        let drawer = ledger
            .processor()
            .process_expense(Money::from_cents(3000), "Rent", "rent")
            .await
            .unwrap();

        assert_eq!(drawer.current_balance, Money::from_cents(12000));
        assert_eq!(drawer.total_expenses, Money::from_cents(3000));
        assert_eq!(drawer.cash_out, Money::from_cents(3000));
        assert_eq!(drawer.net_cash_flow, Money::from_cents(-3000));

        // The ledger entry carries the signed (negative) amount.
        let entries = ledger
            .repository()
            .transactions_for_drawer(&drawer.id)
            .await
            .unwrap();
        let expense = entries
            .iter()
            .find(|t| t.kind == TransactionKind::Expense)
            .unwrap();
        assert_eq!(expense.amount, Money::from_cents(-3000));
    }

    #[tokio::test]
    async fn test_outgoing_beyond_balance_fails() {
        let ledger = open_ledger(12000).await;

        let err = ledger
            .processor()
            .process_expense(Money::from_cents(20000), "Rent", "rent")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientFunds { .. })
        ));

        // Nothing was committed.
        let drawer = ledger.session().current_drawer().await.unwrap().unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(12000));
        assert!(drawer.total_expenses.is_zero());
    }

    #[tokio::test]
    async fn test_non_positive_amount_fails() {
        let ledger = open_ledger(10000).await;

        let err = ledger
            .processor()
            .process_cash_sale(Money::zero(), "R1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::InvalidAmount)));
    }

    #[tokio::test]
    async fn test_no_open_drawer_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger(Arc::new(NullPublisher));

        let err = ledger
            .processor()
            .process_cash_sale(Money::from_cents(5000), "R1")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::NoOpenDrawer)));
    }

    #[tokio::test]
    async fn test_cash_receipt_shares_the_guards() {
        // The receipt path is a wrapper over process_transaction, so the
        // amount guard applies there too.
        let ledger = open_ledger(10000).await;

        let err = ledger
            .processor()
            .process_cash_receipt(Money::from_cents(-500), "account payment")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::InvalidAmount)));

        let drawer = ledger
            .processor()
            .process_cash_receipt(Money::from_cents(2500), "account payment")
            .await
            .unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(12500));
        assert_eq!(drawer.total_sales, Money::from_cents(2500));
    }

    #[tokio::test]
    async fn test_supplier_invoice_shares_the_guards() {
        let ledger = open_ledger(1000).await;

        let err = ledger
            .processor()
            .process_supplier_invoice(Money::from_cents(5000), "Acme", "INV-7")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientFunds { .. })
        ));

        let drawer = ledger
            .processor()
            .process_supplier_invoice(Money::from_cents(400), "Acme", "INV-7")
            .await
            .unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(600));
        assert_eq!(drawer.total_expenses, Money::from_cents(400));

        let entries = ledger
            .repository()
            .transactions_for_drawer(&drawer.id)
            .await
            .unwrap();
        let invoice = entries
            .iter()
            .find(|t| t.kind == TransactionKind::Expense)
            .unwrap();
        assert!(invoice.description.starts_with("Supplier Invoice Payment: Acme"));
    }

    #[tokio::test]
    async fn test_cash_in_and_out_touch_only_cash_counters() {
        let ledger = open_ledger(10000).await;
        let processor = ledger.processor();

        let drawer = processor
            .process_cash_in(Money::from_cents(2000), None)
            .await
            .unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(12000));
        assert_eq!(drawer.cash_in, Money::from_cents(2000));
        assert!(drawer.total_sales.is_zero());

        let drawer = processor
            .process_cash_out(Money::from_cents(1500), Some("bank drop"))
            .await
            .unwrap();
        assert_eq!(drawer.current_balance, Money::from_cents(10500));
        assert_eq!(drawer.cash_out, Money::from_cents(1500));
        assert!(drawer.total_expenses.is_zero());
    }

    #[tokio::test]
    async fn test_quote_payment_counts_as_sales() {
        let ledger = open_ledger(10000).await;

        let drawer = ledger
            .processor()
            .process_quote_payment(Money::from_cents(7500), "Dana", "Q-12")
            .await
            .unwrap();

        assert_eq!(drawer.current_balance, Money::from_cents(17500));
        assert_eq!(drawer.total_sales, Money::from_cents(7500));
        assert_eq!(drawer.cash_in, Money::from_cents(7500));
    }

    #[tokio::test]
    async fn test_hash_reference_is_appended_from_marker() {
        let ledger = open_ledger(10000).await;

        let drawer = ledger
            .processor()
            .process_cash_sale(Money::from_cents(1000), "Transaction #42")
            .await
            .unwrap();

        let entries = ledger
            .repository()
            .transactions_for_drawer(&drawer.id)
            .await
            .unwrap();
        let sale = entries
            .iter()
            .find(|t| t.kind == TransactionKind::CashSale)
            .unwrap();
        assert_eq!(sale.description, "Cash sale transaction #42");
    }
}
