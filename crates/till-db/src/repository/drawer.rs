//! # Drawer Repository
//!
//! Database operations for drawers, their ledger entries, and the audit
//! history.
//!
//! ## Two Method Flavors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-level reads (instance methods)                                    │
//! │     repo.get_by_id(..), repo.transactions_for_drawer(..)               │
//! │     Acquire a connection, run one query, release.                      │
//! │                                                                         │
//! │  Transaction-scoped operations (associated *_in functions)              │
//! │     DrawerRepository::insert_drawer_in(&mut *tx, ..)                   │
//! │     Take the caller's open sqlx transaction so a whole                 │
//! │     read-modify-write sequence commits or rolls back together.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Append-Only Ledger
//! There is intentionally no update or delete for `drawer_transactions`.
//! Corrections append new rows; history is never rewritten.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{
    ActionCategory, Drawer, DrawerHistoryEntry, DrawerStatus, DrawerTransaction, Money,
    PaymentMethod, TransactionKind,
};

// =============================================================================
// Row Mapping
// =============================================================================

const DRAWER_COLUMNS: &str = "id, status, opening_balance_cents, current_balance_cents, \
     opened_at, closed_at, cashier_id, cashier_name, notes, \
     total_sales_cents, total_expenses_cents, total_supplier_payments_cents, \
     cash_in_cents, cash_out_cents, net_sales_cents, net_cash_flow_cents, last_updated";

const TRANSACTION_COLUMNS: &str = "id, drawer_id, timestamp, kind, amount_cents, balance_cents, \
     description, action_category, reference, payment_method";

const HISTORY_COLUMNS: &str =
    "id, drawer_id, action_category, amount_cents, balance_cents, description, timestamp";

#[derive(Debug, sqlx::FromRow)]
struct DrawerRow {
    id: String,
    status: String,
    opening_balance_cents: i64,
    current_balance_cents: i64,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    cashier_id: String,
    cashier_name: String,
    notes: Option<String>,
    total_sales_cents: i64,
    total_expenses_cents: i64,
    total_supplier_payments_cents: i64,
    cash_in_cents: i64,
    cash_out_cents: i64,
    net_sales_cents: i64,
    net_cash_flow_cents: i64,
    last_updated: DateTime<Utc>,
}

impl TryFrom<DrawerRow> for Drawer {
    type Error = DbError;

    fn try_from(row: DrawerRow) -> DbResult<Drawer> {
        let status: DrawerStatus = row
            .status
            .parse()
            .map_err(|e: till_core::CoreError| DbError::CorruptRow(e.to_string()))?;

        Ok(Drawer {
            id: row.id,
            status,
            opening_balance: Money::from_cents(row.opening_balance_cents),
            current_balance: Money::from_cents(row.current_balance_cents),
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            cashier_id: row.cashier_id,
            cashier_name: row.cashier_name,
            notes: row.notes,
            total_sales: Money::from_cents(row.total_sales_cents),
            total_expenses: Money::from_cents(row.total_expenses_cents),
            total_supplier_payments: Money::from_cents(row.total_supplier_payments_cents),
            cash_in: Money::from_cents(row.cash_in_cents),
            cash_out: Money::from_cents(row.cash_out_cents),
            net_sales: Money::from_cents(row.net_sales_cents),
            net_cash_flow: Money::from_cents(row.net_cash_flow_cents),
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    drawer_id: String,
    timestamp: DateTime<Utc>,
    kind: String,
    amount_cents: i64,
    balance_cents: i64,
    description: String,
    action_category: String,
    reference: String,
    payment_method: String,
}

impl TryFrom<TransactionRow> for DrawerTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> DbResult<DrawerTransaction> {
        let kind: TransactionKind = row
            .kind
            .parse()
            .map_err(|e: till_core::CoreError| DbError::CorruptRow(e.to_string()))?;
        let action: ActionCategory = row
            .action_category
            .parse()
            .map_err(|e: till_core::CoreError| DbError::CorruptRow(e.to_string()))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e: till_core::CoreError| DbError::CorruptRow(e.to_string()))?;

        Ok(DrawerTransaction {
            id: row.id,
            drawer_id: row.drawer_id,
            timestamp: row.timestamp,
            kind,
            amount: Money::from_cents(row.amount_cents),
            balance: Money::from_cents(row.balance_cents),
            description: row.description,
            action,
            reference: row.reference,
            payment_method,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    drawer_id: String,
    action_category: String,
    amount_cents: i64,
    balance_cents: i64,
    description: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for DrawerHistoryEntry {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> DbResult<DrawerHistoryEntry> {
        let action: ActionCategory = row
            .action_category
            .parse()
            .map_err(|e: till_core::CoreError| DbError::CorruptRow(e.to_string()))?;

        Ok(DrawerHistoryEntry {
            id: row.id,
            drawer_id: row.drawer_id,
            action,
            amount: Money::from_cents(row.amount_cents),
            balance: Money::from_cents(row.balance_cents),
            description: row.description,
            timestamp: row.timestamp,
        })
    }
}

fn collect_drawers(rows: Vec<DrawerRow>) -> DbResult<Vec<Drawer>> {
    rows.into_iter().map(Drawer::try_from).collect()
}

fn collect_transactions(rows: Vec<TransactionRow>) -> DbResult<Vec<DrawerTransaction>> {
    rows.into_iter().map(DrawerTransaction::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for drawer database operations.
#[derive(Debug, Clone)]
pub struct DrawerRepository {
    pool: SqlitePool,
}

impl DrawerRepository {
    /// Creates a new DrawerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DrawerRepository { pool }
    }

    /// Returns the underlying pool (for ad-hoc queries and tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Pool-level reads
    // -------------------------------------------------------------------------

    /// Gets a drawer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Drawer>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Gets the single open drawer, if any.
    pub async fn open_drawer(&self) -> DbResult<Option<Drawer>> {
        let mut conn = self.pool.acquire().await?;
        Self::open_drawer_in(&mut conn).await
    }

    /// Gets all ledger entries for a drawer, oldest first.
    pub async fn transactions_for_drawer(
        &self,
        drawer_id: &str,
    ) -> DbResult<Vec<DrawerTransaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::transactions_for_drawer_in(&mut conn, drawer_id).await
    }

    /// Gets a drawer's ledger entries written on one calendar day.
    pub async fn transactions_on_day(
        &self,
        drawer_id: &str,
        day: NaiveDate,
    ) -> DbResult<Vec<DrawerTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM drawer_transactions \
             WHERE drawer_id = ?1 AND date(timestamp) = ?2 \
             ORDER BY timestamp ASC, rowid ASC"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(drawer_id)
            .bind(day)
            .fetch_all(&self.pool)
            .await?;
        collect_transactions(rows)
    }

    /// Gets ledger entries in a date range whose owning drawer is open.
    ///
    /// Closed-session entries are excluded from summaries.
    pub async fn transactions_for_open_drawers(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<DrawerTransaction>> {
        let sql = format!(
            "SELECT t.id, t.drawer_id, t.timestamp, t.kind, t.amount_cents, t.balance_cents, \
                    t.description, t.action_category, t.reference, t.payment_method \
             FROM drawer_transactions t \
             JOIN drawers d ON d.id = t.drawer_id \
             WHERE d.status = '{open}' \
               AND date(t.timestamp) >= ?1 AND date(t.timestamp) <= ?2 \
             ORDER BY t.timestamp ASC, t.rowid ASC",
            open = DrawerStatus::Open.as_str()
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        collect_transactions(rows)
    }

    /// Lists drawer sessions, newest first, optionally bounded by the
    /// calendar day they were opened on.
    pub async fn sessions(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> DbResult<Vec<Drawer>> {
        let sql = format!(
            "SELECT {DRAWER_COLUMNS} FROM drawers \
             WHERE (?1 IS NULL OR date(opened_at) >= ?1) \
               AND (?2 IS NULL OR date(opened_at) <= ?2) \
             ORDER BY opened_at DESC"
        );
        let rows: Vec<DrawerRow> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        collect_drawers(rows)
    }

    /// Gets audit history entries of one category in a time range,
    /// newest first.
    pub async fn history_by_category(
        &self,
        category: ActionCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<DrawerHistoryEntry>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM drawer_history \
             WHERE action_category = ?1 AND timestamp >= ?2 AND timestamp <= ?3 \
             ORDER BY timestamp DESC"
        );
        let rows: Vec<HistoryRow> = sqlx::query_as(&sql)
            .bind(category.as_str())
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DrawerHistoryEntry::try_from).collect()
    }

    /// Sums the signed amounts of one history category in a time range.
    pub async fn total_by_category(
        &self,
        category: ActionCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM drawer_history \
             WHERE action_category = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
        )
        .bind(category.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    // -------------------------------------------------------------------------
    // Transaction-scoped operations
    // -------------------------------------------------------------------------

    /// Gets a drawer by ID inside the caller's transaction.
    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Drawer>> {
        let sql = format!("SELECT {DRAWER_COLUMNS} FROM drawers WHERE id = ?1");
        let row: Option<DrawerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(Drawer::try_from).transpose()
    }

    /// Gets the single open drawer inside the caller's transaction.
    ///
    /// Orders by opened_at so a (theoretically impossible) second open
    /// row would still resolve deterministically.
    pub async fn open_drawer_in(conn: &mut SqliteConnection) -> DbResult<Option<Drawer>> {
        let sql = format!(
            "SELECT {DRAWER_COLUMNS} FROM drawers WHERE status = ?1 \
             ORDER BY opened_at DESC LIMIT 1"
        );
        let row: Option<DrawerRow> = sqlx::query_as(&sql)
            .bind(DrawerStatus::Open.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        row.map(Drawer::try_from).transpose()
    }

    /// Gets all ledger entries for a drawer, oldest first, inside the
    /// caller's transaction.
    pub async fn transactions_for_drawer_in(
        conn: &mut SqliteConnection,
        drawer_id: &str,
    ) -> DbResult<Vec<DrawerTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM drawer_transactions \
             WHERE drawer_id = ?1 ORDER BY timestamp ASC, rowid ASC"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(drawer_id)
            .fetch_all(&mut *conn)
            .await?;
        collect_transactions(rows)
    }

    /// Finds ledger entries whose reference matches either the raw
    /// external id or its `Transaction #<id>` form, oldest first.
    pub async fn transactions_by_reference_in(
        conn: &mut SqliteConnection,
        external_id: &str,
    ) -> DbResult<Vec<DrawerTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM drawer_transactions \
             WHERE reference = ?1 OR reference = 'Transaction #' || ?1 \
             ORDER BY timestamp ASC, rowid ASC"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(external_id)
            .fetch_all(&mut *conn)
            .await?;
        collect_transactions(rows)
    }

    /// Does the drawer already have a closing entry?
    pub async fn has_close_transaction_in(
        conn: &mut SqliteConnection,
        drawer_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM drawer_transactions WHERE drawer_id = ?1 AND kind = ?2",
        )
        .bind(drawer_id)
        .bind(TransactionKind::Close.as_str())
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    /// Inserts a new drawer row.
    ///
    /// The partial unique index on open status makes this the enforcement
    /// point for the single-open-drawer invariant.
    pub async fn insert_drawer_in(conn: &mut SqliteConnection, drawer: &Drawer) -> DbResult<()> {
        debug!(id = %drawer.id, cashier = %drawer.cashier_name, "Inserting drawer");

        sqlx::query(
            "INSERT INTO drawers ( \
                id, status, opening_balance_cents, current_balance_cents, \
                opened_at, closed_at, cashier_id, cashier_name, notes, \
                total_sales_cents, total_expenses_cents, total_supplier_payments_cents, \
                cash_in_cents, cash_out_cents, net_sales_cents, net_cash_flow_cents, \
                last_updated \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        )
        .bind(&drawer.id)
        .bind(drawer.status.as_str())
        .bind(drawer.opening_balance.cents())
        .bind(drawer.current_balance.cents())
        .bind(drawer.opened_at)
        .bind(drawer.closed_at)
        .bind(&drawer.cashier_id)
        .bind(&drawer.cashier_name)
        .bind(&drawer.notes)
        .bind(drawer.total_sales.cents())
        .bind(drawer.total_expenses.cents())
        .bind(drawer.total_supplier_payments.cents())
        .bind(drawer.cash_in.cents())
        .bind(drawer.cash_out.cents())
        .bind(drawer.net_sales.cents())
        .bind(drawer.net_cash_flow.cents())
        .bind(drawer.last_updated)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes back every mutable field of the drawer aggregate.
    pub async fn update_drawer_in(conn: &mut SqliteConnection, drawer: &Drawer) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE drawers SET \
                status = ?2, current_balance_cents = ?3, closed_at = ?4, notes = ?5, \
                total_sales_cents = ?6, total_expenses_cents = ?7, \
                total_supplier_payments_cents = ?8, cash_in_cents = ?9, cash_out_cents = ?10, \
                net_sales_cents = ?11, net_cash_flow_cents = ?12, last_updated = ?13 \
             WHERE id = ?1",
        )
        .bind(&drawer.id)
        .bind(drawer.status.as_str())
        .bind(drawer.current_balance.cents())
        .bind(drawer.closed_at)
        .bind(&drawer.notes)
        .bind(drawer.total_sales.cents())
        .bind(drawer.total_expenses.cents())
        .bind(drawer.total_supplier_payments.cents())
        .bind(drawer.cash_in.cents())
        .bind(drawer.cash_out.cents())
        .bind(drawer.net_sales.cents())
        .bind(drawer.net_cash_flow.cents())
        .bind(drawer.last_updated)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Drawer", &drawer.id));
        }

        Ok(())
    }

    /// Appends one immutable ledger entry.
    pub async fn insert_transaction_in(
        conn: &mut SqliteConnection,
        transaction: &DrawerTransaction,
    ) -> DbResult<()> {
        debug!(
            drawer_id = %transaction.drawer_id,
            kind = %transaction.kind,
            amount = %transaction.amount,
            "Appending ledger entry"
        );

        sqlx::query(
            "INSERT INTO drawer_transactions ( \
                id, drawer_id, timestamp, kind, amount_cents, balance_cents, \
                description, action_category, reference, payment_method \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&transaction.id)
        .bind(&transaction.drawer_id)
        .bind(transaction.timestamp)
        .bind(transaction.kind.as_str())
        .bind(transaction.amount.cents())
        .bind(transaction.balance.cents())
        .bind(&transaction.description)
        .bind(transaction.action.as_str())
        .bind(&transaction.reference)
        .bind(transaction.payment_method.as_str())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends one audit history entry.
    pub async fn insert_history_in(
        conn: &mut SqliteConnection,
        entry: &DrawerHistoryEntry,
    ) -> DbResult<()> {
        debug!(
            drawer_id = %entry.drawer_id,
            action = %entry.action,
            "Appending history entry"
        );

        sqlx::query(
            "INSERT INTO drawer_history ( \
                id, drawer_id, action_category, amount_cents, balance_cents, \
                description, timestamp \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&entry.id)
        .bind(&entry.drawer_id)
        .bind(entry.action.as_str())
        .bind(entry.amount.cents())
        .bind(entry.balance.cents())
        .bind(&entry.description)
        .bind(entry.timestamp)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
