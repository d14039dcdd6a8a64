//! # Domain Types
//!
//! Core domain types for the drawer ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌───────────────────┐   ┌───────────────────┐   │
//! │  │     Drawer      │   │ DrawerTransaction │   │ DrawerHistoryEntry│   │
//! │  │  ─────────────  │ 1:N  ─────────────    │   │  ─────────────    │   │
//! │  │  id (UUID)      │◄──│  drawer_id (FK)   │   │  drawer_id (FK)   │   │
//! │  │  status         │   │  kind             │   │  action           │   │
//! │  │  balances       │   │  amount (signed)  │   │  amount           │   │
//! │  │  aggregates     │   │  balance-after    │   │  description      │   │
//! │  └─────────────────┘   └───────────────────┘   └───────────────────┘   │
//! │                                                                         │
//! │  The Drawer is the mutable aggregate; DrawerTransaction rows are       │
//! │  immutable once written (corrections append, never edit).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;
use crate::registry::{ActionCategory, TransactionKind};

// =============================================================================
// Drawer Status
// =============================================================================

/// Lifecycle state of a drawer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawerStatus {
    Open,
    Closed,
}

impl DrawerStatus {
    /// Canonical storage token.
    pub const fn as_str(self) -> &'static str {
        match self {
            DrawerStatus::Open => "open",
            DrawerStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for DrawerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(DrawerStatus::Open),
            "closed" => Ok(DrawerStatus::Closed),
            _ => Err(CoreError::UnknownDrawerStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a ledger entry was settled.
///
/// Every path through the drawer core settles in cash; the field exists
/// on the ledger row so the schema does not need to change when other
/// tenders reach the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
}

impl PaymentMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            _ => Err(CoreError::UnknownPaymentMethod(s.to_string())),
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Drawer
// =============================================================================

/// A cashier's cash-handling session from open to close.
///
/// ## Invariants
/// - At most one Drawer is Open process-wide at any time.
/// - `current_balance` equals `opening_balance` folded with every
///   transaction's signed amount, within one cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawer {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Open or Closed.
    pub status: DrawerStatus,

    /// Counted float when the session started.
    pub opening_balance: Money,

    /// The running balance after the latest ledger entry.
    pub current_balance: Money,

    /// When the session started.
    pub opened_at: DateTime<Utc>,

    /// When the session ended (None while Open).
    pub closed_at: Option<DateTime<Utc>>,

    /// Cashier operating this drawer.
    pub cashier_id: String,

    /// Display name of the cashier.
    pub cashier_name: String,

    /// Free-text notes recorded at close.
    pub notes: Option<String>,

    /// Sum of sale amounts this session.
    pub total_sales: Money,

    /// Sum of expense amounts this session.
    pub total_expenses: Money,

    /// Sum of supplier payment amounts (rebuilt by reconciliation).
    pub total_supplier_payments: Money,

    /// Cash that entered the drawer (sales, receipts, cash-in).
    pub cash_in: Money,

    /// Cash that left the drawer (expenses, payments, cash-out).
    pub cash_out: Money,

    /// Net sales (mirrors total_sales).
    pub net_sales: Money,

    /// total_sales minus total_expenses.
    pub net_cash_flow: Money,

    /// When any aggregate field last changed.
    pub last_updated: DateTime<Utc>,
}

impl Drawer {
    /// Is this session still accepting transactions?
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == DrawerStatus::Open
    }

    /// The balance the drawer should hold going by cash flow alone:
    /// opening balance plus cash in, minus cash out.
    ///
    /// The close discrepancy is the counted final balance minus this.
    pub fn expected_balance(&self) -> Money {
        self.opening_balance + self.cash_in - self.cash_out
    }

    /// Recomputes the derived net fields from the raw totals.
    pub fn recompute_net(&mut self) {
        self.net_sales = self.total_sales;
        self.net_cash_flow = self.total_sales - self.total_expenses;
    }

    /// Zeroes every aggregate ahead of a reconciliation replay.
    pub fn reset_totals(&mut self) {
        self.total_sales = Money::zero();
        self.total_expenses = Money::zero();
        self.total_supplier_payments = Money::zero();
        self.cash_in = Money::zero();
        self.cash_out = Money::zero();
    }
}

// =============================================================================
// Drawer Transaction
// =============================================================================

/// One immutable ledger entry recording a cash movement or lifecycle
/// event against a drawer.
///
/// ## Append-Only Discipline
/// Entries are created by the session manager, the processor, and the
/// correction handler; they are never deleted and never mutated after
/// persistence. A correction is a new entry, not an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerTransaction {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning drawer.
    pub drawer_id: String,

    /// When the entry was written.
    pub timestamp: DateTime<Utc>,

    /// What kind of movement this records.
    pub kind: TransactionKind,

    /// Signed amount: positive for incoming kinds, negative for outgoing.
    pub amount: Money,

    /// Snapshot of the running balance right after this entry.
    pub balance: Money,

    /// Human-readable description (reference-enhanced where applicable).
    pub description: String,

    /// Audit category, separate from the kind.
    pub action: ActionCategory,

    /// Free-text correlation back to an originating sale/expense id.
    pub reference: String,

    /// Settlement method; always cash in this core.
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Drawer History Entry
// =============================================================================

/// Secondary audit record keyed by category and timestamp.
///
/// Serves category/date-range reporting and the audit trail; never used
/// for balance reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerHistoryEntry {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning drawer.
    pub drawer_id: String,

    /// What category of action this records.
    pub action: ActionCategory,

    /// Signed amount attached to the action (zero for pure notes).
    pub amount: Money,

    /// Balance at the time the action was logged.
    pub balance: Money,

    /// Human-readable description.
    pub description: String,

    /// When the action was logged.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Drawer Event
// =============================================================================

/// The single event shape published after every state-changing operation
/// (open, transaction, close, modification, recalculation).
///
/// Delivery is fire-and-forget, at-most-once per commit, and only after
/// a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerEvent {
    /// What happened ("Cash Sale", "Close", "Transaction Modification", ...).
    pub label: String,

    /// Signed amount the operation moved (zero for recalculations).
    pub amount: Money,

    /// Human-readable description of the operation.
    pub description: String,
}

impl DrawerEvent {
    pub fn new(label: impl Into<String>, amount: Money, description: impl Into<String>) -> Self {
        DrawerEvent {
            label: label.into(),
            amount,
            description: description.into(),
        }
    }
}

// =============================================================================
// Report Shapes
// =============================================================================

/// Per-category totals over a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub sales: Money,
    pub supplier_payments: Money,
    pub expenses: Money,
}

/// Same-calendar-day totals for one drawer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub sales: Money,
    pub expenses: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
