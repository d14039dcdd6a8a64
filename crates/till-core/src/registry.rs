//! # Transaction Classification
//!
//! The closed table of drawer transaction kinds and their accounting
//! behavior.
//!
//! ## Classification Table
//! ```text
//! ┌─────────────────────┬──────────┬──────────────┬─────────────────┐
//! │ Kind                │ Incoming │ Updates Sales│ Updates Expenses│
//! ├─────────────────────┼──────────┼──────────────┼─────────────────┤
//! │ Open                │    ✓     │              │                 │
//! │ Cash Sale           │    ✓     │      ✓       │                 │
//! │ Cash In             │    ✓     │              │                 │
//! │ Cash Receipt        │    ✓     │      ✓       │                 │
//! │ Expense             │          │              │        ✓        │
//! │ Internet Expenses   │          │              │        ✓        │
//! │ Supplier Payment    │          │              │        ✓        │
//! │ Cash Out            │          │              │                 │
//! │ Salary Withdrawal   │          │              │        ✓        │
//! │ Return              │          │              │                 │
//! │ Quote Payment       │    ✓     │      ✓       │                 │
//! │ Close               │          │              │                 │
//! └─────────────────────┴──────────┴──────────────┴─────────────────┘
//! ```
//!
//! ## Why a Closed Enum?
//! Free-text transaction types make every classification a string match
//! and give unrecognized spellings a silent, cash-neutral meaning. In a
//! financial ledger that silence is a liability. Here the kind is an
//! enum: [`TransactionKind::config`] is total, and string parsing exists
//! only at the persistence boundary, where an unknown token is an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Transaction Kind
// =============================================================================

/// A kind of drawer ledger entry.
///
/// Stored in the database as the snake_case token from
/// [`TransactionKind::as_str`]; displayed with the human label from
/// [`TransactionKind::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Session anchor: the first entry of every drawer, establishing the
    /// opening balance.
    Open,
    /// A cash sale rung up at the register.
    CashSale,
    /// Cash added to the drawer outside of a sale (e.g. a float top-up).
    CashIn,
    /// A payment received against a customer account.
    CashReceipt,
    /// A general expense paid from the drawer.
    Expense,
    /// Internet/connectivity expenses paid from the drawer.
    InternetExpenses,
    /// A payment to a supplier.
    SupplierPayment,
    /// Cash removed from the drawer outside of an expense (e.g. a bank drop).
    CashOut,
    /// Salary paid out in cash.
    SalaryWithdrawal,
    /// A customer return refunded in cash.
    Return,
    /// A payment received against a quote.
    QuotePayment,
    /// Session terminator: records the counted final balance.
    Close,
}

/// Accounting behavior of a transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeConfig {
    /// Does this kind add cash to the drawer?
    pub is_incoming: bool,
    /// Does this kind contribute to the sales total (and cash-in)?
    pub updates_sales: bool,
    /// Does this kind contribute to the expense total (and cash-out)?
    pub updates_expenses: bool,
}

const fn cfg(is_incoming: bool, updates_sales: bool, updates_expenses: bool) -> TypeConfig {
    TypeConfig {
        is_incoming,
        updates_sales,
        updates_expenses,
    }
}

/// Reporting bucket for the financial summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryCategory {
    Sales,
    SupplierPayments,
    Expenses,
    /// Not aggregated by the summary.
    Other,
}

impl TransactionKind {
    /// Every kind, in declaration order.
    pub const ALL: [TransactionKind; 12] = [
        TransactionKind::Open,
        TransactionKind::CashSale,
        TransactionKind::CashIn,
        TransactionKind::CashReceipt,
        TransactionKind::Expense,
        TransactionKind::InternetExpenses,
        TransactionKind::SupplierPayment,
        TransactionKind::CashOut,
        TransactionKind::SalaryWithdrawal,
        TransactionKind::Return,
        TransactionKind::QuotePayment,
        TransactionKind::Close,
    ];

    /// Looks up the accounting behavior for this kind.
    ///
    /// Total over the enum: there is no "unknown type" fallback to reach.
    pub const fn config(self) -> TypeConfig {
        match self {
            TransactionKind::Open => cfg(true, false, false),
            TransactionKind::CashSale => cfg(true, true, false),
            TransactionKind::CashIn => cfg(true, false, false),
            TransactionKind::CashReceipt => cfg(true, true, false),
            TransactionKind::Expense => cfg(false, false, true),
            TransactionKind::InternetExpenses => cfg(false, false, true),
            TransactionKind::SupplierPayment => cfg(false, false, true),
            TransactionKind::CashOut => cfg(false, false, false),
            TransactionKind::SalaryWithdrawal => cfg(false, false, true),
            TransactionKind::Return => cfg(false, false, false),
            TransactionKind::QuotePayment => cfg(true, true, false),
            TransactionKind::Close => cfg(false, false, false),
        }
    }

    /// Does this kind add cash to the drawer?
    #[inline]
    pub const fn is_incoming(self) -> bool {
        self.config().is_incoming
    }

    /// Canonical storage token.
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Open => "open",
            TransactionKind::CashSale => "cash_sale",
            TransactionKind::CashIn => "cash_in",
            TransactionKind::CashReceipt => "cash_receipt",
            TransactionKind::Expense => "expense",
            TransactionKind::InternetExpenses => "internet_expenses",
            TransactionKind::SupplierPayment => "supplier_payment",
            TransactionKind::CashOut => "cash_out",
            TransactionKind::SalaryWithdrawal => "salary_withdrawal",
            TransactionKind::Return => "return",
            TransactionKind::QuotePayment => "quote_payment",
            TransactionKind::Close => "close",
        }
    }

    /// Human-readable label (used in events and descriptions).
    pub const fn label(self) -> &'static str {
        match self {
            TransactionKind::Open => "Open",
            TransactionKind::CashSale => "Cash Sale",
            TransactionKind::CashIn => "Cash In",
            TransactionKind::CashReceipt => "Cash Receipt",
            TransactionKind::Expense => "Expense",
            TransactionKind::InternetExpenses => "Internet Expenses",
            TransactionKind::SupplierPayment => "Supplier Payment",
            TransactionKind::CashOut => "Cash Out",
            TransactionKind::SalaryWithdrawal => "Salary Withdrawal",
            TransactionKind::Return => "Return",
            TransactionKind::QuotePayment => "Quote Payment",
            TransactionKind::Close => "Close",
        }
    }

    /// Maps this kind to its financial-summary bucket.
    ///
    /// Cash Sale counts as Sales; Supplier Payment stands alone; Expense
    /// and Internet Expenses roll up together. Everything else is
    /// ignored by the summary.
    pub const fn summary_category(self) -> SummaryCategory {
        match self {
            TransactionKind::CashSale => SummaryCategory::Sales,
            TransactionKind::SupplierPayment => SummaryCategory::SupplierPayments,
            TransactionKind::Expense | TransactionKind::InternetExpenses => {
                SummaryCategory::Expenses
            }
            _ => SummaryCategory::Other,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses both the storage token ("cash_sale") and the human label
/// ("Cash Sale"), case-insensitively. Anything else is rejected.
impl FromStr for TransactionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "open" => Ok(TransactionKind::Open),
            "cash_sale" => Ok(TransactionKind::CashSale),
            "cash_in" => Ok(TransactionKind::CashIn),
            "cash_receipt" => Ok(TransactionKind::CashReceipt),
            "expense" => Ok(TransactionKind::Expense),
            "internet_expenses" => Ok(TransactionKind::InternetExpenses),
            "supplier_payment" => Ok(TransactionKind::SupplierPayment),
            "cash_out" => Ok(TransactionKind::CashOut),
            "salary_withdrawal" => Ok(TransactionKind::SalaryWithdrawal),
            "return" => Ok(TransactionKind::Return),
            "quote_payment" => Ok(TransactionKind::QuotePayment),
            "close" => Ok(TransactionKind::Close),
            _ => Err(CoreError::UnknownTransactionKind(s.to_string())),
        }
    }
}

// =============================================================================
// Action Category
// =============================================================================

/// Audit category attached to ledger entries and history records.
///
/// Separate from [`TransactionKind`]: an entry's kind says what cash
/// movement it records, the category says why it was written (a plain
/// movement, a correction, an adjustment, an audit note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Open,
    CashSale,
    CashIn,
    CashReceipt,
    Expense,
    InternetExpenses,
    SupplierPayment,
    CashOut,
    SalaryWithdrawal,
    Return,
    QuotePayment,
    Close,
    /// A correction entry adjusting for a modified external sale/expense.
    TransactionModification,
    /// A manual balance override.
    BalanceAdjustment,
    /// Marks a history row whose amount increases the balance during
    /// display-only reconstruction.
    Increase,
    /// An audit note (e.g. an unauthorized access attempt).
    Audit,
}

impl ActionCategory {
    /// Canonical storage token.
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionCategory::Open => "open",
            ActionCategory::CashSale => "cash_sale",
            ActionCategory::CashIn => "cash_in",
            ActionCategory::CashReceipt => "cash_receipt",
            ActionCategory::Expense => "expense",
            ActionCategory::InternetExpenses => "internet_expenses",
            ActionCategory::SupplierPayment => "supplier_payment",
            ActionCategory::CashOut => "cash_out",
            ActionCategory::SalaryWithdrawal => "salary_withdrawal",
            ActionCategory::Return => "return",
            ActionCategory::QuotePayment => "quote_payment",
            ActionCategory::Close => "close",
            ActionCategory::TransactionModification => "transaction_modification",
            ActionCategory::BalanceAdjustment => "balance_adjustment",
            ActionCategory::Increase => "increase",
            ActionCategory::Audit => "audit",
        }
    }

    /// Human-readable label (used in events).
    pub const fn label(self) -> &'static str {
        match self {
            ActionCategory::TransactionModification => "Transaction Modification",
            ActionCategory::BalanceAdjustment => "Balance Adjustment",
            ActionCategory::Increase => "Increase",
            ActionCategory::Audit => "Audit",
            ActionCategory::Open => "Open",
            ActionCategory::CashSale => "Cash Sale",
            ActionCategory::CashIn => "Cash In",
            ActionCategory::CashReceipt => "Cash Receipt",
            ActionCategory::Expense => "Expense",
            ActionCategory::InternetExpenses => "Internet Expenses",
            ActionCategory::SupplierPayment => "Supplier Payment",
            ActionCategory::CashOut => "Cash Out",
            ActionCategory::SalaryWithdrawal => "Salary Withdrawal",
            ActionCategory::Return => "Return",
            ActionCategory::QuotePayment => "Quote Payment",
            ActionCategory::Close => "Close",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActionCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "open" => Ok(ActionCategory::Open),
            "cash_sale" => Ok(ActionCategory::CashSale),
            "cash_in" => Ok(ActionCategory::CashIn),
            "cash_receipt" => Ok(ActionCategory::CashReceipt),
            "expense" => Ok(ActionCategory::Expense),
            "internet_expenses" => Ok(ActionCategory::InternetExpenses),
            "supplier_payment" => Ok(ActionCategory::SupplierPayment),
            "cash_out" => Ok(ActionCategory::CashOut),
            "salary_withdrawal" => Ok(ActionCategory::SalaryWithdrawal),
            "return" => Ok(ActionCategory::Return),
            "quote_payment" => Ok(ActionCategory::QuotePayment),
            "close" => Ok(ActionCategory::Close),
            "transaction_modification" => Ok(ActionCategory::TransactionModification),
            "balance_adjustment" => Ok(ActionCategory::BalanceAdjustment),
            "increase" => Ok(ActionCategory::Increase),
            "audit" => Ok(ActionCategory::Audit),
            _ => Err(CoreError::UnknownActionCategory(s.to_string())),
        }
    }
}

/// Every transaction kind maps to its same-named audit category.
impl From<TransactionKind> for ActionCategory {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Open => ActionCategory::Open,
            TransactionKind::CashSale => ActionCategory::CashSale,
            TransactionKind::CashIn => ActionCategory::CashIn,
            TransactionKind::CashReceipt => ActionCategory::CashReceipt,
            TransactionKind::Expense => ActionCategory::Expense,
            TransactionKind::InternetExpenses => ActionCategory::InternetExpenses,
            TransactionKind::SupplierPayment => ActionCategory::SupplierPayment,
            TransactionKind::CashOut => ActionCategory::CashOut,
            TransactionKind::SalaryWithdrawal => ActionCategory::SalaryWithdrawal,
            TransactionKind::Return => ActionCategory::Return,
            TransactionKind::QuotePayment => ActionCategory::QuotePayment,
            TransactionKind::Close => ActionCategory::Close,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
