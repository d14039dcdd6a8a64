//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - CoreError | DbError, what services return      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, ids)
//! 3. Errors are enum variants, never String
//! 4. A failed validation aborts the whole atomic operation; nothing
//!    partial is ever committed

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
///
/// These are raised before any write happens, so a caller seeing one of
/// these can assume stored state is unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Open attempted while a drawer is already open.
    ///
    /// At most one drawer may be open process-wide; the constraint is
    /// also enforced by a partial unique index at the storage layer.
    #[error("There is already an open drawer")]
    DrawerAlreadyOpen,

    /// An operation requiring an active session found none.
    #[error("No open drawer")]
    NoOpenDrawer,

    /// A non-positive amount was submitted.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// An outgoing amount exceeds the current drawer balance.
    ///
    /// ## User Workflow
    /// ```text
    /// Pay expense $200.00
    ///      │
    ///      ▼
    /// Check balance: $120.00 available
    ///      │
    ///      ▼
    /// InsufficientFunds { requested: $200.00, available: $120.00 }
    /// ```
    #[error("Insufficient funds in drawer: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Money,
        available: Money,
    },

    /// The operation targeted a nonexistent drawer id.
    #[error("Drawer not found: {0}")]
    DrawerNotFound(String),

    /// A cashier tried to act on a drawer they do not own.
    ///
    /// An audit history entry is recorded before this is reported.
    #[error("Cashier {cashier_id} is not authorized for drawer {drawer_id}")]
    UnauthorizedAccess {
        cashier_id: String,
        drawer_id: String,
    },

    /// A stored or supplied transaction kind token was not recognized.
    ///
    /// Classification fails closed: a ledger must not silently treat an
    /// unknown kind as cash-neutral.
    #[error("Unrecognized transaction kind: {0}")]
    UnknownTransactionKind(String),

    /// A stored action category token was not recognized.
    #[error("Unrecognized action category: {0}")]
    UnknownActionCategory(String),

    /// A stored drawer status token was not recognized.
    #[error("Unrecognized drawer status: {0}")]
    UnknownDrawerStatus(String),

    /// A stored payment method token was not recognized.
    #[error("Unrecognized payment method: {0}")]
    UnknownPaymentMethod(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements, before any
/// ledger logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
