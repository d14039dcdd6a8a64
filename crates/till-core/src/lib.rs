//! # till-core: Pure Ledger Logic for Till
//!
//! This crate is the **heart** of the Till drawer ledger. It contains all
//! ledger logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Embedding Application                        │   │
//! │  │     open drawer ──► ring up sales ──► correct ──► close        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 till-db (Services + SQLite)                     │   │
//! │  │   session manager, processor, corrections, reconciliation      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  registry │  │  ledger   │  │   │
//! │  │   │  Drawer   │  │   Money   │  │   Kinds   │  │  balance  │  │   │
//! │  │   │  Ledger   │  │  epsilon  │  │  configs  │  │   math    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Drawer, DrawerTransaction, events, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`registry`] - The closed transaction classification table
//! - [`ledger`] - Balance math, replays, discrepancy scanning
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the fold that writes balances is the fold that
//!    verifies them later
//! 2. **No I/O**: database, network, and file system access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); the only
//!    tolerance is one explicit cent
//! 4. **Closed Classification**: transaction kinds are an enum; parsing
//!    fails closed at the storage boundary

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod registry;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, BALANCE_EPSILON};
pub use registry::{ActionCategory, SummaryCategory, TransactionKind, TypeConfig};
pub use types::{
    DailyTotals, Drawer, DrawerEvent, DrawerHistoryEntry, DrawerStatus, DrawerTransaction,
    FinancialSummary, PaymentMethod,
};
