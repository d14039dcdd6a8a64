//! # till-db: Persistence + Drawer Services for Till
//!
//! This crate provides SQLite persistence and the drawer ledger services.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till Data Flow                                  │
//! │                                                                         │
//! │  Embedding application (UI commands, POS services)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │ Drawer services│   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │   │  (drawer/*)    │   │  (embedded)  │   │   │
//! │  │   │               │   │ session        │   │              │   │   │
//! │  │   │ SqlitePool    │◄──│ processor      │   │ 001_drawer_  │   │   │
//! │  │   │ WAL, FKs      │   │ correction     │   │ schema.sql   │   │   │
//! │  │   │               │   │ reconciliation │   │              │   │   │
//! │  │   └───────────────┘   │ reporting      │   └──────────────┘   │   │
//! │  │                       │ audit          │                      │   │
//! │  │                       └────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (one file, or :memory: for tests)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Drawer repository (row mapping, queries, writes)
//! - [`drawer`] - The service components around the ledger
//! - [`events`] - Post-commit event publication
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use till_db::{Database, DbConfig, BroadcastPublisher};
//! use till_core::Money;
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//! let ledger = db.ledger(Arc::new(BroadcastPublisher::default()));
//!
//! ledger.session().open(Money::from_cents(10000), "C1", "Alice").await?;
//! ledger.processor().process_cash_sale(Money::from_cents(5000), "R1").await?;
//! ledger.session().close(Money::from_cents(15000), Some("eod")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod drawer;
pub mod error;
pub mod events;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use events::{BroadcastPublisher, EventPublisher, NullPublisher};
pub use pool::{Database, DbConfig};

// Service re-exports for convenience
pub use drawer::{
    CorrectionHandler, DrawerAudit, DrawerLedger, DrawerSessionManager, LedgerError, LedgerResult,
    ReconciliationEngine, ReportingQueries, TransactionProcessor,
};
pub use repository::drawer::DrawerRepository;
