//! # Drawer Services
//!
//! The service components that own the drawer ledger:
//!
//! - [`session::DrawerSessionManager`] - open/close lifecycle
//! - [`processor::TransactionProcessor`] - validates and applies ledger entries
//! - [`correction::CorrectionHandler`] - post-hoc corrections for modified sales
//! - [`reconciliation::ReconciliationEngine`] - replays and verifies history
//! - [`reporting::ReportingQueries`] - read-only aggregations
//! - [`audit::DrawerAudit`] - audit trail and access checks
//!
//! ## The Atomic Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutating operation:                                              │
//! │                                                                         │
//! │  write gate ── BEGIN ── read drawer ── apply ledger math ──            │
//! │       │                                                     │           │
//! │       │         ┌── append entry + update aggregate row ◄──┘           │
//! │       │         ▼                                                       │
//! │       │      COMMIT ──► publish event (fire-and-forget)                │
//! │       ▼                                                                 │
//! │    released   (any error: rollback, nothing published)                 │
//! │                                                                         │
//! │  Callers never observe an updated balance without its ledger entry,    │
//! │  or vice versa.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The in-process write gate (one tokio Mutex shared by all services)
//! serializes the read-modify-write window on the aggregate row; the
//! SQLite transaction makes it atomic and rolls it back on error.

pub mod audit;
pub mod correction;
pub mod processor;
pub mod reconciliation;
pub mod reporting;
pub mod session;

use std::sync::Arc;

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::events::EventPublisher;
use crate::repository::drawer::DrawerRepository;
use till_core::{
    ActionCategory, CoreError, DrawerEvent, DrawerHistoryEntry, DrawerTransaction, Money,
    TransactionKind, ValidationError,
};

pub use audit::DrawerAudit;
pub use correction::CorrectionHandler;
pub use processor::TransactionProcessor;
pub use reconciliation::ReconciliationEngine;
pub use reporting::ReportingQueries;
pub use session::DrawerSessionManager;

// =============================================================================
// Service Error
// =============================================================================

/// What every drawer service operation returns on failure: either a
/// ledger rule violation or a storage problem.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Db(DbError::from(err))
    }
}

/// Result type for drawer service operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Shared Service Context
// =============================================================================

/// Shared context behind all drawer services: the pool, the event
/// publisher, and the write gate.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger(Arc::new(BroadcastPublisher::default()));
/// let drawer = ledger.session().open(float, "C1", "Alice").await?;
/// let drawer = ledger.processor().process_cash_sale(amount, "R1").await?;
/// ```
#[derive(Clone)]
pub struct DrawerLedger {
    pool: SqlitePool,
    publisher: Arc<dyn EventPublisher>,
    write_gate: Arc<Mutex<()>>,
}

impl DrawerLedger {
    /// Creates the service context around a pool and an event publisher.
    pub fn new(pool: SqlitePool, publisher: Arc<dyn EventPublisher>) -> Self {
        DrawerLedger {
            pool,
            publisher,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the session lifecycle manager.
    pub fn session(&self) -> DrawerSessionManager {
        DrawerSessionManager::new(self.clone())
    }

    /// Returns the transaction processor.
    pub fn processor(&self) -> TransactionProcessor {
        TransactionProcessor::new(self.clone())
    }

    /// Returns the correction handler.
    pub fn corrections(&self) -> CorrectionHandler {
        CorrectionHandler::new(self.clone())
    }

    /// Returns the reconciliation engine.
    pub fn reconciliation(&self) -> ReconciliationEngine {
        ReconciliationEngine::new(self.clone())
    }

    /// Returns the read-only reporting queries.
    pub fn reports(&self) -> ReportingQueries {
        ReportingQueries::new(self.clone())
    }

    /// Returns the audit service.
    pub fn audit(&self) -> DrawerAudit {
        DrawerAudit::new(self.clone())
    }

    /// Returns a repository bound to this context's pool.
    pub fn repository(&self) -> DrawerRepository {
        DrawerRepository::new(self.pool.clone())
    }

    /// Acquires the write gate for a read-modify-write sequence.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Begins a sqlx transaction on the shared pool.
    pub(crate) async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(DbError::from)
    }

    /// Publishes a drawer event. Call only after a successful commit.
    pub(crate) fn publish(&self, label: &str, amount: Money, description: &str) {
        self.publisher
            .publish(DrawerEvent::new(label, amount, description));
    }
}

// =============================================================================
// Record Constructors
// =============================================================================

/// Builds one ledger entry with a fresh id and timestamp. The action
/// category mirrors the kind; correction entries override it afterwards.
pub(crate) fn new_transaction(
    drawer_id: &str,
    kind: TransactionKind,
    amount: Money,
    balance: Money,
    description: String,
    reference: String,
) -> DrawerTransaction {
    DrawerTransaction {
        id: Uuid::new_v4().to_string(),
        drawer_id: drawer_id.to_string(),
        timestamp: Utc::now(),
        kind,
        amount,
        balance,
        description,
        action: kind.into(),
        reference,
        payment_method: Default::default(),
    }
}

/// Builds one audit history entry with a fresh id and timestamp.
pub(crate) fn new_history_entry(
    drawer_id: &str,
    action: ActionCategory,
    amount: Money,
    balance: Money,
    description: String,
) -> DrawerHistoryEntry {
    DrawerHistoryEntry {
        id: Uuid::new_v4().to_string(),
        drawer_id: drawer_id.to_string(),
        action,
        amount,
        balance,
        description,
        timestamp: Utc::now(),
    }
}
