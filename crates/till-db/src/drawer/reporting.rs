//! # Reporting Queries
//!
//! Read-only aggregations over the ledger and the audit history. No
//! writes, no write gate, no events.

use chrono::{DateTime, NaiveDate, Utc};

use crate::drawer::{DrawerLedger, LedgerResult};
use till_core::{
    ActionCategory, DailyTotals, Drawer, DrawerHistoryEntry, FinancialSummary, Money,
    SummaryCategory, TransactionKind,
};

/// Read-only reporting over the drawer ledger.
pub struct ReportingQueries {
    ledger: DrawerLedger,
}

impl ReportingQueries {
    pub(crate) fn new(ledger: DrawerLedger) -> Self {
        ReportingQueries { ledger }
    }

    /// Per-category totals (sales / supplier payments / expenses) over a
    /// date range.
    ///
    /// Only entries whose owning drawer is currently open are counted;
    /// closed-session history is excluded from summaries. Amounts are
    /// summed absolute.
    pub async fn financial_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<FinancialSummary> {
        let transactions = self
            .ledger
            .repository()
            .transactions_for_open_drawers(start, end)
            .await?;

        let mut summary = FinancialSummary::default();
        for t in &transactions {
            match t.kind.summary_category() {
                SummaryCategory::Sales => summary.sales += t.amount.abs(),
                SummaryCategory::SupplierPayments => summary.supplier_payments += t.amount.abs(),
                SummaryCategory::Expenses => summary.expenses += t.amount.abs(),
                SummaryCategory::Other => {}
            }
        }

        Ok(summary)
    }

    /// Today's sales and expense totals for one drawer.
    ///
    /// Sales counts cash sales; expenses counts expenses plus supplier
    /// payments. Amounts are summed absolute.
    pub async fn daily_totals(&self, drawer_id: &str) -> LedgerResult<DailyTotals> {
        self.totals_for_day(drawer_id, Utc::now().date_naive()).await
    }

    /// Sales and expense totals for one drawer on one calendar day.
    pub async fn totals_for_day(
        &self,
        drawer_id: &str,
        day: NaiveDate,
    ) -> LedgerResult<DailyTotals> {
        let transactions = self
            .ledger
            .repository()
            .transactions_on_day(drawer_id, day)
            .await?;

        let sales = transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::CashSale)
            .map(|t| t.amount.abs())
            .sum();
        let expenses = transactions
            .iter()
            .filter(|t| {
                matches!(
                    t.kind,
                    TransactionKind::Expense | TransactionKind::SupplierPayment
                )
            })
            .map(|t| t.amount.abs())
            .sum();

        Ok(DailyTotals { sales, expenses })
    }

    /// Audit history entries of one category in a time range, newest first.
    pub async fn history_by_category(
        &self,
        category: ActionCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<DrawerHistoryEntry>> {
        Ok(self
            .ledger
            .repository()
            .history_by_category(category, start, end)
            .await?)
    }

    /// Sum of one history category's signed amounts in a time range.
    pub async fn total_by_category(
        &self,
        category: ActionCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Money> {
        Ok(self
            .ledger
            .repository()
            .total_by_category(category, start, end)
            .await?)
    }

    /// Drawer sessions, newest first, optionally bounded by opening day.
    pub async fn sessions(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> LedgerResult<Vec<Drawer>> {
        Ok(self.ledger.repository().sessions(start, end).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
