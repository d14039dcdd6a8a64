//! # Ledger Math
//!
//! Pure balance and aggregate arithmetic for the drawer ledger. Every
//! rule the services apply when writing an entry lives here, so
//! reconciliation can replay history with the exact same functions.
//!
//! ## The Balance Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       next_balance(kind, current, amount)               │
//! │                                                                         │
//! │  kind == Open      ──►  |amount|          (RESET: the first ledger     │
//! │                                            entry establishes the       │
//! │                                            balance, it does not        │
//! │                                            adjust one)                 │
//! │  kind is incoming  ──►  current + |amount|                             │
//! │  otherwise         ──►  current - |amount|                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::{Money, BALANCE_EPSILON};
use crate::registry::{ActionCategory, TransactionKind};
use crate::types::{Drawer, DrawerTransaction};

// =============================================================================
// Amount & Balance Rules
// =============================================================================

/// Gives an amount the sign its kind dictates: positive for incoming
/// kinds, negative for outgoing ones.
pub fn adjusted_amount(kind: TransactionKind, amount: Money) -> Money {
    if kind.is_incoming() {
        amount.abs()
    } else {
        -amount.abs()
    }
}

/// Computes the balance after applying one entry to `current`.
///
/// `Open` is a reset, not an addition: the opening entry anchors the
/// ledger at its own amount.
pub fn next_balance(kind: TransactionKind, current: Money, amount: Money) -> Money {
    match kind {
        TransactionKind::Open => amount.abs(),
        _ if kind.is_incoming() => current + amount.abs(),
        _ => current - amount.abs(),
    }
}

// =============================================================================
// Aggregate Updates
// =============================================================================

/// Applies one processed transaction to the drawer's running aggregates.
///
/// Sales-updating kinds feed total_sales and cash_in; expense-updating
/// kinds feed total_expenses and cash_out; plain Cash In / Cash Out only
/// move the cash counters. Derived net fields are recomputed at the end.
pub fn apply_transaction_totals(drawer: &mut Drawer, kind: TransactionKind, amount: Money) {
    let abs = amount.abs();
    let config = kind.config();

    if config.updates_sales {
        drawer.total_sales += abs;
        drawer.cash_in += abs;
    } else if config.updates_expenses {
        drawer.total_expenses += abs;
        drawer.cash_out += abs;
    } else if kind == TransactionKind::CashOut {
        drawer.cash_out += abs;
    } else if kind == TransactionKind::CashIn {
        drawer.cash_in += abs;
    }

    drawer.recompute_net();
}

/// Applies one historical transaction during a reconciliation replay.
///
/// Narrower than [`apply_transaction_totals`]: the replay rebuilds
/// total_sales, total_expenses, and total_supplier_payments only. The
/// cash counters are zeroed by the caller and left zeroed.
pub fn apply_replay_totals(drawer: &mut Drawer, kind: TransactionKind, amount: Money) {
    let abs = amount.abs();
    let config = kind.config();

    if config.updates_sales {
        drawer.total_sales += abs;
    }
    if config.updates_expenses {
        drawer.total_expenses += abs;
    }
    if kind == TransactionKind::SupplierPayment {
        drawer.total_supplier_payments += abs;
    }
}

/// Applies a correction delta for a modified external sale/expense.
///
/// The delta is signed; aggregates move by the same signed delta so a
/// price reduction pulls the totals back down.
pub fn apply_modification(drawer: &mut Drawer, kind: TransactionKind, delta: Money) {
    drawer.current_balance += delta;

    match kind {
        TransactionKind::CashSale => {
            drawer.total_sales += delta;
            drawer.cash_in += delta;
        }
        TransactionKind::Expense | TransactionKind::SupplierPayment => {
            drawer.total_expenses += delta;
            drawer.cash_out += delta;
        }
        _ => {}
    }
}

// =============================================================================
// Replays
// =============================================================================

fn sorted_ascending(transactions: &[DrawerTransaction]) -> Vec<&DrawerTransaction> {
    let mut ordered: Vec<&DrawerTransaction> = transactions.iter().collect();
    ordered.sort_by_key(|t| t.timestamp);
    ordered
}

/// Folds every entry over `opening`, in ascending timestamp order, using
/// the same balance rule that wrote the entries.
pub fn fold_balance(opening: Money, transactions: &[DrawerTransaction]) -> Money {
    sorted_ascending(transactions)
        .into_iter()
        .fold(opening, |balance, t| next_balance(t.kind, balance, t.amount))
}

/// Replays the ledger from zero and collects every entry whose recorded
/// balance snapshot diverges from the recomputed value by more than
/// [`BALANCE_EPSILON`]. Results come back newest first.
///
/// Note the fold starts at zero, not the opening balance; the verify
/// fold starts at the opening balance. The asymmetry is inherited
/// behavior and deliberate until product says otherwise.
pub fn find_discrepancies(transactions: &[DrawerTransaction]) -> Vec<DrawerTransaction> {
    let mut running = Money::zero();
    let mut discrepancies = Vec::new();

    for t in sorted_ascending(transactions) {
        running = next_balance(t.kind, running, t.amount);
        if (running - t.balance).abs() > BALANCE_EPSILON {
            discrepancies.push(t.clone());
        }
    }

    discrepancies.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    discrepancies
}

/// One ledger entry paired with its display-reconstructed balance.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerLine {
    pub transaction: DrawerTransaction,
    pub resulting_balance: Money,
}

/// Rebuilds a running balance over an arbitrary entry list for display.
///
/// Independent of the persisted balance snapshots: `Open` resets to the
/// entry's own (signed) amount; an incoming kind, or an entry tagged
/// [`ActionCategory::Increase`], adds |amount|; everything else
/// subtracts |amount|.
pub fn running_balances(transactions: &[DrawerTransaction]) -> Vec<LedgerLine> {
    let mut running = Money::zero();
    let mut lines = Vec::with_capacity(transactions.len());

    for t in sorted_ascending(transactions) {
        running = if t.kind == TransactionKind::Open {
            t.amount
        } else if t.kind.is_incoming() || t.action == ActionCategory::Increase {
            running + t.amount.abs()
        } else {
            running - t.amount.abs()
        };
        lines.push(LedgerLine {
            transaction: t.clone(),
            resulting_balance: running,
        });
    }

    lines
}

// =============================================================================
// Description Formatting
// =============================================================================

/// Appends a reference to a description unless it is already present.
///
/// A reference containing a `#` marker is appended from the marker
/// onward; any other reference is appended parenthesized.
pub fn enhance_description(description: &str, reference: &str) -> String {
    if reference.is_empty() || description.contains(reference) {
        return description.to_string();
    }

    match reference.find('#') {
        Some(idx) => format!("{} {}", description, &reference[idx..]),
        None => format!("{} ({})", description, reference),
    }
}

/// Formats the description for a correction entry, making sure the
/// originating transaction id is mentioned exactly once.
pub fn modification_description(description: &str, transaction_id: &str) -> String {
    if description.is_empty() {
        return format!("Modified Transaction #{transaction_id}");
    }
    if description.contains(&format!("#{transaction_id}")) {
        description.to_string()
    } else {
        format!("{description} (Transaction #{transaction_id})")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::{Duration, Utc};

    fn entry(
        offset_secs: i64,
        kind: TransactionKind,
        amount_cents: i64,
        balance_cents: i64,
    ) -> DrawerTransaction {
        DrawerTransaction {
            id: format!("t{offset_secs}"),
            drawer_id: "d1".to_string(),
            timestamp: Utc::now() + Duration::seconds(offset_secs),
            kind,
            amount: Money::from_cents(amount_cents),
            balance: Money::from_cents(balance_cents),
            description: String::new(),
            action: kind.into(),
            reference: String::new(),
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn test_adjusted_amount_signs() {
        assert_eq!(
            adjusted_amount(TransactionKind::CashSale, Money::from_cents(5000)),
            Money::from_cents(5000)
        );
        assert_eq!(
            adjusted_amount(TransactionKind::Expense, Money::from_cents(3000)),
            Money::from_cents(-3000)
        );
        // Already-negative input is normalized through abs.
        assert_eq!(
            adjusted_amount(TransactionKind::CashSale, Money::from_cents(-5000)),
            Money::from_cents(5000)
        );
    }

    #[test]
    fn test_next_balance_open_resets() {
        let balance = next_balance(
            TransactionKind::Open,
            Money::from_cents(99999),
            Money::from_cents(10000),
        );
        assert_eq!(balance, Money::from_cents(10000));
    }

    #[test]
    fn test_next_balance_incoming_and_outgoing() {
        let after_sale = next_balance(
            TransactionKind::CashSale,
            Money::from_cents(10000),
            Money::from_cents(5000),
        );
        assert_eq!(after_sale, Money::from_cents(15000));

        let after_expense = next_balance(
            TransactionKind::Expense,
            Money::from_cents(15000),
            Money::from_cents(-3000),
        );
        assert_eq!(after_expense, Money::from_cents(12000));
    }

    #[test]
    fn test_fold_balance_matches_hand_computation() {
        let transactions = vec![
            entry(0, TransactionKind::Open, 10000, 10000),
            entry(1, TransactionKind::CashSale, 5000, 15000),
            entry(2, TransactionKind::Expense, -3000, 12000),
        ];
        assert_eq!(
            fold_balance(Money::from_cents(10000), &transactions),
            Money::from_cents(12000)
        );
    }

    #[test]
    fn test_fold_balance_sorts_before_folding() {
        // Same ledger, shuffled input order.
        let transactions = vec![
            entry(2, TransactionKind::Expense, -3000, 12000),
            entry(0, TransactionKind::Open, 10000, 10000),
            entry(1, TransactionKind::CashSale, 5000, 15000),
        ];
        assert_eq!(
            fold_balance(Money::from_cents(10000), &transactions),
            Money::from_cents(12000)
        );
    }

    #[test]
    fn test_find_discrepancies_flags_tampered_entries() {
        let transactions = vec![
            entry(0, TransactionKind::Open, 10000, 10000),
            // Recorded balance is 500 cents high.
            entry(1, TransactionKind::CashSale, 5000, 15500),
            entry(2, TransactionKind::Expense, -3000, 12000),
        ];
        let found = find_discrepancies(&transactions);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "t1");
    }

    #[test]
    fn test_find_discrepancies_returns_newest_first() {
        let transactions = vec![
            entry(0, TransactionKind::Open, 10000, 10000),
            entry(1, TransactionKind::CashSale, 5000, 10), // tampered
            entry(2, TransactionKind::CashSale, 2000, 20), // tampered
        ];
        let found = find_discrepancies(&transactions);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "t2");
        assert_eq!(found[1].id, "t1");
    }

    #[test]
    fn test_running_balances_open_resets_to_raw_amount() {
        let transactions = vec![
            entry(0, TransactionKind::Open, 10000, 10000),
            entry(1, TransactionKind::CashSale, 5000, 15000),
            entry(2, TransactionKind::CashOut, -2000, 13000),
        ];
        let lines = running_balances(&transactions);
        assert_eq!(lines[0].resulting_balance, Money::from_cents(10000));
        assert_eq!(lines[1].resulting_balance, Money::from_cents(15000));
        assert_eq!(lines[2].resulting_balance, Money::from_cents(13000));
    }

    #[test]
    fn test_running_balances_honors_increase_tag() {
        let mut adjustment = entry(1, TransactionKind::Return, 500, 0);
        adjustment.action = ActionCategory::Increase;
        let transactions = vec![entry(0, TransactionKind::Open, 10000, 10000), adjustment];

        let lines = running_balances(&transactions);
        // Return is outgoing by classification, but the Increase tag wins.
        assert_eq!(lines[1].resulting_balance, Money::from_cents(10500));
    }

    #[test]
    fn test_apply_transaction_totals() {
        let mut drawer = drawer_with_zeroed_totals();

        apply_transaction_totals(&mut drawer, TransactionKind::CashSale, Money::from_cents(5000));
        assert_eq!(drawer.total_sales, Money::from_cents(5000));
        assert_eq!(drawer.cash_in, Money::from_cents(5000));
        assert_eq!(drawer.net_cash_flow, Money::from_cents(5000));

        apply_transaction_totals(&mut drawer, TransactionKind::Expense, Money::from_cents(-3000));
        assert_eq!(drawer.total_expenses, Money::from_cents(3000));
        assert_eq!(drawer.cash_out, Money::from_cents(3000));
        assert_eq!(drawer.net_cash_flow, Money::from_cents(2000));

        apply_transaction_totals(&mut drawer, TransactionKind::CashOut, Money::from_cents(-1000));
        assert_eq!(drawer.cash_out, Money::from_cents(4000));
        // Plain cash movement leaves the sales/expense totals alone.
        assert_eq!(drawer.total_sales, Money::from_cents(5000));
        assert_eq!(drawer.total_expenses, Money::from_cents(3000));
    }

    #[test]
    fn test_apply_replay_totals_skips_cash_counters() {
        let mut drawer = drawer_with_zeroed_totals();

        apply_replay_totals(&mut drawer, TransactionKind::CashSale, Money::from_cents(5000));
        apply_replay_totals(
            &mut drawer,
            TransactionKind::SupplierPayment,
            Money::from_cents(-2000),
        );

        assert_eq!(drawer.total_sales, Money::from_cents(5000));
        assert_eq!(drawer.total_expenses, Money::from_cents(2000));
        assert_eq!(drawer.total_supplier_payments, Money::from_cents(2000));
        assert!(drawer.cash_in.is_zero());
        assert!(drawer.cash_out.is_zero());
    }

    #[test]
    fn test_apply_modification() {
        let mut drawer = drawer_with_zeroed_totals();
        drawer.current_balance = Money::from_cents(15000);
        drawer.total_sales = Money::from_cents(5000);
        drawer.cash_in = Money::from_cents(5000);

        apply_modification(&mut drawer, TransactionKind::CashSale, Money::from_cents(2000));
        assert_eq!(drawer.current_balance, Money::from_cents(17000));
        assert_eq!(drawer.total_sales, Money::from_cents(7000));
        assert_eq!(drawer.cash_in, Money::from_cents(7000));

        // A kind outside the mapped set moves the balance only.
        apply_modification(&mut drawer, TransactionKind::Return, Money::from_cents(-500));
        assert_eq!(drawer.current_balance, Money::from_cents(16500));
        assert_eq!(drawer.total_sales, Money::from_cents(7000));
    }

    #[test]
    fn test_enhance_description() {
        assert_eq!(
            enhance_description("Cash sale transaction", "R1"),
            "Cash sale transaction (R1)"
        );
        assert_eq!(
            enhance_description("Cash sale transaction", "Transaction #42"),
            "Cash sale transaction #42"
        );
        // Reference already present: unchanged.
        assert_eq!(
            enhance_description("Refund for R1", "R1"),
            "Refund for R1"
        );
        // Empty reference: unchanged.
        assert_eq!(enhance_description("Rent", ""), "Rent");
    }

    #[test]
    fn test_modification_description() {
        assert_eq!(
            modification_description("", "42"),
            "Modified Transaction #42"
        );
        assert_eq!(
            modification_description("price correction", "42"),
            "price correction (Transaction #42)"
        );
        assert_eq!(
            modification_description("fixed #42 pricing", "42"),
            "fixed #42 pricing"
        );
    }

    fn drawer_with_zeroed_totals() -> Drawer {
        let now = Utc::now();
        Drawer {
            id: "d1".to_string(),
            status: crate::types::DrawerStatus::Open,
            opening_balance: Money::from_cents(10000),
            current_balance: Money::from_cents(10000),
            opened_at: now,
            closed_at: None,
            cashier_id: "C1".to_string(),
            cashier_name: "Alice".to_string(),
            notes: None,
            total_sales: Money::zero(),
            total_expenses: Money::zero(),
            total_supplier_payments: Money::zero(),
            cash_in: Money::zero(),
            cash_out: Money::zero(),
            net_sales: Money::zero(),
            net_cash_flow: Money::zero(),
            last_updated: now,
        }
    }
}
