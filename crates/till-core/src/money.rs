//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A drawer ledger folds thousands of entries into one running balance;  │
//! │  binary floats drift, and drift in a cash ledger is a discrepancy.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount, balance, and aggregate is an i64 cent count.          │
//! │    Addition and subtraction are exact; tolerance is one explicit cent. │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! // Create from cents (preferred)
//! let amount = Money::from_cents(10050); // $100.50
//!
//! // Arithmetic operations
//! let total = amount + Money::from_cents(500); // $105.50
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Tolerance
// =============================================================================

/// Tolerance for balance comparisons: one cent.
///
/// ## Semantics
/// Two balances agree when they differ by strictly less than this value
/// (with integer cents, that means exact equality). A recorded balance
/// snapshot counts as a discrepancy only when it diverges by strictly
/// more than this value.
pub const BALANCE_EPSILON: Money = Money::from_cents(1);

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Transaction amounts carry their direction; outgoing
///   ledger entries are stored negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let outgoing = Money::from_cents(-550);
    /// assert_eq!(outgoing.abs().cents(), 550);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Compares two values within [`BALANCE_EPSILON`].
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let a = Money::from_cents(10000);
    /// assert!(a.approx_eq(Money::from_cents(10000)));
    /// assert!(!a.approx_eq(Money::from_cents(10001)));
    /// ```
    #[inline]
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() < BALANCE_EPSILON.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This format also appears in ledger entry descriptions (e.g. the
/// closing surplus/shortage message), so it is part of observable
/// behavior, not just debugging output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation (flips direction of an amount).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Summation over iterators of Money.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, -50]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 300);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_approx_eq_is_exact_in_cents() {
        let a = Money::from_cents(12000);
        assert!(a.approx_eq(Money::from_cents(12000)));
        // One cent off is already outside the strict-less-than window.
        assert!(!a.approx_eq(Money::from_cents(12001)));
        assert!(!a.approx_eq(Money::from_cents(11999)));
    }
}
