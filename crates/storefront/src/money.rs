//! Currency amounts in minor units.
//!
//! Prices are rendered as decimal text (`$ 27.00`, `$14.9`). They are parsed
//! into whole cents so that subtotal reconciliation compares integers and
//! never accumulates floating-point drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

/// An amount of money in cents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Create from a number of cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount as a float, for display only
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse an unsigned decimal amount such as `27`, `14.9` or `95.90`.
    ///
    /// Digits past the minor unit round half-up. Returns `None` for anything
    /// that is not `digits[.digits]`.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let text = text.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let dollars: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().ok()?
        };

        let mut digits = frac.bytes().map(|b| i64::from(b - b'0'));
        let tens = digits.next().unwrap_or(0);
        let ones = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let cents = dollars
            .checked_mul(100)?
            .checked_add(tens * 10 + ones + i64::from(round_up))?;
        Some(Self(cents))
    }

    /// Add two amounts, or `None` on overflow
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Multiply by a quantity, or `None` on overflow
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

// Operators saturate; callers reconciling parsed readouts use the checked forms.
impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_whole_and_fraction() {
            assert_eq!(Money::parse_decimal("27"), Some(Money::from_cents(2700)));
            assert_eq!(Money::parse_decimal("14.9"), Some(Money::from_cents(1490)));
            assert_eq!(Money::parse_decimal("95.90"), Some(Money::from_cents(9590)));
            assert_eq!(Money::parse_decimal(".5"), Some(Money::from_cents(50)));
            assert_eq!(Money::parse_decimal("0.00"), Some(Money::ZERO));
        }

        #[test]
        fn test_parse_rounds_to_minor_unit() {
            assert_eq!(Money::parse_decimal("1.005"), Some(Money::from_cents(101)));
            assert_eq!(Money::parse_decimal("1.004"), Some(Money::from_cents(100)));
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert_eq!(Money::parse_decimal(""), None);
            assert_eq!(Money::parse_decimal("."), None);
            assert_eq!(Money::parse_decimal("1.2.3"), None);
            assert_eq!(Money::parse_decimal("12a"), None);
            assert_eq!(Money::parse_decimal("-4"), None);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(9590).to_string(), "$95.90");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
    }

    #[test]
    fn test_arithmetic() {
        let blue = Money::from_dollars(27) * 3;
        let black = Money::from_cents(1490) * 1;
        assert_eq!(blue + black, Money::from_cents(9590));

        let total: Money = [blue, black].into_iter().sum();
        assert_eq!(total.cents(), 9590);
        assert!((total.as_f64() - 95.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let huge = Money::parse_decimal("92233720368547758").unwrap();
        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(huge.checked_mul(1), Some(huge));
        assert_eq!(
            Money::from_cents(1490).checked_mul(3),
            Some(Money::from_cents(4470))
        );
        assert_eq!(huge * 2, Money::from_cents(i64::MAX));
        assert_eq!(huge + huge, Money::from_cents(i64::MAX));
    }
}
