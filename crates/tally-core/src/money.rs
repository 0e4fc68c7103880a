//! # Money Module
//!
//! Provides the `Money` type for every price, total and ledger amount in the
//! sales core.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Collaborators send prices as JSON numbers:  "price": 19.99            │
//! │  As f64:  19.99 * 3 = 59.970000000000006     ❌ WRONG!                  │
//! │                                                                         │
//! │  OUR SOLUTION: parse the decimal TEXT straight into cents              │
//! │    "19.99" → 1999 cents → × 3 = 5997 cents   ✅                         │
//! │                                                                         │
//! │  Two fractional digits of precision, always.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::parse_decimal("19.99").unwrap();
//! assert_eq!(price.cents(), 1999);
//!
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.to_string(), "59.97");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::ValidationError;

/// Number of fractional digits carried by [`Money`].
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Stored as `BIGINT` in PostgreSQL and serialized as a plain integer in
/// cache entries.
///
/// ```text
/// CatalogProduct.price ──► PricedLine.unit_price ──► Sale.total_price
///                                   │
///                                   └──► SaleTotals ──► Settlement amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Parses decimal text such as `"100"`, `"99.9"` or `"12.345"` into cents.
    ///
    /// Digits beyond the second fractional place are rounded half-up, so
    /// `"12.345"` becomes 1235 cents. Exponent notation is rejected.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("100").unwrap().cents(), 10000);
    /// assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
    /// assert!(Money::parse_decimal("ten").is_err());
    /// ```
    pub fn parse_decimal(text: &str) -> Result<Self, ValidationError> {
        parse_scaled(text, MONEY_SCALE)
            .map(Money)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!("'{}' is not a decimal amount", text),
            })
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit amount by a quantity.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit = Money::from_cents(299);
    /// assert_eq!(unit.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps / 10000` of this amount, rounded half-up to the cent.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// // 10% of 100.00
    /// assert_eq!(Money::from_cents(10000).portion_bps(1000).cents(), 1000);
    /// // 8.25% of 10.00 = 0.825 → 0.83
    /// assert_eq!(Money::from_cents(1000).portion_bps(825).cents(), 83);
    /// ```
    pub fn portion_bps(&self, bps: u32) -> Money {
        // i128 keeps large ledgers from overflowing before the division
        let raw = self.0 as i128 * bps as i128;
        let rounded = if raw >= 0 {
            (raw + 5000) / 10000
        } else {
            (raw - 5000) / 10000
        };
        Money(rounded as i64)
    }
}

/// Parses an unsigned-or-negative decimal string into an integer scaled by
/// `10^scale`, rounding half-up on the first dropped digit.
pub(crate) fn parse_scaled(text: &str, scale: u32) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let factor = 10_i64.checked_pow(scale)?;
    let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole_value.checked_mul(factor)?;

    let mut place = factor;
    for (index, digit) in fraction.bytes().enumerate() {
        let digit = (digit - b'0') as i64;
        if index < scale as usize {
            place /= 10;
            value = value.checked_add(digit * place)?;
        } else {
            if digit >= 5 {
                value = value.checked_add(1)?;
            }
            break;
        }
    }

    Some(if negative { -value } else { value })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`"90.00"`), as printed on receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(Money::parse_decimal("100").unwrap().cents(), 10000);
        assert_eq!(Money::parse_decimal("100.0").unwrap().cents(), 10000);
        assert_eq!(Money::parse_decimal("19.99").unwrap().cents(), 1999);
        assert_eq!(Money::parse_decimal("0.5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal(".25").unwrap().cents(), 25);
        assert_eq!(Money::parse_decimal("-5.50").unwrap().cents(), -550);
    }

    #[test]
    fn test_parse_decimal_rounds_extra_digits() {
        assert_eq!(Money::parse_decimal("12.345").unwrap().cents(), 1235);
        assert_eq!(Money::parse_decimal("12.344").unwrap().cents(), 1234);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1e3").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(9000).to_string(), "90.00");
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_portion_bps() {
        assert_eq!(Money::from_cents(10000).portion_bps(1000).cents(), 1000);
        assert_eq!(Money::from_cents(10000).portion_bps(0).cents(), 0);
        assert_eq!(Money::from_cents(999).portion_bps(5000).cents(), 500);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "1999");
    }
}
