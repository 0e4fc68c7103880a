//! # Pricing
//!
//! Pure price math for one sale line: catalog price plus an optional
//! promotion in, realized price and discount out.
//!
//! ## Decision Table
//! ```text
//! ┌──────────────────────────────┬──────────────────────┬──────────────────┐
//! │ Promotion                    │ unit price           │ unit discount    │
//! ├──────────────────────────────┼──────────────────────┼──────────────────┤
//! │ none                         │ catalog              │ 0                │
//! │ active=false                 │ catalog              │ 0                │
//! │ rate = 0                     │ catalog              │ 0                │
//! │ outside start/end dates      │ catalog              │ 0                │
//! │ active, rate r, in window    │ catalog − catalog×r  │ catalog × r      │
//! └──────────────────────────────┴──────────────────────┴──────────────────┘
//! ```
//! Every "no discount" row goes through the same return path, so the
//! outputs cannot drift apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::{parse_scaled, Money};

/// Basis points in 100%.
pub const FULL_RATE_BPS: u32 = 10_000;

// =============================================================================
// Discount Rate
// =============================================================================

/// Promotion discount as basis points (1000 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Parses a fractional rate (`"0.1"` = 10%) as sent by the promotion
    /// service. Must lie within `0..=1`.
    ///
    /// ```rust
    /// use tally_core::pricing::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::parse_fraction("0.1").unwrap().bps(), 1000);
    /// assert_eq!(DiscountRate::parse_fraction("0.125").unwrap().bps(), 1250);
    /// assert!(DiscountRate::parse_fraction("1.5").is_err());
    /// ```
    pub fn parse_fraction(text: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidFormat {
            field: "discount_rate".to_string(),
            reason: format!("'{}' is not a rate between 0 and 1", text),
        };
        let bps = parse_scaled(text, 4).ok_or_else(invalid)?;
        if !(0..=FULL_RATE_BPS as i64).contains(&bps) {
            return Err(invalid());
        }
        Ok(DiscountRate(bps as u32))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Collaborator Views
// =============================================================================

/// Canonical product data from the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
}

/// Promotion attached to a product by the promotion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub promotion_id: Option<Uuid>,
    pub product_id: Uuid,
    pub discount_rate: DiscountRate,
    pub active: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Promotion {
    /// Whether this promotion changes the price of a sale made on `day`.
    pub fn applies_on(&self, day: NaiveDate) -> bool {
        if !self.active || self.discount_rate.is_zero() {
            return false;
        }
        let started = self.start_date.map_or(true, |start| start <= day);
        let not_ended = self.end_date.map_or(true, |end| day <= end);
        started && not_ended
    }
}

// =============================================================================
// Priced Line
// =============================================================================

/// Result of pricing one submitted line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub catalog_price: Money,
    /// Realized unit price after discount.
    pub unit_price: Money,
    /// Discount contribution per unit.
    pub unit_discount: Money,
    /// `unit_price × quantity`.
    pub line_total: Money,
}

impl PricedLine {
    /// Pre-discount value of the line.
    pub fn gross(&self) -> Money {
        self.catalog_price.multiply_quantity(self.quantity as i64)
    }

    /// Discount granted on the whole line.
    pub fn discount(&self) -> Money {
        self.unit_discount.multiply_quantity(self.quantity as i64)
    }
}

/// Prices one line.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::pricing::{price_line, CatalogProduct, DiscountRate, Promotion};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let product = CatalogProduct {
///     product_id: Uuid::new_v4(),
///     name: "Espresso".into(),
///     price: Money::from_cents(10000),
/// };
/// let promo = Promotion {
///     promotion_id: None,
///     product_id: product.product_id,
///     discount_rate: DiscountRate::from_bps(1000),
///     active: true,
///     start_date: None,
///     end_date: None,
/// };
/// let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
///
/// let line = price_line(&product, Some(&promo), 1, today);
/// assert_eq!(line.unit_price.cents(), 9000);
/// assert_eq!(line.unit_discount.cents(), 1000);
/// ```
pub fn price_line(
    product: &CatalogProduct,
    promotion: Option<&Promotion>,
    quantity: i32,
    day: NaiveDate,
) -> PricedLine {
    let unit_discount = match promotion {
        Some(promo) if promo.applies_on(day) => product.price.portion_bps(promo.discount_rate.bps()),
        _ => Money::zero(),
    };
    let unit_price = product.price - unit_discount;

    PricedLine {
        product_id: product.product_id,
        product_name: product.name.clone(),
        quantity,
        catalog_price: product.price,
        unit_price,
        unit_discount,
        line_total: unit_price.multiply_quantity(quantity as i64),
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Aggregates for one receipt.
///
/// `total == subtotal − discount == Σ line totals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaleTotals {
    /// Pre-discount subtotal.
    pub subtotal: Money,
    pub discount: Money,
    /// Post-discount total.
    pub total: Money,
}

impl SaleTotals {
    pub fn add_line(&mut self, line: &PricedLine) {
        self.subtotal += line.gross();
        self.discount += line.discount();
        self.total += line.line_total;
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a PricedLine>) -> Self {
        let mut totals = SaleTotals::default();
        for line in lines {
            totals.add_line(line);
        }
        totals
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn product(cents: i64) -> CatalogProduct {
        CatalogProduct {
            product_id: Uuid::new_v4(),
            name: "Oat Milk 1L".to_string(),
            price: Money::from_cents(cents),
        }
    }

    fn promo(product: &CatalogProduct, bps: u32, active: bool) -> Promotion {
        Promotion {
            promotion_id: Some(Uuid::new_v4()),
            product_id: product.product_id,
            discount_rate: DiscountRate::from_bps(bps),
            active,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_ten_percent_on_one_hundred() {
        let p = product(10000);
        let line = price_line(&p, Some(&promo(&p, 1000, true)), 1, day());
        assert_eq!(line.unit_price, Money::from_cents(9000));
        assert_eq!(line.unit_discount, Money::from_cents(1000));
        assert_eq!(line.line_total, Money::from_cents(9000));
    }

    #[test]
    fn test_inactive_and_zero_rate_yield_identical_lines() {
        let p = product(10000);
        let inactive = price_line(&p, Some(&promo(&p, 1000, false)), 2, day());
        let zero_rate = price_line(&p, Some(&promo(&p, 0, true)), 2, day());
        let none = price_line(&p, None, 2, day());

        assert_eq!(inactive.unit_price, p.price);
        assert_eq!(inactive, zero_rate);
        assert_eq!(inactive, none);
    }

    #[test]
    fn test_promotion_window() {
        let p = product(5000);
        let mut pr = promo(&p, 2000, true);
        pr.start_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert_eq!(price_line(&p, Some(&pr), 1, day()).unit_price, p.price);

        pr.start_date = NaiveDate::from_ymd_opt(2024, 6, 15);
        pr.end_date = NaiveDate::from_ymd_opt(2024, 6, 15);
        assert_eq!(price_line(&p, Some(&pr), 1, day()).unit_price.cents(), 4000);
    }

    #[test]
    fn test_totals_do_not_double_count_discount() {
        let a = product(10000);
        let b = product(2500);
        let lines = vec![
            price_line(&a, Some(&promo(&a, 1000, true)), 2, day()),
            price_line(&b, None, 3, day()),
        ];

        let totals = SaleTotals::from_lines(&lines);
        assert_eq!(totals.subtotal.cents(), 27500);
        assert_eq!(totals.discount.cents(), 2000);
        assert_eq!(totals.total.cents(), 25500);
        assert_eq!(totals.total, totals.subtotal - totals.discount);
    }

    #[test]
    fn test_parse_fraction_bounds() {
        assert_eq!(DiscountRate::parse_fraction("0").unwrap(), DiscountRate::from_bps(0));
        assert_eq!(DiscountRate::parse_fraction("1").unwrap().bps(), FULL_RATE_BPS);
        assert!(DiscountRate::parse_fraction("-0.1").is_err());
        assert!(DiscountRate::parse_fraction("x").is_err());
    }
}
