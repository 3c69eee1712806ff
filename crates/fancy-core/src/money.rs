//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    149.50 × 18% = 26.909999999999997  ❌ WRONG!                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    14950 paise × 1800 bps = 26 910 000  (exact, units of 1/10000 paisa) │
//! │    Rounded ONCE at the end: 2691 paise = ₹26.91                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Precisions
//! - [`Money`]: whole paise. Everything stored or shown is `Money`.
//! - [`ExactAmount`]: paise × basis points. Tax is accumulated here so that
//!   no rounding happens before summation.
//!
//! ## Usage
//! ```rust
//! use fancy_core::money::Money;
//!
//! let price = Money::from_paise(29_900); // ₹299.00
//! let line_total = price * 3i64;        // ₹897.00
//! assert_eq!(line_total.to_string(), "₹897.00");
//!
//! let parsed = Money::parse_decimal("149.5").unwrap();
//! assert_eq!(parsed.paise(), 14_950);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Basis points in 100%. One paisa is `BPS_SCALE` units of [`ExactAmount`].
const BPS_SCALE: i128 = 10_000;

/// Paise in one rupee.
const PAISE_PER_RUPEE: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in paise (the minor unit of the rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: round-off adjustments can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as an integer**: client scripts divide by 100 for display
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► LineItem.unit_price ──► LineItem.line_total          │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │  InvoiceTotals.subtotal ──► + total_tax ──► - discount ──► grand_total  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use fancy_core::money::Money;
    ///
    /// let price = Money::from_paise(14_950); // ₹149.50
    /// assert_eq!(price.paise(), 14_950);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts only the rupee part carries the sign:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * PAISE_PER_RUPEE - paise)
        } else {
            Money(rupees * PAISE_PER_RUPEE + paise)
        }
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Parses a decimal rupee string such as `"149.50"`, `"99"` or `"-0.5"`.
    ///
    /// At most two fractional digits are accepted; anything finer than a
    /// paisa is rejected rather than rounded.
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must be a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most 2 decimal places"));
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };
        let paise: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("must be a number"))?,
        };

        let total = rupees
            .checked_mul(PAISE_PER_RUPEE)
            .and_then(|r| r.checked_add(paise))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
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
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts, returning `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use fancy_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(14_900); // ₹149.00
    /// assert_eq!(unit_price.multiply_quantity(3).paise(), 44_700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes the exact (unrounded) tax on this amount.
    ///
    /// ## Example
    /// ```rust
    /// use fancy_core::money::Money;
    /// use fancy_core::types::TaxRate;
    ///
    /// // ₹0.99 at 5% = 4.95 paise, kept exact until the invoice is summed
    /// let tax = Money::from_paise(99).calculate_tax(TaxRate::from_bps(500));
    /// assert_eq!(tax.round_to_paise().paise(), 5);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> ExactAmount {
        ExactAmount(self.0 as i128 * rate.bps() as i128)
    }

    /// Lifts this amount into [`ExactAmount`] precision.
    #[inline]
    pub const fn to_exact(&self) -> ExactAmount {
        ExactAmount(self.0 as i128 * BPS_SCALE)
    }
}

// =============================================================================
// Exact Amount
// =============================================================================

/// A monetary value in units of 1/10 000 paisa.
///
/// `paise × basis points` lands exactly on this scale, so any sum of line
/// taxes at percentage rates is exact. Rounding happens only through the
/// `round_*` methods, half away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ExactAmount(i128);

impl ExactAmount {
    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        ExactAmount(0)
    }

    /// Raw value in 1/10 000 paisa.
    #[inline]
    pub const fn raw(&self) -> i128 {
        self.0
    }

    /// Rounds to the nearest paisa.
    pub fn round_to_paise(&self) -> Money {
        Money(round_div(self.0, BPS_SCALE) as i64)
    }

    /// Rounds half of this amount to the nearest paisa.
    ///
    /// Used for the CGST/SGST split: each half is rounded independently.
    pub fn half_round_to_paise(&self) -> Money {
        Money(round_div(self.0, BPS_SCALE * 2) as i64)
    }

    /// Rounds to the nearest whole rupee, returned in paise.
    pub fn round_to_rupee(&self) -> Money {
        let per_rupee = BPS_SCALE * PAISE_PER_RUPEE as i128;
        Money((round_div(self.0, per_rupee) * PAISE_PER_RUPEE as i128) as i64)
    }

    /// Rounds to the nearest whole rupee, or `None` when the result does not
    /// fit in [`Money`].
    pub fn checked_round_to_rupee(&self) -> Option<Money> {
        let per_rupee = BPS_SCALE * PAISE_PER_RUPEE as i128;
        i64::try_from(round_div(self.0, per_rupee) * PAISE_PER_RUPEE as i128)
            .ok()
            .map(Money)
    }

    /// Returns true when the amount is a whole number of paise.
    pub fn is_whole_paise(&self) -> bool {
        self.0 % BPS_SCALE == 0
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        -((-numerator + half) / denominator)
    }
}

impl Add for ExactAmount {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        ExactAmount(self.0 + other.0)
    }
}

impl AddAssign for ExactAmount {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for ExactAmount {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        ExactAmount(self.0 - other.0)
    }
}

impl Sum for ExactAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ExactAmount::zero(), |acc, x| acc + x)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `₹1234.50` / `-₹5.50`.
///
/// Display grouping (`₹1,234.50`) is left to the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, x| acc + *x)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
