//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing many discounted lines in binary floating point:               │
//! │    0.1 + 0.2 = 0.30000000000000004                                     │
//! │                                                                         │
//! │  A cart of 40 lines at 7.5% off drifts away from the penny-exact       │
//! │  value the backend ledger expects.                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    1890.00 is stored as 189000                                          │
//! │    Every percentage is applied once, rounded half up, and recorded     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockdesk_core::money::Money;
//!
//! // Create from minor units (preferred)
//! let price = Money::from_minor(1099); // 10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;                      // 21.98
//! let total = price + Money::from_minor(500);   // 15.99
//! assert_eq!(total.to_string(), "15.99");
//! ```
//!
//! Floats only appear at the edges: [`Money::from_major_f64`] for JSON
//! numbers coming from the backend and [`Money::parse`] for amounts typed
//! into a payment form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Percent;

/// Minor units per major unit (two decimal places).
pub const MINOR_PER_MAJOR: i64 = 100;

/// Largest magnitude accepted from a float, in minor units.
///
/// Stays inside the range where f64 represents every integer exactly.
const MAX_FLOAT_MINOR: f64 = 9_000_000_000_000_000.0;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts and differences can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support; the wire layer decides the JSON shape
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogProduct.unit_price ──► LineItem.unit_price ──► line gross       │
/// │                                                                         │
/// │  Cart.subtotal ──► order discount ──► tax ──► Cart.total               │
/// │                                                                         │
/// │  CreditSale.credit_amount ──► − Σ CreditPayment.amount ──► balance     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(1890).minor(), 189_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99);
    /// assert_eq!(price.minor(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.minor(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_PER_MAJOR - minor)
        } else {
            Money(major * MINOR_PER_MAJOR + minor)
        }
    }

    /// Converts a JSON number in major units into Money.
    ///
    /// Only for values crossing the wire boundary. The value is rounded to
    /// the nearest minor unit.
    ///
    /// ## Errors
    /// `ValidationError::InvalidFormat` for NaN, infinities and magnitudes
    /// that cannot be represented exactly.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(1890.5).unwrap().minor(), 189_050);
    /// assert!(Money::from_major_f64(f64::NAN).is_err());
    /// ```
    pub fn from_major_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        let minor = (value * MINOR_PER_MAJOR as f64).round();
        if minor.abs() > MAX_FLOAT_MINOR {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "is too large".to_string(),
            });
        }

        Ok(Money(minor as i64))
    }

    /// Returns the value as a JSON-friendly number in major units.
    #[inline]
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }

    /// Parses an amount typed by a user, e.g. `"3000"`, `"2999.5"`, `"12.05"`.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - At most two decimal places
    /// - Only ASCII digits, one optional leading `-`, one optional `.`
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse("3000").unwrap(), Money::from_major(3000));
    /// assert_eq!(Money::parse(" 12.5 ").unwrap().minor(), 1250);
    /// assert!(Money::parse("12.505").is_err());
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (major_part, minor_part) = match unsigned.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (unsigned, ""),
        };

        if major_part.is_empty() && minor_part.is_empty() {
            return Err(invalid("must contain digits"));
        }
        if !major_part.chars().all(|c| c.is_ascii_digit())
            || !minor_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a plain decimal number"));
        }
        if minor_part.len() > 2 {
            return Err(invalid("must have at most two decimal places"));
        }

        let major: i64 = if major_part.is_empty() {
            0
        } else {
            major_part.parse().map_err(|_| invalid("is too large"))?
        };
        let minor: i64 = match minor_part.len() {
            0 => 0,
            1 => minor_part.parse::<i64>().map_err(|_| invalid("is malformed"))? * 10,
            _ => minor_part.parse().map_err(|_| invalid("is malformed"))?,
        };

        let magnitude = major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(|| invalid("is too large"))?;

        Ok(Money(if negative { -magnitude } else { magnitude }))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major unit portion.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1099).major(), 10);
    /// assert_eq!(Money::from_minor(-550).major(), -5);
    /// ```
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
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
        Money(self.0.saturating_abs())
    }

    /// Returns the value, or zero when it is negative.
    ///
    /// Used for `max(0, credit − paid)`.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Applies a percentage and rounds half up to the minor unit.
    ///
    /// This is the single rounding point of the pricing engine: line
    /// percent discounts, the order percent discount and tax all go through
    /// here, once each.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    /// use stockdesk_core::types::Percent;
    ///
    /// let subtotal = Money::from_major(1800);
    /// let tax = subtotal.percentage(Percent::from_bps(500)); // 5%
    /// assert_eq!(tax, Money::from_major(90));
    ///
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// let tax = Money::from_minor(1000).percentage(Percent::from_bps(825));
    /// assert_eq!(tax.minor(), 83);
    /// ```
    pub fn percentage(&self, rate: Percent) -> Money {
        // i128 prevents overflow on large amounts
        let minor = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(minor.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// let unit_price = Money::from_major(1000);
    /// assert_eq!(unit_price.multiply_quantity(2), Money::from_major(2000));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Arithmetic saturates at the i64 bounds, so absurd cart input prices to a
// clamped total instead of panicking.

/// Plain decimal rendering with two places, no currency symbol.
///
/// Currency symbols and grouping belong to the dashboard's locale
/// formatting; this form is what validation messages quote.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
