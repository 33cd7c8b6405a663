//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! All monetary values in BookHaven are integer cents. Purchase prices,
//! weekly rental rates, deposits, late fees and order totals flow through
//! this type; the UI converts to a display string exactly once, at
//! formatting time.
//!
//! ## Usage
//! ```rust
//! use bookhaven_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(2499); // $24.99
//!
//! // Arithmetic operations
//! let two_copies = price * 2;                    // $49.98
//! let with_fee = price + Money::from_cents(100); // $25.99
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// - **i64 (signed)**: refunds and fee deductions can go through negative
///   intermediate values before clamping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support, so records store plain integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_core::money::Money;
    ///
    /// let price = Money::from_cents(2499); // Represents $24.99
    /// assert_eq!(price.cents(), 2499);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_core::money::Money;
    ///
    /// let price = Money::from_major_minor(24, 99); // $24.99
    /// assert_eq!(price.cents(), 2499);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
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
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps a negative value to zero.
    ///
    /// Used for refunds: a late fee may exceed the deposit, but the
    /// refund itself must never go below zero.
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_core::money::Money;
    ///
    /// let deposit = Money::from_cents(1000);
    /// let late_fee = Money::from_cents(1200);
    /// assert_eq!((deposit - late_fee).clamp_non_negative().cents(), 0);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1999); // $19.99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 5997); // $59.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Prorates a weekly rate over a rental of `days` days, rounding to
    /// the nearest cent.
    ///
    /// ## Formula
    /// `weekly_rate × days / 7`, computed in integer math with i128 to
    /// prevent overflow. Adding 3 before dividing by 7 rounds remainders
    /// of 4-6 up and 0-3 down (nearest, since the denominator is odd).
    ///
    /// ## Example
    /// ```rust
    /// use bookhaven_core::money::Money;
    ///
    /// let weekly = Money::from_cents(600); // $6.00/week
    /// assert_eq!(weekly.prorated_weekly(14).cents(), 1200); // two weeks
    /// assert_eq!(weekly.prorated_weekly(7).cents(), 600);   // one week
    /// ```
    pub fn prorated_weekly(&self, days: u32) -> Money {
        let cents = (self.0 as i128 * days as i128 + 3) / 7;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use the API config's currency
/// formatting for actual UI display to handle localization properly.
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
