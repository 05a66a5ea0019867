//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    200.10 × 0.05 as f64 = 10.004999999999999  ❌                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    20010 × 500 bps / 10000 = 1000.5 → 1001 paise                        │
//! │    Rounding happens exactly once, in one place                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resort_core::money::Money;
//! use resort_core::types::Rate;
//!
//! let base = Money::from_cents(100_000); // 1000.00
//! let gst = base.percentage(Rate::from_bps(500));
//! assert_eq!(gst.cents(), 5_000);        // 50.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Every charge the engine touches (nightly room rate, food line, service
/// fee, GST, voucher discount, bill total) is a `Money`. The database stores
/// the raw `i64` in `*_cents` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use resort_core::money::Money;
    ///
    /// let price = Money::from_cents(15_000); // 150.00
    /// assert_eq!(price.cents(), 15_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use resort_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(200, 50).cents(), 20_050);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
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
    pub const fn minor_part(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `rate` of this amount, rounded half-up to the minor unit.
    ///
    /// Used for both GST on food orders and voucher discounts on bills.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000` in i128 so large bills can't overflow.
    ///
    /// ## Example
    /// ```rust
    /// use resort_core::money::Money;
    /// use resort_core::types::Rate;
    ///
    /// let gross = Money::from_cents(12_345);
    /// // 10% of 123.45 = 12.345 → 12.35
    /// assert_eq!(gross.percentage(Rate::from_bps(1000)).cents(), 1_235);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        let part = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display is for logs and debugging; clients format for their own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.minor_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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
