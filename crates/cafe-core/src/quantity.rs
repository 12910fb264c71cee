//! # Quantity Module
//!
//! Fixed-point ingredient quantities.
//!
//! Ingredient stock is fractional (0.25 L of milk, 18.5 g of espresso), but
//! the ledger must compare and subtract exactly. Quantities are stored as
//! integer thousandths of the ingredient's unit, the same way [`Money`]
//! stores cents:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "18.5"  g   ──► Quantity(18_500) milli-units                           │
//! │  "0.25"  L   ──► Quantity(250)                                          │
//! │  "3"     pcs ──► Quantity(3_000)                                        │
//! │                                                                         │
//! │  SQL:  quantity_milli INTEGER  (conditional decrement stays exact)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Money`]: crate::money::Money

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Thousandths per whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// An ingredient quantity in thousandths of its unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Whole units, e.g. `from_units(5)` for five bottles of syrup.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// How many whole servings of `per_unit` fit into this quantity.
    ///
    /// Returns `None` when `per_unit` is not positive (nothing to divide by).
    ///
    /// ```rust
    /// use cafe_core::Quantity;
    ///
    /// let milk_on_hand = Quantity::from_milli(1_000); // 1 L
    /// let per_latte = Quantity::from_milli(240);      // 0.24 L
    /// assert_eq!(milk_on_hand.servings_of(per_latte), Some(4));
    /// ```
    pub fn servings_of(&self, per_unit: Quantity) -> Option<i64> {
        if per_unit.0 <= 0 {
            return None;
        }
        Some(self.0.max(0) / per_unit.0)
    }

    /// Subtracts `other`, saturating at zero.
    #[inline]
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        Quantity((self.0 - other.0).max(0))
    }
}

impl fmt::Display for Quantity {
    /// Renders as a decimal with trailing zeros trimmed: `18.5`, `3`, `0.25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MILLI_PER_UNIT as u64;
        let frac = abs % MILLI_PER_UNIT as u64;
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let frac = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, frac.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    /// Parses a decimal string with at most three fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number"));
        }
        if frac.len() > 3 {
            return Err(invalid("at most 3 decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac_milli: i64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<3}", frac).parse().map_err(|_| invalid("must be a number"))?
        };

        let milli = whole
            .checked_mul(MILLI_PER_UNIT)
            .and_then(|w| w.checked_add(frac_milli))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Per-unit requirement × number of items sold.
impl Mul<i64> for Quantity {
    type Output = Self;

    #[inline]
    fn mul(self, count: i64) -> Self {
        Quantity(self.0 * count)
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
