//! Exact quarter-unit arithmetic.
//!
//! Every duration and percentage in the allocator is stored as an integer count of
//! quarter units, so summing and comparing against totals never drifts.

use num_traits::cast::cast;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of quarter units in one whole unit.
pub const QUARTERS_PER_UNIT: i64 = 4;

/// Tie-break rule applied when a value sits exactly between two quarters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Ties go to the even quarter (`0.125` → `0.0`, `0.375` → `0.5`).
    #[default]
    HalfEven,
    /// Ties go away from zero (`0.125` → `0.25`).
    HalfUp,
}

/// A value held as an exact multiple of 0.25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quarters(i64);

impl Quarters {
    pub const ZERO: Self = Self(0);

    /// Build from a raw count of quarter units.
    #[must_use]
    pub const fn from_quarters(count: i64) -> Self {
        Self(count)
    }

    /// Build from a whole number of units.
    #[must_use]
    pub const fn from_whole(units: i64) -> Self {
        Self(units.saturating_mul(QUARTERS_PER_UNIT))
    }

    /// Raw count of quarter units.
    #[must_use]
    pub const fn quarters(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Lossless conversion to `f64`; every quarter multiple in range is exact.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        cast::<i64, f64>(self.0).unwrap_or(0.0) / 4.0
    }

    /// Absolute difference between two values.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> Self {
        Self(i64::try_from(self.0.abs_diff(other.0)).unwrap_or(i64::MAX))
    }
}

impl Add for Quarters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Quarters {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Quarters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Quarters {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Quarters {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Quarters> for Quarters {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Quarters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / 4;
        let fraction = match magnitude % 4 {
            0 => "0",
            1 => "25",
            2 => "5",
            _ => "75",
        };
        write!(f, "{sign}{whole}.{fraction}")
    }
}

impl Serialize for Quarters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Round `value` to the nearest multiple of 0.25.
///
/// Non-finite input rounds to zero; values beyond the `i64` quarter range saturate.
#[must_use]
pub fn quarter_round(value: f64, tie: TieBreak) -> Quarters {
    if !value.is_finite() {
        return Quarters::ZERO;
    }
    let scaled = value * 4.0;
    let rounded = match tie {
        TieBreak::HalfEven => scaled.round_ties_even(),
        TieBreak::HalfUp => scaled.round(),
    };
    let saturated = if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };
    Quarters(cast::<f64, i64>(rounded).unwrap_or(saturated))
}
