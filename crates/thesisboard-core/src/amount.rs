//! Exact ledger amounts and guarded arithmetic for derived fields.
//!
//! Ledger supply figures are around 10^17 drops, well past the 2^53 range
//! where `f64` represents every integer. Amounts are therefore held as
//! `i128` drops and only converted to floating point for display.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An integer amount of the ledger's smallest unit.
///
/// Serialized as a decimal string so JSON consumers never round it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Drops(i128);

impl Drops {
    pub const PER_NATIVE: i128 = 1_000_000;

    pub const fn new(drops: i128) -> Self {
        Self(drops)
    }

    pub const fn from_native(units: i128) -> Self {
        Self(units * Self::PER_NATIVE)
    }

    pub const fn get(self) -> i128 {
        self.0
    }

    pub fn checked_sub(self, other: Drops) -> Option<Drops> {
        self.0.checked_sub(other.0).map(Drops)
    }

    pub fn checked_add(self, other: Drops) -> Option<Drops> {
        self.0.checked_add(other.0).map(Drops)
    }

    /// Convert to native units for display. Whole and fractional parts are
    /// converted separately so the integer part stays exact up to 2^53 units.
    pub fn to_native(self) -> f64 {
        let whole = self.0 / Self::PER_NATIVE;
        let frac = self.0 % Self::PER_NATIVE;
        whole as f64 + frac as f64 / Self::PER_NATIVE as f64
    }

    /// `self / total * 100`, or `None` when `total` is zero.
    pub fn percent_of(self, total: Drops) -> Option<f64> {
        if total.0 == 0 {
            return None;
        }
        let pct = self.0 as f64 / total.0 as f64 * 100.0;
        pct.is_finite().then_some(pct)
    }
}

impl fmt::Display for Drops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid drops amount: {0:?}")]
pub struct ParseDropsError(String);

impl FromStr for Drops {
    type Err = ParseDropsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseDropsError(s.to_string()));
        }
        trimmed
            .parse::<i128>()
            .map(Drops)
            .map_err(|_| ParseDropsError(s.to_string()))
    }
}

impl Serialize for Drops {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Drops {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DropsVisitor;

        impl Visitor<'_> for DropsVisitor {
            type Value = Drops;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a decimal integer string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Drops, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Drops, E> {
                Ok(Drops(v as i128))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Drops, E> {
                Ok(Drops(v as i128))
            }
        }

        deserializer.deserialize_any(DropsVisitor)
    }
}

/// Guarded division: `None` if either side is missing, the denominator is
/// zero, or the result is not finite.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 || !d.is_finite() || !n.is_finite() {
        return None;
    }
    let q = n / d;
    q.is_finite().then_some(q)
}
