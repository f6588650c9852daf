//! Integer-denominated price type.
//!
//! All money in the system is Vietnamese dong, which has no fractional minor
//! unit. Arithmetic therefore stays in `i64` end to end; the only rounding in
//! the whole pipeline is the round-half-up applied when taking a percentage
//! (the VAT step).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// An amount of money in whole Vietnamese dong.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero dong.
    pub const ZERO: Self = Self(0);

    /// Create a price from a whole-dong amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the underlying amount.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0 * quantity as i64)
    }

    /// Take a percentage of this amount, rounding half up.
    ///
    /// This is the VAT rule: 10% of 5 dong is 1 dong, not 0.
    #[must_use]
    pub const fn percent_round_half_up(&self, percent: u32) -> Self {
        Self((self.0 * percent as i64 + 50) / 100)
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    /// Format with thousands separators, e.g. `200,000 VND`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i).is_multiple_of(3) {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            write!(f, "-{grouped} VND")
        } else {
            write!(f, "{grouped} VND")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times() {
        assert_eq!(Price::new(100_000).times(2), Price::new(200_000));
        assert_eq!(Price::new(100_000).times(0), Price::ZERO);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 10% of 200,000 is exact
        assert_eq!(
            Price::new(200_000).percent_round_half_up(10),
            Price::new(20_000)
        );
        // 10% of 5 is 0.5, rounds up to 1
        assert_eq!(Price::new(5).percent_round_half_up(10), Price::new(1));
        // 10% of 4 is 0.4, rounds down to 0
        assert_eq!(Price::new(4).percent_round_half_up(10), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::new(100), Price::new(250)].into_iter().sum();
        assert_eq!(total, Price::new(350));
    }

    #[test]
    fn test_display_grouping() {
        assert_eq!(Price::new(0).to_string(), "0 VND");
        assert_eq!(Price::new(950).to_string(), "950 VND");
        assert_eq!(Price::new(30_000).to_string(), "30,000 VND");
        assert_eq!(Price::new(1_250_000).to_string(), "1,250,000 VND");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Price::new(50_000)).unwrap();
        assert_eq!(json, "50000");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Price::new(50_000));
    }
}
