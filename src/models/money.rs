use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Display scale used when the currency does not configure its own.
pub const DEFAULT_CURRENCY_DECIMALS: u32 = 2;

/// An exact monetary amount.
///
/// Thin wrapper over [`rust_decimal::Decimal`]. All arithmetic is performed
/// at full precision; rounding happens only at the formatting boundary via
/// [`Money::rounded`] or [`Money::format`]. Intermediate sums across repeated
/// partial refunds therefore never drift.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Allocates `numerator / denominator` of this amount.
    ///
    /// Multiplies before dividing so the only precision loss is the final
    /// division; when `numerator == denominator` the result is exact. A zero
    /// or negative denominator degrades to zero rather than erroring.
    pub fn prorate(&self, numerator: i32, denominator: i32) -> Money {
        if denominator <= 0 || numerator <= 0 {
            return Money::ZERO;
        }
        if numerator == denominator {
            return *self;
        }
        Money((self.0 * Decimal::from(numerator)) / Decimal::from(denominator))
    }

    /// Clamps negative amounts to zero.
    pub fn clamp_non_negative(self) -> Money {
        if self.is_negative() {
            Money::ZERO
        } else {
            self
        }
    }

    /// Rounds to `decimals` places, midpoint away from zero.
    pub fn rounded(&self, decimals: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Formats at the currency's configured scale. Formatting is the only
    /// place an amount is rounded.
    pub fn format(&self, decimals: u32) -> String {
        let mut rounded = self
            .0
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(decimals);
        rounded.to_string()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(DEFAULT_CURRENCY_DECIMALS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn arithmetic_keeps_full_precision() {
        let third = Money::new(dec!(10.00)).prorate(1, 3);
        let sum = third + third + third;
        // 10.00 * 1 / 3 summed three times comes back to 10.00 only after
        // rounding; the unrounded sum keeps every digit.
        assert_ne!(sum, Money::new(dec!(10.00)));
        assert_eq!(sum.rounded(2), Money::new(dec!(10.00)));
    }

    #[test]
    fn full_proration_is_exact() {
        let total = Money::new(dec!(19.99));
        assert_eq!(total.prorate(4, 4), total);
    }

    #[test]
    fn proration_degrades_to_zero() {
        let total = Money::new(dec!(19.99));
        assert_eq!(total.prorate(1, 0), Money::ZERO);
        assert_eq!(total.prorate(0, 4), Money::ZERO);
        assert_eq!(total.prorate(-1, 4), Money::ZERO);
    }

    #[test]
    fn clamp_non_negative() {
        assert_eq!(Money::new(dec!(-0.01)).clamp_non_negative(), Money::ZERO);
        let positive = Money::new(dec!(0.01));
        assert_eq!(positive.clamp_non_negative(), positive);
    }

    #[test]
    fn format_uses_currency_decimals() {
        let m = Money::new(dec!(1.005));
        assert_eq!(m.format(2), "1.01");
        assert_eq!(m.format(0), "1");
        assert_eq!(Money::new(dec!(5)).format(2), "5.00");
    }

    #[test]
    fn display_defaults_to_two_decimals() {
        assert_eq!(Money::new(dec!(7.5)).to_string(), "7.50");
    }

    #[test]
    fn serializes_as_decimal() {
        let m = Money::new(dec!(12.34));
        let json = serde_json::to_string(&m).expect("serialize");
        assert_eq!(json, "\"12.34\"");
        let back: Money = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, m);
    }
}
