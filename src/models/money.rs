//! Integer money amounts.
//!
//! Every monetary value in the engine is a whole number of pence. Rates are
//! [`Decimal`] fractions; multiplying a [`Money`] by a rate always rounds the
//! product back to whole pence, half away from zero.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A signed amount of pence.
///
/// # Example
///
/// ```
/// use paye_engine::models::Money;
/// use rust_decimal::Decimal;
///
/// let gross = Money::from_pounds(3_000);
/// assert_eq!(gross.pence(), 300_000);
/// assert_eq!(gross.apply_rate(Decimal::new(20, 2)), Money::from_pence(60_000));
/// assert_eq!(gross.to_string(), "£3000.00");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero pence.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from pence.
    pub const fn from_pence(pence: i64) -> Self {
        Self(pence)
    }

    /// Creates an amount from whole pounds.
    pub const fn from_pounds(pounds: i64) -> Self {
        Self(pounds.saturating_mul(100))
    }

    /// Returns the amount in pence.
    pub const fn pence(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute amount.
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Floors the amount at zero.
    pub fn clamp_non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Multiplies by a fractional rate and rounds to whole pence,
    /// half away from zero.
    pub fn apply_rate(self, rate: Decimal) -> Self {
        let product = Decimal::from(self.0) * rate;
        let rounded = product.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let pence = rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Self(pence)
    }

    /// Scales the amount by `numerator / denominator` using integer
    /// arithmetic, rounding half away from zero.
    ///
    /// Used to prorate annual thresholds and bands to a pay period.
    /// A zero denominator yields zero.
    ///
    /// ```
    /// use paye_engine::models::Money;
    ///
    /// // £12,570 over twelve months is £1,047.50 a month.
    /// let monthly = Money::from_pounds(12_570).prorate(1, 12);
    /// assert_eq!(monthly, Money::from_pence(104_750));
    /// // £50,270 / 12 = £4,189.1666...
    /// assert_eq!(Money::from_pounds(50_270).prorate(1, 12), Money::from_pence(418_917));
    /// ```
    pub fn prorate(self, numerator: u32, denominator: u32) -> Self {
        if denominator == 0 {
            return Money::ZERO;
        }
        let scaled = i128::from(self.0) * i128::from(numerator);
        let denominator = i128::from(denominator);
        let magnitude = (scaled.abs() * 2 + denominator) / (denominator * 2);
        let signed = if scaled < 0 { -magnitude } else { magnitude };
        Self(i64::try_from(signed).unwrap_or(if signed < 0 {
            i64::MIN
        } else {
            i64::MAX
        }))
    }

    /// Returns the amount in pounds as a decimal with two places.
    pub fn to_pounds(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}£{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}
