use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use tracing::warn;

/// Money type with 8 decimal places of working precision; cents only at output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s.trim())?.round_dp(8)))
    }

    /// lenient parse for amounts coming out of the accounting sync.
    ///
    /// Accepts `1234.56`, `1234,56`, `1.234,56` and `1,234.56`, with or without a
    /// trailing currency sign. Anything else is `None`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let cleaned: String = s
            .trim()
            .trim_end_matches('€')
            .trim_end_matches("EUR")
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        if let Ok(d) = Decimal::from_str(&cleaned) {
            return Some(Money::from_decimal(d));
        }

        let last_comma = cleaned.rfind(',');
        let last_dot = cleaned.rfind('.');
        let normalized = match (last_comma, last_dot) {
            // german: dots group thousands, comma separates decimals
            (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => cleaned.replace(',', ""),
            (Some(_), None) => cleaned.replace(',', "."),
            _ => return None,
        };
        Decimal::from_str(&normalized).ok().map(Money::from_decimal)
    }

    /// create from integer amount (euros)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, 2))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to specified decimal places (banker's rounding)
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// round to whole cents, half away from zero as invoices are printed
    pub fn round_cents(&self) -> Self {
        Money(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// lossy conversion for template contexts
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// simple interest for `days` at an annual percentage over a `year_basis`-day year.
    ///
    /// Amounts beyond the decimal range yield zero and are logged.
    pub fn apply_rate(&self, annual_rate: Rate, days: u32, year_basis: u32) -> Self {
        let factor = annual_rate
            .as_percent()
            .checked_mul(Decimal::from(days))
            .and_then(|p| p.checked_div(Decimal::ONE_HUNDRED * Decimal::from(year_basis)));
        match factor.and_then(|f| self.0.checked_mul(f)) {
            Some(interest) => Money::from_decimal(interest),
            None => {
                warn!(
                    principal = %self.0,
                    %annual_rate,
                    days,
                    "interest overflowed, charging none"
                );
                Money::ZERO
            }
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0).round_dp(8))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_add(other.0).round_dp(8);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).round_dp(8))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// annual interest rate in percentage points (e.g. 12.62 for 12.62% p.a.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from percentage points (e.g. 5 for 5%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p)
    }

    /// get as percentage points
    pub fn as_percent(&self) -> Decimal {
        self.0
    }

    /// check if strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// add percentage points
    pub fn plus_points(&self, points: Decimal) -> Rate {
        Rate(self.0 + points)
    }

    /// lossy conversion for template contexts
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_percent(d)
    }
}
