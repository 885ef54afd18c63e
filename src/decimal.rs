use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::config::DisplayConfig;

/// Money amount kept at full decimal precision.
///
/// Arithmetic never rounds. Rounding happens only through [`Money::round_dp`]
/// and [`Money::format_with`], which are meant for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d)
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?))
    }

    /// create from integer amount (reais, dollars, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round half away from zero to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// format for display, e.g. `R$ 1.234,57`
    pub fn format_with(&self, display: &DisplayConfig) -> String {
        let rounded = self.round_dp(display.decimal_places).0;
        let digits = format!("{:.*}", display.decimal_places as usize, rounded.abs());
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (digits.clone(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push_str(&display.thousands_separator);
            }
            grouped.push(ch);
        }

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        if !display.currency_symbol.is_empty() {
            out.push_str(&display.currency_symbol);
            out.push(' ');
        }
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            out.push_str(&display.decimal_separator);
            out.push_str(&frac);
        }
        out
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money(self.0 * other)
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money(self.0 / other)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// monthly interest rate, stored as a fraction (0.025 for 2.5%)
///
/// Serialized as a percent, which is how the backend reports `interestRate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from fraction (e.g., 0.025 for 2.5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percent (e.g., 2.5 for 2.5%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p / Decimal::ONE_HUNDRED)
    }

    /// get as fraction
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percent
    pub fn as_percentage(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl Serialize for Rate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.as_percentage(), serializer)
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Rate::from_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_arithmetic_keeps_precision() {
        let third = Money::from_major(100) / dec!(3);
        let back = third * dec!(3);
        // no intermediate rounding to cents
        assert!(third.as_decimal().scale() > 2);
        assert!((back - Money::from_major(100)).abs() < Money::from_str_exact("0.0000001").unwrap());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Money::from_str_exact("2.345").unwrap().round_dp(2).to_string(), "2.35");
        assert_eq!(Money::from_str_exact("-2.345").unwrap().round_dp(2).to_string(), "-2.35");
    }

    #[test]
    fn test_format_brazilian_currency() {
        let display = DisplayConfig::brazil();
        let m = Money::from_str_exact("1234567.891").unwrap();
        assert_eq!(m.format_with(&display), "R$ 1.234.567,89");
        assert_eq!(Money::from_str_exact("-0.5").unwrap().format_with(&display), "-R$ 0,50");
        assert_eq!(Money::ZERO.format_with(&display), "R$ 0,00");
    }

    #[test]
    fn test_format_default_display() {
        let display = DisplayConfig::default();
        assert_eq!(Money::from_major(1000).format_with(&display), "$ 1,000.00");
        assert_eq!(Money::from_major(999).format_with(&display), "$ 999.00");
    }

    #[test]
    fn test_rate_percent_roundtrip() {
        let rate = Rate::from_percent(dec!(2.5));
        assert_eq!(rate.as_decimal(), dec!(0.025));
        assert_eq!(rate.as_percentage(), dec!(2.5));
        assert_eq!(rate.to_string(), "2.5%");
    }

    #[test]
    fn test_rate_deserializes_from_number_or_string() {
        let from_number: Rate = serde_json::from_str("3.5").unwrap();
        let from_string: Rate = serde_json::from_str("\"3.5\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_decimal(), dec!(0.035));
    }

    #[test]
    fn test_rate_serializes_as_percent() {
        let rate = Rate::from_percent(dec!(2.5));
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, "\"2.5\"");

        let back: Rate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rate);
    }

    #[test]
    fn test_money_deserializes_from_number_or_string() {
        let a: Money = serde_json::from_str("500").unwrap();
        let b: Money = serde_json::from_str("\"500.00\"").unwrap();
        assert_eq!(a, b);
    }
}
