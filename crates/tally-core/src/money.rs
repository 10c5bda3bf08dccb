//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floats:                                                    │
//! │    200.50 + 99.50 + 0.1 + 0.2 = 300.30000000000001  ❌                  │
//! │                                                                         │
//! │  Stored invoices already contain user-typed decimals (200.5, 99.99)    │
//! │  and a few JS artifacts (30.000000000000004). Integer cents would      │
//! │  silently rewrite those on the next save.                              │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                         │
//! │    "200.50" + "99.50" = 300.00 exactly                                 │
//! │    the wire value is re-emitted as the same JSON number                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let transport = Money::parse_or_zero("200.50");
//! let food = Money::parse_or_zero("99.50");
//!
//! assert_eq!((transport + food).to_fixed(2), "300.00");
//! assert!(Money::parse_or_zero("abc").is_zero());
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Largest exponent accepted by the lenient parser (`1e28`).
const MAX_EXPONENT: i64 = 28;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major currency units, backed by `rust_decimal`.
///
/// ## Design Decisions
/// - **Decimal, not f64**: arithmetic is exact in base 10 and can never
///   produce `NaN` or infinity
/// - **Lenient parsing**: user text is read like a form field; anything that
///   does not start with a number is worth zero
/// - **Wire format**: a plain JSON number, integral values without a fraction
/// - **Saturating arithmetic**: sums and percentages clamp to the decimal
///   range (about `±7.9e28`) instead of panicking
///
/// ## Where Money is Used
/// ```text
/// ExpenseItem.amount ──► subtotal ──► tax ──► total ──► Invoice
///                                                │
///                 finalPrice (charged) ──► profit / margin
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parses the leading number of a text field.
    ///
    /// Mirrors how a numeric form field is read: surrounding whitespace is
    /// ignored, an optional sign, digits with at most one decimal point and
    /// an optional exponent are consumed, and the rest of the text is
    /// dropped (`"12.5kg"` reads as `12.5`).
    ///
    /// ## Returns
    /// `None` when the text does not start with a number, or when the value
    /// cannot be represented as a finite decimal.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse(" 12.5kg").unwrap().to_fixed(2), "12.50");
    /// assert_eq!(Money::parse(".5").unwrap().to_fixed(1), "0.5");
    /// assert!(Money::parse("kg").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Money> {
        parse_leading_decimal(text).map(Money)
    }

    /// Parses a text field, treating anything unparsable as zero.
    pub fn parse_or_zero(text: &str) -> Money {
        Money::parse(text).unwrap_or_default()
    }

    /// Converts a binary float through its shortest decimal representation.
    ///
    /// Non-finite input and values outside the decimal range become zero,
    /// so a stray `NaN` never reaches a persisted record.
    pub fn from_f64(value: f64) -> Money {
        if !value.is_finite() {
            return Money::zero();
        }
        Decimal::from_str(&value.to_string())
            .map(Money)
            .unwrap_or_default()
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `rate_percent` percent of this amount.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::parse_or_zero("300");
    /// let tax = subtotal.percent(Decimal::from(10));
    /// assert_eq!(tax.to_fixed(2), "30.00");
    /// ```
    ///
    /// Saturates at the decimal range instead of overflowing, so a rate
    /// like `"1e28"` yields a huge but finite tax.
    pub fn percent(&self, rate_percent: Decimal) -> Money {
        let exact = self
            .0
            .checked_mul(rate_percent)
            .map(|product| product / Decimal::ONE_HUNDRED);
        let scaled_first = || (self.0 / Decimal::ONE_HUNDRED).checked_mul(rate_percent);

        match exact.or_else(scaled_first) {
            Some(value) => Money(value),
            None => Money::saturated(self.0.is_sign_negative() != rate_percent.is_sign_negative()),
        }
    }

    /// The largest representable amount with the given sign.
    fn saturated(negative: bool) -> Money {
        if negative {
            Money(Decimal::MIN)
        } else {
            Money(Decimal::MAX)
        }
    }

    /// Formats with a fixed number of decimals, rounding half away from zero.
    ///
    /// This is a presentation helper; stored values are never rounded.
    pub fn to_fixed(&self, decimals: u32) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.*}", decimals as usize, rounded)
    }
}

/// Reads the numeric prefix of `text` as a decimal.
fn parse_leading_decimal(text: &str) -> Option<Decimal> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &s[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_part = &s[frac_start..frac_end];
        if !int_part.is_empty() || !frac_part.is_empty() {
            pos = frac_end;
        }
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut exponent: i64 = 0;
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut exp_pos = pos + 1;
        let exp_negative = match bytes.get(exp_pos) {
            Some(b'-') => {
                exp_pos += 1;
                true
            }
            Some(b'+') => {
                exp_pos += 1;
                false
            }
            _ => false,
        };
        let digits_start = exp_pos;
        while exp_pos < bytes.len() && bytes[exp_pos].is_ascii_digit() {
            exp_pos += 1;
        }
        if exp_pos > digits_start {
            exponent = s[digits_start..exp_pos].parse::<i64>().ok()?;
            if exp_negative {
                exponent = -exponent;
            }
        }
    }

    if exponent.abs() > MAX_EXPONENT {
        return None;
    }

    let mantissa = format!(
        "{}.{}",
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part }
    );
    let mut value = Decimal::from_str(&mantissa).ok()?;

    for _ in 0..exponent.abs() {
        value = if exponent > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }

    Some(if negative { -value } else { value })
}

// =============================================================================
// Serde
// =============================================================================

/// Emits a JSON number: integral amounts as integers (`300`), others as the
/// shortest float that reads back to the same decimal (`200.5`).
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract().is_zero() {
            if let Some(whole) = self.0.to_i64() {
                return serializer.serialize_i64(whole);
            }
        }
        let float: f64 = self.0.to_string().parse().map_err(S::Error::custom)?;
        serializer.serialize_f64(float)
    }
}

/// Accepts numbers, numeric strings and `null`; anything unparsable is zero.
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_f64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Ok(Money::parse_or_zero(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Money, D::Error> {
        Money::deserialize(deserializer)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display, e.g. `$300.00` or `-$5.50`.
///
/// ## Note
/// Exporters format with their configured currency symbol instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{}${}", sign, self.abs().to_fixed(2))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(text: &str) -> Money {
        Money::parse(text).unwrap()
    }

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(m("200.50"), Money::new(Decimal::new(20050, 2)));
        assert_eq!(m("7"), Money::from(7));
        assert_eq!(m("-5.5"), Money::new(Decimal::new(-55, 1)));
        assert_eq!(m("+3"), Money::from(3));
    }

    #[test]
    fn test_parse_reads_numeric_prefix() {
        assert_eq!(m("  12.5kg"), Money::new(Decimal::new(125, 1)));
        assert_eq!(m("10%"), Money::from(10));
        assert_eq!(m("5."), Money::from(5));
        assert_eq!(m(".25"), Money::new(Decimal::new(25, 2)));
        assert_eq!(m("1.2.3"), Money::new(Decimal::new(12, 1)));
    }

    #[test]
    fn test_parse_exponent() {
        assert_eq!(m("1e3"), Money::from(1000));
        assert_eq!(m("25E-1"), Money::new(Decimal::new(25, 1)));
        // A dangling exponent marker is ignored, like the rest of the text
        assert_eq!(m("4e"), Money::from(4));
        assert!(Money::parse("1e400").is_none());
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert!(Money::parse("").is_none());
        assert!(Money::parse("   ").is_none());
        assert!(Money::parse("abc").is_none());
        assert!(Money::parse(".").is_none());
        assert!(Money::parse("-").is_none());
        assert!(Money::parse("Infinity").is_none());
        assert!(Money::parse("NaN").is_none());
    }

    #[test]
    fn test_parse_or_zero() {
        assert!(Money::parse_or_zero("abc").is_zero());
        assert_eq!(Money::parse_or_zero("16"), Money::from(16));
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Money::from_f64(200.5), m("200.5"));
        assert!(Money::from_f64(f64::NAN).is_zero());
        assert!(Money::from_f64(f64::INFINITY).is_zero());
        assert_eq!(
            Money::from_f64(0.1 + 0.2).amount().to_string(),
            "0.30000000000000004"
        );
    }

    #[test]
    fn test_arithmetic() {
        let a = m("200.50");
        let b = m("99.50");

        assert_eq!(a + b, Money::from(300));
        assert_eq!(a - b, Money::from(101));
        assert_eq!(-b, m("-99.50"));
        assert_eq!(vec![a, b].iter().sum::<Money>(), Money::from(300));
    }

    #[test]
    fn test_percent() {
        assert_eq!(Money::from(300).percent(Decimal::from(10)), Money::from(30));
        assert_eq!(
            Money::from(1000).percent(Decimal::new(825, 2)),
            m("82.5")
        );
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let huge = m("5e28");

        assert_eq!(huge + huge, Money::new(Decimal::MAX));
        assert_eq!(-huge - huge, Money::new(Decimal::MIN));
        assert_eq!(vec![huge, huge, huge].into_iter().sum::<Money>(), Money::new(Decimal::MAX));

        let mut total = huge;
        total += huge;
        assert_eq!(total, Money::new(Decimal::MAX));
    }

    #[test]
    fn test_percent_with_extreme_rate_stays_finite() {
        let rate = m("1e28").amount();

        // 300 × 1e28 overflows, 3 × 1e28 does not
        assert_eq!(Money::from(300).percent(rate), m("3e28"));
        assert_eq!(Money::new(Decimal::MAX).percent(rate), Money::new(Decimal::MAX));
        assert_eq!(Money::new(Decimal::MIN).percent(rate), Money::new(Decimal::MIN));
        assert_eq!(Money::new(Decimal::MIN).percent(-rate), Money::new(Decimal::MAX));
        assert_eq!(
            Money::new(Decimal::MAX).percent(Decimal::from(10)),
            Money::new(Decimal::MAX / Decimal::ONE_HUNDRED * Decimal::from(10))
        );
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(m("0.01").is_positive());
        assert!(m("-0.01").is_negative());
        assert!(!m("-0").is_negative());
    }

    #[test]
    fn test_display_and_fixed() {
        assert_eq!(m("300").to_string(), "$300.00");
        assert_eq!(m("-5.5").to_string(), "-$5.50");
        assert_eq!(m("0.005").to_fixed(2), "0.01");
        assert_eq!(m("2.344").to_fixed(2), "2.34");
    }

    #[test]
    fn test_serialize_integral_and_fractional() {
        assert_eq!(serde_json::to_string(&m("300.00")).unwrap(), "300");
        assert_eq!(serde_json::to_string(&m("200.50")).unwrap(), "200.5");
        assert_eq!(serde_json::to_string(&Money::zero()).unwrap(), "0");
    }

    #[test]
    fn test_float_artifacts_survive_a_round_trip() {
        let raw = "30.000000000000004";
        let money: Money = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&money).unwrap(), raw);
    }

    #[test]
    fn test_deserialize_lenient_inputs() {
        let from_str: Money = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(from_str, m("12.5"));

        let from_null: Money = serde_json::from_str("null").unwrap();
        assert!(from_null.is_zero());

        let from_garbage: Money = serde_json::from_str("\"n/a\"").unwrap();
        assert!(from_garbage.is_zero());

        let from_int: Money = serde_json::from_str("42").unwrap();
        assert_eq!(from_int, Money::from(42));
    }
}
