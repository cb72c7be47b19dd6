use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid localized amount: '{0}'")]
pub struct MoneyError(pub String);

/// A signed monetary amount. Arithmetic is exact; rounding to two places is
/// explicit via [`Money::rounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or_default()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// `None` when the exact sum leaves the representable range.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn rounded(self) -> Self {
        Money(self.0.round_dp(2))
    }

    /// Parses the source ledger's decimal-comma form (`"1.234,56"`).
    ///
    /// Every `.` is treated as a thousands separator and dropped, then `,`
    /// becomes the decimal point.
    pub fn parse_localized(text: &str) -> Result<Self, MoneyError> {
        let normalized = text.trim().replace('.', "").replace(',', ".");
        Decimal::from_str(&normalized)
            .map(Money)
            .map_err(|_| MoneyError(text.to_string()))
    }

    /// Renders an integral minor-unit amount (cents) as localized text.
    pub fn format_minor(cents: i64) -> String {
        Money::from_cents(cents).to_localized()
    }

    /// `1234.56`, always two fractional digits.
    pub fn to_canonical(self) -> String {
        let d = self.0.round_dp(2);
        // Avoid rendering "-0.00" after rounding a tiny negative.
        let d = if d.is_zero() { Decimal::ZERO } else { d };
        format!("{:.2}", d)
    }

    /// `1234,56`, always two fractional digits, no thousands separator.
    pub fn to_localized(self) -> String {
        self.to_canonical().replace('.', ",")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Money {
        Money::parse_localized(s).unwrap()
    }

    #[test]
    fn parse_simple_comma_decimal() {
        assert_eq!(parse("50,00").to_cents(), 5000);
        assert_eq!(parse("2,50").to_cents(), 250);
    }

    #[test]
    fn parse_thousands_separator() {
        assert_eq!(parse("1.234,56").to_cents(), 123456);
        assert_eq!(parse("1.000.000,01").to_cents(), 100000001);
    }

    #[test]
    fn parse_negative() {
        assert_eq!(parse("-5,00").to_cents(), -500);
        assert!(parse("-5,00").is_negative());
    }

    #[test]
    fn parse_without_fraction() {
        assert_eq!(parse("12").to_cents(), 1200);
    }

    #[test]
    fn parse_tolerates_whitespace() {
        assert_eq!(parse(" 3,10 ").to_cents(), 310);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Money::parse_localized("abc").is_err());
        assert!(Money::parse_localized("").is_err());
        assert!(Money::parse_localized("1,2,3").is_err());
    }

    #[test]
    fn parse_error_keeps_original_text() {
        let err = Money::parse_localized("12x,00").unwrap_err();
        assert_eq!(err.0, "12x,00");
    }

    #[test]
    fn format_minor_units() {
        assert_eq!(Money::format_minor(5000), "50,00");
        assert_eq!(Money::format_minor(-250), "-2,50");
        assert_eq!(Money::format_minor(7), "0,07");
        assert_eq!(Money::format_minor(0), "0,00");
    }

    #[test]
    fn canonical_and_localized_rendering() {
        let m = parse("1.234,5");
        assert_eq!(m.to_canonical(), "1234.50");
        assert_eq!(m.to_localized(), "1234,50");
        assert_eq!(Money::zero().to_canonical(), "0.00");
    }

    #[test]
    fn localized_round_trip_normalizes() {
        for (input, expected) in [
            ("1.234,56", "1234,56"),
            ("0,00", "0,00"),
            ("-5,00", "-5,00"),
            ("7,5", "7,50"),
            ("100", "100,00"),
        ] {
            assert_eq!(parse(input).to_localized(), expected, "input {input}");
        }
    }

    #[test]
    fn rounding_is_explicit() {
        let third = Money::from_decimal(Decimal::from(10) / Decimal::from(3));
        assert_ne!(third, third.rounded());
        assert_eq!(third.rounded().to_canonical(), "3.33");
    }

    #[test]
    fn negative_zero_renders_plain() {
        let tiny = Money::from_decimal(Decimal::new(-1, 3));
        assert_eq!(tiny.to_canonical(), "0.00");
    }

    #[test]
    fn checked_add_and_neg() {
        let total = parse("1,10").checked_add(parse("2,20")).unwrap();
        assert_eq!(total.to_cents(), 330);
        assert_eq!((-total).to_cents(), -330);
    }

    #[test]
    fn checked_add_reports_overflow() {
        let max = parse("79.228.162.514.264.337.593.543.950.335");
        assert_eq!(max.checked_add(max), None);
        assert!(max.checked_add(parse("-1")).is_some());
    }
}
