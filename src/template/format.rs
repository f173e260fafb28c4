//! German (de-DE) number, currency and date formatting.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// `1234.5` -> `1.234,50` with `decimals` fraction digits
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.*}", decimals as usize, rounded.abs());

    let (integer, fraction) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 2);
    if negative {
        out.push('-');
    }
    let digits = integer.len();
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

/// `1234.56` -> `1.234,56 €`
pub fn format_currency(value: Decimal) -> String {
    format!("{} €", format_number(value, 2))
}

/// `dd.mm.yyyy`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// inverse of [`format_currency`]: `1.234,56 €` -> `1234.56`
pub fn parse_currency(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .trim()
        .trim_end_matches('€')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_number_grouping() {
        assert_eq!(format_number(dec!(0), 2), "0,00");
        assert_eq!(format_number(dec!(12.5), 2), "12,50");
        assert_eq!(format_number(dec!(999.999), 2), "1.000,00");
        assert_eq!(format_number(dec!(1234567.891), 2), "1.234.567,89");
        assert_eq!(format_number(dec!(1234.5), 0), "1.235");
        assert_eq!(format_number(dec!(12.62), 3), "12,620");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(dec!(-1234.56), 2), "-1.234,56");
        assert_eq!(format_number(dec!(-0.001), 2), "0,00");
    }

    #[test]
    fn test_format_number_rounds_half_away_from_zero() {
        assert_eq!(format_number(dec!(0.125), 2), "0,13");
        assert_eq!(format_number(dec!(-0.125), 2), "-0,13");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1234.56)), "1.234,56 €");
        assert_eq!(format_currency(dec!(1018.830136986)), "1.018,83 €");
        assert_eq!(format_currency(dec!(5)), "5,00 €");
    }

    #[test]
    fn test_currency_round_trip() {
        assert_eq!(parse_currency("1.234,56 €"), Some(dec!(1234.56)));
        assert_eq!(parse_currency("1.234,56\u{a0}€"), Some(dec!(1234.56)));
        assert_eq!(parse_currency("-0,13 €"), Some(dec!(-0.13)));
        assert_eq!(parse_currency("€"), None);

        for value in [dec!(0.01), dec!(42), dec!(1234.56), dec!(9876543.21), dec!(-17.5)] {
            assert_eq!(parse_currency(&format_currency(value)), Some(value));
        }
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_date(date), "05.01.2024");
    }
}
