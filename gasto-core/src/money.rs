//! Colombian peso display helpers.
//!
//! `$ 1.234.567` for whole units, `$ 1.234,50` with two fraction digits.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up (away from zero) to `dp` decimals
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as COP. Only whole pesos or cents are shown: any
/// `fraction_digits` other than 0 renders two decimals.
pub fn format_cop(amount: Decimal, fraction_digits: u32) -> String {
    let digits = if fraction_digits == 0 { 0 } else { 2 };
    let mut rounded = round_half_up(amount.abs(), digits);
    rounded.rescale(digits);
    let text = rounded.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    if amount < Decimal::ZERO && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str("$ ");
    out.push_str(&group_thousands(int_part));
    if let Some(f) = frac_part {
        out.push(',');
        out.push_str(f);
    }
    out
}

/// Percent with up to two decimals and a decimal comma: `33,33%`, `60%`
pub fn format_percent(value: Decimal) -> String {
    let p = round_half_up(value, 2).normalize();
    format!("{}%", p.to_string().replace('.', ","))
}

fn group_thousands(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_units() {
        assert_eq!(format_cop(Decimal::from(1500), 0), "$ 1.500");
        assert_eq!(format_cop(Decimal::from(1234567), 0), "$ 1.234.567");
        assert_eq!(format_cop(Decimal::from(225), 0), "$ 225");
        assert_eq!(format_cop(Decimal::ZERO, 0), "$ 0");
    }

    #[test]
    fn test_two_fraction_digits() {
        assert_eq!(format_cop(Decimal::new(123450, 2), 2), "$ 1.234,50");
        assert_eq!(format_cop(Decimal::from(-500), 2), "-$ 500,00");
        assert_eq!(format_cop(Decimal::new(9995, 3), 2), "$ 10,00");
    }

    #[test]
    fn test_odd_fraction_digits_show_cents() {
        assert_eq!(format_cop(Decimal::new(15, 1), 1), "$ 1,50");
        assert_eq!(format_cop(Decimal::new(15, 1), 5), "$ 1,50");
    }

    #[test]
    fn test_half_up_to_whole() {
        assert_eq!(format_cop(Decimal::new(1005, 1), 0), "$ 101");
        assert_eq!(format_cop(Decimal::new(-4, 1), 0), "$ 0");
    }

    #[test]
    fn test_percent() {
        assert_eq!(format_percent(Decimal::from(60)), "60%");
        assert_eq!(format_percent(Decimal::new(333333, 4)), "33,33%");
    }
}
