//! Lenient numeric parsing of string literals
//!
//! Accepts what a user typically writes for a number in a query:
//! decimal integers, `0x`/`#` hex, `L`/`F`/`D` type suffixes, decimals
//! and exponents. Anything else, including non-finite values, is not a
//! number.

use serde_json::Number;

/// Parses `text` as a number, or `None` if it is not one
pub fn parse_numeric_literal(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .or_else(|| body.strip_prefix('#'))
    {
        return parse_hex(hex, negative);
    }

    let last = body.chars().last()?;
    match last {
        'l' | 'L' => {
            let digits = &body[..body.len() - 1];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            parse_integer(digits, negative)
        }
        'f' | 'F' | 'd' | 'D' => parse_float(&body[..body.len() - 1], negative),
        _ if body.bytes().all(|b| b.is_ascii_digit()) => parse_integer(body, negative),
        _ => parse_float(body, negative),
    }
}

fn parse_hex(hex: &str, negative: bool) -> Option<Number> {
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let magnitude = u64::from_str_radix(hex, 16).ok()?;
    signed(magnitude, negative)
}

fn parse_integer(digits: &str, negative: bool) -> Option<Number> {
    match digits.parse::<u64>() {
        Ok(magnitude) => signed(magnitude, negative),
        // Wider than 64 bits: keep the magnitude as a float
        Err(_) => parse_float(digits, negative),
    }
}

fn signed(magnitude: u64, negative: bool) -> Option<Number> {
    if !negative {
        return Some(Number::from(magnitude));
    }
    if magnitude <= i64::MAX as u64 {
        Some(Number::from(-(magnitude as i64)))
    } else if magnitude == i64::MAX as u64 + 1 {
        Some(Number::from(i64::MIN))
    } else {
        Number::from_f64(-(magnitude as f64))
    }
}

fn parse_float(body: &str, negative: bool) -> Option<Number> {
    // Sign was already stripped; a second one is malformed
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    if !body.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: f64 = body.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Number::from_f64(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str) -> Option<i64> {
        parse_numeric_literal(text).and_then(|n| n.as_i64())
    }

    fn float(text: &str) -> Option<f64> {
        parse_numeric_literal(text).and_then(|n| n.as_f64())
    }

    #[test]
    fn test_integers() {
        assert_eq!(int("42"), Some(42));
        assert_eq!(int("-42"), Some(-42));
        assert_eq!(int("+7"), Some(7));
        assert_eq!(int(" 12 "), Some(12));
        assert_eq!(int("9223372036854775807"), Some(i64::MAX));
        assert_eq!(int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(
            parse_numeric_literal("18446744073709551615").and_then(|n| n.as_u64()),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_hex_and_suffixes() {
        assert_eq!(int("0x1F"), Some(31));
        assert_eq!(int("#ff"), Some(255));
        assert_eq!(int("-0X10"), Some(-16));
        assert_eq!(int("123L"), Some(123));
        assert_eq!(float("1.5f"), Some(1.5));
        assert_eq!(float("2D"), Some(2.0));
        assert!(parse_numeric_literal("0x").is_none());
        assert!(parse_numeric_literal("0xZZ").is_none());
        assert!(parse_numeric_literal("1.5L").is_none());
    }

    #[test]
    fn test_floats() {
        assert_eq!(float("3.25"), Some(3.25));
        assert_eq!(float("-1e3"), Some(-1000.0));
        assert_eq!(float(".5"), Some(0.5));
        assert_eq!(float("5."), Some(5.0));
        // Wider than u64 falls back to a float magnitude
        assert!(float("123456789012345678901234567890").is_some());
    }

    #[test]
    fn test_not_numbers() {
        for text in ["", "   ", "abc", "null", "NaN", "inf", "-infinity", "1e999", "--1", "1-2", "12abc", "."] {
            assert!(parse_numeric_literal(text).is_none(), "{text:?} parsed");
        }
    }
}
