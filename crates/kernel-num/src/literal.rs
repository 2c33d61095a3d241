//! Parses a numeric token's raw lexeme (as `kernel-lex` hands it over,
//! un-interpreted) into a [`Number`] (spec.md §6 "numeric literal syntax",
//! §4.7 "conversions to/from strings").
//!
//! `kernel-lex` only decides that a token *looks* numeric; it never
//! interprets digits, since doing so would require importing the numeric
//! tower into the lexer. That interpretation happens here instead, and
//! `kernel-syntax`'s reader calls this directly.

use crate::bigint::Bigint;
use crate::bigrat::Bigrat;
use crate::error::{NumError, Result};
use crate::number::Number;

/// Exactness a `#e`/`#i` prefix requests, if any. Absent a prefix, integers
/// and rationals default to exact and decimal-point/exponent numerals
/// default to inexact (R7RS's rule, which klisp inherits).
#[derive(Clone, Copy, PartialEq, Eq)]
enum Exactness {
    Exact,
    Inexact,
    Unspecified,
}

/// Parses a complete numeric literal, prefixes and all (e.g. `"#e1/3"`,
/// `"#xFF"`, `"-3.14e2"`, `"+inf.0"`, `"+infinity"`). Returns
/// [`NumError::EmptyNumeral`] or [`NumError::InvalidDigit`] on malformed
/// input; `kernel-syntax` turns either into a read error naming the
/// offending lexeme.
pub fn parse_literal(raw: &str) -> Result<Number> {
    let (body, radix, exactness) = strip_prefixes(raw)?;
    if body.is_empty() {
        return Err(NumError::EmptyNumeral);
    }

    if let Some(n) = parse_signed_infinity(body) {
        return Ok(apply_exactness_to_infinity(n, exactness));
    }

    if let Some(slash) = body.find('/') {
        let (num_str, rest) = body.split_at(slash);
        let den_str = &rest[1..];
        let num = Bigint::from_radix_str(num_str, radix)?;
        let den = Bigint::from_radix_str(den_str, radix)?;
        let rat = Bigrat::new(num, den).map_err(|_| NumError::InvalidDigit { digit: '/', radix })?;
        let exact = normalize_rational(rat);
        return Ok(match exactness {
            Exactness::Inexact => Number::Double(exact.to_f64()),
            _ => exact,
        });
    }

    if radix == 10 && is_decimal_syntax(body) {
        let (int_part, frac_part, exp) = split_decimal(body)?;
        return Ok(match exactness {
            Exactness::Exact => exact_from_decimal(int_part, frac_part, exp)?,
            _ => {
                let f: f64 = body.parse().map_err(|_| NumError::InvalidDigit { digit: '.', radix: 10 })?;
                Number::Double(f)
            }
        });
    }

    let bi = Bigint::from_radix_str(body, radix)?;
    let exact = normalize_bigint(bi);
    Ok(match exactness {
        Exactness::Inexact => Number::Double(exact.to_f64()),
        _ => exact,
    })
}

/// True iff `raw` could plausibly be consumed by [`parse_literal`] without
/// erroring on the very first character — used by `kernel-lex` to decide
/// whether a bare `+`/`-`-led token is a number or a symbol.
pub fn looks_numeric(raw: &str) -> bool {
    parse_literal(raw).is_ok()
}

fn strip_prefixes(mut s: &str) -> Result<(&str, u32, Exactness)> {
    let mut radix: Option<u32> = None;
    let mut exactness = Exactness::Unspecified;
    loop {
        if s.len() < 2 || !s.starts_with('#') {
            break;
        }
        match s.as_bytes()[1].to_ascii_lowercase() {
            b'e' if exactness == Exactness::Unspecified => {
                exactness = Exactness::Exact;
                s = &s[2..];
            }
            b'i' if exactness == Exactness::Unspecified => {
                exactness = Exactness::Inexact;
                s = &s[2..];
            }
            b'b' if radix.is_none() => {
                radix = Some(2);
                s = &s[2..];
            }
            b'o' if radix.is_none() => {
                radix = Some(8);
                s = &s[2..];
            }
            b'd' if radix.is_none() => {
                radix = Some(10);
                s = &s[2..];
            }
            b'x' if radix.is_none() => {
                radix = Some(16);
                s = &s[2..];
            }
            _ => break,
        }
    }
    Ok((s, radix.unwrap_or(10), exactness))
}

fn parse_signed_infinity(s: &str) -> Option<Number> {
    match s {
        "+inf.0" => Some(Number::Double(f64::INFINITY)),
        "-inf.0" => Some(Number::Double(f64::NEG_INFINITY)),
        "+infinity" => Some(Number::ExactInf { negative: false }),
        "-infinity" => Some(Number::ExactInf { negative: true }),
        _ => None,
    }
}

fn apply_exactness_to_infinity(n: Number, exactness: Exactness) -> Number {
    let negative = match &n {
        Number::Double(d) => *d < 0.0,
        Number::ExactInf { negative } => *negative,
        _ => unreachable!("parse_signed_infinity only ever returns Double or ExactInf"),
    };
    match exactness {
        Exactness::Exact => Number::ExactInf { negative },
        Exactness::Inexact => Number::Double(if negative { f64::NEG_INFINITY } else { f64::INFINITY }),
        Exactness::Unspecified => n,
    }
}

/// A radix-10 numeral contains decimal-point-float syntax if it has a `.`
/// or an exponent marker; `e`/`E` only counts outside radix 16, where the
/// caller never reaches this (hex digits `a`-`f` include `e`).
fn is_decimal_syntax(s: &str) -> bool {
    s.contains('.') || s.contains('e') || s.contains('E')
}

fn split_decimal(s: &str) -> Result<(&str, &str, i32)> {
    let (mantissa, exp) = match s.find(['e', 'E']) {
        Some(i) => {
            let exp: i32 = s[i + 1..].parse().map_err(|_| NumError::InvalidDigit { digit: 'e', radix: 10 })?;
            (&s[..i], exp)
        }
        None => (s, 0),
    };
    match mantissa.find('.') {
        Some(i) => Ok((&mantissa[..i], &mantissa[i + 1..], exp)),
        None => Ok((mantissa, "", exp)),
    }
}

/// Builds the exact rational `int_part.frac_part × 10^exp` represents,
/// e.g. `#e3.14` becomes `157/50` rather than a `Double` approximation.
fn exact_from_decimal(int_part: &str, frac_part: &str, exp: i32) -> Result<Number> {
    let negative = int_part.starts_with('-');
    let digits: String =
        int_part.trim_start_matches(['+', '-']).chars().chain(frac_part.chars()).collect();
    let digits = if digits.is_empty() { "0" } else { digits.as_str() };
    let mut num = Bigint::from_radix_str(digits, 10)?;
    if negative {
        num = num.neg();
    }
    let scale = exp - frac_part.len() as i32;
    let pow_of_ten = |n: i32| -> Result<Bigint> { Bigint::from_radix_str(&format!("1{}", "0".repeat(n as usize)), 10) };
    let rat = if scale >= 0 {
        Bigrat::new(num.mul(&pow_of_ten(scale)?), Bigint::from_u64(1))
    } else {
        Bigrat::new(num, pow_of_ten(-scale)?)
    }
    .map_err(|_| NumError::InvalidDigit { digit: '.', radix: 10 })?;
    Ok(normalize_rational(rat))
}

fn normalize_bigint(b: Bigint) -> Number {
    match b.to_i64() {
        Some(i) => Number::Int(i),
        None => Number::Bignum(b),
    }
}

fn normalize_rational(r: Bigrat) -> Number {
    match r.try_to_bigint() {
        Some(b) => normalize_bigint(b),
        None => Number::Rational(r),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal_integer() {
        assert_eq!(parse_literal("42").unwrap(), Number::Int(42));
        assert_eq!(parse_literal("-7").unwrap(), Number::Int(-7));
    }

    #[test]
    fn hex_prefix() {
        assert_eq!(parse_literal("#xFF").unwrap(), Number::Int(255));
        assert_eq!(parse_literal("#x-10").unwrap(), Number::Int(-16));
    }

    #[test]
    fn binary_and_octal_prefixes() {
        assert_eq!(parse_literal("#b101").unwrap(), Number::Int(5));
        assert_eq!(parse_literal("#o17").unwrap(), Number::Int(15));
    }

    #[test]
    fn rational_literal_reduces() {
        assert_eq!(parse_literal("2/4").unwrap(), Number::Rational(Bigrat::new(Bigint::from_i64(1), Bigint::from_i64(2)).unwrap()));
    }

    #[test]
    fn rational_literal_collapses_to_integer() {
        assert_eq!(parse_literal("6/3").unwrap(), Number::Int(2));
    }

    #[test]
    fn inexact_prefix_forces_double() {
        assert!(matches!(parse_literal("#i3").unwrap(), Number::Double(d) if d == 3.0));
    }

    #[test]
    fn exact_prefix_on_decimal_yields_rational() {
        assert_eq!(parse_literal("#e3.14").unwrap(), Number::Rational(Bigrat::new(Bigint::from_i64(157), Bigint::from_i64(50)).unwrap()));
    }

    #[test]
    fn bare_decimal_is_inexact() {
        assert!(matches!(parse_literal("3.14").unwrap(), Number::Double(_)));
    }

    #[test]
    fn signed_infinities() {
        assert_eq!(parse_literal("+infinity").unwrap(), Number::ExactInf { negative: false });
        assert!(matches!(parse_literal("-inf.0").unwrap(), Number::Double(d) if d == f64::NEG_INFINITY));
    }

    #[test]
    fn prefixes_compose_in_either_order() {
        assert_eq!(parse_literal("#e#x10").unwrap(), Number::Int(16));
        assert_eq!(parse_literal("#x#e10").unwrap(), Number::Int(16));
    }

    #[test]
    fn empty_numeral_is_an_error() {
        assert_eq!(parse_literal("#x"), Err(NumError::EmptyNumeral));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_literal("abc").is_err());
        assert!(!looks_numeric("abc"));
        assert!(looks_numeric("42"));
    }
}
