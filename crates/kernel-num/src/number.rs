//! The unified numeric tower: fixints normalize into this as `Int`, with
//! automatic promotion to `Bignum` on overflow and to `Double` whenever an
//! operand is inexact. `Einf`/`Iinf` are exact/inexact signed infinities.

use crate::bigint::Bigint;
use crate::bigrat::Bigrat;
use crate::error::{NumError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Small integers live as plain `i64` until an operation would overflow,
/// then promote to `Bignum`. This mirrors spec.md §4.7's "small-int bound
/// (signed 32-bit)" at native-word width rather than artificially
/// truncating to 32 bits in a 64-bit-native Rust implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Bignum(Bigint),
    Rational(Bigrat),
    Double(f64),
    /// Exact signed infinity (`+`/`-`), as distinct from inexact `Double`
    /// infinity: klisp keeps these as separate tags so exactness queries
    /// and printing can distinguish `#e+infinity` from `+inf.0`.
    ExactInf { negative: bool },
}

impl Number {
    pub fn is_exact(&self) -> bool {
        !matches!(self, Number::Double(_))
    }

    /// Exposed for ground bindings (`quotient`/`remainder`/`modulo`) that
    /// need the underlying `Bigint` for integer-only operations `Number`
    /// itself doesn't model (truncating/floor division split).
    pub fn to_bigint(&self) -> Option<Bigint> {
        match self {
            Number::Int(i) => Some(Bigint::from_i64(*i)),
            Number::Bignum(b) => Some(b.clone()),
            Number::Rational(r) => r.try_to_bigint(),
            _ => None,
        }
    }

    fn to_rational(&self) -> Option<Bigrat> {
        match self {
            Number::Int(i) => Some(Bigrat::from_bigint(Bigint::from_i64(*i))),
            Number::Bignum(b) => Some(Bigrat::from_bigint(b.clone())),
            Number::Rational(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Bignum(b) => b.to_radix_string(10).unwrap().parse().unwrap_or(f64::NAN),
            Number::Rational(r) => r.to_f64(),
            Number::Double(d) => *d,
            Number::ExactInf { negative } => {
                if *negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Collapses a bignum back to `Int` when it fits, and a rational back
    /// to an integer when its denominator is 1 — the normalization rule
    /// every arithmetic primitive must apply (`§4.7`).
    pub fn normalize_bigint(b: Bigint) -> Number {
        match b.to_i64() {
            Some(i) => Number::Int(i),
            None => Number::Bignum(b),
        }
    }

    pub fn normalize_rational(r: Bigrat) -> Number {
        match r.try_to_bigint() {
            Some(b) => Self::normalize_bigint(b),
            None => Number::Rational(r),
        }
    }

    fn is_inf(&self) -> bool {
        matches!(self, Number::ExactInf { .. }) || matches!(self, Number::Double(d) if d.is_infinite())
    }

    fn inf_sign(&self) -> Option<bool> {
        match self {
            Number::ExactInf { negative } => Some(*negative),
            Number::Double(d) if d.is_infinite() => Some(*d < 0.0),
            _ => None,
        }
    }

    pub fn add(&self, other: &Number) -> Result<Number> {
        if self.is_inf() || other.is_inf() {
            return Self::add_with_infinity(self, other);
        }
        if matches!(self, Number::Double(_)) || matches!(other, Number::Double(_)) {
            return Ok(Number::Double(self.to_f64() + other.to_f64()));
        }
        if let (Some(a), Some(b)) = (int_pair(self, other)) {
            if let Some(sum) = a.checked_add(b) {
                return Ok(Number::Int(sum));
            }
        }
        let (a, b) = (self.to_rational().unwrap(), other.to_rational().unwrap());
        Ok(Self::normalize_rational(a.add(&b)?))
    }

    pub fn sub(&self, other: &Number) -> Result<Number> {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Int(i) => i.checked_neg().map(Number::Int).unwrap_or_else(|| {
                Self::normalize_bigint(Bigint::from_i64(*i).neg())
            }),
            Number::Bignum(b) => Self::normalize_bigint(b.neg()),
            Number::Rational(r) => Number::Rational(r.neg()),
            Number::Double(d) => Number::Double(-d),
            Number::ExactInf { negative } => Number::ExactInf { negative: !negative },
        }
    }

    pub fn mul(&self, other: &Number) -> Result<Number> {
        if self.is_inf() || other.is_inf() {
            return Self::mul_with_infinity(self, other);
        }
        if matches!(self, Number::Double(_)) || matches!(other, Number::Double(_)) {
            return Ok(Number::Double(self.to_f64() * other.to_f64()));
        }
        if let (Some(a), Some(b)) = int_pair(self, other) {
            if let Some(prod) = a.checked_mul(b) {
                return Ok(Number::Int(prod));
            }
        }
        let (a, b) = (self.to_rational().unwrap(), other.to_rational().unwrap());
        Ok(Self::normalize_rational(a.mul(&b)?))
    }

    pub fn div(&self, other: &Number) -> Result<Number> {
        if other.is_zero_exact() {
            return Err(NumError::DivisionByZero);
        }
        if self.is_inf() || other.is_inf() {
            return Self::div_with_infinity(self, other);
        }
        if matches!(self, Number::Double(_)) || matches!(other, Number::Double(_)) {
            return Ok(Number::Double(self.to_f64() / other.to_f64()));
        }
        let (a, b) = (self.to_rational().unwrap(), other.to_rational().unwrap());
        Ok(Self::normalize_rational(a.div(&b)?))
    }

    fn is_zero_exact(&self) -> bool {
        matches!(self, Number::Int(0))
            || matches!(self, Number::Bignum(b) if b.is_zero())
            || matches!(self, Number::Rational(r) if r.is_zero())
    }

    fn add_with_infinity(a: &Number, b: &Number) -> Result<Number> {
        match (a.inf_sign(), b.inf_sign()) {
            (Some(sa), Some(sb)) if sa != sb => Err(NumError::Overflow),
            (Some(sa), _) | (_, Some(sa)) => {
                if matches!(a, Number::Double(_)) || matches!(b, Number::Double(_)) {
                    Ok(Number::Double(if sa { f64::NEG_INFINITY } else { f64::INFINITY }))
                } else {
                    Ok(Number::ExactInf { negative: sa })
                }
            }
            _ => unreachable!("at least one operand is infinite"),
        }
    }

    fn mul_with_infinity(a: &Number, b: &Number) -> Result<Number> {
        let neg = a.inf_sign().unwrap_or(a.to_f64() < 0.0) ^ b.inf_sign().unwrap_or(b.to_f64() < 0.0);
        if matches!(a, Number::Double(_)) || matches!(b, Number::Double(_)) {
            Ok(Number::Double(if neg { f64::NEG_INFINITY } else { f64::INFINITY }))
        } else {
            Ok(Number::ExactInf { negative: neg })
        }
    }

    fn div_with_infinity(a: &Number, b: &Number) -> Result<Number> {
        if a.is_inf() && b.is_inf() {
            return Err(NumError::Overflow);
        }
        if b.is_inf() {
            return Ok(Number::Int(0));
        }
        let neg = a.inf_sign().unwrap_or(false) ^ (b.to_f64() < 0.0);
        if matches!(a, Number::Double(_)) || matches!(b, Number::Double(_)) {
            Ok(Number::Double(if neg { f64::NEG_INFINITY } else { f64::INFINITY }))
        } else {
            Ok(Number::ExactInf { negative: neg })
        }
    }

    pub fn cmp(&self, other: &Number) -> Option<Ordering> {
        if self.is_inf() || other.is_inf() {
            return self.to_f64().partial_cmp(&other.to_f64());
        }
        if matches!(self, Number::Double(_)) || matches!(other, Number::Double(_)) {
            return self.to_f64().partial_cmp(&other.to_f64());
        }
        Some(self.to_rational()?.cmp(&other.to_rational()?))
    }

    pub fn numeric_eq(&self, other: &Number) -> bool {
        self.cmp(other) == Some(Ordering::Equal)
    }
}

fn int_pair(a: &Number, b: &Number) -> (Option<i64>, Option<i64>) {
    let ai = match a {
        Number::Int(i) => Some(*i),
        _ => None,
    };
    let bi = match b {
        Number::Int(i) => Some(*i),
        _ => None,
    };
    (ai, bi)
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Bignum(b) => write!(f, "{b}"),
            Number::Rational(r) => write!(f, "{r}"),
            Number::Double(d) => {
                if d.is_infinite() {
                    write!(f, "{}", if *d < 0.0 { "-inf.0" } else { "+inf.0" })
                } else {
                    write!(f, "{d}")
                }
            }
            Number::ExactInf { negative } => {
                write!(f, "{}", if *negative { "-infinity" } else { "+infinity" })
            }
        }
    }
}
