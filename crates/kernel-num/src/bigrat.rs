//! Exact rationals: numerator/denominator reduced to lowest terms with a
//! strictly positive denominator.

use crate::bigint::{Bigint, Sign};
use crate::error::{NumError, Result};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bigrat {
    num: Bigint,
    den: Bigint,
}

fn gcd(a: &Bigint, b: &Bigint) -> Bigint {
    let mut a = a.clone();
    let mut b = b.clone();
    if a.is_negative() {
        a = a.neg();
    }
    if b.is_negative() {
        b = b.neg();
    }
    while !b.is_zero() {
        let (_, r) = a.divmod(&b).expect("divisor checked non-zero by loop condition");
        a = b;
        b = r;
        if b.is_negative() {
            b = b.neg();
        }
    }
    a
}

impl Bigrat {
    /// Reduces `num/den` to lowest terms with `den > 0`. Errors if `den` is
    /// zero.
    pub fn new(num: Bigint, den: Bigint) -> Result<Bigrat> {
        if den.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        let (num, den) = if den.is_negative() { (num.neg(), den.neg()) } else { (num, den) };
        let g = gcd(&num, &den);
        if g.is_zero() || (g.to_i64() == Some(1)) {
            Ok(Bigrat { num, den })
        } else {
            let (n, _) = num.divmod(&g).expect("gcd is non-zero by construction");
            let (d, _) = den.divmod(&g).expect("gcd is non-zero by construction");
            Ok(Bigrat { num: n, den: d })
        }
    }

    pub fn from_bigint(n: Bigint) -> Bigrat {
        Bigrat { num: n, den: Bigint::from_u64(1) }
    }

    pub fn numerator(&self) -> &Bigint {
        &self.num
    }

    pub fn denominator(&self) -> &Bigint {
        &self.den
    }

    /// If the rational has reduced to an integer (denominator 1), returns
    /// the bignum, matching the evaluator's normalize-on-arithmetic rule
    /// (`§4.7`: "a rational whose denominator is 1 is converted to an
    /// integer").
    pub fn try_to_bigint(&self) -> Option<Bigint> {
        if self.den.to_i64() == Some(1) {
            Some(self.num.clone())
        } else {
            None
        }
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    pub fn neg(&self) -> Bigrat {
        Bigrat { num: self.num.neg(), den: self.den.clone() }
    }

    pub fn add(&self, other: &Bigrat) -> Result<Bigrat> {
        let num = self.num.mul(&other.den).add(&other.num.mul(&self.den));
        let den = self.den.mul(&other.den);
        Bigrat::new(num, den)
    }

    pub fn sub(&self, other: &Bigrat) -> Result<Bigrat> {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Bigrat) -> Result<Bigrat> {
        Bigrat::new(self.num.mul(&other.num), self.den.mul(&other.den))
    }

    pub fn div(&self, other: &Bigrat) -> Result<Bigrat> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        Bigrat::new(self.num.mul(&other.den), self.den.mul(&other.num))
    }

    pub fn cmp(&self, other: &Bigrat) -> Ordering {
        self.num.mul(&other.den).cmp(&other.num.mul(&self.den))
    }

    pub fn to_f64(&self) -> f64 {
        // Adequate precision for a Scheme-family `exact->inexact`; not a
        // correctly-rounded division for arbitrarily large operands.
        let n: f64 = self.num.to_radix_string(10).unwrap().parse().unwrap_or(f64::NAN);
        let d: f64 = self.den.to_radix_string(10).unwrap().parse().unwrap_or(f64::NAN);
        n / d
    }

    /// `inexact->exact` on a finite double: decomposes the IEEE 754
    /// mantissa/exponent exactly (no intermediate rounding through
    /// decimal), matching what klisp's `kreal.c` does via its own
    /// `frexp`-based conversion. `None` for non-finite input.
    pub fn from_f64(d: f64) -> Option<Bigrat> {
        if !d.is_finite() {
            return None;
        }
        if d == 0.0 {
            return Some(Bigrat::from_bigint(Bigint::zero()));
        }
        let bits = d.to_bits();
        let sign = if (bits >> 63) & 1 == 1 { Sign::Neg } else { Sign::NonNeg };
        let raw_exp = ((bits >> 52) & 0x7ff) as i64;
        let raw_mantissa = bits & 0xf_ffff_ffff_ffff;
        let (mantissa, exp) = if raw_exp == 0 {
            (raw_mantissa, -1074i64)
        } else {
            (raw_mantissa | (1 << 52), raw_exp - 1075)
        };
        let mut num = Bigint::from_u64(mantissa);
        if sign == Sign::Neg {
            num = num.neg();
        }
        let mut den = Bigint::from_u64(1);
        if exp >= 0 {
            for _ in 0..exp {
                num = num.mul(&Bigint::from_u64(2));
            }
        } else {
            for _ in 0..(-exp) {
                den = den.mul(&Bigint::from_u64(2));
            }
        }
        Bigrat::new(num, den).ok()
    }
}

impl fmt::Display for Bigrat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_to_lowest_terms() {
        let r = Bigrat::new(Bigint::from_i64(4), Bigint::from_i64(8)).unwrap();
        assert_eq!(r.numerator().to_i64(), Some(1));
        assert_eq!(r.denominator().to_i64(), Some(2));
    }

    #[test]
    fn normalizes_denominator_sign() {
        let r = Bigrat::new(Bigint::from_i64(1), Bigint::from_i64(-2)).unwrap();
        assert_eq!(r.numerator().sign(), Sign::Neg);
        assert_eq!(r.denominator().to_i64(), Some(2));
    }

    #[test]
    fn integral_result_collapses() {
        let r = Bigrat::new(Bigint::from_i64(6), Bigint::from_i64(3)).unwrap();
        assert_eq!(r.try_to_bigint().and_then(|b| b.to_i64()), Some(2));
    }

    #[test]
    fn division_by_zero_rational() {
        let a = Bigrat::from_bigint(Bigint::from_i64(1));
        let z = Bigrat::from_bigint(Bigint::zero());
        assert_eq!(a.div(&z), Err(NumError::DivisionByZero));
    }
}
