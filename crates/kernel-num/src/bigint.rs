//! Arbitrary-precision signed integers.
//!
//! Representation mirrors klisp's `imath`-derived `Bigint`: sign-magnitude,
//! digits stored least-significant limb first as 32-bit unsigned words
//! (`mp_digit`), with a 64-bit accumulator (`mp_word`) absorbing carries
//! during digit-at-a-time arithmetic. The invariant is that there is never a
//! leading (most-significant) zero limb, except for the canonical
//! representation of zero itself: a single zero limb with a non-negative
//! sign.

use crate::error::{NumError, Result};
use std::cmp::Ordering;
use std::fmt;

pub type Digit = u32;
pub type Word = u64;

const DIGIT_BITS: u32 = 32;
/// Limb count above which multiplication switches from schoolbook to
/// Karatsuba. Chosen conservatively; not tuned against a specific machine.
const KARATSUBA_THRESHOLD: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    NonNeg,
    Neg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bigint {
    sign: Sign,
    /// Least-significant digit first. Never has a leading zero limb unless
    /// the value is the canonical zero `[0]`.
    digits: Vec<Digit>,
}

impl Bigint {
    pub fn zero() -> Self {
        Bigint { sign: Sign::NonNeg, digits: vec![0] }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.len() == 1 && self.digits[0] == 0
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.sign == Sign::Neg
    }

    pub fn from_i64(v: i64) -> Self {
        let sign = if v < 0 { Sign::Neg } else { Sign::NonNeg };
        let mag = v.unsigned_abs();
        Bigint::from_magnitude_u64(mag, sign)
    }

    pub fn from_u64(v: u64) -> Self {
        Bigint::from_magnitude_u64(v, Sign::NonNeg)
    }

    fn from_magnitude_u64(mut mag: u64, sign: Sign) -> Self {
        if mag == 0 {
            return Bigint::zero();
        }
        let mut digits = Vec::new();
        while mag > 0 {
            digits.push((mag & 0xFFFF_FFFF) as Digit);
            mag >>= DIGIT_BITS;
        }
        Bigint { sign, digits }
    }

    /// Attempts to narrow to an `i64`; returns `None` on overflow, mirroring
    /// the evaluator's fixint-vs-bignum normalization (`§4.7`).
    pub fn to_i64(&self) -> Option<i64> {
        if self.digits.len() > 2 {
            return None;
        }
        let mut mag: u128 = 0;
        for (i, d) in self.digits.iter().enumerate() {
            mag |= (*d as u128) << (DIGIT_BITS as usize * i);
        }
        if self.sign == Sign::Neg {
            if mag > (i64::MAX as u128) + 1 {
                return None;
            }
            if mag == (i64::MAX as u128) + 1 {
                return Some(i64::MIN);
            }
            Some(-(mag as i64))
        } else {
            if mag > i64::MAX as u128 {
                return None;
            }
            Some(mag as i64)
        }
    }

    fn trim(digits: &mut Vec<Digit>) {
        while digits.len() > 1 && *digits.last().unwrap() == 0 {
            digits.pop();
        }
    }

    fn normalize(sign: Sign, mut digits: Vec<Digit>) -> Self {
        Self::trim(&mut digits);
        let sign = if digits.len() == 1 && digits[0] == 0 { Sign::NonNeg } else { sign };
        Bigint { sign, digits }
    }

    fn cmp_magnitude(a: &[Digit], b: &[Digit]) -> Ordering {
        if a.len() != b.len() {
            return a.len().cmp(&b.len());
        }
        for i in (0..a.len()).rev() {
            if a[i] != b[i] {
                return a[i].cmp(&b[i]);
            }
        }
        Ordering::Equal
    }

    fn add_magnitude(a: &[Digit], b: &[Digit]) -> Vec<Digit> {
        let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry: Word = 0;
        for i in 0..long.len() {
            let s = long[i] as Word + if i < short.len() { short[i] as Word } else { 0 } + carry;
            out.push((s & 0xFFFF_FFFF) as Digit);
            carry = s >> DIGIT_BITS;
        }
        if carry > 0 {
            out.push(carry as Digit);
        }
        out
    }

    /// Requires `a >= b` in magnitude.
    fn sub_magnitude(a: &[Digit], b: &[Digit]) -> Vec<Digit> {
        let mut out = Vec::with_capacity(a.len());
        let mut borrow: i64 = 0;
        for i in 0..a.len() {
            let bi = if i < b.len() { b[i] as i64 } else { 0 };
            let mut d = a[i] as i64 - bi - borrow;
            if d < 0 {
                d += 1i64 << DIGIT_BITS;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out.push(d as Digit);
        }
        out
    }

    fn mul_schoolbook(a: &[Digit], b: &[Digit]) -> Vec<Digit> {
        let mut out = vec![0 as Digit; a.len() + b.len()];
        for (i, &ai) in a.iter().enumerate() {
            if ai == 0 {
                continue;
            }
            let mut carry: Word = 0;
            for (j, &bj) in b.iter().enumerate() {
                let idx = i + j;
                let prod = ai as Word * bj as Word + out[idx] as Word + carry;
                out[idx] = (prod & 0xFFFF_FFFF) as Digit;
                carry = prod >> DIGIT_BITS;
            }
            let mut idx = i + b.len();
            while carry > 0 {
                let s = out[idx] as Word + carry;
                out[idx] = (s & 0xFFFF_FFFF) as Digit;
                carry = s >> DIGIT_BITS;
                idx += 1;
            }
        }
        out
    }

    fn mul_magnitude(a: &[Digit], b: &[Digit]) -> Vec<Digit> {
        if a.len().min(b.len()) < KARATSUBA_THRESHOLD {
            return Self::mul_schoolbook(a, b);
        }
        let n = a.len().max(b.len());
        let half = n / 2;
        let (a_lo, a_hi) = split_at(a, half);
        let (b_lo, b_hi) = split_at(b, half);

        let z0 = Self::mul_magnitude(&a_lo, &b_lo);
        let z2 = Self::mul_magnitude(&a_hi, &b_hi);
        let a_sum = Self::add_magnitude(&a_lo, &a_hi);
        let b_sum = Self::add_magnitude(&b_lo, &b_hi);
        let z1_full = Self::mul_magnitude(&a_sum, &b_sum);
        let z1_minus_z2 = Self::sub_magnitude(&z1_full, &z2_padded_for_sub(&z1_full, &z2));
        let z1 = Self::sub_magnitude(&z1_minus_z2, &z0_padded_for_sub(&z1_minus_z2, &z0));

        let mut out = vec![0 as Digit; a.len() + b.len()];
        add_shifted(&mut out, &z0, 0);
        add_shifted(&mut out, &z1, half);
        add_shifted(&mut out, &z2, 2 * half);
        out
    }

    pub fn add(&self, other: &Bigint) -> Bigint {
        if self.sign == other.sign {
            Bigint::normalize(self.sign, Self::add_magnitude(&self.digits, &other.digits))
        } else {
            match Self::cmp_magnitude(&self.digits, &other.digits) {
                Ordering::Equal => Bigint::zero(),
                Ordering::Greater => {
                    Bigint::normalize(self.sign, Self::sub_magnitude(&self.digits, &other.digits))
                }
                Ordering::Less => {
                    Bigint::normalize(other.sign, Self::sub_magnitude(&other.digits, &self.digits))
                }
            }
        }
    }

    pub fn neg(&self) -> Bigint {
        if self.is_zero() {
            return self.clone();
        }
        let sign = if self.sign == Sign::Neg { Sign::NonNeg } else { Sign::Neg };
        Bigint { sign, digits: self.digits.clone() }
    }

    pub fn sub(&self, other: &Bigint) -> Bigint {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Bigint) -> Bigint {
        if self.is_zero() || other.is_zero() {
            return Bigint::zero();
        }
        let sign = if self.sign == other.sign { Sign::NonNeg } else { Sign::Neg };
        Bigint::normalize(sign, Self::mul_magnitude(&self.digits, &other.digits))
    }

    /// Truncating division, returning `(quotient, remainder)`. The
    /// remainder's sign matches the dividend's, matching klisp/Scheme
    /// `truncate/` semantics.
    pub fn divmod(&self, other: &Bigint) -> Result<(Bigint, Bigint)> {
        if other.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        if Self::cmp_magnitude(&self.digits, &other.digits) == Ordering::Less {
            return Ok((Bigint::zero(), self.clone()));
        }
        // Simple binary long division over magnitudes; adequate for an
        // interpreter's arithmetic, not optimized for huge operands.
        let mut rem = Bigint::zero();
        let mut quot_bits: Vec<u8> = Vec::new();
        let total_bits = self.digits.len() * DIGIT_BITS as usize;
        for bit in (0..total_bits).rev() {
            rem = rem.shl1();
            if bit_at(&self.digits, bit) {
                rem = rem.add(&Bigint::from_u64(1));
            }
            if Self::cmp_magnitude(&rem.digits, &other.digits) != Ordering::Less {
                rem = Bigint::normalize(Sign::NonNeg, Self::sub_magnitude(&rem.digits, &other.digits));
                quot_bits.push(1);
            } else {
                quot_bits.push(0);
            }
        }
        quot_bits.reverse();
        let mut quot = Bigint::zero();
        for b in quot_bits {
            quot = quot.shl1();
            if b == 1 {
                quot = quot.add(&Bigint::from_u64(1));
            }
        }
        let quot_sign = if self.sign == other.sign { Sign::NonNeg } else { Sign::Neg };
        let quot = Bigint::normalize(quot_sign, quot.digits);
        let rem_sign = self.sign;
        let rem = Bigint::normalize(rem_sign, rem.digits);
        Ok((quot, rem))
    }

    fn shl1(&self) -> Bigint {
        let mut out = Vec::with_capacity(self.digits.len() + 1);
        let mut carry: Digit = 0;
        for &d in &self.digits {
            let shifted = ((d as Word) << 1) | carry as Word;
            out.push((shifted & 0xFFFF_FFFF) as Digit);
            carry = (shifted >> DIGIT_BITS) as Digit;
        }
        if carry > 0 {
            out.push(carry);
        }
        Bigint::normalize(self.sign, out)
    }

    pub fn cmp(&self, other: &Bigint) -> Ordering {
        if self.is_zero() && other.is_zero() {
            return Ordering::Equal;
        }
        match (self.sign, other.sign) {
            (Sign::NonNeg, Sign::Neg) => Ordering::Greater,
            (Sign::Neg, Sign::NonNeg) => Ordering::Less,
            (Sign::NonNeg, Sign::NonNeg) => Self::cmp_magnitude(&self.digits, &other.digits),
            (Sign::Neg, Sign::Neg) => Self::cmp_magnitude(&other.digits, &self.digits),
        }
    }

    /// Renders in the given radix (2..=36), matching the writer's textual
    /// syntax for bignums (no `#e`/`#i` prefix — that is added by the
    /// caller when exactness must be marked explicitly).
    pub fn to_radix_string(&self, radix: u32) -> Result<String> {
        if !(2..=36).contains(&radix) {
            return Err(NumError::BadRadix(radix));
        }
        if self.is_zero() {
            return Ok("0".to_string());
        }
        let mut mag = self.digits.clone();
        let mut out = Vec::new();
        while !(mag.len() == 1 && mag[0] == 0) {
            let mut rem: Word = 0;
            for d in mag.iter_mut().rev() {
                let cur = (rem << DIGIT_BITS) | *d as Word;
                *d = (cur / radix as Word) as Digit;
                rem = cur % radix as Word;
            }
            Self::trim(&mut mag);
            out.push(std::char::from_digit(rem as u32, radix).unwrap());
        }
        if self.sign == Sign::Neg {
            out.push('-');
        }
        out.reverse();
        Ok(out.into_iter().collect())
    }

    /// Parses a numeral in the given radix, matching `to_radix_string`.
    pub fn from_radix_str(s: &str, radix: u32) -> Result<Bigint> {
        if !(2..=36).contains(&radix) {
            return Err(NumError::BadRadix(radix));
        }
        let mut chars = s.chars().peekable();
        let sign = match chars.peek() {
            Some('-') => {
                chars.next();
                Sign::Neg
            }
            Some('+') => {
                chars.next();
                Sign::NonNeg
            }
            _ => Sign::NonNeg,
        };
        let mut acc = Bigint::zero();
        let radix_big = Bigint::from_u64(radix as u64);
        let mut any = false;
        for c in chars {
            let digit = c.to_digit(radix).ok_or(NumError::InvalidDigit { digit: c, radix })?;
            any = true;
            acc = acc.mul(&radix_big).add(&Bigint::from_u64(digit as u64));
        }
        if !any {
            return Err(NumError::EmptyNumeral);
        }
        Ok(if sign == Sign::Neg { acc.neg() } else { acc })
    }

    /// Minimal two's-complement byte encoding, most-significant byte first,
    /// including a sign bit (so `127` is one byte, `128` is two).
    pub fn to_twos_complement(&self) -> Vec<u8> {
        if self.is_zero() {
            return vec![0];
        }
        let mut bytes = Vec::new();
        let mut mag = self.digits.clone();
        while !(mag.len() == 1 && mag[0] == 0) {
            bytes.push((mag[0] & 0xFF) as u8);
            mag = shr8(&mag);
        }
        if bytes.is_empty() {
            bytes.push(0);
        }
        if self.sign == Sign::NonNeg {
            if bytes.last().map(|b| b & 0x80 != 0).unwrap_or(false) {
                bytes.push(0);
            }
        } else {
            // two's complement of magnitude
            let mut carry = 1u16;
            for b in bytes.iter_mut() {
                let inv = (!*b) as u16 + carry;
                *b = (inv & 0xFF) as u8;
                carry = inv >> 8;
            }
            if bytes.last().map(|b| b & 0x80 == 0).unwrap_or(false) {
                bytes.push(0xFF);
            }
        }
        bytes.reverse();
        bytes
    }

    pub fn from_twos_complement(bytes: &[u8]) -> Bigint {
        if bytes.is_empty() {
            return Bigint::zero();
        }
        let negative = bytes[0] & 0x80 != 0;
        if !negative {
            let mut acc = Bigint::zero();
            let base = Bigint::from_u64(256);
            for &b in bytes {
                acc = acc.mul(&base).add(&Bigint::from_u64(b as u64));
            }
            acc
        } else {
            let mut inverted: Vec<u8> = bytes.iter().map(|b| !b).collect();
            let mut carry = 1u16;
            for b in inverted.iter_mut().rev() {
                let s = *b as u16 + carry;
                *b = (s & 0xFF) as u8;
                carry = s >> 8;
            }
            let mut acc = Bigint::zero();
            let base = Bigint::from_u64(256);
            for b in inverted {
                acc = acc.mul(&base).add(&Bigint::from_u64(b as u64));
            }
            acc.neg()
        }
    }

    /// Unsigned big-endian byte encoding of the magnitude (no sign bit).
    pub fn to_unsigned_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut mag = self.digits.clone();
        while !(mag.len() == 1 && mag[0] == 0) {
            bytes.push((mag[0] & 0xFF) as u8);
            mag = shr8(&mag);
        }
        if bytes.is_empty() {
            bytes.push(0);
        }
        bytes.reverse();
        bytes
    }

    pub fn from_unsigned_bytes(bytes: &[u8]) -> Bigint {
        let mut acc = Bigint::zero();
        let base = Bigint::from_u64(256);
        for &b in bytes {
            acc = acc.mul(&base).add(&Bigint::from_u64(b as u64));
        }
        acc
    }
}

fn shr8(digits: &[Digit]) -> Vec<Digit> {
    // Divide magnitude by 256, discarding remainder; used for byte extraction.
    let mut out = vec![0 as Digit; digits.len()];
    let mut rem: Word = 0;
    for i in (0..digits.len()).rev() {
        let cur = (rem << DIGIT_BITS) | digits[i] as Word;
        out[i] = (cur / 256) as Digit;
        rem = cur % 256;
    }
    let mut out = out;
    Bigint::trim(&mut out);
    out
}

fn bit_at(digits: &[Digit], bit: usize) -> bool {
    let idx = bit / DIGIT_BITS as usize;
    let off = bit % DIGIT_BITS as usize;
    if idx >= digits.len() {
        return false;
    }
    (digits[idx] >> off) & 1 == 1
}

fn split_at(digits: &[Digit], at: usize) -> (Vec<Digit>, Vec<Digit>) {
    if at >= digits.len() {
        return (digits.to_vec(), vec![0]);
    }
    let mut lo = digits[..at].to_vec();
    let mut hi = digits[at..].to_vec();
    Bigint::trim(&mut lo);
    Bigint::trim(&mut hi);
    (lo, hi)
}

fn add_shifted(out: &mut [Digit], part: &[Digit], shift: usize) {
    let mut carry: Word = 0;
    for (i, &d) in part.iter().enumerate() {
        let idx = i + shift;
        if idx >= out.len() {
            break;
        }
        let s = out[idx] as Word + d as Word + carry;
        out[idx] = (s & 0xFFFF_FFFF) as Digit;
        carry = s >> DIGIT_BITS;
    }
    let mut idx = shift + part.len();
    while carry > 0 && idx < out.len() {
        let s = out[idx] as Word + carry;
        out[idx] = (s & 0xFFFF_FFFF) as Digit;
        carry = s >> DIGIT_BITS;
        idx += 1;
    }
}

fn z2_padded_for_sub(z1: &[Digit], z2: &[Digit]) -> Vec<Digit> {
    let mut v = z2.to_vec();
    v.resize(z1.len(), 0);
    v
}

fn z0_padded_for_sub(z1m2: &[Digit], z0: &[Digit]) -> Vec<Digit> {
    let mut v = z0.to_vec();
    v.resize(z1m2.len(), 0);
    v
}

impl fmt::Display for Bigint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_radix_string(10).unwrap())
    }
}

impl PartialOrd for Bigint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bigint {
    fn cmp(&self, other: &Self) -> Ordering {
        Bigint::cmp(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_roundtrip() {
        let a = Bigint::from_i64(-12345);
        assert_eq!(a.to_i64(), Some(-12345));
    }

    #[test]
    fn add_carries_across_limbs() {
        let a = Bigint::from_u64(u64::MAX);
        let b = Bigint::from_u64(1);
        let sum = a.add(&b);
        assert_eq!(sum.to_radix_string(10).unwrap(), "18446744073709551616");
    }

    #[test]
    fn big_times_one_stays_big() {
        let a = Bigint::from_radix_str("100000000000000000000", 10).unwrap();
        let plus_one = a.add(&Bigint::from_u64(1));
        assert_eq!(plus_one.to_radix_string(10).unwrap(), "100000000000000000001");
    }

    #[test]
    fn divmod_matches_truncation() {
        let a = Bigint::from_i64(-7);
        let b = Bigint::from_i64(2);
        let (q, r) = a.divmod(&b).unwrap();
        assert_eq!(q.to_i64(), Some(-3));
        assert_eq!(r.to_i64(), Some(-1));
    }

    #[test]
    fn division_by_zero_errors() {
        let a = Bigint::from_i64(1);
        let z = Bigint::zero();
        assert_eq!(a.divmod(&z), Err(NumError::DivisionByZero));
    }

    #[test]
    fn radix_roundtrip_all_bases() {
        let z = Bigint::from_radix_str("123456789012345678901234567890", 10).unwrap();
        for radix in 2..=36u32 {
            let text = z.to_radix_string(radix).unwrap();
            let back = Bigint::from_radix_str(&text, radix).unwrap();
            assert_eq!(back, z, "radix {radix}");
        }
    }

    #[test]
    fn twos_complement_roundtrip() {
        for v in [-1i64, 0, 1, 127, 128, -128, -129, 1_000_000, -1_000_000] {
            let z = Bigint::from_i64(v);
            let bytes = z.to_twos_complement();
            let back = Bigint::from_twos_complement(&bytes);
            assert_eq!(back.to_i64(), Some(v), "value {v}");
        }
    }

    #[test]
    fn unsigned_roundtrip() {
        let z = Bigint::from_u64(987654321);
        let bytes = z.to_unsigned_bytes();
        let back = Bigint::from_unsigned_bytes(&bytes);
        assert_eq!(back, z);
    }

    #[test]
    fn karatsuba_matches_schoolbook_on_large_operands() {
        // `KARATSUBA_THRESHOLD` is 64 limbs; a limb holds ~9.6 decimal
        // digits, so both operands need well over 64*9.6 ≈ 614 decimal
        // digits for `mul_magnitude` to actually take the Karatsuba
        // branch instead of falling straight through to schoolbook.
        let a = Bigint::from_radix_str(&"9".repeat(800), 10).unwrap();
        let b = Bigint::from_radix_str(&"7".repeat(800), 10).unwrap();
        assert!(a.digits.len() > KARATSUBA_THRESHOLD);
        assert!(b.digits.len() > KARATSUBA_THRESHOLD);
        let direct = Bigint::normalize(Sign::NonNeg, Bigint::mul_schoolbook(&a.digits, &b.digits));
        let viaka = a.mul(&b);
        assert_eq!(direct, viaka);
    }
}

/// Property-based tests for the §8 universal properties this tower owns:
/// radix round-trip and binary round-trip for arbitrary bigints, not just
/// the literal examples above.
#[cfg(test)]
mod proptests {
    use super::*;
    use quickcheck_macros::quickcheck;

    /// Builds a bigint from quickcheck-generated limbs, capped small so
    /// shrinking stays fast; `Bigint::normalize` trims the leading zeros
    /// and collapses an all-zero magnitude to the canonical zero.
    fn arbitrary_bigint(sign_neg: bool, mut digits: Vec<Digit>) -> Bigint {
        digits.truncate(8);
        if digits.is_empty() {
            digits.push(0);
        }
        let sign = if sign_neg { Sign::Neg } else { Sign::NonNeg };
        Bigint::normalize(sign, digits)
    }

    #[quickcheck]
    fn radix_round_trip(sign_neg: bool, digits: Vec<Digit>, radix_pick: u8) -> bool {
        let radix = 2 + (radix_pick as u32 % 35); // 2..=36
        let z = arbitrary_bigint(sign_neg, digits);
        let text = z.to_radix_string(radix).expect("radix is in [2, 36]");
        let back = Bigint::from_radix_str(&text, radix).expect("writer output parses back");
        back == z
    }

    #[quickcheck]
    fn twos_complement_round_trip(sign_neg: bool, digits: Vec<Digit>) -> bool {
        let z = arbitrary_bigint(sign_neg, digits);
        let bytes = z.to_twos_complement();
        Bigint::from_twos_complement(&bytes) == z
    }

    #[quickcheck]
    fn unsigned_round_trip(digits: Vec<Digit>) -> bool {
        let z = arbitrary_bigint(false, digits);
        let bytes = z.to_unsigned_bytes();
        Bigint::from_unsigned_bytes(&bytes) == z
    }
}
