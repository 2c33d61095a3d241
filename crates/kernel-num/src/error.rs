use thiserror::Error;

/// Failure modes of the numeric tower, independent of the evaluator's own
/// error taxonomy (`kernel-eval::error::KError` wraps these as its `type`/
/// `range`/`division-by-zero` kinds).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid digit {digit:?} for radix {radix}")]
    InvalidDigit { digit: char, radix: u32 },

    #[error("radix {0} out of range (expected 2..=36)")]
    BadRadix(u32),

    #[error("empty numeral")]
    EmptyNumeral,

    #[error("value does not fit in the requested integer width")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, NumError>;
