//! Diagnostic codes for categorizing reader, evaluator and ground-environment errors.
//!
//! This module provides the [`DiagnosticCode`] type for uniquely identifying
//! diagnostic messages, enabling users to look up documentation and suppress
//! specific warnings.
//!
//! # Examples
//!
//! ```
//! use kernel_util::diagnostic::DiagnosticCode;
//!
//! let code = DiagnosticCode::E0001;
//! assert_eq!(code.prefix(), "E");
//! assert_eq!(code.number(), 1);
//! assert_eq!(code.as_str(), "E0001");
//! ```

/// A unique code identifying a diagnostic message
///
/// Diagnostic codes follow the format `{prefix}{number}` where:
/// - `prefix` is typically "E" for errors or "W" for warnings
/// - `number` is a 4-digit number (padded with zeros)
///
/// This allows users to reference specific diagnostics in documentation
/// and suppression attributes.
///
/// # Examples
///
/// ```
/// use kernel_util::diagnostic::DiagnosticCode;
///
/// let code = DiagnosticCode::new("E", 1);
/// assert_eq!(code.as_str(), "E0001");
///
/// let warning = DiagnosticCode::W0001;
/// assert_eq!(warning.prefix(), "W");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    /// The prefix (e.g., "E" for error, "W" for warning)
    pub prefix: &'static str,
    /// The numeric identifier
    pub number: u32,
}

impl DiagnosticCode {
    /// Create a new diagnostic code
    ///
    /// # Arguments
    ///
    /// * `prefix` - The code prefix (typically "E" or "W")
    /// * `number` - The numeric identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_util::diagnostic::DiagnosticCode;
    ///
    /// let code = DiagnosticCode::new("E", 1001);
    /// assert_eq!(code.prefix(), "E");
    /// assert_eq!(code.number(), 1001);
    /// ```
    #[inline]
    pub const fn new(prefix: &'static str, number: u32) -> Self {
        Self { prefix, number }
    }

    /// Get the prefix (e.g., "E" for error, "W" for warning)
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_util::diagnostic::DiagnosticCode;
    ///
    /// assert_eq!(DiagnosticCode::E0001.prefix(), "E");
    /// assert_eq!(DiagnosticCode::W0001.prefix(), "W");
    /// ```
    #[inline]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Get the numeric identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_util::diagnostic::DiagnosticCode;
    ///
    /// assert_eq!(DiagnosticCode::E0001.number(), 1);
    /// assert_eq!(DiagnosticCode::W0001.number(), 1);
    /// ```
    #[inline]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Get the full code string (e.g., "E0001", "W0001")
    ///
    /// # Examples
    ///
    /// ```
    /// use kernel_util::diagnostic::DiagnosticCode;
    ///
    /// assert_eq!(DiagnosticCode::E0001.as_str(), "E0001");
    /// assert_eq!(DiagnosticCode::W0001.as_str(), "W0001");
    /// ```
    pub fn as_str(&self) -> String {
        format!("{}{:04}", self.prefix, self.number)
    }

    // =========================================================================
    // PREDEFINED ERROR CODES (E0001-E9999)
    // =========================================================================

    /// E0001: Malformed datum (reader syntax error)
    pub const E0001: Self = Self::new("E", 1);
    /// E0002: Wrong type for primitive
    pub const E0002: Self = Self::new("E", 2);
    /// E0003: Unbound symbol
    pub const E0003: Self = Self::new("E", 3);
    /// E0004: Combiner applied to non-list operand tree
    pub const E0004: Self = Self::new("E", 4);
    /// E0005: Duplicate binding in a parameter tree
    pub const E0005: Self = Self::new("E", 5);

    /// E1001: Reader - unterminated string literal
    pub const E_READER_UNTERMINATED_STRING: Self = Self::new("E", 1001);
    /// E1002: Reader - unmatched closing paren
    pub const E_READER_UNMATCHED_PAREN: Self = Self::new("E", 1002);
    /// E1003: Reader - invalid numeric literal
    pub const E_READER_INVALID_NUMBER: Self = Self::new("E", 1003);
    /// E1004: Reader - dangling datum label reference (`#n#` with no `#n=`)
    pub const E_READER_DANGLING_LABEL: Self = Self::new("E", 1004);

    /// E2001: Evaluator - operand tree does not match the combiner's parameter tree
    pub const E_EVAL_PTREE_MISMATCH: Self = Self::new("E", 2001);
    /// E2002: Evaluator - wrong number of arguments
    pub const E_EVAL_ARITY_MISMATCH: Self = Self::new("E", 2002);
    /// E2003: Evaluator - attempt to combine a non-combiner
    pub const E_EVAL_NOT_A_COMBINER: Self = Self::new("E", 2003);
    /// E2004: Evaluator - `$set!`/`$define!` against an immutable binding
    pub const E_EVAL_IMMUTABLE_BINDING: Self = Self::new("E", 2004);

    /// E3001: Numeric tower - division by zero
    pub const E_NUM_DIVISION_BY_ZERO: Self = Self::new("E", 3001);
    /// E3002: Numeric tower - invalid digit for the given radix
    pub const E_NUM_INVALID_DIGIT: Self = Self::new("E", 3002);
    /// E3003: Numeric tower - exact/inexact overflow (e.g. infinity minus infinity)
    pub const E_NUM_OVERFLOW: Self = Self::new("E", 3003);
    /// E3004: GC - heap exhausted after a full collection
    pub const E_GC_OUT_OF_MEMORY: Self = Self::new("E", 3004);

    // =========================================================================
    // PREDEFINED WARNING CODES (W0001-W9999)
    // =========================================================================

    /// W0001: Unused `$let` binding
    pub const W0001: Self = Self::new("W", 1);
    /// W0002: Redefinition shadowing an existing binding
    pub const W0002: Self = Self::new("W", 2);
    /// W0003: Non-tail recursive call in a position that could be a tail call
    pub const W0003: Self = Self::new("W", 3);
}

impl std::fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DiagnosticCode({})", self.as_str())
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Standalone constant exports for convenience
pub const E0001: DiagnosticCode = DiagnosticCode::E0001;
pub const E0002: DiagnosticCode = DiagnosticCode::E0002;
pub const E0003: DiagnosticCode = DiagnosticCode::E0003;
pub const E0004: DiagnosticCode = DiagnosticCode::E0004;
pub const E0005: DiagnosticCode = DiagnosticCode::E0005;
pub const E_READER_UNTERMINATED_STRING: DiagnosticCode = DiagnosticCode::E_READER_UNTERMINATED_STRING;
pub const E_READER_UNMATCHED_PAREN: DiagnosticCode = DiagnosticCode::E_READER_UNMATCHED_PAREN;
pub const E_READER_INVALID_NUMBER: DiagnosticCode = DiagnosticCode::E_READER_INVALID_NUMBER;
pub const E_READER_DANGLING_LABEL: DiagnosticCode = DiagnosticCode::E_READER_DANGLING_LABEL;
pub const E_EVAL_PTREE_MISMATCH: DiagnosticCode = DiagnosticCode::E_EVAL_PTREE_MISMATCH;
pub const E_EVAL_ARITY_MISMATCH: DiagnosticCode = DiagnosticCode::E_EVAL_ARITY_MISMATCH;
pub const E_EVAL_NOT_A_COMBINER: DiagnosticCode = DiagnosticCode::E_EVAL_NOT_A_COMBINER;
pub const E_EVAL_IMMUTABLE_BINDING: DiagnosticCode = DiagnosticCode::E_EVAL_IMMUTABLE_BINDING;
pub const E_NUM_DIVISION_BY_ZERO: DiagnosticCode = DiagnosticCode::E_NUM_DIVISION_BY_ZERO;
pub const E_NUM_INVALID_DIGIT: DiagnosticCode = DiagnosticCode::E_NUM_INVALID_DIGIT;
pub const E_NUM_OVERFLOW: DiagnosticCode = DiagnosticCode::E_NUM_OVERFLOW;
pub const E_GC_OUT_OF_MEMORY: DiagnosticCode = DiagnosticCode::E_GC_OUT_OF_MEMORY;
pub const W0001: DiagnosticCode = DiagnosticCode::W0001;
pub const W0002: DiagnosticCode = DiagnosticCode::W0002;
pub const W0003: DiagnosticCode = DiagnosticCode::W0003;
