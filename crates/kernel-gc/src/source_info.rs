//! Source-location tags attached to pairs, symbols and continuations
//! (spec §3.1, `khas_si`). Kept separate from the general-purpose
//! [`kernel_util::Span`] because the reader tracks filename/line/column
//! directly as it tokenizes, the same shape klisp's `ksource_info_t` uses,
//! rather than a byte-offset range into a pre-loaded source map.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceInfo {
    pub filename: std::sync::Arc<str>,
    pub line: i32,
    pub col: i32,
}

impl SourceInfo {
    pub fn new(filename: std::sync::Arc<str>, line: i32, col: i32) -> Self {
        SourceInfo { filename, line, col }
    }
}

impl std::fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.col)
    }
}
