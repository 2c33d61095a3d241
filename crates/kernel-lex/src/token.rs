//! Token kinds the tokenizer produces (spec §6's "Tokenizer" interface).
//!
//! Number literals are carried as their raw source text rather than a
//! parsed value: recognizing *that* something is a numeric token (leading
//! digit, sign-then-digit, or an `#e`/`#i`/`#b`/`#o`/`#d`/`#x` prefix) is
//! this crate's job, but turning the text into a [`kernel_num::Number`]
//! needs the radix/exactness rules that live with the reader
//! (`kernel-syntax`), which this crate does not depend on.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Dot,
    Symbol(String),
    String(String),
    Char(char),
    /// Raw numeric lexeme, e.g. `"#e1/3"`, `"-42"`, `"#xFF"`.
    Number(String),
    True,
    False,
    Inert,
    Ignore,
    EofObject,
    /// `#n=`: introduces a datum label.
    DatumLabelDef(u64),
    /// `#n#`: refers back to a previously introduced datum label.
    DatumLabelRef(u64),
    /// End of the character stream itself (distinct from the `#eof`
    /// object token).
    EndOfInput,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self, Token::EndOfInput)
    }
}
