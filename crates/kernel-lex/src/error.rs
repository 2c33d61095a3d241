//! Tokenizer-level failures (spec §7's `read` error kind, at the
//! lexical layer the reader sits on top of).

use kernel_util::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unterminated block comment")]
    UnterminatedBlockComment { span: Span },
    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },
    #[error("unknown character name `#\\{name}`")]
    UnknownCharName { name: String, span: Span },
    #[error("malformed datum label `#{text}`")]
    MalformedDatumLabel { text: String, span: Span },
    #[error("unexpected character `{found}`")]
    UnexpectedChar { found: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedBlockComment { span }
            | LexError::UnterminatedChar { span }
            | LexError::UnknownCharName { span, .. }
            | LexError::MalformedDatumLabel { span, .. }
            | LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}
