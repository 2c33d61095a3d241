//! Read-time failures (spec §7's `read` error kind), layering the
//! tokenizer's own [`LexError`] and the numeric tower's [`NumError`] under
//! the reader's own structural complaints.

use kernel_lex::LexError;
use kernel_num::NumError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("malformed numeric literal: {0}")]
    Number(#[from] NumError),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected `.` outside a list")]
    MisplacedDot,

    #[error("expected `)` to close the list")]
    ExpectedCloseParen,

    #[error("datum label #{0}# referenced but never defined")]
    UndefinedLabel(u64),

    #[error("heap allocation failed while reading")]
    OutOfMemory,
}

impl From<kernel_gc::GcError> for ReadError {
    fn from(_: kernel_gc::GcError) -> Self {
        ReadError::OutOfMemory
    }
}

impl From<kernel_gc::Unwind> for ReadError {
    fn from(_: kernel_gc::Unwind) -> Self {
        // `State::alloc` only ever fails this way on heap exhaustion while
        // reading (no ordinary Kernel evaluation is in flight), so there's
        // no richer error object here worth unpacking.
        ReadError::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, ReadError>;
