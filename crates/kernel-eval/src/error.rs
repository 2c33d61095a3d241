//! A borrowable, `Display`-able view of an `ErrorObj` (spec §7): the core
//! error path itself is `kernel_gc::Unwind`/`ErrorObj`, since the object
//! has to live on the heap for a continuation to capture and inspect it.
//! `KError` exists only so `kernel-driver` and `kernel-ground`'s `$guard`
//! can format one without re-deriving the same match-on-`ErrorKind`
//! every call site would otherwise need.

use std::fmt;

use kernel_gc::{ObjKind, SourceInfo, State, Value};
use kernel_gc::object::ErrorKind;

#[derive(Debug, Clone)]
pub struct KError {
    pub kind: ErrorKind,
    pub message: String,
    pub si: Option<SourceInfo>,
}

impl KError {
    /// Reads an `ErrorObj` out of the heap value a failed [`kernel_gc::Unwind`]
    /// carries. Panics if `err` isn't actually an error object — every
    /// `Unwind` the core produces is constructed by `State::throw*`,
    /// which only ever builds one of these, so a caller handing this a
    /// different kind of value has a bug worth panicking on rather than
    /// silently misreporting.
    pub fn from_value(state: &State, err: Value) -> Self {
        match err {
            Value::Ref(id) => match state.heap.get(id) {
                ObjKind::Error(e) => KError { kind: e.kind, message: e.message.clone(), si: e.si.clone() },
                _ => panic!("Unwind carried a non-error value"),
            },
            _ => panic!("Unwind carried a non-error value"),
        }
    }
}

impl fmt::Display for KError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(si) = &self.si {
            write!(f, " (at {si})")?;
        }
        Ok(())
    }
}
