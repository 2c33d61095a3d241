//! The one failure mode the heap itself can raise. Every other error kind
//! in the system (spec §7's `range`/`type`/`arity`/…) is a Kernel-level
//! `ErrorObj` raised through [`crate::state::State::throw`], not a Rust
//! `Result` — `GcError` is the exception: allocation really can fail, and
//! that has to surface before there's even an error-object heap slot to
//! put the failure in.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GcError {
    #[error("out of memory: heap already holds {limit} objects")]
    OutOfMemory { requested: usize, limit: usize },
}
