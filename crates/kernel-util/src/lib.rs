//! Shared infrastructure for the Kernel evaluator: symbol interning, typed
//! index vectors, source spans and diagnostic reporting.
//!
//! Every other crate in the workspace depends on this one; it carries no
//! dependency on the object model or the evaluator itself.

pub mod diagnostic;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, Span};
pub use symbol::{Symbol, SymbolTable};
