//! Kernel's numeric tower.
//!
//! A leaf crate: pure value types with no heap/GC dependency, so the object
//! runtime (`kernel-gc`) can embed them as boxed payloads without a
//! dependency cycle.

pub mod bigint;
pub mod bigrat;
pub mod error;
pub mod literal;
pub mod number;

pub use bigint::{Bigint, Sign};
pub use bigrat::Bigrat;
pub use error::{NumError, Result};
pub use literal::{looks_numeric, parse_literal};
pub use number::Number;
