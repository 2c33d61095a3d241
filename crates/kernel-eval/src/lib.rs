//! The trampolined evaluator (spec §4.2–§4.4): `eval`/`combine` dispatch,
//! the cyclic-operand-safe argument-evaluation machine, first-class
//! continuation application, and the scheduler loop that drives them all
//! without growing the host stack.
//!
//! [`kernel_gc::State`] owns the actual registers this crate reads and
//! writes (`next`, `curr_cont`); this crate only supplies the `NativeFn`
//! bodies and the loop that dispatches them, the same split `kstate.c`'s
//! `klispS_init` (wires `K->next_func` etc.) keeps from `keval.c` (reads
//! them).

pub mod arglist;
pub mod combine;
pub mod continuation;
pub mod error;
pub mod eval;
pub mod eval_ls;
pub mod trampoline;

pub use continuation::invoke_continuation_native;
pub use error::KError;
pub use eval::eval_entry;
pub use trampoline::run;

/// `combine.rs` was authored against a module named `arglist_eval` for
/// the per-step continuation it tail-calls into; the implementation
/// lives in `eval_ls.rs` (spec §4.3's `eval_ls_cfn`) since that name
/// matches the spec prose more closely. One alias, so neither file has
/// to pretend the other's name doesn't exist.
pub use eval_ls as arglist_eval;
