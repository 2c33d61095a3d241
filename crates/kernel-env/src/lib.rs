//! Multi-parent environments and parameter-tree matching (spec §4.5).
//!
//! Mirrors klisp's free-function-over-`klisp_State*` style rather than
//! inherent methods on [`kernel_gc::State`]: `State` is defined in
//! `kernel-gc`, so this crate's operations live as plain functions taking
//! `&mut State`, the same shape as `kenvironment.c`'s `kadd_binding`/
//! `kget_binding` taking `klisp_State *K` as their first argument.

pub mod environment;
pub mod ptree;

pub use environment::{define_variable, lookup, make_environment, set_variable};
pub use ptree::{match_ptree, validate_and_copy_ptree};
