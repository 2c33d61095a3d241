//! The tagged heap-object model and tracing collector (spec §3, §4.1).
//!
//! This crate is deliberately the bottom of the Kernel-specific
//! dependency graph: it owns [`Value`], every boxed [`object::ObjKind`],
//! the [`Heap`]/collector, and [`State`] — the single, monolithic
//! interpreter-state struct klisp calls `klisp_State`
//! (`original_source/src/kstate.h`). Putting `State` here rather than in
//! `kernel-eval` is what lets [`object::Continuation`] and
//! [`object::Operative`] store a plain `fn(&mut State, ...)` pointer
//! without creating a cycle back up to the crate that implements what
//! those functions do; see `object.rs`'s module doc for the full
//! rationale.

pub mod config;
pub mod error;
pub mod heap;
pub mod object;
pub mod pairs;
pub mod root;
pub mod source_info;
pub mod state;
pub mod symbols;
pub mod tracer;
pub mod types;
pub mod value;

pub use config::GcConfig;
pub use error::GcError;
pub use heap::Heap;
pub use object::{ErrorKind, NativeFn, ObjKind, TypeTag};
pub use root::{Guard, Root, RootStack};
pub use source_info::SourceInfo;
pub use state::{KResult, NextRegisters, State, Unwind};
pub use symbols::SymbolInterner;
pub use types::Kind;
pub use value::{Fixint, ObjId, Symbol, Value};


/// Property-based coverage for spec §8's "the collector never reclaims a
/// reachable object" universal property: build an arbitrary mix of
/// rooted and unrooted pairs and check every rooted one (and its
/// contents) survives an arbitrary number of collection cycles.
#[cfg(test)]
mod proptests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn dummy_eval(_s: &mut State, _x: &[Value], _o: Value, _e: Value) -> KResult<()> {
        Ok(())
    }

    #[quickcheck]
    fn rooted_pairs_survive_arbitrary_collections(rooted: Vec<bool>, cycles: u8) -> bool {
        // Cap both dimensions: this is about reachability, not stress
        // volume, and an unbounded `cycles` would make the slow sweep
        // path dominate the property run for no extra coverage.
        let rooted: Vec<bool> = rooted.into_iter().take(16).collect();
        let cycles = 1 + (cycles % 4);
        let mut st = State::new(GcConfig::default(), dummy_eval);

        let mut guards = Vec::new();
        let mut kept = Vec::new();
        for (i, &is_rooted) in rooted.iter().enumerate() {
            let pair = match st.cons(Value::Fixint(i as i64), Value::Nil) {
                Ok(p) => p,
                Err(_) => return false,
            };
            if is_rooted {
                guards.push(st.roots.push(pair));
                kept.push((pair, Value::Fixint(i as i64)));
            }
        }
        // Garbage the rooted pairs will never reach, to give the
        // collector something real to reclaim each cycle.
        for i in 0..8 {
            if st.cons(Value::Fixint(-(i + 1)), Value::Nil).is_err() {
                return false;
            }
        }

        for _ in 0..cycles {
            st.collect_now();
        }

        let survived = kept.iter().all(|&(pair, expected)| st.car(pair) == Some(expected));
        for g in guards {
            st.roots.pop(g);
        }
        survived
    }
}
