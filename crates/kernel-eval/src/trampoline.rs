//! The scheduler loop (spec §4.2): reads `state.next`, clears it, invokes
//! the stored `fn`. A function that wants to tail-call or "return" stores
//! a fresh tuple and returns `Ok(())`; this loop never recurses into
//! itself for a tail call, which is what makes proper tail calls proper
//! (spec §8 "Tail-call space": O(1) native stack frames for any `N`).
//!
//! An error (`Err(Unwind(..))`) is klisp's longjmp-to-scheduler (spec
//! §5 "Long-jump discipline"): this loop is the one place that catches
//! it, truncating the root stacks back to the snapshot taken at entry.

use kernel_gc::{KResult, State, Unwind, Value};

/// Runs `expr` to completion in `env`, starting from a halted
/// continuation chain (`Value::Inert`, the trampoline's "nothing left to
/// do" sentinel) so the final `apply_cc` has nowhere further to pop to
/// and the loop returns the result.
///
/// Top-level callers (tests, `kernel-driver`'s REPL) use this directly;
/// a continuation captured *during* a run (e.g. by `call/cc`) and
/// invoked later re-enters through the very same mechanism, since
/// `apply_cc` and `tail_eval` are the only way anything ever gets
/// scheduled.
pub fn run(state: &mut State, expr: Value, env: Value) -> KResult<Value> {
    let saved_cc = state.get_cc();
    let root_snapshot = state.roots.len();
    state.set_cc(Value::Inert);
    state.tail_eval(expr, env);
    let result = drive(state, root_snapshot);
    state.set_cc(saved_cc);
    result
}

/// Drains `state.next` until a step reports "halt" (`func: None`) or
/// throws. Shared by [`run`] and anything that needs to pump the
/// trampoline without resetting `curr_cont` first (none of the core
/// does today, but keeping the pump separate from the entry-point setup
/// in `run` is what let `kernel-ground`'s `$guard` reuse it without
/// duplicating the loop, should it need to later).
fn drive(state: &mut State, root_snapshot: usize) -> KResult<Value> {
    loop {
        let next = std::mem::take(&mut state.next);
        match next.func {
            Some(f) => {
                if let Err(Unwind(err)) = f(state, &next.xparams, next.value, next.env) {
                    state.roots.truncate(root_snapshot);
                    return Err(Unwind(err));
                }
            }
            None => return Ok(next.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), crate::eval::eval_entry)
    }

    #[test]
    fn running_a_self_evaluating_literal_halts_immediately() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        assert_eq!(run(&mut st, Value::Fixint(5), env).unwrap(), Value::Fixint(5));
    }

    #[test]
    fn a_self_tail_call_iterated_many_times_does_not_grow_the_host_stack() {
        // A self-recursive operative: on every invocation it schedules
        // another tail-call to itself via `tail_call`, decrementing a
        // counter threaded through xparams, until it reaches zero. If
        // this recursed in Rust's call stack instead of trampolining,
        // a large N would overflow; it doesn't, because `combine.rs`/
        // this loop only ever returns and re-dispatches.
        fn countdown(state: &mut State, xparams: &[Value], _obj: Value, denv: Value) -> KResult<()> {
            let n = xparams[0].as_fixint().unwrap();
            if n == 0 {
                state.apply_cc(Value::Fixint(0));
                Ok(())
            } else {
                state.tail_call(countdown, vec![Value::Fixint(n - 1)], Value::Nil, denv);
                Ok(())
            }
        }
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        let op = st.make_operative(countdown, vec![Value::Fixint(200_000)]).unwrap();
        let app =
            st.alloc(kernel_gc::ObjKind::Applicative(kernel_gc::object::Applicative { underlying: op })).unwrap();
        let form = st.list_from(&[app]).unwrap();
        assert_eq!(run(&mut st, form, env).unwrap(), Value::Fixint(0));
    }
}
