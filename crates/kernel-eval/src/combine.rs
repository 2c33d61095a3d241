//! Combination dispatch (spec §4.2 "combine").
//!
//! `combine_cont` is the continuation `eval.rs` installs right before
//! tail-evaluating a pair's `car`: once that evaluation delivers the
//! resolved combiner value, this dispatches on its kind.

use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};

use crate::arglist::make_arg_ls;

/// xparams: `[operand_tree, denv]`. The trampoline clears `next.env` on
/// every `apply_cc`, so continuations that need their dynamic
/// environment later must carry it themselves — see `kernel-gc::State`'s
/// `apply_cc` doc comment.
pub fn combine_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let operands = xparams[0];
    let denv = xparams[1];
    dispatch(state, obj, operands, denv)
}

fn dispatch(state: &mut State, combiner: Value, operands: Value, denv: Value) -> KResult<()> {
    match combiner {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Operative(op) => {
                let (func, extra) = (op.func, op.extra.clone());
                state.tail_call(func, extra, operands, denv);
                Ok(())
            }
            ObjKind::Applicative(_) => combine_applicative(state, combiner, operands, denv),
            ObjKind::Continuation(_) => crate::continuation::combine_continuation(state, combiner, operands, denv),
            _ => state.throw(ErrorKind::Type, "not a combiner"),
        },
        _ => state.throw(ErrorKind::Type, "not a combiner"),
    }
}

/// Unwraps `applicative` down to its innermost operative (applicatives
/// may nest — spec §4.2) and either tail-calls it directly (empty
/// operand list) or enters the argument-evaluation machine.
fn combine_applicative(state: &mut State, applicative: Value, operands: Value, denv: Value) -> KResult<()> {
    let mut cur = applicative;
    let operative = loop {
        match cur {
            Value::Ref(id) => match state.heap.get(id) {
                ObjKind::Applicative(a) => cur = a.underlying,
                ObjKind::Operative(_) => break cur,
                _ => return state.throw(ErrorKind::Type, "not a combiner"),
            },
            _ => return state.throw(ErrorKind::Type, "not a combiner"),
        }
    };

    if operands.is_nil() {
        let (func, extra) = match operative {
            Value::Ref(id) => match state.heap.get(id) {
                ObjKind::Operative(op) => (op.func, op.extra.clone()),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };
        state.tail_call(func, extra, Value::Nil, denv);
        return Ok(());
    }

    let (head, tail) = make_arg_ls(state, operands)?;
    crate::arglist_eval::schedule_step(state, head, head, tail, operative, denv)
}
