//! First-class continuation application (spec §4.4, glossary
//! "Continuation").
//!
//! A captured continuation is an ordinary heap value; applying one in
//! operator position evaluates its single operand like an applicative
//! and then replaces the continuation chain wholesale rather than
//! tail-calling a combiner body. `combine.rs` routes
//! `ObjKind::Continuation` here instead of down the operative/applicative
//! path.

use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};

use crate::arglist::make_arg_ls;

/// Entry point `combine.rs` calls when the resolved combiner in operator
/// position is a continuation rather than an operative/applicative.
pub fn combine_continuation(state: &mut State, cont: Value, operands: Value, denv: Value) -> KResult<()> {
    if operands.is_nil() {
        return state.throw(ErrorKind::Arity, "continuation application expects exactly one argument");
    }
    let (head, tail) = make_arg_ls(state, operands)?;
    // Reuse the existing argument-evaluation machine by handing it a
    // synthetic one-shot operative whose body is `invoke_continuation_native`
    // below; this is the same trick `combine_applicative` uses to drive
    // a real operative, just with the continuation closed over as the
    // operative's sole `extra` parameter instead of a ground-env `fn`.
    let synthetic = state.make_operative(invoke_continuation_native, vec![cont])?;
    crate::arglist_eval::schedule_step(state, head, head, tail, synthetic, denv)
}

/// xparams: `[captured_continuation]`. `obj` is the fully-evaluated
/// one-element argument list the machine above built.
pub fn invoke_continuation_native(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let cont = xparams[0];
    let args = match state.list_to_vec(obj) {
        Some(v) => v,
        None => return state.throw(ErrorKind::Type, "continuation application: cyclic argument list"),
    };
    if args.len() != 1 {
        return state.throw(ErrorKind::Arity, "continuation application expects exactly one argument");
    }
    state.set_cc(cont);
    state.apply_cc(args[0]);
    Ok(())
}

/// Captures the continuation active when `call/cc`'s operand (a
/// one-argument combiner) is invoked. `kernel-ground`'s
/// `call-with-current-continuation` applicative builds the combination
/// `(receiver captured)` and tail-calls it; this function only does the
/// capture, since the combine dispatch it hands off to already knows how
/// to both apply an ordinary combiner and apply a continuation value as
/// one.
pub fn capture(state: &State) -> Value {
    state.get_cc()
}

/// True iff `v` is a heap `Continuation` object — `continuation?`'s
/// primitive.
pub fn is_continuation(state: &State, v: Value) -> bool {
    matches!(v, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Continuation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), crate::eval::eval_entry)
    }

    #[test]
    fn invoking_a_captured_continuation_resumes_its_own_waiting_caller() {
        // (list 1 ((lambda-ish capture) 2) 3): the middle combiner
        // captures the continuation waiting for *its own* value and
        // invokes it with 99 instead of returning normally. Evaluation of
        // the outer list resumes exactly as if `middle` had evaluated to
        // 99, giving (1 99 3) rather than running off with the captured
        // continuation to the top of the whole program.
        fn list_op(state: &mut State, _x: &[Value], operands: Value, _denv: Value) -> KResult<()> {
            state.apply_cc(operands);
            Ok(())
        }
        fn capturing_op(state: &mut State, _x: &[Value], operands: Value, denv: Value) -> KResult<()> {
            let _ = (operands, denv);
            let cont = capture(state);
            state.set_cc(cont);
            state.apply_cc(Value::Fixint(99));
            Ok(())
        }

        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();

        let list_inner_op = st.make_operative(list_op, Vec::new()).unwrap();
        let list_app = st
            .alloc(kernel_gc::ObjKind::Applicative(kernel_gc::object::Applicative { underlying: list_inner_op }))
            .unwrap();

        let cap_op = st.make_operative(capturing_op, Vec::new()).unwrap();
        let cap_app =
            st.alloc(kernel_gc::ObjKind::Applicative(kernel_gc::object::Applicative { underlying: cap_op })).unwrap();

        let middle = st.list_from(&[cap_app, Value::Fixint(2)]).unwrap();
        let form = st.list_from(&[list_app, Value::Fixint(1), middle, Value::Fixint(3)]).unwrap();

        let result = crate::run(&mut st, form, env).unwrap();
        assert_eq!(
            st.list_to_vec(result),
            Some(vec![Value::Fixint(1), Value::Fixint(99), Value::Fixint(3)])
        );
    }
}
