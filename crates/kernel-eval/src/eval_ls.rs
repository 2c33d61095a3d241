//! `eval_ls_cfn`: the per-step continuation that walks a copied operand
//! list evaluating one car at a time (spec §4.3).
//!
//! The copy `make_arg_ls` hands back is always a plain, `Nil`-terminated
//! list, even for a cyclic input — only [`cyclic tail`] tracks where the
//! *original* list cycled. Walking the copy's structural `cdr` therefore
//! never requires distinguishing "next element" from "cycled back":
//! reaching `Nil` always means this was the copy's last pair, at which
//! point the cycle (if any) is restored onto the copy before the
//! underlying combiner is finally invoked.

use kernel_gc::{KResult, ObjKind, State, Value};

/// Pushes the continuation that will receive `current`'s (still
/// unevaluated) car once evaluated, then tail-evaluates it.
///
/// `head` is threaded through unchanged on every step so the final step
/// can hand the fully-evaluated list to the combiner.
pub fn schedule_step(
    state: &mut State,
    head: Value,
    current: Value,
    tail: Value,
    operative: Value,
    denv: Value,
) -> KResult<()> {
    let original_car = state.car(current).expect("current is a pair from make_arg_ls's copy");
    let cont = state.make_continuation(eval_ls_cfn, vec![head, current, tail, operative, denv])?;
    state.set_cc(cont);
    state.tail_eval(original_car, denv);
    Ok(())
}

/// xparams: `[head, current, tail, operative, denv]`.
fn eval_ls_cfn(state: &mut State, xparams: &[Value], obj: Value, _denv_unused: Value) -> KResult<()> {
    let head = xparams[0];
    let current = xparams[1];
    let tail = xparams[2];
    let operative = xparams[3];
    let denv = xparams[4];

    state.set_car(current, obj).expect("current is a mutable pair from make_arg_ls's copy");

    let next = state.cdr(current).expect("current is a pair");
    if next.is_nil() {
        if !tail.is_nil() {
            state.set_cdr(current, tail).expect("current is a mutable pair");
        }
        let (func, extra) = match operative {
            Value::Ref(id) => match state.heap.get(id) {
                ObjKind::Operative(op) => (op.func, op.extra.clone()),
                _ => unreachable!("combine.rs only ever stores an Operative here"),
            },
            _ => unreachable!("combine.rs only ever stores an Operative here"),
        };
        state.tail_call(func, extra, head, denv);
        Ok(())
    } else {
        schedule_step(state, head, next, tail, operative, denv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trampoline::run;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), crate::eval::eval_entry)
    }

    fn self_eval_operative(state: &mut State) -> Value {
        fn body(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
            state.apply_cc(obj);
            Ok(())
        }
        state.make_operative(body, Vec::new()).unwrap()
    }

    #[test]
    fn evaluates_each_operand_exactly_once_left_to_right_for_a_cyclic_list() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();

        // Build (list 1 2 3) as an applicative wrapping an operative that
        // just hands its (already evaluated) operand list back.
        fn list_op(state: &mut State, _x: &[Value], operands: Value, _denv: Value) -> KResult<()> {
            state.apply_cc(operands);
            Ok(())
        }
        let op = st.make_operative(list_op, Vec::new()).unwrap();
        let app = st.alloc(ObjKind::Applicative(kernel_gc::object::Applicative { underlying: op })).unwrap();

        let p3 = st.cons(Value::Fixint(3), Value::Nil).unwrap();
        let p2 = st.cons(Value::Fixint(2), p3).unwrap();
        let p1 = st.cons(Value::Fixint(1), p2).unwrap();
        st.set_cdr(p3, p1).unwrap(); // cyclic operand list

        let form = st.cons(app, p1).unwrap();
        let result = run(&mut st, form, env).unwrap();
        assert_eq!(st.list_to_vec(result).is_none(), true); // cyclic result
        let elems: Vec<Value> = {
            let mut out = Vec::new();
            let mut cur = result;
            for _ in 0..6 {
                out.push(st.car(cur).unwrap());
                cur = st.cdr(cur).unwrap();
            }
            out
        };
        assert_eq!(
            elems,
            vec![
                Value::Fixint(1),
                Value::Fixint(2),
                Value::Fixint(3),
                Value::Fixint(1),
                Value::Fixint(2),
                Value::Fixint(3),
            ]
        );
        let _ = self_eval_operative(&mut st);
    }
}
