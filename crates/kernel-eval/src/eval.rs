//! `eval`: spec §4.2's dispatch on expression shape — pair, symbol, or
//! self-evaluating. Registered once as `State`'s `eval_entry` (klisp's
//! `K->eval_op`'s underlying `fn`, `keval.c`'s top half); `tail_eval`
//! schedules this as the trampoline's next step.

use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};

/// xparams is always empty here: `State::tail_eval` never threads extra
/// parameters to this entry point, only the expression and its
/// environment.
pub fn eval_entry(state: &mut State, _xparams: &[Value], expr: Value, env: Value) -> KResult<()> {
    match expr {
        Value::Nil => state.throw(ErrorKind::Type, "empty combination: cannot evaluate ()"),
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Pair(p) => {
                let (operator, operands, si) = (p.car, p.cdr, p.si.clone());
                let cont = state.make_continuation(crate::combine::combine_cont, vec![operands, env])?;
                if let Value::Ref(cont_id) = cont {
                    if let Some(si) = si {
                        if let ObjKind::Continuation(c) = state.heap.get_mut(cont_id) {
                            c.si = Some(si);
                        }
                    }
                }
                state.set_cc(cont);
                state.tail_eval(operator, env);
                Ok(())
            }
            ObjKind::Symbol(s) => {
                let name = s.name;
                match kernel_env::lookup(state, env, name) {
                    Some(v) => {
                        state.apply_cc(v);
                        Ok(())
                    }
                    None => {
                        let text = state.symbols.resolve(name).to_string();
                        state.throw(ErrorKind::Unbound, format!("unbound variable: {text}"))
                    }
                }
            }
            // Every other boxed kind (string, vector, bignum, operative,
            // applicative, continuation, environment, port, ...)
            // self-evaluates.
            _ => {
                state.apply_cc(expr);
                Ok(())
            }
        },
        // Fixint, Char, Bool, Inert, Ignore, Eof: self-evaluating
        // immediates.
        _ => {
            state.apply_cc(expr);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), eval_entry)
    }

    #[test]
    fn a_pair_installs_a_combine_continuation_before_evaluating_its_car() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        let form = st.list_from(&[Value::Fixint(1)]).unwrap();
        st.tail_eval(form, env);
        // The next step should be eval_entry on `1`, not combine_cont yet.
        assert_eq!(st.next.value, form);
    }
}
