//! 4.2/4.3 Equivalence under and up to mutation. `eq?` is grounded on
//! `original_source/src/kground.c`'s `eqp`; `equal?` has no grounding
//! there (it's left `/* TODO */` in the original), so it's built
//! directly from spec.md §3.1's definition over `State::equal`.

use kernel_gc::{KResult, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn eq_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "eq?")?;
    check_arity(state, &args, "eq?", 2)?;
    state.apply_cc(Value::Bool(state.eq(args[0], args[1])));
    Ok(())
}

fn equal_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "equal?")?;
    check_arity(state, &args, "equal?", 2)?;
    state.apply_cc(Value::Bool(state.equal(args[0], args[1])));
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "eq?", eq_p)?;
    bind_applicative(state, env, "equal?", equal_p)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), kernel_eval::eval_entry)
    }

    #[test]
    fn eq_is_identity_equal_is_structural() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();

        let a = st.list_from(&[Value::Fixint(1), Value::Fixint(2)]).unwrap();
        let b = st.list_from(&[Value::Fixint(1), Value::Fixint(2)]).unwrap();

        let eq_sym = crate::util::intern_symbol(&mut st, "eq?").unwrap();
        let eq_fn = kernel_env::lookup(&st, env, eq_sym).unwrap();
        let form = st.list_from(&[eq_fn, a, b]).unwrap();
        assert_eq!(kernel_eval::run(&mut st, form, env).unwrap(), Value::Bool(false));

        let equal_sym = crate::util::intern_symbol(&mut st, "equal?").unwrap();
        let equal_fn = kernel_env::lookup(&st, env, equal_sym).unwrap();
        let form2 = st.list_from(&[equal_fn, a, b]).unwrap();
        assert_eq!(kernel_eval::run(&mut st, form2, env).unwrap(), Value::Bool(true));
    }
}
