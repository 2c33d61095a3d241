//! `call/cc`/`call-with-current-continuation` and `continuation?` (spec
//! §4.4, glossary "Continuation"). The capture/invoke machinery itself
//! lives in `kernel_eval::continuation`; this module is just the ground
//! binding that wires a one-argument receiver combiner to it.
//!
//! Grounded on `original_source/src/kground.c`'s `call_cc` alongside
//! `kernel_eval::continuation::capture`/`combine_continuation`.

use kernel_eval::continuation::{capture, is_continuation};
use kernel_gc::{KResult, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

/// `(call/cc receiver)`: captures the continuation waiting on this
/// combination's own result, then applies `receiver` to it as an
/// ordinary one-argument call. Building `(receiver captured)` and handing
/// it to `tail_eval` is safe without a separate "apply without
/// re-evaluating" path because both `receiver` and `captured` are
/// already-evaluated heap values — neither a `Pair` nor a `Symbol` — so
/// re-evaluating the combination evaluates them to themselves.
fn call_cc(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "call/cc")?;
    check_arity(state, &args, "call/cc", 1)?;
    let captured = capture(state);
    let form = state.list_from(&[args[0], captured])?;
    state.tail_eval(form, denv);
    Ok(())
}

fn continuation_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "continuation?")?;
    check_arity(state, &args, "continuation?", 1)?;
    state.apply_cc(Value::Bool(is_continuation(state, args[0])));
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "call/cc", call_cc)?;
    bind_applicative(state, env, "call-with-current-continuation", call_cc)?;
    bind_applicative(state, env, "continuation?", continuation_p)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), kernel_eval::eval_entry)
    }

    fn ground_env(st: &mut State) -> Value {
        let env = kernel_env::make_environment(st, vec![]).unwrap();
        crate::install(st, env).unwrap();
        env
    }

    fn run_text(st: &mut State, env: Value, text: &str) -> Value {
        let mut reader = kernel_syntax::Reader::new(st, text, "test");
        let form = reader.read().unwrap().expect("one datum");
        kernel_eval::run(st, form, env).unwrap()
    }

    #[test]
    fn escaping_call_cc_short_circuits_the_enclosing_sequence() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        // The captured continuation is invoked with 99 before `$sequence`
        // ever reaches its own third form, so the whole combination
        // evaluates to 99 rather than 3.
        let result = run_text(
            &mut st,
            env,
            "($sequence 1 (call/cc ($lambda (k) ($sequence (k 99) 2))) 3)",
        );
        assert_eq!(result, Value::Fixint(99));
    }

    #[test]
    fn call_cc_returns_normally_when_never_invoked() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(call/cc ($lambda (k) 42))");
        assert_eq!(result, Value::Fixint(42));
    }

    #[test]
    fn continuation_predicate() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(call/cc ($lambda (k) (continuation? k)))");
        assert_eq!(result, Value::Bool(true));
        assert_eq!(run_text(&mut st, env, "(continuation? 5)"), Value::Bool(false));
    }
}
