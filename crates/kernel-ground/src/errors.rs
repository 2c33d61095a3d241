//! `error`, `error?`, `error-message`, `error-irritants`, and `$guard`
//! (spec §7). The `Unwind`/`ErrorObj` machinery itself lives in
//! `kernel-gc::state`; this module is the user-facing surface over it,
//! grounded on `original_source/src/kerror.c`'s `error` primitive and
//! `kground.c`'s `guard`.

use kernel_gc::{ErrorKind, KResult, ObjKind, State, Unwind, Value};

use crate::util::{bind_applicative, bind_operative, check_arity, list_args};

fn is_error(state: &State, v: Value) -> bool {
    matches!(v, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Error(_)))
}

/// `(error message irritant ...)`: always raises, carrying `message` as
/// the first argument (rendered as a string if it's one, debug-formatted
/// otherwise, matching klisp's own latitude on non-string messages) and
/// the rest as irritants (spec §7's "user-raised condition").
fn error_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "error")?;
    if args.is_empty() {
        return state.throw(ErrorKind::Arity, "error: expected at least 1 argument");
    }
    let message = match args[0] {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::String(s) => s.chars.iter().collect::<String>(),
            _ => format!("{:?}", args[0]),
        },
        other => format!("{other:?}"),
    };
    let irritants = state.list_from(&args[1..])?;
    state.throw_with_irritants(ErrorKind::User, message, irritants)
}

fn error_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "error?")?;
    check_arity(state, &args, "error?", 1)?;
    state.apply_cc(Value::Bool(is_error(state, args[0])));
    Ok(())
}

fn error_message(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "error-message")?;
    check_arity(state, &args, "error-message", 1)?;
    let Value::Ref(id) = args[0] else {
        return state.throw(ErrorKind::Type, "error-message: expected an error object");
    };
    let ObjKind::Error(e) = state.heap.get(id) else {
        return state.throw(ErrorKind::Type, "error-message: expected an error object");
    };
    let chars: Vec<char> = e.message.chars().collect();
    let s = state.alloc(ObjKind::String(kernel_gc::object::StringObj { chars, immutable: true }))?;
    state.apply_cc(s);
    Ok(())
}

fn error_irritants(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "error-irritants")?;
    check_arity(state, &args, "error-irritants", 1)?;
    let Value::Ref(id) = args[0] else {
        return state.throw(ErrorKind::Type, "error-irritants: expected an error object");
    };
    let ObjKind::Error(e) = state.heap.get(id) else {
        return state.throw(ErrorKind::Type, "error-irritants: expected an error object");
    };
    let irritants = e.irritants;
    state.apply_cc(irritants);
    Ok(())
}

/// `($guard (var clause ...) body ...)`: runs `body` as a `$sequence`;
/// if it raises, binds the captured error object to `var` in a fresh
/// environment and dispatches the `clause` list exactly like `$cond`
/// (spec §7's condition handling).
///
/// Unlike every other special form in this catalog, `$guard` is not a
/// proper tail call: recovering from an `Unwind` has no trampoline-native
/// representation to hook a continuation onto, since the `Err` only
/// surfaces by unwinding the Rust call stack, so this pays for one nested
/// `kernel_eval::run` call per dynamic extent of a guarded body.
fn guard_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$guard: expected ((var clause...) body...)");
    }
    let spec = state.car(obj).expect("checked is_pair");
    let body = state.cdr(obj).expect("checked is_pair");
    if !state.is_pair(spec) {
        return state.throw(ErrorKind::Type, "$guard: expected (var clause...)");
    }
    let var = state.car(spec).expect("checked is_pair");
    let clauses = state.cdr(spec).expect("checked is_pair");
    let Value::Ref(var_id) = var else {
        return state.throw(ErrorKind::Type, "$guard: handler variable must be a symbol");
    };
    if !matches!(state.heap.get(var_id), ObjKind::Symbol(_)) {
        return state.throw(ErrorKind::Type, "$guard: handler variable must be a symbol");
    }

    let protected_env = kernel_env::make_environment(state, vec![denv])?;
    match run_sequence_reentrant(state, body, protected_env) {
        Ok(v) => {
            state.apply_cc(v);
            Ok(())
        }
        Err(Unwind(err_value)) => {
            let handler_env = kernel_env::make_environment(state, vec![denv])?;
            let ObjKind::Symbol(s) = state.heap.get(var_id) else { unreachable!("checked above") };
            let sym = s.name;
            kernel_env::define_variable(state, handler_env, sym, err_value)?;
            state.tail_call(crate::control::cond_form, Vec::new(), clauses, handler_env);
            Ok(())
        }
    }
}

/// Runs `body` (a list of forms) to completion as a nested evaluation,
/// returning either its final value or the `Unwind` it raised — the
/// boundary `$guard` needs and nothing else in this catalog does, since
/// every other form tail-calls through the same top-level trampoline.
fn run_sequence_reentrant(state: &mut State, body: Value, env: Value) -> KResult<Value> {
    if body.is_nil() {
        return Ok(Value::Inert);
    }
    let mut result = Value::Inert;
    let mut rest = body;
    loop {
        if !state.is_pair(rest) {
            return state.throw(ErrorKind::Type, "$guard: improper body");
        }
        let form = state.car(rest).expect("checked is_pair");
        result = kernel_eval::run(state, form, env)?;
        rest = state.cdr(rest).expect("checked is_pair");
        if rest.is_nil() {
            return Ok(result);
        }
    }
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "error", error_fn)?;
    bind_applicative(state, env, "error?", error_p)?;
    bind_applicative(state, env, "error-message", error_message)?;
    bind_applicative(state, env, "error-irritants", error_irritants)?;
    bind_operative(state, env, "$guard", guard_form)?;
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
    fn error_raises_with_a_message_and_irritants() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let mut reader = kernel_syntax::Reader::new(&mut st, "(error \"bad\" 1 2)", "test");
        let form = reader.read().unwrap().unwrap();
        assert!(kernel_eval::run(&mut st, form, env).is_err());
    }

    #[test]
    fn guard_catches_an_error_and_reports_its_message() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(
            &mut st,
            env,
            "($guard (e (#t (error-message e))) (error \"boom\"))",
        );
        let ObjKind::String(s) = st.heap.get(result.as_ref_id().unwrap()) else {
            panic!("expected a string");
        };
        let text: String = s.chars.iter().collect();
        assert_eq!(text, "boom");
    }

    #[test]
    fn guard_passes_through_values_when_body_does_not_raise() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "($guard (e (#t 0)) 42)");
        assert_eq!(result, Value::Fixint(42));
    }
}
