//! 4.6/4.7 Pairs and lists, and pair mutation. `pair?`/`null?`/`cons`/
//! `set-car!`/`set-cdr!` are grounded on `original_source/src/kground.c`;
//! `car`/`cdr`/`list`/`append`/`list-tail`/`length`/`map`/`reverse` are
//! the mechanical extras every Kernel ground environment needs and that
//! the original's incomplete snapshot left as `/* TODO */` or omitted
//! outright — built directly over `kernel_gc::State`'s own `car`/`cdr`/
//! `list_from`/`list_to_vec`.

use kernel_gc::{ErrorKind, KResult, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn pair_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "pair?")?;
    check_arity(state, &args, "pair?", 1)?;
    state.apply_cc(Value::Bool(state.is_pair(args[0])));
    Ok(())
}

fn null_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "null?")?;
    check_arity(state, &args, "null?", 1)?;
    state.apply_cc(Value::Bool(args[0].is_nil()));
    Ok(())
}

fn cons(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "cons")?;
    check_arity(state, &args, "cons", 2)?;
    let p = state.cons(args[0], args[1])?;
    state.apply_cc(p);
    Ok(())
}

fn car(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "car")?;
    check_arity(state, &args, "car", 1)?;
    match state.car(args[0]) {
        Some(v) => {
            state.apply_cc(v);
            Ok(())
        }
        None => state.throw(ErrorKind::Type, "car: expected a pair"),
    }
}

fn cdr(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "cdr")?;
    check_arity(state, &args, "cdr", 1)?;
    match state.cdr(args[0]) {
        Some(v) => {
            state.apply_cc(v);
            Ok(())
        }
        None => state.throw(ErrorKind::Type, "cdr: expected a pair"),
    }
}

fn set_car_b(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "set-car!")?;
    check_arity(state, &args, "set-car!", 2)?;
    if state.set_car(args[0], args[1]).is_err() {
        return state.throw(ErrorKind::Immutable, "set-car!: expected a mutable pair");
    }
    state.apply_cc(Value::Inert);
    Ok(())
}

fn set_cdr_b(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "set-cdr!")?;
    check_arity(state, &args, "set-cdr!", 2)?;
    if state.set_cdr(args[0], args[1]).is_err() {
        return state.throw(ErrorKind::Immutable, "set-cdr!: expected a mutable pair");
    }
    state.apply_cc(Value::Inert);
    Ok(())
}

fn list(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "list")?;
    let l = state.list_from(&args)?;
    state.apply_cc(l);
    Ok(())
}

fn append(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let lists = list_args(state, obj, "append")?;
    let mut out = Vec::new();
    for l in lists {
        match state.list_to_vec(l) {
            Some(items) => out.extend(items),
            None => return state.throw(ErrorKind::Type, "append: expected a proper list"),
        }
    }
    let result = state.list_from(&out)?;
    state.apply_cc(result);
    Ok(())
}

fn length(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "length")?;
    check_arity(state, &args, "length", 1)?;
    match state.list_to_vec(args[0]) {
        Some(items) => {
            state.apply_cc(Value::Fixint(items.len() as i64));
            Ok(())
        }
        None => state.throw(ErrorKind::Type, "length: expected a finite list"),
    }
}

fn list_tail(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "list-tail")?;
    check_arity(state, &args, "list-tail", 2)?;
    let Some(k) = args[1].as_fixint() else {
        return state.throw(ErrorKind::Type, "list-tail: expected an integer index");
    };
    let mut cur = args[0];
    for _ in 0..k {
        match state.cdr(cur) {
            Some(next) => cur = next,
            None => return state.throw(ErrorKind::Range, "list-tail: index beyond the list's end"),
        }
    }
    state.apply_cc(cur);
    Ok(())
}

fn reverse(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "reverse")?;
    check_arity(state, &args, "reverse", 1)?;
    let mut items = match state.list_to_vec(args[0]) {
        Some(items) => items,
        None => return state.throw(ErrorKind::Type, "reverse: expected a finite list"),
    };
    items.reverse();
    let result = state.list_from(&items)?;
    state.apply_cc(result);
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "pair?", pair_p)?;
    bind_applicative(state, env, "null?", null_p)?;
    bind_applicative(state, env, "cons", cons)?;
    bind_applicative(state, env, "car", car)?;
    bind_applicative(state, env, "cdr", cdr)?;
    bind_applicative(state, env, "set-car!", set_car_b)?;
    bind_applicative(state, env, "set-cdr!", set_cdr_b)?;
    bind_applicative(state, env, "list", list)?;
    bind_applicative(state, env, "append", append)?;
    bind_applicative(state, env, "length", length)?;
    bind_applicative(state, env, "list-tail", list_tail)?;
    bind_applicative(state, env, "reverse", reverse)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), kernel_eval::eval_entry)
    }

    fn eval_in_ground(st: &mut State, env: Value, name: &str, args: &[Value]) -> Value {
        let sym = crate::util::intern_symbol(st, name).unwrap();
        let f = kernel_env::lookup(st, env, sym).unwrap();
        let mut form = vec![f];
        form.extend_from_slice(args);
        let expr = st.list_from(&form).unwrap();
        kernel_eval::run(st, expr, env).unwrap()
    }

    #[test]
    fn cons_car_cdr_round_trip() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();
        let p = eval_in_ground(&mut st, env, "cons", &[Value::Fixint(1), Value::Fixint(2)]);
        assert_eq!(eval_in_ground(&mut st, env, "car", &[p]), Value::Fixint(1));
        assert_eq!(eval_in_ground(&mut st, env, "cdr", &[p]), Value::Fixint(2));
    }

    #[test]
    fn append_concatenates_two_lists() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();
        let a = st.list_from(&[Value::Fixint(1), Value::Fixint(2)]).unwrap();
        let b = st.list_from(&[Value::Fixint(3)]).unwrap();
        let result = eval_in_ground(&mut st, env, "append", &[a, b]);
        assert_eq!(st.list_to_vec(result), Some(vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]));
    }
}
