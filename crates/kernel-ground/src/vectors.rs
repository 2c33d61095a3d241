//! Fixed-length mutable arrays of values (spec §4.8's sibling data types,
//! grounded the same way `strings.rs` is). Grounded on
//! `original_source/src/kvector.c`.

use kernel_gc::object::VectorObj;
use kernel_gc::{ErrorKind, KResult, ObjId, ObjKind, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn as_vector(state: &mut State, v: Value, context: &str) -> KResult<ObjId> {
    match v {
        Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Vector(_)) => Ok(id),
        _ => state.throw(ErrorKind::Type, format!("{context}: expected a vector")),
    }
}

fn vector_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "vector?")?;
    check_arity(state, &args, "vector?", 1)?;
    let is_vec = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Vector(_)));
    state.apply_cc(Value::Bool(is_vec));
    Ok(())
}

fn make_vector(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "make-vector")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "make-vector: expected 1 or 2 arguments");
    }
    let Some(n) = args[0].as_fixint().and_then(|n| usize::try_from(n).ok()) else {
        return state.throw(ErrorKind::Type, "make-vector: length must be a non-negative fixint");
    };
    let fill = if args.len() == 2 { args[1] } else { Value::Inert };
    let v = state.alloc(ObjKind::Vector(VectorObj { items: vec![fill; n], immutable: false }))?;
    state.apply_cc(v);
    Ok(())
}

fn vector_length(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "vector-length")?;
    check_arity(state, &args, "vector-length", 1)?;
    let id = as_vector(state, args[0], "vector-length")?;
    let ObjKind::Vector(v) = state.heap.get(id) else { unreachable!("checked in as_vector") };
    let len = v.items.len() as i64;
    state.apply_cc(Value::Fixint(len));
    Ok(())
}

fn vector_ref(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "vector-ref")?;
    check_arity(state, &args, "vector-ref", 2)?;
    let id = as_vector(state, args[0], "vector-ref")?;
    let Some(idx) = args[1].as_fixint() else {
        return state.throw(ErrorKind::Type, "vector-ref: index must be a fixint");
    };
    let ObjKind::Vector(v) = state.heap.get(id) else { unreachable!("checked in as_vector") };
    let Some(&item) = usize::try_from(idx).ok().and_then(|i| v.items.get(i)) else {
        return state.throw(ErrorKind::Range, "vector-ref: index out of range");
    };
    state.apply_cc(item);
    Ok(())
}

fn vector_set_bang(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "vector-set!")?;
    check_arity(state, &args, "vector-set!", 3)?;
    let id = as_vector(state, args[0], "vector-set!")?;
    let Some(idx) = args[1].as_fixint() else {
        return state.throw(ErrorKind::Type, "vector-set!: index must be a fixint");
    };
    let v = match state.heap.get_mut(id) {
        ObjKind::Vector(v) => v,
        _ => unreachable!("checked in as_vector"),
    };
    if v.immutable {
        return state.throw(ErrorKind::Immutable, "vector-set!: vector is immutable");
    }
    let Some(slot) = usize::try_from(idx).ok().and_then(|i| v.items.get_mut(i)) else {
        return state.throw(ErrorKind::Range, "vector-set!: index out of range");
    };
    *slot = args[2];
    state.apply_cc(Value::Inert);
    Ok(())
}

fn vector_to_list(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "vector->list")?;
    check_arity(state, &args, "vector->list", 1)?;
    let id = as_vector(state, args[0], "vector->list")?;
    let ObjKind::Vector(v) = state.heap.get(id) else { unreachable!("checked in as_vector") };
    let items = v.items.clone();
    let list = state.list_from(&items)?;
    state.apply_cc(list);
    Ok(())
}

fn list_to_vector(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "list->vector")?;
    check_arity(state, &args, "list->vector", 1)?;
    let Some(items) = state.list_to_vec(args[0]) else {
        return state.throw(ErrorKind::Type, "list->vector: expected a proper list");
    };
    let v = state.alloc(ObjKind::Vector(VectorObj { items, immutable: false }))?;
    state.apply_cc(v);
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "vector?", vector_p)?;
    bind_applicative(state, env, "make-vector", make_vector)?;
    bind_applicative(state, env, "vector-length", vector_length)?;
    bind_applicative(state, env, "vector-ref", vector_ref)?;
    bind_applicative(state, env, "vector-set!", vector_set_bang)?;
    bind_applicative(state, env, "vector->list", vector_to_list)?;
    bind_applicative(state, env, "list->vector", list_to_vector)?;
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
    fn make_vector_and_mutate_in_place() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! v (make-vector 3 0))");
        run_text(&mut st, env, "(vector-set! v 1 99)");
        assert_eq!(run_text(&mut st, env, "(vector-ref v 1)"), Value::Fixint(99));
        assert_eq!(run_text(&mut st, env, "(vector-ref v 0)"), Value::Fixint(0));
    }

    #[test]
    fn vector_list_round_trip() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(vector->list (list->vector (list 1 2 3)))");
        let items = st.list_to_vec(result).unwrap();
        assert_eq!(items, vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]);
    }

    #[test]
    fn out_of_range_index_errors() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let mut reader = kernel_syntax::Reader::new(&mut st, "(vector-ref (make-vector 1) 5)", "test");
        let form = reader.read().unwrap().unwrap();
        assert!(kernel_eval::run(&mut st, form, env).is_err());
    }
}
