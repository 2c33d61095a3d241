//! Immutable/mutable character strings (spec §4.8's sibling data types —
//! the spec itself scopes pairs/symbols/numbers/continuations as the core
//! object model; strings round out the catalog the same way klisp's own
//! `kstring.c` rounds out its core `ktypes`).
//!
//! Grounded on `original_source/src/kstring.c`.

use kernel_gc::object::StringObj;
use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn as_string(state: &mut State, v: Value, context: &str) -> KResult<kernel_gc::ObjId> {
    match v {
        Value::Ref(id) if matches!(state.heap.get(id), ObjKind::String(_)) => Ok(id),
        _ => state.throw(ErrorKind::Type, format!("{context}: expected a string")),
    }
}

fn string_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string?")?;
    check_arity(state, &args, "string?", 1)?;
    let is_str = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::String(_)));
    state.apply_cc(Value::Bool(is_str));
    Ok(())
}

fn string_length(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string-length")?;
    check_arity(state, &args, "string-length", 1)?;
    let id = as_string(state, args[0], "string-length")?;
    let ObjKind::String(s) = state.heap.get(id) else { unreachable!("checked in as_string") };
    let len = s.chars.len() as i64;
    state.apply_cc(Value::Fixint(len));
    Ok(())
}

fn string_ref(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string-ref")?;
    check_arity(state, &args, "string-ref", 2)?;
    let id = as_string(state, args[0], "string-ref")?;
    let Some(idx) = args[1].as_fixint() else {
        return state.throw(ErrorKind::Type, "string-ref: index must be a fixint");
    };
    let ObjKind::String(s) = state.heap.get(id) else { unreachable!("checked in as_string") };
    let Some(&c) = usize::try_from(idx).ok().and_then(|i| s.chars.get(i)) else {
        return state.throw(ErrorKind::Range, "string-ref: index out of range");
    };
    state.apply_cc(Value::Char(c));
    Ok(())
}

fn string_set_bang(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string-set!")?;
    check_arity(state, &args, "string-set!", 3)?;
    let id = as_string(state, args[0], "string-set!")?;
    let Some(idx) = args[1].as_fixint() else {
        return state.throw(ErrorKind::Type, "string-set!: index must be a fixint");
    };
    let Value::Char(c) = args[2] else {
        return state.throw(ErrorKind::Type, "string-set!: expected a character");
    };
    let s = match state.heap.get_mut(id) {
        ObjKind::String(s) => s,
        _ => unreachable!("checked in as_string"),
    };
    if s.immutable {
        return state.throw(ErrorKind::Immutable, "string-set!: string is immutable");
    }
    let Some(slot) = usize::try_from(idx).ok().and_then(|i| s.chars.get_mut(i)) else {
        return state.throw(ErrorKind::Range, "string-set!: index out of range");
    };
    *slot = c;
    state.apply_cc(Value::Inert);
    Ok(())
}

fn make_string(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "make-string")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "make-string: expected 1 or 2 arguments");
    }
    let Some(n) = args[0].as_fixint().and_then(|n| usize::try_from(n).ok()) else {
        return state.throw(ErrorKind::Type, "make-string: length must be a non-negative fixint");
    };
    let fill = if args.len() == 2 {
        match args[1] {
            Value::Char(c) => c,
            _ => return state.throw(ErrorKind::Type, "make-string: fill must be a character"),
        }
    } else {
        ' '
    };
    let s = state.alloc(ObjKind::String(StringObj { chars: vec![fill; n], immutable: false }))?;
    state.apply_cc(s);
    Ok(())
}

fn string_append(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string-append")?;
    let mut chars = Vec::new();
    for a in &args {
        let id = as_string(state, *a, "string-append")?;
        let ObjKind::String(s) = state.heap.get(id) else { unreachable!("checked in as_string") };
        chars.extend_from_slice(&s.chars);
    }
    let s = state.alloc(ObjKind::String(StringObj { chars, immutable: false }))?;
    state.apply_cc(s);
    Ok(())
}

fn string_to_list(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string->list")?;
    check_arity(state, &args, "string->list", 1)?;
    let id = as_string(state, args[0], "string->list")?;
    let ObjKind::String(s) = state.heap.get(id) else { unreachable!("checked in as_string") };
    let items: Vec<Value> = s.chars.iter().map(|&c| Value::Char(c)).collect();
    let list = state.list_from(&items)?;
    state.apply_cc(list);
    Ok(())
}

fn list_to_string(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "list->string")?;
    check_arity(state, &args, "list->string", 1)?;
    let Some(items) = state.list_to_vec(args[0]) else {
        return state.throw(ErrorKind::Type, "list->string: expected a proper list");
    };
    let mut chars = Vec::with_capacity(items.len());
    for v in items {
        match v {
            Value::Char(c) => chars.push(c),
            _ => return state.throw(ErrorKind::Type, "list->string: expected a list of characters"),
        }
    }
    let s = state.alloc(ObjKind::String(StringObj { chars, immutable: false }))?;
    state.apply_cc(s);
    Ok(())
}

fn string_eq(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string=?")?;
    if args.len() < 2 {
        return state.throw(ErrorKind::Arity, "string=?: expected at least 2 arguments");
    }
    let id0 = as_string(state, args[0], "string=?")?;
    let ObjKind::String(first) = state.heap.get(id0) else { unreachable!("checked in as_string") };
    let first = first.chars.clone();
    let mut all_eq = true;
    for a in &args[1..] {
        let id = as_string(state, *a, "string=?")?;
        let ObjKind::String(s) = state.heap.get(id) else { unreachable!("checked in as_string") };
        if s.chars != first {
            all_eq = false;
            break;
        }
    }
    state.apply_cc(Value::Bool(all_eq));
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "string?", string_p)?;
    bind_applicative(state, env, "string-length", string_length)?;
    bind_applicative(state, env, "string-ref", string_ref)?;
    bind_applicative(state, env, "string-set!", string_set_bang)?;
    bind_applicative(state, env, "make-string", make_string)?;
    bind_applicative(state, env, "string-append", string_append)?;
    bind_applicative(state, env, "string->list", string_to_list)?;
    bind_applicative(state, env, "list->string", list_to_string)?;
    bind_applicative(state, env, "string=?", string_eq)?;
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
    fn make_string_and_mutate_in_place() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! s (make-string 3 #\\a))");
        run_text(&mut st, env, "(string-set! s 1 #\\b)");
        let result = run_text(&mut st, env, "(string-ref s 1)");
        assert_eq!(result, Value::Char('b'));
    }

    #[test]
    fn string_append_concatenates() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(string-length (string-append (make-string 2) (make-string 3)))");
        assert_eq!(result, Value::Fixint(5));
    }

    #[test]
    fn string_list_round_trip() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(string=? (list->string (string->list (make-string 2 #\\x))) (make-string 2 #\\x))");
        assert_eq!(result, Value::Bool(true));
    }
}
