//! 4.1 Booleans. Grounded on `original_source/src/kground.c`'s `booleanp`.

use kernel_gc::{ErrorKind, KResult, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn boolean_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "boolean?")?;
    check_arity(state, &args, "boolean?", 1)?;
    state.apply_cc(Value::Bool(matches!(args[0], Value::Bool(_))));
    Ok(())
}

/// `and?`/`or?`: applicatives (not `$and?`/`$or?`'s short-circuiting
/// operative form, which belongs with `$if`/`$cond` in `control.rs` if
/// ever added) over already-evaluated boolean arguments.
fn and_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "and?")?;
    let mut result = true;
    for a in args {
        match a.as_bool() {
            Some(b) => result &= b,
            None => return state.throw(ErrorKind::Type, "and?: argument is not a boolean"),
        }
    }
    state.apply_cc(Value::Bool(result));
    Ok(())
}

fn or_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "or?")?;
    let mut result = false;
    for a in args {
        match a.as_bool() {
            Some(b) => result |= b,
            None => return state.throw(ErrorKind::Type, "or?: argument is not a boolean"),
        }
    }
    state.apply_cc(Value::Bool(result));
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "boolean?", boolean_p)?;
    bind_applicative(state, env, "and?", and_p)?;
    bind_applicative(state, env, "or?", or_p)?;
    Ok(())
}
