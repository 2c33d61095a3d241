//! 4.4 Symbols. Grounded on `original_source/src/kground.c`'s `symbolp`.

use kernel_gc::{KResult, ObjKind, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn symbol_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "symbol?")?;
    check_arity(state, &args, "symbol?", 1)?;
    let is_symbol = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Symbol(_)));
    state.apply_cc(Value::Bool(is_symbol));
    Ok(())
}

/// Not part of the original ground catalog: symbols carry no textual
/// representation a Kernel program can get at otherwise, and
/// `kernel-syntax`'s writer needs exactly this string for `write`/
/// `display`, so it's worth exposing directly.
fn symbol_to_string(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "symbol->string")?;
    check_arity(state, &args, "symbol->string", 1)?;
    let name = match args[0] {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Symbol(s) => state.symbols.resolve(s.name).to_string(),
            _ => return state.throw(kernel_gc::ErrorKind::Type, "symbol->string: expected a symbol"),
        },
        _ => return state.throw(kernel_gc::ErrorKind::Type, "symbol->string: expected a symbol"),
    };
    let chars: Vec<char> = name.chars().collect();
    let s = state.alloc(ObjKind::String(kernel_gc::object::StringObj { chars, immutable: false }))?;
    state.apply_cc(s);
    Ok(())
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "symbol?", symbol_p)?;
    bind_applicative(state, env, "symbol->string", symbol_to_string)?;
    Ok(())
}
