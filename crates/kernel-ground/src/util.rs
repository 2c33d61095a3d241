//! Shared plumbing every ground module uses to install its bindings:
//! interning a name down to the bare [`Symbol`] `kernel_env::define_variable`
//! wants (rather than the boxed symbol object `SymbolInterner::intern`
//! hands back), and wrapping a [`NativeFn`] as either a raw operative or
//! an applicative over one.

use kernel_gc::object::{Applicative, ObjKind};
use kernel_gc::{ErrorKind, KResult, NativeFn, State, Symbol, Unwind, Value};

pub fn intern_symbol(state: &mut State, name: &str) -> KResult<Symbol> {
    let v = state.symbols.intern(&mut state.heap, name).map_err(|_| Unwind(Value::Inert))?;
    match v {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Symbol(s) => Ok(s.name),
            _ => unreachable!("SymbolInterner::intern always allocates a Symbol object"),
        },
        _ => unreachable!("SymbolInterner::intern always returns a Value::Ref"),
    }
}

pub fn bind_operative(state: &mut State, env: Value, name: &str, f: NativeFn) -> KResult<()> {
    let sym = intern_symbol(state, name)?;
    let op = state.make_operative(f, Vec::new())?;
    kernel_env::define_variable(state, env, sym, op)
}

pub fn bind_applicative(state: &mut State, env: Value, name: &str, f: NativeFn) -> KResult<()> {
    let sym = intern_symbol(state, name)?;
    let op = state.make_operative(f, Vec::new())?;
    let app = state.alloc(ObjKind::Applicative(Applicative { underlying: op }))?;
    kernel_env::define_variable(state, env, sym, app)
}

/// Binds a precomputed value (a constructed applicative/operative that
/// needed closure-style `extra` parameters, e.g. `$lambda` wrapping
/// `$vau`) directly, skipping the bare-`NativeFn` helpers above.
pub fn bind_value(state: &mut State, env: Value, name: &str, value: Value) -> KResult<()> {
    let sym = intern_symbol(state, name)?;
    kernel_env::define_variable(state, env, sym, value)
}

/// Walks a Kernel list into a `Vec<Value>`, throwing `type` (naming
/// `context`) if it's improper or cyclic — the shape almost every
/// fixed-arity-checking native function needs before indexing its
/// arguments.
pub fn list_args(state: &mut State, v: Value, context: &str) -> KResult<Vec<Value>> {
    match state.list_to_vec(v) {
        Some(items) => Ok(items),
        None => state.throw(ErrorKind::Type, format!("{context}: expected a proper argument list")),
    }
}

pub fn check_arity(state: &mut State, args: &[Value], name: &str, expected: usize) -> KResult<()> {
    if args.len() != expected {
        return state.throw(
            ErrorKind::Arity,
            format!("{name}: expected {expected} argument(s), got {}", args.len()),
        );
    }
    Ok(())
}
