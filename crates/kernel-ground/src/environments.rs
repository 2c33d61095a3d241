//! `make-environment`, `environment?`, and `$let` (spec §4.5). `$set!` lives
//! in `control.rs` alongside `$define!`, since both share the same
//! evaluate-then-bind continuation shape.
//!
//! Grounded on `original_source/src/kground.c`'s `make_environment`/`klet`
//! pair and on `kernel-env::environment`'s multi-parent search, which is
//! what lets `make-environment` accept more than one parent where klisp's
//! C version only ever took zero or one.

use kernel_gc::object::Environment as EnvObj;
use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};

use crate::util::{bind_applicative, bind_operative, check_arity, list_args};

fn is_environment(state: &State, v: Value) -> bool {
    matches!(v, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Environment(_)))
}

/// `(make-environment parent ...)`: every argument must itself already be
/// an environment (spec §4.5's ptree/eformal-free constructor — the
/// general multi-parent case `$vau`'s own child-environment creation
/// doesn't need, but the ground catalog exposes directly).
fn make_environment_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "make-environment")?;
    for &a in &args {
        if !is_environment(state, a) {
            return state.throw(ErrorKind::Type, "make-environment: expected an environment");
        }
    }
    let env = state.alloc(ObjKind::Environment(EnvObj::new(args)))?;
    state.apply_cc(env);
    Ok(())
}

fn environment_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "environment?")?;
    check_arity(state, &args, "environment?", 1)?;
    state.apply_cc(Value::Bool(is_environment(state, args[0])));
    Ok(())
}

/// `($let ((name expr) ...) body...)`: every binding expression is
/// evaluated in the *original* dynamic environment (not the new child
/// environment, and not each other's — spec §4.5's "non-recursive let"),
/// then bound into one fresh environment before the body runs there. This
/// is exactly `$vau`'s own child-env-then-ptree-bind shape, just with the
/// bindings spelled out as an explicit list instead of matched against an
/// operand ptree, so it gets its own small continuation chain rather than
/// reusing `vau_apply`.
fn let_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$let: expected (bindings . body)");
    }
    let bindings_form = state.car(obj).expect("checked is_pair");
    let body = state.cdr(obj).expect("checked is_pair");
    let bindings = match state.list_to_vec(bindings_form) {
        Some(b) => b,
        None => return state.throw(ErrorKind::Type, "$let: bindings must be a proper list"),
    };

    let mut names = Vec::with_capacity(bindings.len());
    let mut exprs = Vec::with_capacity(bindings.len());
    for b in &bindings {
        if !state.is_pair(*b) {
            return state.throw(ErrorKind::Type, "$let: malformed binding");
        }
        let name = state.car(*b).expect("checked is_pair");
        let rest = state.cdr(*b).expect("checked is_pair");
        if !state.is_pair(rest) || !state.cdr(rest).expect("checked is_pair").is_nil() {
            return state.throw(ErrorKind::Type, "$let: malformed binding, expected (name expr)");
        }
        let expr = state.car(rest).expect("checked is_pair");
        if !matches!(name, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Symbol(_))) {
            return state.throw(ErrorKind::Type, "$let: binding name must be a symbol");
        }
        names.push(name);
        exprs.push(expr);
    }

    let_step(state, names, exprs, Vec::new(), body, denv)
}

/// Evaluates binding expressions one at a time (each against the
/// original `denv`), accumulating results, then binds them all at once
/// once every expression has run — matching `$define!`'s
/// evaluate-fully-before-binding discipline rather than binding
/// incrementally, so an error partway through never leaves a partially
/// populated environment observable.
fn let_step(
    state: &mut State,
    names: Vec<Value>,
    exprs: Vec<Value>,
    mut done: Vec<Value>,
    body: Value,
    denv: Value,
) -> KResult<()> {
    let i = done.len();
    if i == exprs.len() {
        let child = kernel_env::make_environment(state, vec![denv])?;
        for (name, value) in names.iter().zip(done.into_iter()) {
            let Value::Ref(id) = *name else { unreachable!("checked symbol in let_form") };
            let ObjKind::Symbol(s) = state.heap.get(id) else { unreachable!("checked symbol in let_form") };
            let sym = s.name;
            kernel_env::define_variable(state, child, sym, value)?;
        }
        return crate::control::eval_sequence(state, body, child);
    }
    let n = exprs.len();
    let cont = state.make_continuation(let_step_cont, {
        let mut xp = vec![body, denv, Value::Fixint(n as i64)];
        xp.extend(names.iter().copied());
        xp.extend(exprs.iter().copied());
        xp.extend(done.iter().copied());
        xp
    })?;
    state.set_cc(cont);
    state.tail_eval(exprs[i], denv);
    Ok(())
}

/// xparams layout: `[body, denv, n, name_0..name_{n-1}, expr_0..expr_{n-1}, done_0..done_{i-1}]`,
/// where `i` (the number of already-evaluated bindings) is implicit in
/// how many xparams remain after the fixed `3 + 2n` header.
fn let_step_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let body = xparams[0];
    let denv = xparams[1];
    let Value::Fixint(n) = xparams[2] else { unreachable!("count marker always a Fixint") };
    let n = n as usize;
    let names: Vec<Value> = xparams[3..3 + n].to_vec();
    let exprs: Vec<Value> = xparams[3 + n..3 + 2 * n].to_vec();
    let mut done: Vec<Value> = xparams[3 + 2 * n..].to_vec();
    done.push(obj);
    let_step(state, names, exprs, done, body, denv)
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "make-environment", make_environment_fn)?;
    bind_applicative(state, env, "environment?", environment_p)?;
    bind_operative(state, env, "$let", let_form)?;
    Ok(())
}
