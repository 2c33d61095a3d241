//! 4.2/4.5 Core special forms: `$vau`, `$lambda`, `$define!`, `$if`,
//! `$sequence`, `$quote`, `$cond`, `$and?`, `$or?`, plus the
//! combiner-introspection applicatives `wrap`/`unwrap`/`apply`/
//! `operative?`/`applicative?`/`combiner?` and `eval`.
//!
//! Grounded on `original_source/src/kground.c`'s `vau`/`Dvariable`/`Dif` family
//! (the original snapshot implements these natively in C against the same
//! trampoline primitives `kernel-eval::trampoline` realizes); every
//! special form here is, true to spec §4.2, an *operative* that receives
//! its operand tree unevaluated and installs a continuation before
//! tail-evaluating a subexpression — never a macro that expands and
//! re-enters `eval` from the top.

use kernel_gc::object::{Applicative, ObjKind, Operative};
use kernel_gc::{ErrorKind, KResult, State, Value};

use crate::util::{bind_applicative, bind_operative, check_arity, list_args};

/// `$sequence`: evaluates each form in `forms` left-to-right, discarding
/// every value but the last, which is a **proper tail call** (spec §9
/// "proper tail calls... mandatory") — the trampoline never recurses to
/// reach it. An empty sequence evaluates to `#inert`, matching `$vau`'s
/// own empty-body case and the `$sequence` ground binding alike.
pub fn eval_sequence(state: &mut State, forms: Value, env: Value) -> KResult<()> {
    if forms.is_nil() {
        state.apply_cc(Value::Inert);
        return Ok(());
    }
    if !state.is_pair(forms) {
        return state.throw(ErrorKind::Type, "$sequence: improper body");
    }
    let car = state.car(forms).expect("checked is_pair");
    let cdr = state.cdr(forms).expect("checked is_pair");
    if cdr.is_nil() {
        state.tail_eval(car, env);
        Ok(())
    } else {
        let cont = state.make_continuation(seq_cont, vec![cdr, env])?;
        state.set_cc(cont);
        state.tail_eval(car, env);
        Ok(())
    }
}

/// xparams: `[rest_forms, env]`. Discards the value just produced by the
/// form before it and schedules the next one.
fn seq_cont(state: &mut State, xparams: &[Value], _obj: Value, _denv: Value) -> KResult<()> {
    eval_sequence(state, xparams[0], xparams[1])
}

fn sequence_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    eval_sequence(state, obj, denv)
}

/// `$quote`: returns its single operand exactly as written, never
/// evaluating it.
fn quote_form(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "$quote")?;
    check_arity(state, &args, "$quote", 1)?;
    state.apply_cc(args[0]);
    Ok(())
}

/// `$if`: installs a **bool-check continuation** (spec glossary) over the
/// test so the error path ("test is not a boolean", scenario 2) is
/// reported at the point `$if` itself notices the mismatch, then
/// tail-evaluates whichever branch the test selected.
fn if_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "$if")?;
    check_arity(state, &args, "$if", 3)?;
    let cont = state.make_continuation(if_cont, vec![args[1], args[2], denv])?;
    state.mark_bool_check(cont);
    state.set_cc(cont);
    state.tail_eval(args[0], denv);
    Ok(())
}

/// xparams: `[consequent, alternative, denv]`.
fn if_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    match obj {
        Value::Bool(true) => {
            state.tail_eval(xparams[0], xparams[2]);
            Ok(())
        }
        Value::Bool(false) => {
            state.tail_eval(xparams[1], xparams[2]);
            Ok(())
        }
        _ => state.throw(ErrorKind::Type, "$if: test is not a boolean"),
    }
}

/// `$cond`: a list of `(test . body)` clauses, tried in order; a clause
/// with an empty body yields the test's own value (like `cond`'s `=>`-less
/// bodyless clause in most Schemes). No matching clause yields `#inert`.
pub(crate) fn cond_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if obj.is_nil() {
        state.apply_cc(Value::Inert);
        return Ok(());
    }
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$cond: improper clause list");
    }
    let clause = state.car(obj).expect("checked is_pair");
    let rest = state.cdr(obj).expect("checked is_pair");
    if !state.is_pair(clause) {
        return state.throw(ErrorKind::Type, "$cond: malformed clause");
    }
    let test = state.car(clause).expect("checked is_pair");
    let body = state.cdr(clause).expect("checked is_pair");
    let cont = state.make_continuation(cond_cont, vec![body, rest, denv])?;
    state.mark_bool_check(cont);
    state.set_cc(cont);
    state.tail_eval(test, denv);
    Ok(())
}

/// xparams: `[body, rest_clauses, denv]`.
fn cond_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let body = xparams[0];
    let rest = xparams[1];
    let denv = xparams[2];
    match obj {
        Value::Bool(true) => {
            if body.is_nil() {
                state.apply_cc(Value::Bool(true));
                Ok(())
            } else {
                eval_sequence(state, body, denv)
            }
        }
        Value::Bool(false) => {
            state.tail_call(cond_form, Vec::new(), rest, denv);
            Ok(())
        }
        _ => state.throw(ErrorKind::Type, "$cond: test is not a boolean"),
    }
}

/// `$and?`: short-circuiting operative form — stops and returns `#f` at
/// the first false operand, otherwise returns the last operand's value
/// (`#t` for an empty operand list).
fn and_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if obj.is_nil() {
        state.apply_cc(Value::Bool(true));
        return Ok(());
    }
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$and?: improper operand list");
    }
    let car = state.car(obj).expect("checked is_pair");
    let cdr = state.cdr(obj).expect("checked is_pair");
    if cdr.is_nil() {
        state.tail_eval(car, denv);
        return Ok(());
    }
    let cont = state.make_continuation(and_cont, vec![cdr, denv])?;
    state.mark_bool_check(cont);
    state.set_cc(cont);
    state.tail_eval(car, denv);
    Ok(())
}

fn and_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    match obj {
        Value::Bool(true) => {
            state.tail_call(and_form, Vec::new(), xparams[0], xparams[1]);
            Ok(())
        }
        Value::Bool(false) => {
            state.apply_cc(Value::Bool(false));
            Ok(())
        }
        _ => state.throw(ErrorKind::Type, "$and?: operand is not a boolean"),
    }
}

/// `$or?`: dual of `$and?` — stops at the first true operand.
fn or_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if obj.is_nil() {
        state.apply_cc(Value::Bool(false));
        return Ok(());
    }
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$or?: improper operand list");
    }
    let car = state.car(obj).expect("checked is_pair");
    let cdr = state.cdr(obj).expect("checked is_pair");
    if cdr.is_nil() {
        state.tail_eval(car, denv);
        return Ok(());
    }
    let cont = state.make_continuation(or_cont, vec![cdr, denv])?;
    state.mark_bool_check(cont);
    state.set_cc(cont);
    state.tail_eval(car, denv);
    Ok(())
}

fn or_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    match obj {
        Value::Bool(false) => {
            state.tail_call(or_form, Vec::new(), xparams[0], xparams[1]);
            Ok(())
        }
        Value::Bool(true) => {
            state.apply_cc(Value::Bool(true));
            Ok(())
        }
        _ => state.throw(ErrorKind::Type, "$or?: operand is not a boolean"),
    }
}

/// `$vau`: the primitive combiner constructor (spec §1, glossary
/// "Operative"). `(car)` is the parameter tree, `(cadr)` the dynamic-
/// environment parameter (a symbol or `#ignore`), `(cddr)` the body. The
/// resulting operative closes over `denv` (the *static* environment, the
/// one `$vau` itself was evaluated in) as `vau_apply`'s fourth `extra`.
fn vau_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$vau: expected (ptree eformal . body)");
    }
    let ptree = state.car(obj).expect("checked is_pair");
    let rest = state.cdr(obj).expect("checked is_pair");
    if !state.is_pair(rest) {
        return state.throw(ErrorKind::Type, "$vau: expected (ptree eformal . body)");
    }
    let eformal = state.car(rest).expect("checked is_pair");
    let body = state.cdr(rest).expect("checked is_pair");

    match eformal {
        Value::Ignore => {}
        Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Symbol(_)) => {}
        _ => return state.throw(ErrorKind::Type, "$vau: dynamic environment parameter must be a symbol or #ignore"),
    }

    let ptree_copy = kernel_env::validate_and_copy_ptree(state, ptree)?;
    let op = state.alloc(ObjKind::Operative(Operative {
        func: vau_apply,
        extra: vec![ptree_copy, eformal, body, denv],
        name: None,
        si: None,
    }))?;
    state.apply_cc(op);
    Ok(())
}

/// The shared body every `$vau`-constructed operative runs: bind the
/// operand tree against the ptree, bind the eformal (if not `#ignore`) to
/// the caller's dynamic environment, then tail-evaluate the body as a
/// `$sequence` — all in a fresh child of the operative's *static*
/// environment, so free identifiers in the body resolve lexically rather
/// than against whatever environment happened to call it.
///
/// xparams: `[ptree, eformal, body, static_env]`.
fn vau_apply(state: &mut State, xparams: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let ptree = xparams[0];
    let eformal = xparams[1];
    let body = xparams[2];
    let static_env = xparams[3];

    let call_env = kernel_env::make_environment(state, vec![static_env])?;
    kernel_env::match_ptree(state, call_env, ptree, obj)?;
    if let Value::Ref(id) = eformal {
        if let ObjKind::Symbol(s) = state.heap.get(id) {
            let name = s.name;
            kernel_env::define_variable(state, call_env, name, denv)?;
        }
    }
    eval_sequence(state, body, call_env)
}

/// `$lambda`: sugar for `$vau` immediately wrapped in an applicative with
/// the dynamic-environment parameter set to `#ignore` — the body can
/// never see its caller's environment, only evaluated-argument values
/// (spec glossary "Applicative").
fn lambda_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    if !state.is_pair(obj) {
        return state.throw(ErrorKind::Type, "$lambda: expected (ptree . body)");
    }
    let ptree = state.car(obj).expect("checked is_pair");
    let body = state.cdr(obj).expect("checked is_pair");
    let ptree_copy = kernel_env::validate_and_copy_ptree(state, ptree)?;
    let op = state.alloc(ObjKind::Operative(Operative {
        func: vau_apply,
        extra: vec![ptree_copy, Value::Ignore, body, denv],
        name: None,
        si: None,
    }))?;
    let app = state.alloc(ObjKind::Applicative(Applicative { underlying: op }))?;
    state.apply_cc(app);
    Ok(())
}

/// `$define!`: evaluates the expression in `denv`, then binds the result
/// against the (validated, copied) parameter tree in `denv` itself —
/// all-or-nothing, per spec §4.5/§8.
fn define_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "$define!")?;
    check_arity(state, &args, "$define!", 2)?;
    let ptree = kernel_env::validate_and_copy_ptree(state, args[0])?;
    let cont = state.make_continuation(define_cont, vec![ptree, denv])?;
    state.set_cc(cont);
    state.tail_eval(args[1], denv);
    Ok(())
}

fn define_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    kernel_env::match_ptree(state, xparams[1], xparams[0], obj)?;
    state.apply_cc(Value::Inert);
    Ok(())
}

/// `$set!`: like `$define!` but requires the symbol to already be bound
/// somewhere in the environment chain (spec §4.5's `kset_binding`); only
/// a bare-symbol target is supported, matching the common ground-env
/// shape (`(env-form target expr)` three-argument form is not modeled
/// since no ground `$vau`-level caller in this catalog needs it).
fn set_bang_form(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "$set!")?;
    check_arity(state, &args, "$set!", 2)?;
    let Value::Ref(id) = args[0] else {
        return state.throw(ErrorKind::Type, "$set!: expected a symbol");
    };
    let ObjKind::Symbol(s) = state.heap.get(id) else {
        return state.throw(ErrorKind::Type, "$set!: expected a symbol");
    };
    let name = s.name;
    let cont = state.make_continuation(set_bang_cont, vec![Value::Ref(id), denv])?;
    state.set_cc(cont);
    let _ = name;
    state.tail_eval(args[1], denv);
    Ok(())
}

fn set_bang_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let ObjKind::Symbol(s) = state.heap.get(xparams[0].as_ref_id().expect("checked in set_bang_form")) else {
        unreachable!("checked in set_bang_form");
    };
    let name = s.name;
    kernel_env::set_variable(state, xparams[1], name, obj)?;
    state.apply_cc(Value::Inert);
    Ok(())
}

/// `wrap`/`unwrap`: convert between a combiner and an applicative wrapping
/// it (spec glossary "Applicative" — "wraps another combiner").
fn wrap(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "wrap")?;
    check_arity(state, &args, "wrap", 1)?;
    let app = state.alloc(ObjKind::Applicative(Applicative { underlying: args[0] }))?;
    state.apply_cc(app);
    Ok(())
}

fn unwrap(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "unwrap")?;
    check_arity(state, &args, "unwrap", 1)?;
    match args[0] {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Applicative(a) => {
                let underlying = a.underlying;
                state.apply_cc(underlying);
                Ok(())
            }
            _ => state.throw(ErrorKind::Type, "unwrap: expected an applicative"),
        },
        _ => state.throw(ErrorKind::Type, "unwrap: expected an applicative"),
    }
}

fn is_operative_value(state: &State, v: Value) -> bool {
    matches!(v, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Operative(_) | ObjKind::Continuation(_)))
}

fn is_applicative_value(state: &State, v: Value) -> bool {
    matches!(v, Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Applicative(_)))
}

fn operative_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "operative?")?;
    check_arity(state, &args, "operative?", 1)?;
    state.apply_cc(Value::Bool(is_operative_value(state, args[0])));
    Ok(())
}

fn applicative_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "applicative?")?;
    check_arity(state, &args, "applicative?", 1)?;
    state.apply_cc(Value::Bool(is_applicative_value(state, args[0])));
    Ok(())
}

fn combiner_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "combiner?")?;
    check_arity(state, &args, "combiner?", 1)?;
    state.apply_cc(Value::Bool(is_operative_value(state, args[0]) || is_applicative_value(state, args[0])));
    Ok(())
}

/// `eval`: the applicative form of the core primitive — `(eval expr env)`
/// evaluates already-evaluated `expr` in already-evaluated `env`, the
/// mechanism every derived evaluation strategy (`$lambda`'s body, a REPL)
/// ultimately bottoms out in (spec §1 "ordinary evaluation is a derived
/// mechanism built on this primitive").
fn eval_applicative(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "eval")?;
    check_arity(state, &args, "eval", 2)?;
    if !matches!(args[1], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Environment(_))) {
        return state.throw(ErrorKind::Type, "eval: second argument must be an environment");
    }
    state.tail_eval(args[0], args[1]);
    Ok(())
}

/// `apply`: `(apply combiner arglist [env])` applies `combiner` to the
/// already-evaluated `arglist` without re-evaluating its elements —
/// unwraps down to the underlying operative (an applicative may itself
/// wrap another, spec §4.2) and tail-calls it directly, passing `env`
/// (defaulting to a fresh, empty environment) as the dynamic environment.
fn apply_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "apply")?;
    if args.len() < 2 || args.len() > 3 {
        return state.throw(ErrorKind::Arity, "apply: expected 2 or 3 arguments");
    }
    let arglist = args[1];
    let env = if args.len() == 3 {
        if !matches!(args[2], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Environment(_))) {
            return state.throw(ErrorKind::Type, "apply: third argument must be an environment");
        }
        args[2]
    } else {
        kernel_env::make_environment(state, Vec::new())?
    };

    let mut cur = args[0];
    loop {
        match cur {
            Value::Ref(id) => match state.heap.get(id) {
                ObjKind::Applicative(a) => cur = a.underlying,
                ObjKind::Operative(_) => break,
                _ => return state.throw(ErrorKind::Type, "apply: expected an applicative"),
            },
            _ => return state.throw(ErrorKind::Type, "apply: expected an applicative"),
        }
    }
    let (func, extra) = match cur {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Operative(op) => (op.func, op.extra.clone()),
            _ => unreachable!("loop above only breaks on Operative"),
        },
        _ => unreachable!("loop above only breaks on Operative"),
    };
    state.tail_call(func, extra, arglist, env);
    Ok(())
}

/// Walks a proper list front-to-back, reversing it — the finishing move
/// both `map`/`for-each` need since each step conses its new result onto
/// the front of what's accumulated so far.
fn reverse_built_list(state: &mut State, mut v: Value) -> KResult<Value> {
    let mut out = Value::Nil;
    while state.is_pair(v) {
        let car = state.car(v).expect("checked is_pair");
        out = state.cons(car, out)?;
        v = state.cdr(v).expect("checked is_pair");
    }
    Ok(out)
}

/// `(map f list1 list2 ...)`: applies `f` to the successive cars of each
/// list (stopping at the shortest), collecting results into a new list in
/// the original order. Each application is itself a proper tail call
/// (via `tail_eval`); only the bookkeeping between applications — not the
/// application itself — keeps this function from being a single
/// unbroken tail chain down to the last element.
/// Each list argument is first passed through the same cyclic-operand-safe
/// copy `kernel_eval::arglist::make_arg_ls` uses for operand evaluation
/// (spec §4.3): a cyclic list collapses to its distinct elements visited
/// exactly once, so `map`/`for-each` never loop forever over one, and an
/// improper list is rejected uniformly with the same error the evaluator
/// itself would give a malformed combination.
fn copy_distinct_elements(state: &mut State, list: Value) -> KResult<Value> {
    let (head, _tail) = kernel_eval::arglist::make_arg_ls(state, list)?;
    Ok(head)
}

fn map_fn(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "map")?;
    if args.len() < 2 {
        return state.throw(ErrorKind::Arity, "map: expected at least 2 arguments");
    }
    let mut lists = Vec::with_capacity(args.len() - 1);
    for l in &args[1..] {
        lists.push(copy_distinct_elements(state, *l)?);
    }
    map_step(state, args[0], lists, Value::Nil, denv)
}

fn map_step(state: &mut State, f: Value, lists: Vec<Value>, acc_rev: Value, denv: Value) -> KResult<()> {
    if lists.iter().any(|l| l.is_nil()) {
        let result = reverse_built_list(state, acc_rev)?;
        state.apply_cc(result);
        return Ok(());
    }
    let mut cars = Vec::with_capacity(lists.len());
    let mut cdrs = Vec::with_capacity(lists.len());
    for l in &lists {
        if !state.is_pair(*l) {
            return state.throw(ErrorKind::Type, "map: lists must be equal length");
        }
        cars.push(state.car(*l).expect("checked is_pair"));
        cdrs.push(state.cdr(*l).expect("checked is_pair"));
    }
    let mut call_items = vec![f];
    call_items.extend(cars);
    let form = state.list_from(&call_items)?;
    let n = cdrs.len();
    let mut xp = vec![f, denv, Value::Fixint(n as i64)];
    xp.extend(cdrs);
    xp.push(acc_rev);
    let cont = state.make_continuation(map_step_cont, xp)?;
    state.set_cc(cont);
    state.tail_eval(form, denv);
    Ok(())
}

fn map_step_cont(state: &mut State, xparams: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let f = xparams[0];
    let denv = xparams[1];
    let Value::Fixint(n) = xparams[2] else { unreachable!("count marker always a Fixint") };
    let n = n as usize;
    let cdrs: Vec<Value> = xparams[3..3 + n].to_vec();
    let acc_rev = xparams[3 + n];
    let new_acc = state.cons(obj, acc_rev)?;
    map_step(state, f, cdrs, new_acc, denv)
}

/// `(for-each f list1 list2 ...)`: like `map` but discards every result,
/// evaluating purely for effect, and itself evaluates to `#inert`.
fn for_each_fn(state: &mut State, _x: &[Value], obj: Value, denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "for-each")?;
    if args.len() < 2 {
        return state.throw(ErrorKind::Arity, "for-each: expected at least 2 arguments");
    }
    let mut lists = Vec::with_capacity(args.len() - 1);
    for l in &args[1..] {
        lists.push(copy_distinct_elements(state, *l)?);
    }
    for_each_step(state, args[0], lists, denv)
}

fn for_each_step(state: &mut State, f: Value, lists: Vec<Value>, denv: Value) -> KResult<()> {
    if lists.iter().any(|l| l.is_nil()) {
        state.apply_cc(Value::Inert);
        return Ok(());
    }
    let mut cars = Vec::with_capacity(lists.len());
    let mut cdrs = Vec::with_capacity(lists.len());
    for l in &lists {
        if !state.is_pair(*l) {
            return state.throw(ErrorKind::Type, "for-each: lists must be equal length");
        }
        cars.push(state.car(*l).expect("checked is_pair"));
        cdrs.push(state.cdr(*l).expect("checked is_pair"));
    }
    let mut call_items = vec![f];
    call_items.extend(cars);
    let form = state.list_from(&call_items)?;
    let n = cdrs.len();
    let mut xp = vec![f, denv, Value::Fixint(n as i64)];
    xp.extend(cdrs);
    let cont = state.make_continuation(for_each_step_cont, xp)?;
    state.set_cc(cont);
    state.tail_eval(form, denv);
    Ok(())
}

fn for_each_step_cont(state: &mut State, xparams: &[Value], _obj: Value, _denv: Value) -> KResult<()> {
    let f = xparams[0];
    let denv = xparams[1];
    let Value::Fixint(n) = xparams[2] else { unreachable!("count marker always a Fixint") };
    let n = n as usize;
    let cdrs: Vec<Value> = xparams[3..3 + n].to_vec();
    for_each_step(state, f, cdrs, denv)
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_operative(state, env, "$vau", vau_form)?;
    bind_operative(state, env, "$lambda", lambda_form)?;
    bind_operative(state, env, "$define!", define_form)?;
    bind_operative(state, env, "$set!", set_bang_form)?;
    bind_operative(state, env, "$if", if_form)?;
    bind_operative(state, env, "$sequence", sequence_form)?;
    bind_operative(state, env, "$quote", quote_form)?;
    bind_operative(state, env, "$cond", cond_form)?;
    bind_operative(state, env, "$and?", and_form)?;
    bind_operative(state, env, "$or?", or_form)?;
    bind_applicative(state, env, "wrap", wrap)?;
    bind_applicative(state, env, "unwrap", unwrap)?;
    bind_applicative(state, env, "operative?", operative_p)?;
    bind_applicative(state, env, "applicative?", applicative_p)?;
    bind_applicative(state, env, "combiner?", combiner_p)?;
    bind_applicative(state, env, "eval", eval_applicative)?;
    bind_applicative(state, env, "apply", apply_fn)?;
    bind_applicative(state, env, "map", map_fn)?;
    bind_applicative(state, env, "for-each", for_each_fn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    pub(super) fn test_state() -> State {
        State::new(GcConfig::default(), kernel_eval::eval_entry)
    }

    pub(super) fn ground_env(st: &mut State) -> Value {
        let env = kernel_env::make_environment(st, vec![]).unwrap();
        crate::install(st, env).unwrap();
        env
    }

    pub(super) fn run_text(st: &mut State, env: Value, text: &str) -> Value {
        let mut reader = kernel_syntax::Reader::new(st, text, "test");
        let form = reader.read().unwrap().expect("one datum");
        kernel_eval::run(st, form, env).unwrap()
    }

    #[test]
    fn sequence_returns_its_last_value_scenario_1() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "($sequence 1 2 3)");
        assert_eq!(result, Value::Fixint(3));
    }

    #[test]
    fn if_true_and_false_scenario_2() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        assert_eq!(run_text(&mut st, env, "($if #t 1 2)"), Value::Fixint(1));
    }

    #[test]
    fn if_non_boolean_test_errors_scenario_2() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let mut reader = kernel_syntax::Reader::new(&mut st, "($if 0 1 2)", "test");
        let form = reader.read().unwrap().unwrap();
        assert!(kernel_eval::run(&mut st, form, env).is_err());
    }

    #[test]
    fn define_with_a_ptree_destructures_scenario_3() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! (a b . c) (list 1 2 3 4))");
        let result = run_text(&mut st, env, "(list a b c)");
        let items = st.list_to_vec(result).unwrap();
        assert_eq!(items[0], Value::Fixint(1));
        assert_eq!(items[1], Value::Fixint(2));
        assert_eq!(st.list_to_vec(items[2]), Some(vec![Value::Fixint(3), Value::Fixint(4)]));
    }

    #[test]
    fn lambda_closes_over_its_definition_environment() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! add1 ($lambda (x) (+ x 1)))");
        let result = run_text(&mut st, env, "(add1 41)");
        assert_eq!(result, Value::Fixint(42));
    }

    #[test]
    fn cond_falls_through_to_the_matching_clause() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "($cond (#f 1) (#t 2) (#t 3))");
        assert_eq!(result, Value::Fixint(2));
    }

    #[test]
    fn vau_receives_operands_unevaluated() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        // A $vau operative that just quotes its operand tree back,
        // proving it never got evaluated (an unbound symbol would throw
        // if it had been).
        run_text(&mut st, env, "($define! peek ($vau (x) #ignore x))");
        let result = run_text(&mut st, env, "(peek unbound-symbol-name)");
        let sym_text = match result {
            Value::Ref(id) => match st.heap.get(id) {
                ObjKind::Symbol(s) => st.symbols.resolve(s.name).to_string(),
                _ => panic!("expected a symbol"),
            },
            _ => panic!("expected a symbol"),
        };
        assert_eq!(sym_text, "unbound-symbol-name");
    }

    #[test]
    fn map_applies_across_parallel_lists_in_order() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let result = run_text(&mut st, env, "(map + (list 1 2 3) (list 10 20 30))");
        let items = st.list_to_vec(result).unwrap();
        assert_eq!(items, vec![Value::Fixint(11), Value::Fixint(22), Value::Fixint(33)]);
    }

    #[test]
    fn for_each_over_a_cyclic_list_visits_each_distinct_pair_exactly_once_scenario_5() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        // 1 -> 2 -> 3 -> back to the first pair.
        let p3 = st.cons(Value::Fixint(3), Value::Nil).unwrap();
        let p2 = st.cons(Value::Fixint(2), p3).unwrap();
        let p1 = st.cons(Value::Fixint(1), p2).unwrap();
        st.set_cdr(p3, p1).unwrap();

        run_text(&mut st, env, "($define! count 0)");
        run_text(&mut st, env, "($define! bump ($lambda (x) ($set! count (+ count x))))");
        let for_each_sym = crate::util::intern_symbol(&mut st, "for-each").unwrap();
        let bump_sym = crate::util::intern_symbol(&mut st, "bump").unwrap();
        let for_each_val = kernel_env::lookup(&st, env, for_each_sym).unwrap();
        let bump_val = kernel_env::lookup(&st, env, bump_sym).unwrap();
        let form = st.list_from(&[for_each_val, bump_val, p1]).unwrap();
        kernel_eval::run(&mut st, form, env).unwrap();

        let count = run_text(&mut st, env, "count");
        assert_eq!(count, Value::Fixint(6));
    }

    #[test]
    fn for_each_rejects_lists_of_unequal_length() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        let mut reader = kernel_syntax::Reader::new(&mut st, "(for-each + (list 1 2) (list 1))", "test");
        let form = reader.read().unwrap().unwrap();
        assert!(kernel_eval::run(&mut st, form, env).is_err());
    }
}

/// Property-based coverage generalizing
/// `for_each_over_a_cyclic_list_visits_each_distinct_pair_exactly_once_scenario_5`
/// above across arbitrary lead and cycle lengths, instead of the single
/// lead-0/cycle-3 example.
#[cfg(test)]
mod proptests {
    use super::tests::{ground_env, run_text, test_state};
    use kernel_gc::Value;
    use quickcheck_macros::quickcheck;

    /// `lead` acyclic elements followed by a cycle of `cycle` elements
    /// looping back to the first cycle element (`cycle == 0`: a plain
    /// list). Elements are `1, 2, .., lead + cycle` so the expected sum
    /// is just the sum over that range.
    fn build_list(state: &mut kernel_gc::State, lead: usize, cycle: usize) -> Value {
        let total = lead + cycle;
        let pairs: Vec<Value> =
            (0..total).map(|i| state.cons(Value::Fixint(i as i64 + 1), Value::Nil).unwrap()).collect();
        for i in 0..total.saturating_sub(1) {
            state.set_cdr(pairs[i], pairs[i + 1]).unwrap();
        }
        if cycle > 0 {
            state.set_cdr(pairs[total - 1], pairs[lead]).unwrap();
        }
        pairs[0]
    }

    #[quickcheck]
    fn for_each_visits_every_distinct_cyclic_element_exactly_once(lead: u8, cycle: u8) -> bool {
        let lead = 1 + (lead % 8) as usize; // at least one element, so the list is never ()
        let cycle = (cycle % 6) as usize;
        let mut st = test_state();
        let env = ground_env(&mut st);
        let p1 = build_list(&mut st, lead, cycle);

        run_text(&mut st, env, "($define! count 0)");
        run_text(&mut st, env, "($define! bump ($lambda (x) ($set! count (+ count x))))");
        let for_each_sym = crate::util::intern_symbol(&mut st, "for-each").unwrap();
        let bump_sym = crate::util::intern_symbol(&mut st, "bump").unwrap();
        let for_each_val = kernel_env::lookup(&st, env, for_each_sym).unwrap();
        let bump_val = kernel_env::lookup(&st, env, bump_sym).unwrap();
        let form = st.list_from(&[for_each_val, bump_val, p1]).unwrap();
        if kernel_eval::run(&mut st, form, env).is_err() {
            return false;
        }

        let total = lead + cycle;
        let expected: i64 = (1..=total as i64).sum();
        run_text(&mut st, env, "count") == Value::Fixint(expected)
    }
}
