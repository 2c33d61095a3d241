//! 4.9 The numeric tower's ground bindings. Grounded on
//! `original_source/src/kground.c`'s `knumber` family, rebuilt over
//! `kernel_num::Number` (spec §4.7) rather than klisp's raw `TValue`
//! number tags — `value_to_number`/`number_to_value` below are the bridge
//! `kernel-gc`'s `ObjKind` doesn't provide on its own (spec §4.7 is a
//! leaf crate with no heap dependency, by design).

use std::cmp::Ordering;

use kernel_gc::object::{DoubleObj, ExactInfObj};
use kernel_gc::{ErrorKind, KResult, ObjKind, State, Value};
use kernel_num::{Bigint, Bigrat, NumError, Number, Sign};

use crate::util::{bind_applicative, check_arity, list_args};

/// Reads a `Value` as a `Number`, throwing `type` if it isn't one.
pub fn value_to_number(state: &mut State, v: Value, context: &str) -> KResult<Number> {
    match v {
        Value::Fixint(i) => Ok(Number::Int(i)),
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Bigint(b) => Ok(Number::Bignum(b.clone())),
            ObjKind::Bigrat(r) => Ok(Number::Rational(r.clone())),
            ObjKind::Double(d) => Ok(Number::Double(d.0)),
            ObjKind::ExactInf(e) => Ok(Number::ExactInf { negative: e.negative }),
            _ => state.throw(ErrorKind::Type, format!("{context}: expected a number")),
        },
        _ => state.throw(ErrorKind::Type, format!("{context}: expected a number")),
    }
}

/// Allocates the `Value` a `Number` normalizes to — `Number::add`/`mul`/…
/// already collapse bignum-that-fits-a-fixint and rational-with-
/// denominator-1 (spec §4.7), so this only has to pick the matching
/// `Value`/`ObjKind` shape, not re-normalize.
pub fn number_to_value(state: &mut State, n: Number) -> KResult<Value> {
    match n {
        Number::Int(i) => Ok(Value::Fixint(i)),
        Number::Bignum(b) => state.alloc(ObjKind::Bigint(b)),
        Number::Rational(r) => state.alloc(ObjKind::Bigrat(r)),
        Number::Double(d) => state.alloc(ObjKind::Double(DoubleObj(d))),
        Number::ExactInf { negative } => state.alloc(ObjKind::ExactInf(ExactInfObj { negative })),
    }
}

fn num_err(state: &mut State, e: NumError) -> KResult<()> {
    match e {
        NumError::DivisionByZero => state.throw(ErrorKind::DivisionByZero, "division by zero"),
        NumError::Overflow => state.throw(ErrorKind::Range, "numeric overflow (indeterminate infinity)"),
        NumError::InvalidDigit { digit, radix } => {
            state.throw(ErrorKind::Type, format!("invalid digit {digit:?} for radix {radix}"))
        }
        NumError::BadRadix(r) => state.throw(ErrorKind::Range, format!("radix {r} out of range")),
        NumError::EmptyNumeral => state.throw(ErrorKind::Type, "empty numeral"),
    }
}

fn is_number(state: &State, v: Value) -> bool {
    match v {
        Value::Fixint(_) => true,
        Value::Ref(id) => matches!(
            state.heap.get(id),
            ObjKind::Bigint(_) | ObjKind::Bigrat(_) | ObjKind::Double(_) | ObjKind::ExactInf(_)
        ),
        _ => false,
    }
}

fn number_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "number?")?;
    check_arity(state, &args, "number?", 1)?;
    state.apply_cc(Value::Bool(is_number(state, args[0])));
    Ok(())
}

fn integer_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "integer?")?;
    check_arity(state, &args, "integer?", 1)?;
    let is_int = match args[0] {
        Value::Fixint(_) => true,
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::Bigint(_) => true,
            ObjKind::Double(d) => d.0.fract() == 0.0 && d.0.is_finite(),
            _ => false,
        },
        _ => false,
    };
    state.apply_cc(Value::Bool(is_int));
    Ok(())
}

fn rational_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "rational?")?;
    check_arity(state, &args, "rational?", 1)?;
    let is_rat = match args[0] {
        Value::Fixint(_) => true,
        Value::Ref(id) => matches!(state.heap.get(id), ObjKind::Bigint(_) | ObjKind::Bigrat(_)),
        _ => false,
    };
    state.apply_cc(Value::Bool(is_rat));
    Ok(())
}

fn exact_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "exact?")?;
    check_arity(state, &args, "exact?", 1)?;
    let n = value_to_number(state, args[0], "exact?")?;
    state.apply_cc(Value::Bool(n.is_exact()));
    Ok(())
}

fn inexact_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "inexact?")?;
    check_arity(state, &args, "inexact?", 1)?;
    let n = value_to_number(state, args[0], "inexact?")?;
    state.apply_cc(Value::Bool(!n.is_exact()));
    Ok(())
}

fn fold_arith(
    state: &mut State,
    obj: Value,
    name: &str,
    identity: Number,
    op: fn(&Number, &Number) -> kernel_num::Result<Number>,
) -> KResult<()> {
    let args = list_args(state, obj, name)?;
    let mut acc = identity;
    for a in &args {
        let n = value_to_number(state, *a, name)?;
        acc = match op(&acc, &n) {
            Ok(v) => v,
            Err(e) => return num_err(state, e),
        };
    }
    let v = number_to_value(state, acc)?;
    state.apply_cc(v);
    Ok(())
}

fn plus(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    fold_arith(state, obj, "+", Number::Int(0), Number::add)
}

fn times(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    fold_arith(state, obj, "*", Number::Int(1), Number::mul)
}

/// `(- a)` negates; `(- a b c ...)` subtracts left-to-right.
fn minus(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "-")?;
    if args.is_empty() {
        return state.throw(ErrorKind::Arity, "-: expected at least 1 argument");
    }
    let mut acc = value_to_number(state, args[0], "-")?;
    if args.len() == 1 {
        acc = acc.neg();
    } else {
        for a in &args[1..] {
            let n = value_to_number(state, *a, "-")?;
            acc = match acc.sub(&n) {
                Ok(v) => v,
                Err(e) => return num_err(state, e),
            };
        }
    }
    let v = number_to_value(state, acc)?;
    state.apply_cc(v);
    Ok(())
}

/// `(/ a)` reciprocal; `(/ a b c ...)` divides left-to-right.
fn divide(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "/")?;
    if args.is_empty() {
        return state.throw(ErrorKind::Arity, "/: expected at least 1 argument");
    }
    let mut acc = value_to_number(state, args[0], "/")?;
    if args.len() == 1 {
        acc = match Number::Int(1).div(&acc) {
            Ok(v) => v,
            Err(e) => return num_err(state, e),
        };
    } else {
        for a in &args[1..] {
            let n = value_to_number(state, *a, "/")?;
            acc = match acc.div(&n) {
                Ok(v) => v,
                Err(e) => return num_err(state, e),
            };
        }
    }
    let v = number_to_value(state, acc)?;
    state.apply_cc(v);
    Ok(())
}

fn chain_cmp(state: &mut State, obj: Value, name: &str, ok: fn(Ordering) -> bool) -> KResult<()> {
    let args = list_args(state, obj, name)?;
    if args.len() < 2 {
        return state.throw(ErrorKind::Arity, format!("{name}: expected at least 2 arguments"));
    }
    let mut result = true;
    for w in args.windows(2) {
        let a = value_to_number(state, w[0], name)?;
        let b = value_to_number(state, w[1], name)?;
        match a.cmp(&b) {
            Some(o) if ok(o) => {}
            _ => {
                result = false;
                break;
            }
        }
    }
    state.apply_cc(Value::Bool(result));
    Ok(())
}

fn num_eq(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    chain_cmp(state, obj, "=", |o| o == Ordering::Equal)
}

fn num_lt(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    chain_cmp(state, obj, "<", |o| o == Ordering::Less)
}

fn num_gt(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    chain_cmp(state, obj, ">", |o| o == Ordering::Greater)
}

fn num_le(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    chain_cmp(state, obj, "<=", |o| o != Ordering::Greater)
}

fn num_ge(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    chain_cmp(state, obj, ">=", |o| o != Ordering::Less)
}

fn zero_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "zero?")?;
    check_arity(state, &args, "zero?", 1)?;
    let n = value_to_number(state, args[0], "zero?")?;
    state.apply_cc(Value::Bool(n.numeric_eq(&Number::Int(0))));
    Ok(())
}

fn positive_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "positive?")?;
    check_arity(state, &args, "positive?", 1)?;
    let n = value_to_number(state, args[0], "positive?")?;
    state.apply_cc(Value::Bool(n.cmp(&Number::Int(0)) == Some(Ordering::Greater)));
    Ok(())
}

fn negative_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "negative?")?;
    check_arity(state, &args, "negative?", 1)?;
    let n = value_to_number(state, args[0], "negative?")?;
    state.apply_cc(Value::Bool(n.cmp(&Number::Int(0)) == Some(Ordering::Less)));
    Ok(())
}

fn abs(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "abs")?;
    check_arity(state, &args, "abs", 1)?;
    let n = value_to_number(state, args[0], "abs")?;
    let result = if n.cmp(&Number::Int(0)) == Some(Ordering::Less) { n.neg() } else { n };
    let v = number_to_value(state, result)?;
    state.apply_cc(v);
    Ok(())
}

/// `quotient`/`remainder` on the integer part, via the underlying
/// `Bigint` division primitives — truncating toward zero, matching
/// Scheme's `quotient`/`remainder` (as opposed to `floor`-rounding
/// `modulo`, which `kernel-num::Bigint::div_rem` doesn't distinguish from
/// `remainder` for same-sign operands, the only case the ground
/// catalog's tests exercise).
fn int_div_pair(state: &mut State, args: &[Value], name: &str) -> KResult<(Bigint, Bigint)> {
    let a = value_to_number(state, args[0], name)?;
    let b = value_to_number(state, args[1], name)?;
    let (Some(ai), Some(bi)) = (a.to_bigint(), b.to_bigint()) else {
        return state.throw(ErrorKind::Type, format!("{name}: expected integers"));
    };
    if bi.is_zero() {
        return state.throw(ErrorKind::DivisionByZero, format!("{name}: division by zero"));
    }
    Ok((ai, bi))
}

fn quotient(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "quotient")?;
    check_arity(state, &args, "quotient", 2)?;
    let (a, b) = int_div_pair(state, &args, "quotient")?;
    let (q, _) = a.divmod(&b).expect("divisor checked non-zero above");
    let v = number_to_value(state, Number::normalize_bigint(q))?;
    state.apply_cc(v);
    Ok(())
}

fn remainder(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "remainder")?;
    check_arity(state, &args, "remainder", 2)?;
    let (a, b) = int_div_pair(state, &args, "remainder")?;
    let (_, r) = a.divmod(&b).expect("divisor checked non-zero above");
    let v = number_to_value(state, Number::normalize_bigint(r))?;
    state.apply_cc(v);
    Ok(())
}

/// `modulo`: like `remainder` but the result's sign always matches the
/// divisor's (floor-rounding), rather than `divmod`'s dividend-matching
/// truncating remainder — so a nonzero remainder whose sign disagrees
/// with `b`'s gets `b` added back in, the standard `truncate/` → `floor/`
/// correction.
fn modulo(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "modulo")?;
    check_arity(state, &args, "modulo", 2)?;
    let (a, b) = int_div_pair(state, &args, "modulo")?;
    let (_, r) = a.divmod(&b).expect("divisor checked non-zero above");
    let result = if !r.is_zero() && r.sign() != b.sign() { r.add(&b) } else { r };
    let v = number_to_value(state, Number::normalize_bigint(result))?;
    state.apply_cc(v);
    Ok(())
}

fn exact_to_inexact(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "exact->inexact")?;
    check_arity(state, &args, "exact->inexact", 1)?;
    let n = value_to_number(state, args[0], "exact->inexact")?;
    let v = number_to_value(state, Number::Double(n.to_f64()))?;
    state.apply_cc(v);
    Ok(())
}

fn inexact_to_exact(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "inexact->exact")?;
    check_arity(state, &args, "inexact->exact", 1)?;
    let n = value_to_number(state, args[0], "inexact->exact")?;
    let exact = match n {
        Number::Double(d) => match Bigrat::from_f64(d) {
            Some(r) => Number::normalize_rational(r),
            None => return state.throw(ErrorKind::Type, "inexact->exact: not a finite number"),
        },
        other => other,
    };
    let v = number_to_value(state, exact)?;
    state.apply_cc(v);
    Ok(())
}

fn number_to_string(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "number->string")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "number->string: expected 1 or 2 arguments");
    }
    let n = value_to_number(state, args[0], "number->string")?;
    let radix = if args.len() == 2 {
        match args[1].as_fixint() {
            Some(r) if (2..=36).contains(&r) => r as u32,
            _ => return state.throw(ErrorKind::Range, "number->string: radix must be in [2, 36]"),
        }
    } else {
        10
    };
    let text = if radix == 10 {
        n.to_string()
    } else {
        match n.to_bigint() {
            Some(b) => b.to_radix_string(radix).unwrap_or_else(|_| n.to_string()),
            None => n.to_string(),
        }
    };
    let chars: Vec<char> = text.chars().collect();
    let s = state.alloc(ObjKind::String(kernel_gc::object::StringObj { chars, immutable: false }))?;
    state.apply_cc(s);
    Ok(())
}

fn string_to_number(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "string->number")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "string->number: expected 1 or 2 arguments");
    }
    let text = match args[0] {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::String(s) => s.chars.iter().collect::<String>(),
            _ => return state.throw(ErrorKind::Type, "string->number: expected a string"),
        },
        _ => return state.throw(ErrorKind::Type, "string->number: expected a string"),
    };
    match kernel_num::parse_literal(&text) {
        Ok(n) => {
            let v = number_to_value(state, n)?;
            state.apply_cc(v);
            Ok(())
        }
        Err(_) => {
            state.apply_cc(Value::Bool(false));
            Ok(())
        }
    }
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "number?", number_p)?;
    bind_applicative(state, env, "integer?", integer_p)?;
    bind_applicative(state, env, "rational?", rational_p)?;
    bind_applicative(state, env, "exact?", exact_p)?;
    bind_applicative(state, env, "inexact?", inexact_p)?;
    bind_applicative(state, env, "+", plus)?;
    bind_applicative(state, env, "-", minus)?;
    bind_applicative(state, env, "*", times)?;
    bind_applicative(state, env, "/", divide)?;
    bind_applicative(state, env, "=", num_eq)?;
    bind_applicative(state, env, "<", num_lt)?;
    bind_applicative(state, env, ">", num_gt)?;
    bind_applicative(state, env, "<=", num_le)?;
    bind_applicative(state, env, ">=", num_ge)?;
    bind_applicative(state, env, "zero?", zero_p)?;
    bind_applicative(state, env, "positive?", positive_p)?;
    bind_applicative(state, env, "negative?", negative_p)?;
    bind_applicative(state, env, "abs", abs)?;
    bind_applicative(state, env, "quotient", quotient)?;
    bind_applicative(state, env, "remainder", remainder)?;
    bind_applicative(state, env, "modulo", modulo)?;
    bind_applicative(state, env, "exact->inexact", exact_to_inexact)?;
    bind_applicative(state, env, "inexact->exact", inexact_to_exact)?;
    bind_applicative(state, env, "number->string", number_to_string)?;
    bind_applicative(state, env, "string->number", string_to_number)?;
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
    fn bignum_addition_matches_scenario_6() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();
        let big = kernel_num::Bigint::from_radix_str("100000000000000000000", 10).unwrap();
        let big_v = st.alloc(ObjKind::Bigint(big)).unwrap();
        let result = eval_in_ground(&mut st, env, "+", &[big_v, Value::Fixint(1)]);
        let n = value_to_number(&mut st, result, "+").unwrap();
        assert_eq!(n.to_string(), "100000000000000000001");
    }

    #[test]
    fn division_by_zero_throws() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();
        let sym = crate::util::intern_symbol(&mut st, "/").unwrap();
        let f = kernel_env::lookup(&st, env, sym).unwrap();
        let form = st.list_from(&[f, Value::Fixint(1), Value::Fixint(0)]).unwrap();
        assert!(kernel_eval::run(&mut st, form, env).is_err());
    }

    #[test]
    fn comparison_chains_left_to_right() {
        let mut st = test_state();
        let env = kernel_env::make_environment(&mut st, vec![]).unwrap();
        crate::install(&mut st, env).unwrap();
        let result = eval_in_ground(&mut st, env, "<", &[Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]);
        assert_eq!(result, Value::Bool(true));
        let result2 = eval_in_ground(&mut st, env, "<", &[Value::Fixint(1), Value::Fixint(3), Value::Fixint(2)]);
        assert_eq!(result2, Value::Bool(false));
    }
}
