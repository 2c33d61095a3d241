//! The cyclic-operand-safe argument-evaluation machine (spec §4.3).
//!
//! klisp's `make_arg_ls` detects a revisited operand pair by stamping a
//! scratch "mark" slot on the pair header itself, then clearing every
//! mark it set (including on the error path) before returning. Rust
//! objects here have no such scratch field, and repurposing the
//! collector's own tri-color mark would race the tracer for no reason;
//! spec §4.1's own fallback — "an auxiliary object → label map keyed by
//! identity" — is exactly what an `FxHashMap<ObjId, Value>` gives us,
//! and it needs no explicit clearing: it's a local that drops when this
//! function returns, clearing itself on every exit path for free,
//! including `?`-propagated errors.

use rustc_hash::FxHashMap;

use kernel_gc::{ErrorKind, KResult, ObjId, State, Value};

/// Walks `operands`, copying each pair exactly once even if the list is
/// cyclic. Returns `(head, tail)`:
/// - `head` is the first pair of the copy (`Value::Nil` only if
///   `operands` itself was `()`).
/// - `tail` is `Value::Nil` for a proper list, or — for a cyclic input —
///   the already-copied pair that the copy's own last pair must
///   eventually point back to, once every element has been evaluated
///   (spec: "restores the cycle").
///
/// The copy returned here is itself a **plain, `Nil`-terminated list**:
/// restoring the cycle link is deferred to [`crate::eval_ls_cfn`]'s last
/// step, so this pass never has to walk a structure it is simultaneously
/// building into a cycle.
pub fn make_arg_ls(state: &mut State, operands: Value) -> KResult<(Value, Value)> {
    if operands.is_nil() {
        return Ok((Value::Nil, Value::Nil));
    }

    let mut marks: FxHashMap<ObjId, Value> = FxHashMap::default();
    let mut head: Option<Value> = None;
    let mut last_copy: Option<Value> = None;
    let mut tail = Value::Nil;
    let mut cur = operands;

    loop {
        if cur.is_nil() {
            break;
        }
        let id = match cur {
            Value::Ref(id) if state.is_pair(cur) => id,
            _ => return state.throw(ErrorKind::Type, "Not a list in applicative combination"),
        };
        if let Some(&existing) = marks.get(&id) {
            tail = existing;
            break;
        }
        let original_car = state.car(cur).expect("already checked is_pair");
        let new_pair = state.cons(original_car, Value::Nil)?;
        marks.insert(id, new_pair);
        match last_copy {
            Some(prev) => {
                state.set_cdr(prev, new_pair).expect("prev is a freshly-consed mutable pair");
            }
            None => head = Some(new_pair),
        }
        last_copy = Some(new_pair);
        cur = state.cdr(cur).expect("already checked is_pair");
    }

    Ok((head.unwrap_or(Value::Nil), tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn dummy_eval(_s: &mut State, _x: &[Value], _o: Value, _e: Value) -> KResult<()> {
        Ok(())
    }

    fn test_state() -> State {
        State::new(GcConfig::default(), dummy_eval)
    }

    #[test]
    fn copies_a_proper_list_preserving_shape() {
        let mut st = test_state();
        let ops = st.list_from(&[Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]).unwrap();
        let (head, tail) = make_arg_ls(&mut st, ops).unwrap();
        assert!(tail.is_nil());
        assert_eq!(st.list_to_vec(head), Some(vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]));
        // The copy is a distinct pair chain, not the same objects.
        assert_ne!(head, ops);
    }

    #[test]
    fn detects_a_cycle_and_reports_the_tail_to_restore() {
        let mut st = test_state();
        let p3 = st.cons(Value::Fixint(3), Value::Nil).unwrap();
        let p2 = st.cons(Value::Fixint(2), p3).unwrap();
        let p1 = st.cons(Value::Fixint(1), p2).unwrap();
        st.set_cdr(p3, p1).unwrap(); // 1 -> 2 -> 3 -> 1 ...
        let (head, tail) = make_arg_ls(&mut st, p1).unwrap();
        assert!(!tail.is_nil());
        // The copy itself is not yet cyclic: walking it hits Nil.
        assert_eq!(st.list_to_vec(head), Some(vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]));
    }

    #[test]
    fn rejects_an_improper_operand_list() {
        let mut st = test_state();
        let ops = st.cons(Value::Fixint(1), Value::Fixint(2)).unwrap();
        assert!(make_arg_ls(&mut st, ops).is_err());
    }
}
