//! `make-environment`/lookup/`$define!`/`$set!` (spec §4.5).
//!
//! Lookup is depth-first, left-to-right across parents, with a visited-set
//! guard: the spec prevents parent cycles by construction (environments
//! are built only from already-existing envs, and nothing mutates
//! `parents` after the fact), but a guard costs one `HashSet` and removes
//! any chance of this code looping forever if that invariant is ever
//! violated by a future combiner.

use std::collections::HashSet;

use kernel_gc::{ErrorKind, KResult, ObjId, ObjKind, State, Symbol, Value};

/// `make-environment`: parents must already be environment objects: this
/// function doesn't check that (callers — the `$let`/`make-environment`
/// ground bindings — do, since only they know the right error message),
/// it just builds the record.
pub fn make_environment(state: &mut State, parents: Vec<Value>) -> KResult<Value> {
    state.alloc(ObjKind::Environment(kernel_gc::object::Environment::new(parents)))
}

fn env_id(state: &mut State, env: Value, what: &str) -> KResult<ObjId> {
    match env.as_ref_id() {
        Some(id) if matches!(state.heap.get(id), ObjKind::Environment(_)) => Ok(id),
        _ => state.throw(ErrorKind::Type, format!("{what}: expected an environment")),
    }
}

/// Depth-first, left-to-right binding search (spec §4.5). Returns the
/// bound value, or `None` if `sym` is unbound anywhere in the chain.
pub fn lookup(state: &State, env: Value, sym: Symbol) -> Option<Value> {
    let mut visited = HashSet::new();
    lookup_rec(state, env, sym, &mut visited)
}

fn lookup_rec(state: &State, env: Value, sym: Symbol, visited: &mut HashSet<ObjId>) -> Option<Value> {
    let id = env.as_ref_id()?;
    if !visited.insert(id) {
        return None;
    }
    match state.heap.get(id) {
        ObjKind::Environment(e) => {
            if let Some(&v) = e.bindings.get(&sym) {
                return Some(v);
            }
            for &parent in &e.parents {
                if let Some(v) = lookup_rec(state, parent, sym, visited) {
                    return Some(v);
                }
            }
            None
        }
        _ => None,
    }
}

fn find_owner(state: &State, env: Value, sym: Symbol, visited: &mut HashSet<ObjId>) -> Option<ObjId> {
    let id = env.as_ref_id()?;
    if !visited.insert(id) {
        return None;
    }
    match state.heap.get(id) {
        ObjKind::Environment(e) => {
            if e.bindings.contains_key(&sym) {
                return Some(id);
            }
            for &parent in &e.parents {
                if let Some(owner) = find_owner(state, parent, sym, visited) {
                    return Some(owner);
                }
            }
            None
        }
        _ => None,
    }
}

/// `$define!`'s primitive effect on a single symbol: always binds in
/// `env`'s own frame, shadowing (not erroring on) an existing binding
/// there or in a parent, matching klisp's `kadd_binding`.
pub fn define_variable(state: &mut State, env: Value, sym: Symbol, value: Value) -> KResult<()> {
    let id = env_id(state, env, "$define!")?;
    match state.heap.get_mut(id) {
        ObjKind::Environment(e) => {
            e.bindings.insert(sym, value);
        }
        _ => unreachable!("env_id already checked this is an Environment"),
    }
    state.heap.write_barrier(id);
    Ok(())
}

/// `$set!`'s primitive effect: mutate the frame that already binds `sym`,
/// searching depth-first left-to-right exactly like `lookup`. Throws
/// `unbound` if no frame in the chain binds it (klisp's `kenvironment.c`
/// `kset_binding` does the same).
pub fn set_variable(state: &mut State, env: Value, sym: Symbol, value: Value) -> KResult<()> {
    env_id(state, env, "$set!")?;
    let mut visited = HashSet::new();
    match find_owner(state, env, sym, &mut visited) {
        Some(owner) => {
            match state.heap.get_mut(owner) {
                ObjKind::Environment(e) => {
                    e.bindings.insert(sym, value);
                }
                _ => unreachable!(),
            }
            state.heap.write_barrier(owner);
            Ok(())
        }
        None => {
            let name = state.symbols.resolve(sym).to_string();
            state.throw(ErrorKind::Unbound, format!("unbound symbol: {name}"))
        }
    }
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

    fn sym(state: &mut State, name: &str) -> Symbol {
        let v = state.symbols.intern(&mut state.heap, name).unwrap();
        match state.heap.get(v.as_ref_id().unwrap()) {
            ObjKind::Symbol(s) => s.name,
            _ => unreachable!(),
        }
    }

    #[test]
    fn a_child_binding_shadows_its_parent() {
        let mut st = test_state();
        let x = sym(&mut st, "x");
        let parent = make_environment(&mut st, vec![]).unwrap();
        define_variable(&mut st, parent, x, Value::Fixint(1)).unwrap();
        let child = make_environment(&mut st, vec![parent]).unwrap();
        define_variable(&mut st, child, x, Value::Fixint(2)).unwrap();
        assert_eq!(lookup(&st, child, x), Some(Value::Fixint(2)));
        assert_eq!(lookup(&st, parent, x), Some(Value::Fixint(1)));
    }

    #[test]
    fn lookup_falls_through_to_an_unshadowed_parent() {
        let mut st = test_state();
        let x = sym(&mut st, "x");
        let parent = make_environment(&mut st, vec![]).unwrap();
        define_variable(&mut st, parent, x, Value::Fixint(7)).unwrap();
        let child = make_environment(&mut st, vec![parent]).unwrap();
        assert_eq!(lookup(&st, child, x), Some(Value::Fixint(7)));
    }

    #[test]
    fn set_on_an_unbound_symbol_throws() {
        let mut st = test_state();
        let x = sym(&mut st, "x");
        let env = make_environment(&mut st, vec![]).unwrap();
        assert!(set_variable(&mut st, env, x, Value::Fixint(1)).is_err());
    }

    #[test]
    fn set_mutates_the_frame_that_owns_the_binding() {
        let mut st = test_state();
        let x = sym(&mut st, "x");
        let parent = make_environment(&mut st, vec![]).unwrap();
        define_variable(&mut st, parent, x, Value::Fixint(1)).unwrap();
        let child = make_environment(&mut st, vec![parent]).unwrap();
        set_variable(&mut st, child, x, Value::Fixint(9)).unwrap();
        assert_eq!(lookup(&st, parent, x), Some(Value::Fixint(9)));
    }

    #[test]
    fn left_to_right_parent_search_prefers_the_first_parent() {
        let mut st = test_state();
        let x = sym(&mut st, "x");
        let p1 = make_environment(&mut st, vec![]).unwrap();
        define_variable(&mut st, p1, x, Value::Fixint(1)).unwrap();
        let p2 = make_environment(&mut st, vec![]).unwrap();
        define_variable(&mut st, p2, x, Value::Fixint(2)).unwrap();
        let child = make_environment(&mut st, vec![p1, p2]).unwrap();
        assert_eq!(lookup(&st, child, x), Some(Value::Fixint(1)));
    }
}
