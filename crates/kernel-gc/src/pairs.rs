//! Pair construction and mutation helpers layered onto [`State`]. Kept
//! separate from `object.rs` because these are the operations that must
//! honor the GC write barrier (spec §4.1) and the list-shape invariants
//! the evaluator and ground environment lean on constantly.

use crate::object::{ObjKind, Pair};
use crate::state::{KResult, State};
use crate::value::Value;

impl State {
    pub fn cons(&mut self, car: Value, cdr: Value) -> KResult<Value> {
        self.alloc(ObjKind::Pair(Pair { car, cdr, si: None, mutable: true }))
    }

    /// klisp's `kcons` for list literals read back from the writer/reader
    /// produces immutable pairs by default; mutation is only legal
    /// through `set-car!`/`set-cdr!` on pairs built with [`State::cons`].
    pub fn cons_immutable(&mut self, car: Value, cdr: Value) -> KResult<Value> {
        self.alloc(ObjKind::Pair(Pair { car, cdr, si: None, mutable: false }))
    }

    pub fn is_pair(&self, v: Value) -> bool {
        matches!(v, Value::Ref(id) if matches!(self.heap.get(id), ObjKind::Pair(_)))
    }

    pub fn car(&self, v: Value) -> Option<Value> {
        match v {
            Value::Ref(id) => match self.heap.get(id) {
                ObjKind::Pair(p) => Some(p.car),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn cdr(&self, v: Value) -> Option<Value> {
        match v {
            Value::Ref(id) => match self.heap.get(id) {
                ObjKind::Pair(p) => Some(p.cdr),
                _ => None,
            },
            _ => None,
        }
    }

    /// `set-car!`, with the write barrier: mutating a pair the collector
    /// has already blackened must re-gray it so the new child isn't lost
    /// (spec §4.1).
    pub fn set_car(&mut self, v: Value, new_car: Value) -> Result<(), ()> {
        let id = v.as_ref_id().ok_or(())?;
        match self.heap.get_mut(id) {
            ObjKind::Pair(p) if p.mutable => {
                p.car = new_car;
                self.heap.write_barrier(id);
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub fn set_cdr(&mut self, v: Value, new_cdr: Value) -> Result<(), ()> {
        let id = v.as_ref_id().ok_or(())?;
        match self.heap.get_mut(id) {
            ObjKind::Pair(p) if p.mutable => {
                p.cdr = new_cdr;
                self.heap.write_barrier(id);
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub fn is_mutable_pair(&self, v: Value) -> bool {
        matches!(v, Value::Ref(id) if matches!(self.heap.get(id), ObjKind::Pair(p) if p.mutable))
    }

    /// Builds a proper list from a Rust slice, `Value::Nil`-terminated.
    pub fn list_from(&mut self, items: &[Value]) -> KResult<Value> {
        let mut tail = Value::Nil;
        for &item in items.iter().rev() {
            tail = self.cons(item, tail)?;
        }
        Ok(tail)
    }

    /// Collects a *finite, proper* list into a `Vec`; `None` if `v` is
    /// improper or cyclic (callers that must tolerate cycles use the
    /// argument-evaluation machine in `kernel-eval` instead, never this).
    pub fn list_to_vec(&self, mut v: Value) -> Option<Vec<Value>> {
        let mut out = Vec::new();
        // Floyd's cycle detection: `fast` advances two cells per `slow`'s
        // one, so a genuine cycle makes them collide within one traversal.
        let mut fast = v;
        loop {
            if v.is_nil() {
                return Some(out);
            }
            out.push(self.car(v)?);
            v = self.cdr(v)?;
            if v.is_nil() {
                return Some(out);
            }
            out.push(self.car(v)?);
            v = self.cdr(v)?;

            if fast.is_nil() {
                continue;
            }
            fast = self.cdr(fast)?;
            if fast.is_nil() {
                continue;
            }
            fast = self.cdr(fast)?;
            if let (Value::Ref(a), Value::Ref(b)) = (v, fast) {
                if a == b {
                    return None; // cyclic
                }
            }
        }
    }

    pub fn is_list(&self, v: Value) -> bool {
        self.list_to_vec(v).is_some()
    }
}
