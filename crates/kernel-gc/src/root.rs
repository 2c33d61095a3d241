//! The two root-stack flavors of spec §4.1, unified into one stack-
//! disciplined API.
//!
//! klisp distinguishes "value root stack" (push a `TValue`, the push site
//! owns exactly that value for its lifetime) from "variable root stack"
//! (push a *pointer to* a local, so a later reassignment of the local is
//! visible to the tracer without an extra push/pop). In a non-relocating
//! collector that distinction is purely a precision optimization — a
//! variable whose root entry still holds the old value just keeps that
//! old object alive a little longer than strictly necessary, it is never
//! unsound. We fold both into a single `Root` handle with a `set` method:
//! callers that only need "keep this alive" never call `set`; callers
//! that track a reassigned local call `set` exactly where klisp would
//! have written through the pointer. This is recorded as a deliberate
//! simplification in DESIGN.md rather than carrying two parallel stacks
//! for a distinction that cannot affect correctness here.

use crate::value::Value;

#[derive(Debug, Default)]
pub struct RootStack {
    values: Vec<Value>,
}

/// A handle into the root stack. Must be popped in strict LIFO order —
/// `RootStack::pop` panics otherwise, the same "push must be matched by
/// pop before returning to the caller" discipline spec §4.1 and §5
/// mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Root(usize);

impl RootStack {
    pub fn new() -> Self {
        RootStack { values: Vec::new() }
    }

    pub fn push(&mut self, v: Value) -> Root {
        self.values.push(v);
        Root(self.values.len() - 1)
    }

    pub fn get(&self, root: Root) -> Value {
        self.values[root.0]
    }

    pub fn set(&mut self, root: Root, v: Value) {
        self.values[root.0] = v;
    }

    pub fn pop(&mut self, root: Root) {
        assert_eq!(root.0, self.values.len() - 1, "root stack popped out of order");
        self.values.pop();
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Truncates back to a previously observed length. Used to restore
    /// the root stack to a scheduler-entry snapshot after an error
    /// long-jumps past whatever intervening pushes never got to pop
    /// (spec §5, "Long-jump discipline").
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }
}

/// RAII guard pairing a push with its pop. Most call sites should prefer
/// this over raw `push`/`pop` so an early `?` return can't leave the
/// stack unbalanced.
pub struct Guard<'a> {
    stack: &'a mut RootStack,
    root: Root,
}

impl<'a> Guard<'a> {
    pub fn new(stack: &'a mut RootStack, v: Value) -> Self {
        let root = stack.push(v);
        Guard { stack, root }
    }

    pub fn get(&self) -> Value {
        self.stack.get(self.root)
    }

    pub fn set(&mut self, v: Value) {
        self.stack.set(self.root, v);
    }
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        self.stack.pop(self.root);
    }
}
