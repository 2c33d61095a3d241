//! `TValue`: the uniform, dynamically-typed value every combiner sees
//! (spec §3.1). Immediates are `Copy` and live entirely in this enum;
//! everything else is a [`Ref`](Value::Ref) handle into a [`Heap`](crate::heap::Heap)
//! slot, resolved through the heap rather than through a raw pointer so the
//! collector can relocate-free sweep without invalidating values the
//! mutator still holds.

use kernel_util::Symbol as InternedName;

/// A fixnum is the native machine word; arithmetic that overflows it
/// promotes to a heap `Bignum` (spec §4.7). We use `i64` rather than a
/// 32-bit fixint bound since that's the native width on every target this
/// interpreter runs on, and the evaluator's own correctness never depends
/// on the bound being exactly 32 bits, only on *a* bound existing.
pub type Fixint = i64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// The trampoline's registers need a placeholder before the first
    /// `tail_eval`/`tail_call`; `#inert` (Kernel's own "nothing interesting
    /// happened" value) reads more honestly here than picking some other
    /// variant to be the arbitrary zero case.
    #[default]
    Inert,
    Fixint(Fixint),
    Char(char),
    Bool(bool),
    Nil,
    Ignore,
    Eof,
    /// A handle into the heap's object table. Two `Ref`s are `eq?` iff
    /// their ids are equal: identity, not structural, comparison.
    Ref(ObjId),
}

impl Value {
    pub const fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub const fn is_ref(self) -> bool {
        matches!(self, Value::Ref(_))
    }

    pub fn as_ref_id(self) -> Option<ObjId> {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_fixint(self) -> Option<Fixint> {
        match self {
            Value::Fixint(i) => Some(i),
            _ => None,
        }
    }
}

/// Index into [`Heap`](crate::heap::Heap)'s slot table plus a generation
/// counter. The generation guards against a freshly-allocated object at a
/// recycled slot being mistaken, by a stale handle, for the object that
/// used to live there; in a single-threaded, non-relocating collector the
/// index alone would work, but `eq?` on a use-after-free handle should
/// fail loudly in debug builds rather than silently alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl ObjId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        ObjId { index, generation }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Pending symbol lookups and `write`'s `#n=` accounting both need a
/// name a `Value` can carry without round-tripping through the heap;
/// re-exported so downstream crates don't also depend on `kernel-util`
/// just to spell the interner's handle type.
pub type Symbol = InternedName;
