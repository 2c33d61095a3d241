//! `State`: the single per-interpreter struct klisp calls `klisp_State`
//! (see `original_source/src/kstate.h`) — heap, root stacks, the
//! trampoline's "next" registers, the current continuation, and the
//! symbol table all live on one owner because spec §5 makes that owner
//! single-threaded and serial by construction. Splitting it across crates
//! the way `kstate.h` splits nothing would recreate the exact dependency
//! cycle object.rs's doc comment explains away: `kernel-eval` needs to
//! read/write these fields, but the *object model* (`Continuation`,
//! `Operative`) storing `NativeFn`s that take `&mut State` has to see the
//! same type. So `State` is defined once, here, at the bottom of the
//! dependency graph, and every crate above hangs its logic off it.

use crate::config::GcConfig;
use crate::error::GcError;
use crate::heap::Heap;
use crate::object::{Continuation, ErrorKind, ErrorObj, NativeFn, ObjKind, Operative};
use crate::root::RootStack;
use crate::source_info::SourceInfo;
use crate::symbols::SymbolInterner;
use crate::value::Value;

/// The error path: a `NativeFn` that fails returns `Err(Unwind(err_value))`
/// where `err_value` is a `Value::Ref` to an already-constructed
/// `ErrorObj`. Propagating it with `?` through ordinary Rust call frames
/// *is* klisp's longjmp-to-scheduler — the trampoline's `run` loop
/// (`kernel-eval::trampoline`) is the only place that catches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unwind(pub Value);

pub type KResult<T> = Result<T, Unwind>;

/// The trampoline's dispatch registers (spec §4.2). The scheduler reads
/// these, clears them, and invokes `func`; any function that wants to
/// "return" or tail-call stores a fresh tuple here and returns instead of
/// recursing, which is what makes tail calls proper.
#[derive(Default)]
pub struct NextRegisters {
    pub func: Option<NativeFn>,
    pub value: Value,
    pub env: Value,
    pub xparams: Vec<Value>,
}

pub struct State {
    pub heap: Heap,
    pub roots: RootStack,
    pub symbols: SymbolInterner,
    /// The active continuation chain, a `Value::Ref` to a `Continuation`
    /// object or `Value::Inert` once the chain is exhausted (the
    /// trampoline's halt signal).
    pub curr_cont: Value,
    /// Installed once by `kernel-ground::install`; `Value::Inert` before
    /// that point.
    pub ground_env: Value,
    pub next: NextRegisters,
    /// The native entry point for ordinary `eval` (registered by
    /// `kernel-eval`, since that crate — not this one — knows what
    /// evaluating a pair or symbol means). `tail_eval` dispatches here.
    eval_entry: NativeFn,
}

impl State {
    pub fn new(config: GcConfig, eval_entry: NativeFn) -> Self {
        State {
            heap: Heap::new(config),
            roots: RootStack::new(),
            symbols: SymbolInterner::new(),
            curr_cont: Value::Inert,
            ground_env: Value::Inert,
            next: NextRegisters::default(),
            eval_entry,
        }
    }

    /// Allocates, stepping the collector first if the mutator has
    /// allocated past the configured threshold (spec §4.1). Any `Value`s
    /// the new object's trace would need to reach must already be
    /// reachable from a root — callers root operands before calling this,
    /// the way every `krooted_tvs_push` call in klisp precedes a `kcons`.
    pub fn alloc(&mut self, kind: ObjKind) -> KResult<Value> {
        if self.heap.should_step() {
            if self.heap.phase_is_idle() {
                let roots = self.gc_roots();
                self.heap.start_cycle(&roots);
            }
            self.heap.step();
        }
        self.heap.alloc(kind).map_err(|GcError::OutOfMemory { requested, limit }| {
            // Constructing the error object is itself an allocation; if the
            // heap is truly exhausted this falls back to a sentinel so the
            // interpreter can still report *something* instead of panicking.
            let _ = (requested, limit);
            Unwind(Value::Inert)
        })
    }

    fn gc_roots(&self) -> Vec<Value> {
        let mut roots: Vec<Value> = self.roots.iter().collect();
        roots.push(self.curr_cont);
        roots.push(self.ground_env);
        roots.push(self.next.value);
        roots.push(self.next.env);
        roots.extend(self.next.xparams.iter().copied());
        roots.extend(self.symbols.roots());
        roots
    }

    /// Forces a full collection cycle to completion (the `(gc)` ground
    /// binding, and test harnesses that want a synchronous sweep).
    pub fn collect_now(&mut self) {
        let roots = self.gc_roots();
        self.heap.collect(&roots);
    }

    // -- Trampoline primitives (spec §4.2) --------------------------------

    pub fn get_cc(&self) -> Value {
        self.curr_cont
    }

    pub fn set_cc(&mut self, cont: Value) {
        self.curr_cont = cont;
    }

    /// `ktail_eval`: schedule `expr` to be evaluated in `env` as the next
    /// trampoline step.
    pub fn tail_eval(&mut self, expr: Value, env: Value) {
        self.next = NextRegisters { func: Some(self.eval_entry), value: expr, env, xparams: Vec::new() };
    }

    /// `ktail_call`: schedule `combiner_fn` (an operative's or
    /// continuation's native body) to run next with `xparams`/`operands`/
    /// `env` already in place.
    pub fn tail_call(&mut self, combiner_fn: NativeFn, xparams: Vec<Value>, operands: Value, env: Value) {
        self.next = NextRegisters { func: Some(combiner_fn), value: operands, env, xparams };
    }

    /// `kapply_cc`: pop the current continuation and schedule its body to
    /// resume with `value`. Once the chain is exhausted (`curr_cont`
    /// isn't a `Continuation` object), this is the final result: `next
    /// .func` becomes `None`, which the scheduler reads as "halt".
    pub fn apply_cc(&mut self, value: Value) {
        let cont = match self.curr_cont {
            Value::Ref(id) => match self.heap.get(id) {
                ObjKind::Continuation(c) => Some((c.parent, c.func, c.extra.clone())),
                _ => None,
            },
            _ => None,
        };
        match cont {
            Some((parent, func, extra)) => {
                self.curr_cont = parent.unwrap_or(Value::Inert);
                self.next = NextRegisters { func: Some(func), value, env: Value::Inert, xparams: extra };
            }
            None => {
                self.next = NextRegisters { func: None, value, env: Value::Inert, xparams: Vec::new() };
            }
        }
    }

    /// `kmake_continuation`: allocate a frame chained onto `parent`
    /// (defaulting to the current continuation, the common case).
    pub fn make_continuation(&mut self, func: NativeFn, extra: Vec<Value>) -> KResult<Value> {
        let parent = self.curr_cont;
        self.alloc(ObjKind::Continuation(Continuation {
            parent: Some(parent),
            func,
            extra,
            name: None,
            si: None,
            bool_check: false,
        }))
    }

    pub fn mark_bool_check(&mut self, cont: Value) {
        if let Value::Ref(id) = cont {
            if let ObjKind::Continuation(c) = self.heap.get_mut(id) {
                c.bool_check = true;
            }
        }
    }

    pub fn make_operative(&mut self, func: NativeFn, extra: Vec<Value>) -> KResult<Value> {
        self.alloc(ObjKind::Operative(Operative { func, extra, name: None, si: None }))
    }

    // -- Error path (spec §7) ---------------------------------------------

    /// Constructs an error object capturing the current continuation and
    /// returns `Err(Unwind(..))`, i.e. *throws* rather than allocating a
    /// value to inspect. Every `NativeFn` that can fail ends failing paths
    /// with `return state.throw(..)`.
    pub fn throw<T>(&mut self, kind: ErrorKind, message: impl Into<String>) -> KResult<T> {
        self.throw_with_irritants(kind, message, Value::Nil)
    }

    pub fn throw_with_irritants<T>(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        irritants: Value,
    ) -> KResult<T> {
        let continuation = self.curr_cont;
        let err = self.alloc(ObjKind::Error(ErrorObj {
            kind,
            message: message.into(),
            irritants,
            continuation,
            si: None,
        }))?;
        Err(Unwind(err))
    }

    pub fn throw_at<T>(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        si: SourceInfo,
    ) -> KResult<T> {
        let continuation = self.curr_cont;
        let err = self.alloc(ObjKind::Error(ErrorObj {
            kind,
            message: message.into(),
            irritants: Value::Nil,
            continuation,
            si: Some(si),
        }))?;
        Err(Unwind(err))
    }
}

impl Heap {
    pub(crate) fn phase_is_idle(&self) -> bool {
        matches!(self.phase, crate::tracer::Phase::Idle)
    }
}
