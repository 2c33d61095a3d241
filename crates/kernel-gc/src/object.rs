//! The boxed object kinds of spec §3.2, plus the native-function type that
//! lets continuations, operatives and applicatives be heap objects here
//! while the evaluator that drives them lives one crate up.
//!
//! klisp keeps `fn: klisp_Ofunc`/`klisp_Cfunc` as a raw C function pointer
//! alongside a `TValue extra[]` tail. A Rust `fn` item pointer is the
//! direct, zero-cost analogue — it only has to agree with callers on a
//! signature, and that signature only mentions [`State`](crate::state::State)
//! and [`Value`], both defined in this crate. That is what breaks the
//! dependency cycle that would otherwise exist between "the heap owns
//! combiner objects" and "the evaluator crate implements what they do":
//! `kernel-eval` and `kernel-ground` hand this crate plain `fn` items to
//! store, never the reverse.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use kernel_num::{Bigint, Bigrat};

use crate::source_info::SourceInfo;
use crate::state::{KResult, State};
use crate::value::{Symbol, Value};

/// The shape every builtin combiner body has. `xparams` is the captured
/// "extra parameters" array (klisp's `xparams[]`); `operands`/`obj` is
/// either the unevaluated operand tree (operatives) or the value just
/// delivered to a continuation, depending on which slot this fn is parked
/// in; `denv` is the dynamic environment in scope at the call site.
///
/// A `NativeFn` never *returns* a value directly — like klisp's `kapply_cc`
/// discipline, it reports its result by calling [`State::tail_eval`],
/// [`State::tail_call`] or [`State::apply_cc`] and returning `Ok(())`; the
/// scheduler in `kernel-eval` re-dispatches from `state.next` afterwards.
pub type NativeFn = fn(state: &mut State, xparams: &[Value], obj: Value, denv: Value) -> KResult<()>;

#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
    pub si: Option<SourceInfo>,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolObj {
    pub name: Symbol,
    pub si: Option<SourceInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringObj {
    pub chars: Vec<char>,
    pub immutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BytevectorObj {
    pub bytes: Vec<u8>,
    pub immutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorObj {
    pub items: Vec<Value>,
    pub immutable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubleObj(pub f64);

/// Exact signed infinity — distinct from `DoubleObj`'s inexact `±inf`
/// (spec §3.2 `Einf`/`Iinf`; klisp's `kreal.c` keeps the same split so
/// `(exact? +infinity)` and `(exact? +inf.0)` disagree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactInfObj {
    pub negative: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    /// Zero or more parents, searched left-to-right depth-first (spec
    /// §4.5). klisp environments have at most one parent; Kernel's
    /// `make-environment` in the general case can splice several, so we
    /// keep a vector rather than special-casing arity one.
    pub parents: Vec<Value>,
    pub bindings: FxHashMap<Symbol, Value>,
}

impl Environment {
    pub fn new(parents: Vec<Value>) -> Self {
        Environment { parents, bindings: FxHashMap::default() }
    }
}

#[derive(Clone)]
pub struct Continuation {
    pub parent: Option<Value>,
    pub func: NativeFn,
    pub extra: Vec<Value>,
    pub name: Option<Symbol>,
    pub si: Option<SourceInfo>,
    /// Lets `$if`/`$cond` (spec §4.4, glossary "bool-check continuation")
    /// recognize that the immediately enclosing continuation already
    /// expects a boolean and skip pushing a redundant frame of their own.
    pub bool_check: bool,
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("parent", &self.parent)
            .field("extra", &self.extra)
            .field("name", &self.name)
            .field("bool_check", &self.bool_check)
            .finish()
    }
}
impl PartialEq for Continuation {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.func as *const (), other.func as *const ())
            && self.parent == other.parent
            && self.extra == other.extra
    }
}

#[derive(Clone)]
pub struct Operative {
    pub func: NativeFn,
    pub extra: Vec<Value>,
    pub name: Option<Symbol>,
    pub si: Option<SourceInfo>,
}

impl fmt::Debug for Operative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operative").field("extra", &self.extra).field("name", &self.name).finish()
    }
}
impl PartialEq for Operative {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.func as *const (), other.func as *const ()) && self.extra == other.extra
    }
}

/// Wraps a combiner (operative, or — repeatedly — another applicative) so
/// that applying it first evaluates its operand list (spec glossary
/// "Applicative"). `underlying` is itself a combiner `Value`, possibly
/// another `Applicative`, matching klisp's "may be multiply wrapped".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applicative {
    pub underlying: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Textual,
    Binary,
}

/// The object-model half of spec §6's port interface: direction/kind/open
/// flags live here since they are visible to `port?`/`input-port?`
/// predicates; the byte/char source or sink itself is supplied by
/// `kernel-port` through the [`PortBackend`] trait object so this crate
/// never has to know about files or growable buffers.
pub struct Port {
    pub direction: PortDirection,
    pub kind: PortKind,
    pub open: bool,
    pub name: Option<Arc<str>>,
    pub backend: Box<dyn PortBackend>,
}

impl fmt::Debug for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("direction", &self.direction)
            .field("kind", &self.kind)
            .field("open", &self.open)
            .finish()
    }
}

/// Minimal port behavior external I/O collaborators implement (spec §6).
/// Kept object-safe and GC-opaque: a port never holds `Value`s that the
/// tracer would need to follow, only raw bytes/chars, so `Heap::trace`
/// treats every `Port` object as a leaf.
pub trait PortBackend {
    fn read_char(&mut self) -> std::io::Result<Option<char>>;
    fn peek_char(&mut self) -> std::io::Result<Option<char>>;
    fn write_char(&mut self, ch: char) -> std::io::Result<()>;
    fn write_u8(&mut self, byte: u8) -> std::io::Result<()>;
    fn read_u8(&mut self) -> std::io::Result<Option<u8>>;
    fn flush(&mut self) -> std::io::Result<()>;
    fn close(&mut self) -> std::io::Result<()>;

    /// Lets a ground-env combiner that knows the concrete backend (e.g.
    /// `get-output-string`) downcast to it; backends with nothing to
    /// expose this way can rely on the default.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any
    where
        Self: 'static,
    {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Range,
    Type,
    Arity,
    Unbound,
    Immutable,
    DivisionByZero,
    Memory,
    Io,
    Read,
    BadContinuation,
    /// Raised by the `error` applicative itself (spec §7).
    User,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Range => "range",
            ErrorKind::Type => "type",
            ErrorKind::Arity => "arity",
            ErrorKind::Unbound => "unbound",
            ErrorKind::Immutable => "immutable",
            ErrorKind::DivisionByZero => "division-by-zero",
            ErrorKind::Memory => "memory",
            ErrorKind::Io => "io",
            ErrorKind::Read => "read",
            ErrorKind::BadContinuation => "bad-continuation",
            ErrorKind::User => "user",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorObj {
    pub kind: ErrorKind,
    pub message: String,
    pub irritants: Value,
    /// The continuation active at the point of the throw (spec §7),
    /// captured so a guard can inspect or resume past it.
    pub continuation: Value,
    pub si: Option<SourceInfo>,
}

/// A unique, unforgeable sealed box (Kernel's `make-encapsulation-type`).
/// `tag` is the `Value` identifying which encapsulation type created this
/// instance; unwrap predicates compare tags by `eq?`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncapsulationObj {
    pub tag: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromiseObj {
    pub forced: Option<Value>,
    /// A thunk (zero-argument combiner) to force, `Value::Inert` once
    /// `forced` is `Some`.
    pub thunk: Value,
}

/// klisp's `Table`, used only internally (continuation-name catalog); not
/// surfaced as a first-class Kernel hash-table type (spec §3.2).
#[derive(Debug, Clone, Default)]
pub struct TableObj {
    pub entries: FxHashMap<String, Value>,
}

pub enum ObjKind {
    Pair(Pair),
    Symbol(SymbolObj),
    String(StringObj),
    Bytevector(BytevectorObj),
    Vector(VectorObj),
    Bigint(Bigint),
    Bigrat(Bigrat),
    Double(DoubleObj),
    ExactInf(ExactInfObj),
    Environment(Environment),
    Continuation(Continuation),
    Operative(Operative),
    Applicative(Applicative),
    Port(Port),
    Error(ErrorObj),
    Table(TableObj),
    Encapsulation(EncapsulationObj),
    Promise(PromiseObj),
}

impl fmt::Debug for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjKind::Pair(p) => write!(f, "{p:?}"),
            ObjKind::Symbol(s) => write!(f, "{s:?}"),
            ObjKind::String(s) => write!(f, "{s:?}"),
            ObjKind::Bytevector(b) => write!(f, "{b:?}"),
            ObjKind::Vector(v) => write!(f, "{v:?}"),
            ObjKind::Bigint(b) => write!(f, "{b:?}"),
            ObjKind::Bigrat(b) => write!(f, "{b:?}"),
            ObjKind::Double(d) => write!(f, "{d:?}"),
            ObjKind::ExactInf(e) => write!(f, "{e:?}"),
            ObjKind::Environment(e) => write!(f, "{e:?}"),
            ObjKind::Continuation(c) => write!(f, "{c:?}"),
            ObjKind::Operative(o) => write!(f, "{o:?}"),
            ObjKind::Applicative(a) => write!(f, "{a:?}"),
            ObjKind::Port(p) => write!(f, "{p:?}"),
            ObjKind::Error(e) => write!(f, "{e:?}"),
            ObjKind::Table(t) => write!(f, "{t:?}"),
            ObjKind::Encapsulation(e) => write!(f, "{e:?}"),
            ObjKind::Promise(p) => write!(f, "{p:?}"),
        }
    }
}

/// Tag identifying an `ObjKind` variant without borrowing it; used by
/// type predicates and the writer's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Pair,
    Symbol,
    String,
    Bytevector,
    Vector,
    Bigint,
    Bigrat,
    Double,
    ExactInf,
    Environment,
    Continuation,
    Operative,
    Applicative,
    Port,
    Error,
    Table,
    Encapsulation,
    Promise,
}

impl ObjKind {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ObjKind::Pair(_) => TypeTag::Pair,
            ObjKind::Symbol(_) => TypeTag::Symbol,
            ObjKind::String(_) => TypeTag::String,
            ObjKind::Bytevector(_) => TypeTag::Bytevector,
            ObjKind::Vector(_) => TypeTag::Vector,
            ObjKind::Bigint(_) => TypeTag::Bigint,
            ObjKind::Bigrat(_) => TypeTag::Bigrat,
            ObjKind::Double(_) => TypeTag::Double,
            ObjKind::ExactInf(_) => TypeTag::ExactInf,
            ObjKind::Environment(_) => TypeTag::Environment,
            ObjKind::Continuation(_) => TypeTag::Continuation,
            ObjKind::Operative(_) => TypeTag::Operative,
            ObjKind::Applicative(_) => TypeTag::Applicative,
            ObjKind::Port(_) => TypeTag::Port,
            ObjKind::Error(_) => TypeTag::Error,
            ObjKind::Table(_) => TypeTag::Table,
            ObjKind::Encapsulation(_) => TypeTag::Encapsulation,
            ObjKind::Promise(_) => TypeTag::Promise,
        }
    }

    /// Every `Value` this object directly references, for the tracer
    /// (spec §4.1). Ports, strings, bytevectors, bignums etc. are leaves.
    pub fn trace(&self, mut visit: impl FnMut(Value)) {
        match self {
            ObjKind::Pair(p) => {
                visit(p.car);
                visit(p.cdr);
            }
            ObjKind::Environment(e) => {
                for &parent in &e.parents {
                    visit(parent);
                }
                for &v in e.bindings.values() {
                    visit(v);
                }
            }
            ObjKind::Continuation(c) => {
                if let Some(p) = c.parent {
                    visit(p);
                }
                for &v in &c.extra {
                    visit(v);
                }
            }
            ObjKind::Operative(o) => {
                for &v in &o.extra {
                    visit(v);
                }
            }
            ObjKind::Applicative(a) => visit(a.underlying),
            ObjKind::Error(e) => {
                visit(e.irritants);
                visit(e.continuation);
            }
            ObjKind::Encapsulation(e) => {
                visit(e.tag);
                visit(e.value);
            }
            ObjKind::Promise(p) => {
                if let Some(v) = p.forced {
                    visit(v);
                }
                visit(p.thunk);
            }
            ObjKind::Vector(v) => {
                for &item in &v.items {
                    visit(item);
                }
            }
            ObjKind::Table(t) => {
                for &v in t.entries.values() {
                    visit(v);
                }
            }
            ObjKind::Symbol(_)
            | ObjKind::String(_)
            | ObjKind::Bytevector(_)
            | ObjKind::Bigint(_)
            | ObjKind::Bigrat(_)
            | ObjKind::Double(_)
            | ObjKind::ExactInf(_)
            | ObjKind::Port(_) => {}
        }
    }
}
