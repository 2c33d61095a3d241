//! Symbol interning (spec §3.2/§4 "Symbols: 3%"): one name maps to one
//! heap object for the lifetime of the interpreter, so `eq?` on symbols
//! read from source twice agrees. The name table itself
//! ([`kernel_util::SymbolTable`]) is the single-threaded interner;
//! this wraps it with a name → heap-object cache, since spec §3.2 models
//! symbols as boxed objects (carrying optional source info) rather than
//! bare interned-string handles.

use rustc_hash::FxHashMap;

use kernel_util::SymbolTable;

use crate::error::GcError;
use crate::heap::Heap;
use crate::object::{ObjKind, SymbolObj};
use crate::source_info::SourceInfo;
use crate::value::{Symbol, Value};

#[derive(Default)]
pub struct SymbolInterner {
    names: SymbolTable,
    objects: FxHashMap<Symbol, Value>,
}

impl SymbolInterner {
    pub fn new() -> Self {
        SymbolInterner { names: SymbolTable::new(), objects: FxHashMap::default() }
    }

    /// Interns `name`, allocating its backing heap object on first sight.
    /// Every later call with the same name returns the identical `Value`.
    pub fn intern(&mut self, heap: &mut Heap, name: &str) -> Result<Value, GcError> {
        let sym = self.names.intern(name);
        if let Some(&v) = self.objects.get(&sym) {
            return Ok(v);
        }
        let v = heap.alloc(ObjKind::Symbol(SymbolObj { name: sym, si: None }))?;
        self.objects.insert(sym, v);
        Ok(v)
    }

    pub fn intern_with_si(
        &mut self,
        heap: &mut Heap,
        name: &str,
        si: SourceInfo,
    ) -> Result<Value, GcError> {
        let sym = self.names.intern(name);
        if let Some(&v) = self.objects.get(&sym) {
            return Ok(v);
        }
        let v = heap.alloc(ObjKind::Symbol(SymbolObj { name: sym, si: Some(si) }))?;
        self.objects.insert(sym, v);
        Ok(v)
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.names.resolve(sym)
    }

    /// Every interned symbol object is kept alive for the life of the
    /// interpreter (spec §3.3: "reachable from ... the symbol table"),
    /// so the collector must treat this cache as a root set.
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.objects.values().copied()
    }
}
