//! The interned-string table backing [`super::Symbol`].
//!
//! Kernel is single-threaded end to end (spec §5): there is exactly one
//! interpreter state, owning exactly one [`SymbolTable`]. Interning needs
//! none of a concurrent table's synchronization, so this is a plain
//! `FxHashMap` plus a growable `Vec`, not the teacher's `DashMap`/`AHasher`
//! lock-free design.

use rustc_hash::FxHashMap;

use super::Symbol;

/// Symbols every reader/ground-environment initialization touches, given
/// stable low indices so they can be constructed as compile-time constants
/// once a table is built (mirrors klisp's practice of caching commonly used
/// symbols rather than re-interning them per lookup).
pub const RESERVED: &[&str] = &[
    "#ignore", "$vau", "$lambda", "$define!", "$set!", "$if", "$cond", "$sequence", "$quote",
    "$let", "$import!", "$provide!", "cons", "car", "cdr", "eval",
];

#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<Box<str>>,
    ids: FxHashMap<Box<str>, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable { names: Vec::new(), ids: FxHashMap::default() };
        for name in RESERVED {
            table.intern(name);
        }
        table
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.ids.get(name) {
            return *sym;
        }
        let id = Symbol::from_raw(self.names.len() as u32);
        let boxed: Box<str> = name.into();
        self.names.push(boxed.clone());
        self.ids.insert(boxed, id);
        id
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.names[sym.raw() as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
