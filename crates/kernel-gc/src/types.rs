//! A single type tag spanning both immediates and boxed kinds, for
//! predicates like `pair?`/`symbol?`/`environment?` and for the writer's
//! dispatch — spec §3.1's "dynamic typing... dispatch ... is by tag
//! match".

use crate::object::TypeTag;
use crate::state::State;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Fixint,
    Char,
    Bool,
    Nil,
    Inert,
    Ignore,
    Eof,
    Boxed(TypeTag),
}

impl State {
    pub fn kind_of(&self, v: Value) -> Kind {
        match v {
            Value::Fixint(_) => Kind::Fixint,
            Value::Char(_) => Kind::Char,
            Value::Bool(_) => Kind::Bool,
            Value::Nil => Kind::Nil,
            Value::Inert => Kind::Inert,
            Value::Ignore => Kind::Ignore,
            Value::Eof => Kind::Eof,
            Value::Ref(id) => Kind::Boxed(self.heap.get(id).type_tag()),
        }
    }

    /// `eq?`: identity for boxed objects, value equality for immediates
    /// (spec §3.1).
    pub fn eq(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Ref(x), Value::Ref(y)) => x == y,
            _ => a == b,
        }
    }

    /// `equal?`: structural equality up to mutation — recurses into
    /// pairs, strings, vectors and bytevectors by content; everything
    /// else falls back to `eq?` (spec §3.1).
    pub fn equal(&self, a: Value, b: Value) -> bool {
        use crate::object::ObjKind::*;
        if self.eq(a, b) {
            return true;
        }
        match (a, b) {
            (Value::Ref(x), Value::Ref(y)) => match (self.heap.get(x), self.heap.get(y)) {
                (Pair(p), Pair(q)) => self.equal(p.car, q.car) && self.equal(p.cdr, q.cdr),
                (String(s), String(t)) => s.chars == t.chars,
                (Bytevector(s), Bytevector(t)) => s.bytes == t.bytes,
                (Vector(s), Vector(t)) => {
                    s.items.len() == t.items.len()
                        && s.items.iter().zip(&t.items).all(|(&i, &j)| self.equal(i, j))
                }
                (Bigint(n), Bigint(m)) => n == m,
                (Bigrat(n), Bigrat(m)) => n == m,
                (Double(n), Double(m)) => n.0 == m.0,
                _ => false,
            },
            _ => false,
        }
    }
}
