//! The datum reader (spec §4.6, §6 "Tokenizer"/"Textual syntax"):
//! `kernel-lex` hands over one token at a time, and this module resolves
//! pairs, datum labels, and numeric lexemes into heap values.
//!
//! **Datum labels.** `#n=datum` introduces a label; `#n#` refers back to
//! it. The reader only ever needs to support forward reference from
//! *inside* the labelled datum itself (the textbook `#0=(a . #0#)`), so a
//! label on a list is resolved by pre-allocating the head pair as a
//! mutable placeholder, registering it under the label immediately, and
//! filling in its car/cdr slots as the list's elements are read — a `#n#`
//! occurring anywhere inside sees the same placeholder and resolves to it
//! directly. A label on a non-pair atom can't be self-referential (there's
//! nowhere inside an atom for the label to appear), so those are read
//! first and registered afterward. A `#n#` whose label was never defined
//! is a [`ReadError::UndefinedLabel`].

use std::collections::HashMap;
use std::sync::Arc;

use kernel_gc::object::{BytevectorObj, DoubleObj, ExactInfObj, ObjKind, StringObj};
use kernel_gc::{SourceInfo, State, Value};
use kernel_lex::{Lexer, Token};
use kernel_num::Number;

use crate::error::{ReadError, Result};

pub struct Reader<'a, 'src> {
    state: &'a mut State,
    lexer: Lexer<'src>,
    filename: Arc<str>,
    labels: HashMap<u64, Value>,
}

impl<'a, 'src> Reader<'a, 'src> {
    pub fn new(state: &'a mut State, source: &'src str, filename: impl Into<Arc<str>>) -> Self {
        Reader { state, lexer: Lexer::new(source), filename: filename.into(), labels: HashMap::new() }
    }

    /// Reads the next complete datum, or `None` at end of input.
    pub fn read(&mut self) -> Result<Option<Value>> {
        let (tok, span) = self.lexer.next_token()?;
        if tok.is_eof() {
            return Ok(None);
        }
        let si = SourceInfo::new(self.filename.clone(), span.line as i32, span.column as i32);
        self.dispatch(tok, si, None).map(Some)
    }

    /// Reads every datum in the source, failing on the first error.
    pub fn read_all(&mut self) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        while let Some(v) = self.read()? {
            out.push(v);
        }
        Ok(out)
    }

    fn next_with_si(&mut self) -> Result<(Token, SourceInfo)> {
        let (tok, span) = self.lexer.next_token()?;
        Ok((tok, SourceInfo::new(self.filename.clone(), span.line as i32, span.column as i32)))
    }

    /// Dispatches on an already-lexed token. `label`, when present, is the
    /// `#n=` this token's datum is being read under.
    fn dispatch(&mut self, tok: Token, si: SourceInfo, label: Option<u64>) -> Result<Value> {
        match tok {
            Token::LParen => self.read_list(label),
            Token::DatumLabelDef(n) => {
                let (next_tok, next_si) = self.next_with_si()?;
                self.dispatch(next_tok, next_si, Some(n))
            }
            Token::DatumLabelRef(n) => match self.labels.get(&n) {
                Some(&v) => Ok(v),
                None => Err(ReadError::UndefinedLabel(n)),
            },
            Token::EndOfInput => Err(ReadError::UnexpectedEof),
            Token::Dot => Err(ReadError::MisplacedDot),
            Token::RParen => Err(ReadError::ExpectedCloseParen),
            other => {
                let v = self.atom(other, si)?;
                if let Some(n) = label {
                    self.labels.insert(n, v);
                }
                Ok(v)
            }
        }
    }

    /// Reads the contents of a list after its opening `(` has already been
    /// consumed, building it left-to-right onto a chain of mutable
    /// placeholder pairs rather than by recursive `cons`, so a label
    /// attached to the list (or to any sub-list read along the way) names
    /// a pair that already exists before its own contents are read.
    fn read_list(&mut self, label: Option<u64>) -> Result<Value> {
        let (tok, si) = self.next_with_si()?;
        if let Token::RParen = tok {
            let nil = Value::Nil;
            if let Some(n) = label {
                self.labels.insert(n, nil);
            }
            return Ok(nil);
        }

        let head = self.state.cons(Value::Inert, Value::Inert)?;
        if let Some(n) = label {
            self.labels.insert(n, head);
        }

        let first = self.dispatch(tok, si, None)?;
        self.state.set_car(head, first).expect("freshly allocated pair is mutable");

        let mut cur = head;
        loop {
            let (tok, si) = self.next_with_si()?;
            match tok {
                Token::RParen => {
                    self.state.set_cdr(cur, Value::Nil).expect("freshly allocated pair is mutable");
                    return Ok(head);
                }
                Token::Dot => {
                    let tail_tok = self.next_with_si()?;
                    let tail = self.dispatch(tail_tok.0, tail_tok.1, None)?;
                    self.state.set_cdr(cur, tail).expect("freshly allocated pair is mutable");
                    let (close, _) = self.next_with_si()?;
                    if !matches!(close, Token::RParen) {
                        return Err(ReadError::ExpectedCloseParen);
                    }
                    return Ok(head);
                }
                Token::EndOfInput => return Err(ReadError::UnexpectedEof),
                other => {
                    let elem = self.dispatch(other, si, None)?;
                    let next_pair = self.state.cons(Value::Inert, Value::Inert)?;
                    self.state.set_cdr(cur, next_pair).expect("freshly allocated pair is mutable");
                    self.state.set_car(next_pair, elem).expect("freshly allocated pair is mutable");
                    cur = next_pair;
                }
            }
        }
    }

    fn atom(&mut self, tok: Token, si: SourceInfo) -> Result<Value> {
        match tok {
            Token::Symbol(name) => Ok(self.state.symbols.intern_with_si(&mut self.state.heap, &name, si)?),
            Token::String(s) => {
                Ok(self.state.alloc(ObjKind::String(StringObj { chars: s.chars().collect(), immutable: false }))?)
            }
            Token::Char(c) => Ok(Value::Char(c)),
            Token::Number(raw) => {
                let n = kernel_num::parse_literal(&raw)?;
                number_to_value(self.state, n)
            }
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Inert => Ok(Value::Inert),
            Token::Ignore => Ok(Value::Ignore),
            Token::EofObject => Ok(Value::Eof),
            Token::LParen | Token::RParen | Token::Dot | Token::DatumLabelDef(_) | Token::DatumLabelRef(_) => {
                unreachable!("handled by dispatch before reaching atom()")
            }
            Token::EndOfInput => Err(ReadError::UnexpectedEof),
        }
    }
}

fn number_to_value(state: &mut State, n: Number) -> Result<Value> {
    Ok(match n {
        Number::Int(i) => Value::Fixint(i),
        Number::Bignum(b) => state.alloc(ObjKind::Bigint(b))?,
        Number::Rational(r) => state.alloc(ObjKind::Bigrat(r))?,
        Number::Double(d) => state.alloc(ObjKind::Double(DoubleObj(d)))?,
        Number::ExactInf { negative } => state.alloc(ObjKind::ExactInf(ExactInfObj { negative }))?,
    })
}

#[allow(dead_code)]
fn bytevector_placeholder(bytes: Vec<u8>) -> ObjKind {
    // Textual bytevector syntax (`#u8(...)`) isn't produced by kernel-lex
    // today; this stays here as the one spot to wire it up if the lexer
    // grows that token.
    ObjKind::Bytevector(BytevectorObj { bytes, immutable: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), |_s, _x, _o, _e| Ok(()))
    }

    fn read_one(state: &mut State, src: &str) -> Value {
        let mut r = Reader::new(state, src, "test");
        r.read().unwrap().unwrap()
    }

    #[test]
    fn reads_self_evaluating_atoms() {
        let mut st = test_state();
        assert_eq!(read_one(&mut st, "42"), Value::Fixint(42));
        assert_eq!(read_one(&mut st, "#t"), Value::Bool(true));
        assert_eq!(read_one(&mut st, "#inert"), Value::Inert);
        assert_eq!(read_one(&mut st, "#\\a"), Value::Char('a'));
    }

    #[test]
    fn reads_a_proper_list() {
        let mut st = test_state();
        let v = read_one(&mut st, "(1 2 3)");
        assert_eq!(st.list_to_vec(v), Some(vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]));
    }

    #[test]
    fn reads_an_improper_list() {
        let mut st = test_state();
        let v = read_one(&mut st, "(1 . 2)");
        assert_eq!(st.car(v), Some(Value::Fixint(1)));
        assert_eq!(st.cdr(v), Some(Value::Fixint(2)));
    }

    #[test]
    fn reads_a_self_cyclic_list_via_datum_label() {
        let mut st = test_state();
        let v = read_one(&mut st, "#0=(a . #0#)");
        let cdr = st.cdr(v).unwrap();
        assert_eq!(cdr, v);
    }

    #[test]
    fn reads_shared_structure_as_the_same_object() {
        let mut st = test_state();
        let v = read_one(&mut st, "(#0=(1 2) #0#)");
        let a = st.car(v).unwrap();
        let b = st.car(st.cdr(v).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn undefined_label_reference_is_an_error() {
        let mut st = test_state();
        let mut r = Reader::new(&mut st, "#0#", "test");
        assert_eq!(r.read(), Err(ReadError::UndefinedLabel(0)));
    }

    #[test]
    fn interned_symbols_are_identical_across_reads() {
        let mut st = test_state();
        let a = read_one(&mut st, "foo");
        let b = read_one(&mut st, "foo");
        assert_eq!(a, b);
    }

    #[test]
    fn reads_numeric_literals_with_prefixes() {
        let mut st = test_state();
        assert_eq!(read_one(&mut st, "#xFF"), Value::Fixint(255));
        assert!(matches!(read_one(&mut st, "3.14"), Value::Ref(_)));
    }
}
