//! Tokenizer for Kernel's textual syntax (spec §6).
//!
//! Delimiters — the characters that end a symbol or number lexeme without
//! being consumed as part of it — are whitespace, `(`, `)`, `"`, `;`, and
//! end-of-input, matching the Scheme-family convention the spec calls
//! "bit-exact with Scheme-family conventions".

use kernel_util::Span;

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::Token;

pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

fn is_delimiter(c: char) -> bool {
    c == '\0' || c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';' | '|')
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { cursor: Cursor::new(source) }
    }

    /// Returns the next token along with the span it occupies. `Ok(None)`
    /// is never produced — exhaustion is signalled by `Token::EndOfInput`
    /// — so callers can loop on `next_token` until that variant appears.
    pub fn next_token(&mut self) -> Result<(Token, Span), LexError> {
        self.skip_atmosphere()?;

        let start = self.cursor.position();
        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let c = self.cursor.current_char();

        let token = if c == '\0' {
            Token::EndOfInput
        } else if c == '(' {
            self.cursor.advance();
            Token::LParen
        } else if c == ')' {
            self.cursor.advance();
            Token::RParen
        } else if c == '"' {
            self.lex_string(start, start_line, start_col)?
        } else if c == '#' {
            self.lex_hash(start, start_line, start_col)?
        } else if c == '.' && is_delimiter(self.cursor.peek_char(1)) {
            self.cursor.advance();
            Token::Dot
        } else if is_number_start(c, self.cursor.peek_char(1)) {
            self.lex_atom_as_number(start)
        } else {
            self.lex_symbol(start)
        };

        let span = Span::new(start, self.cursor.position(), start_line, start_col);
        Ok((token, span))
    }

    /// Skips whitespace, `;` line comments, `#|...|#` block comments
    /// (which may nest), and `#;` datum comments' leading atmosphere —
    /// the datum comment's *datum* itself is the reader's concern, not
    /// the lexer's, since skipping it requires recursively reading a
    /// whole form.
    fn skip_atmosphere(&mut self) -> Result<(), LexError> {
        loop {
            let c = self.cursor.current_char();
            if c.is_whitespace() {
                self.cursor.advance();
            } else if c == ';' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
            } else if c == '#' && self.cursor.peek_char(1) == '|' {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.cursor.position();
        let (line, col) = (self.cursor.line(), self.cursor.column());
        self.cursor.advance(); // '#'
        self.cursor.advance(); // '|'
        let mut depth = 1usize;
        while depth > 0 {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedBlockComment {
                    span: Span::new(start, self.cursor.position(), line, col),
                });
            }
            if self.cursor.current_char() == '#' && self.cursor.peek_char(1) == '|' {
                self.cursor.advance();
                self.cursor.advance();
                depth += 1;
            } else if self.cursor.current_char() == '|' && self.cursor.peek_char(1) == '#' {
                self.cursor.advance();
                self.cursor.advance();
                depth -= 1;
            } else {
                self.cursor.advance();
            }
        }
        Ok(())
    }

    fn lex_string(&mut self, start: usize, line: u32, col: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // opening '"'
        let mut s = String::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString {
                    span: Span::new(start, self.cursor.position(), line, col),
                });
            }
            let c = self.cursor.advance();
            match c {
                '"' => return Ok(Token::String(s)),
                '\\' => {
                    let esc = self.cursor.advance();
                    s.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '"' => '"',
                        '\\' => '\\',
                        other => other,
                    });
                }
                other => s.push(other),
            }
        }
    }

    /// Everything introduced by `#`: booleans, `#inert`/`#ignore`/`#eof`,
    /// character literals, exactness/radix number prefixes, and datum
    /// labels.
    fn lex_hash(&mut self, start: usize, line: u32, col: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // '#'
        let c = self.cursor.current_char();
        match c {
            't' => {
                self.consume_word();
                Ok(Token::True)
            }
            'f' => {
                self.consume_word();
                Ok(Token::False)
            }
            'i' if self.looks_like_word("inert") => {
                self.consume_word();
                Ok(Token::Inert)
            }
            'i' if self.looks_like_word("ignore") => {
                self.consume_word();
                Ok(Token::Ignore)
            }
            'e' if self.looks_like_word("eof") => {
                self.consume_word();
                Ok(Token::EofObject)
            }
            'i' | 'e' | 'b' | 'o' | 'd' | 'x' => Ok(self.lex_atom_as_number(start)),
            '\\' => self.lex_char(start, line, col),
            d if d.is_ascii_digit() => self.lex_datum_label(start, line, col),
            other => Err(LexError::UnexpectedChar {
                found: other,
                span: Span::new(start, self.cursor.position(), line, col),
            }),
        }
    }

    fn looks_like_word(&self, word: &str) -> bool {
        word.chars().enumerate().all(|(i, ch)| self.cursor.peek_char(i) == ch)
            && is_delimiter(self.cursor.peek_char(word.len()))
    }

    fn consume_word(&mut self) {
        while !is_delimiter(self.cursor.current_char()) {
            self.cursor.advance();
        }
    }

    fn lex_char(&mut self, start: usize, line: u32, col: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // '\\'
        if self.cursor.is_at_end() {
            return Err(LexError::UnterminatedChar {
                span: Span::new(start, self.cursor.position(), line, col),
            });
        }
        let first = self.cursor.advance();
        if !first.is_ascii_alphabetic() || is_delimiter(self.cursor.current_char()) {
            return Ok(Token::Char(first));
        }
        let mut name = String::new();
        name.push(first);
        while !is_delimiter(self.cursor.current_char()) {
            name.push(self.cursor.advance());
        }
        match name.to_ascii_lowercase().as_str() {
            "space" => Ok(Token::Char(' ')),
            "newline" | "linefeed" => Ok(Token::Char('\n')),
            "tab" => Ok(Token::Char('\t')),
            "nul" | "null" => Ok(Token::Char('\0')),
            "return" => Ok(Token::Char('\r')),
            "altmode" | "escape" => Ok(Token::Char('\x1b')),
            "backspace" => Ok(Token::Char('\x08')),
            "delete" | "rubout" => Ok(Token::Char('\x7f')),
            _ if name.len() == 1 => Ok(Token::Char(first)),
            _ => Err(LexError::UnknownCharName {
                name,
                span: Span::new(start, self.cursor.position(), line, col),
            }),
        }
    }

    fn lex_datum_label(&mut self, start: usize, line: u32, col: u32) -> Result<Token, LexError> {
        let mut digits = String::new();
        while self.cursor.current_char().is_ascii_digit() {
            digits.push(self.cursor.advance());
        }
        match self.cursor.current_char() {
            '=' => {
                self.cursor.advance();
                Ok(Token::DatumLabelDef(digits.parse().unwrap_or(0)))
            }
            '#' => {
                self.cursor.advance();
                Ok(Token::DatumLabelRef(digits.parse().unwrap_or(0)))
            }
            _ => Err(LexError::MalformedDatumLabel {
                text: digits,
                span: Span::new(start, self.cursor.position(), line, col),
            }),
        }
    }

    /// Atoms that could be numbers: leading digit, a sign followed by a
    /// digit or `.`, or an exactness/radix `#` prefix already consumed by
    /// [`Self::lex_hash`]. The lexeme is captured verbatim; parsing (and
    /// falling back to treating it as a plain symbol, e.g. a lone `+` or
    /// `...`) happens in the reader.
    fn lex_atom_as_number(&mut self, start: usize) -> Token {
        while !is_delimiter(self.cursor.current_char()) {
            self.cursor.advance();
        }
        Token::Number(self.cursor.slice_from(start).to_string())
    }

    fn lex_symbol(&mut self, start: usize) -> Token {
        while !is_delimiter(self.cursor.current_char()) {
            self.cursor.advance();
        }
        Token::Symbol(self.cursor.slice_from(start).to_string())
    }
}

/// Whether `c` (with one character of lookahead `next`) begins a number
/// lexeme rather than a symbol: a digit, or `+`/`-`/`.` immediately
/// followed by a digit.
fn is_number_start(c: char, next: char) -> bool {
    c.is_ascii_digit() || ((c == '+' || c == '-' || c == '.') && next.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lexer.next_token().unwrap();
            if tok.is_eof() {
                break;
            }
            out.push(tok);
        }
        out
    }

    #[test]
    fn parens_and_symbols() {
        assert_eq!(
            tokens("(foo bar)"),
            vec![
                Token::LParen,
                Token::Symbol("foo".into()),
                Token::Symbol("bar".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn dot_is_its_own_token_only_before_a_delimiter() {
        assert_eq!(tokens("(a . b)"), vec![
            Token::LParen,
            Token::Symbol("a".into()),
            Token::Dot,
            Token::Symbol("b".into()),
            Token::RParen,
        ]);
        // `...` is a legal symbol, not three dots.
        assert_eq!(tokens("..."), vec![Token::Symbol("...".into())]);
    }

    #[test]
    fn booleans_and_special_atoms() {
        assert_eq!(
            tokens("#t #f #inert #ignore #eof"),
            vec![Token::True, Token::False, Token::Inert, Token::Ignore, Token::EofObject]
        );
    }

    #[test]
    fn string_literal_with_escapes() {
        assert_eq!(tokens(r#""a\"b\nc""#), vec![Token::String("a\"b\nc".to_string())]);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn char_literals_named_and_literal() {
        assert_eq!(
            tokens("#\\a #\\space #\\newline"),
            vec![Token::Char('a'), Token::Char(' '), Token::Char('\n')]
        );
    }

    #[test]
    fn number_lexemes_are_captured_raw() {
        assert_eq!(
            tokens("42 -7 #e1/3 #xFF 3.14"),
            vec![
                Token::Number("42".into()),
                Token::Number("-7".into()),
                Token::Number("#e1/3".into()),
                Token::Number("#xFF".into()),
                Token::Number("3.14".into()),
            ]
        );
    }

    #[test]
    fn datum_labels() {
        assert_eq!(
            tokens("#0=(a . #0#)"),
            vec![
                Token::DatumLabelDef(0),
                Token::LParen,
                Token::Symbol("a".into()),
                Token::Dot,
                Token::DatumLabelRef(0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        assert_eq!(
            tokens("a ; comment\nb #| block #|nested|# comment |# c"),
            vec![Token::Symbol("a".into()), Token::Symbol("b".into()), Token::Symbol("c".into())]
        );
    }

    #[test]
    fn bare_sign_is_a_symbol_not_a_number() {
        assert_eq!(tokens("+ - + 1"), vec![
            Token::Symbol("+".into()),
            Token::Symbol("-".into()),
            Token::Symbol("+".into()),
            Token::Number("1".into()),
        ]);
    }
}

/// Property-based tests, in the same style as the teacher's own
/// `faxc-lex` (`examples/Luvion1-Fax/faxc/crates/faxc-lex/src/lexer.rs`):
/// generate a regex-shaped family of inputs instead of enumerating
/// examples by hand.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lexer.next_token().expect("generated input is well-formed");
            if tok.is_eof() {
                break;
            }
            out.push(tok);
        }
        out
    }

    proptest! {
        #[test]
        fn arbitrary_identifier_lexes_to_a_single_symbol_token(s in "[a-zA-Z][a-zA-Z0-9!?*<>=]{0,30}") {
            prop_assert_eq!(tokens(&s), vec![Token::Symbol(s)]);
        }

        #[test]
        fn arbitrary_decimal_digits_lex_to_a_single_number_token(s in "[0-9]{1,20}") {
            prop_assert_eq!(tokens(&s), vec![Token::Number(s)]);
        }

        #[test]
        fn arbitrary_string_literal_round_trips_its_content(s in "[a-zA-Z0-9 ]{0,40}") {
            let src = format!("\"{s}\"");
            prop_assert_eq!(tokens(&src), vec![Token::String(s)]);
        }

        /// §8's "the core" has no property named for the tokenizer alone,
        /// but every higher-level property (reader, writer) assumes the
        /// tokenizer itself never panics or loops forever on malformed
        /// input — it either produces a token or a `LexError`.
        #[test]
        fn tokenizing_arbitrary_ascii_terminates_without_panicking(s in "[ -~]{0,60}") {
            let mut lexer = Lexer::new(&s);
            let mut steps = 0;
            loop {
                steps += 1;
                prop_assert!(steps < 1_000, "tokenizer made no progress within 1000 steps");
                match lexer.next_token() {
                    Ok((tok, _)) if tok.is_eof() => break,
                    Ok(_) => continue,
                    Err(_) => break,
                }
            }
        }
    }
}
