// ell-parser - Parser for Ell
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Recursive descent reader for Ell source code.
//!
//! Converts tokens into `Value` trees. Vector and struct literals are read
//! as aggregates whose elements are unevaluated forms; the compiler decides
//! what they evaluate to.

use thiserror::Error;

use crate::keyword::Keyword;
use crate::lexer::{Lexer, LexerError, Token};
use crate::type_tag::TypeTag;
use crate::value::{List, StructKey, Value};

/// Reader error with position information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<LexerError> for ParseError {
    fn from(e: LexerError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
            column: e.column,
        }
    }
}

/// The parser converts tokens into `Value` forms.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let line = lexer.line();
        let column = lexer.column();
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            line,
            column,
        })
    }

    /// Parse a single form. Returns None at end of input.
    pub fn parse(&mut self) -> Result<Option<Value>, ParseError> {
        if matches!(self.current, Token::Eof) {
            return Ok(None);
        }
        self.parse_form().map(Some)
    }

    /// Parse all remaining forms.
    pub fn parse_all(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut forms = Vec::new();
        while let Some(form) = self.parse()? {
            forms.push(form);
        }
        Ok(forms)
    }

    /// Parse a string and return the first form.
    pub fn parse_str(source: &str) -> Result<Option<Value>, ParseError> {
        Parser::new(source)?.parse()
    }

    /// Parse a string and return all forms.
    pub fn parse_all_str(source: &str) -> Result<Vec<Value>, ParseError> {
        Parser::new(source)?.parse_all()
    }

    // ========================================================================
    // Internal parsing methods
    // ========================================================================

    fn advance(&mut self) -> Result<Token, ParseError> {
        let prev = std::mem::replace(&mut self.current, Token::Eof);
        self.line = self.lexer.line();
        self.column = self.lexer.column();
        self.current = self.lexer.next_token()?;
        Ok(prev)
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn parse_form(&mut self) -> Result<Value, ParseError> {
        let token = self.advance()?;
        match token {
            Token::LParen => Ok(Value::List(List::from(self.parse_until(&Token::RParen)?))),
            Token::LBracket => Ok(Value::vector(self.parse_until(&Token::RBracket)?)),
            Token::LBrace => self.parse_struct(),
            Token::RParen | Token::RBracket | Token::RBrace => {
                Err(self.error(format!("Unexpected closing delimiter: {:?}", token)))
            }
            Token::Quote => self.parse_wrapped("quote"),
            Token::Backquote => self.parse_wrapped("quasiquote"),
            Token::Unquote => self.parse_wrapped("unquote"),
            Token::UnquoteSplice => self.parse_wrapped("unquote-splicing"),
            Token::Null => Ok(Value::Null),
            Token::True => Ok(Value::Boolean(true)),
            Token::False => Ok(Value::Boolean(false)),
            Token::Number(n) => Ok(Value::Number(n)),
            Token::Char(c) => Ok(Value::Character(c)),
            Token::String(s) => Ok(Value::string(&s)),
            Token::Symbol(s) => Ok(Value::symbol(&s)),
            Token::Keyword(k) => Ok(Value::Keyword(Keyword::new(&k))),
            Token::Type(t) => Ok(Value::Type(TypeTag::new(&t))),
            Token::Eof => Err(self.error("Unexpected end of input".to_string())),
        }
    }

    fn parse_until(&mut self, close: &Token) -> Result<Vec<Value>, ParseError> {
        let mut items = Vec::new();
        loop {
            if &self.current == close {
                self.advance()?;
                return Ok(items);
            }
            if matches!(self.current, Token::Eof) {
                return Err(self.error(format!("Unterminated form, expected {:?}", close)));
            }
            items.push(self.parse_form()?);
        }
    }

    fn parse_struct(&mut self) -> Result<Value, ParseError> {
        let items = self.parse_until(&Token::RBrace)?;
        if items.len() % 2 != 0 {
            return Err(self.error("Struct literal needs an even number of forms".to_string()));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            let key = StructKey::from_value(&key)
                .ok_or_else(|| self.error(format!("Invalid struct key: {}", key)))?;
            pairs.push((key, value));
        }
        Ok(Value::structure(pairs))
    }

    fn parse_wrapped(&mut self, name: &str) -> Result<Value, ParseError> {
        if matches!(self.current, Token::Eof) {
            return Err(self.error(format!("Expected form after {}", name)));
        }
        let form = self.parse_form()?;
        Ok(Value::list(vec![Value::symbol(name), form]))
    }
}

/// Read the first form from `source`.
pub fn read(source: &str) -> Result<Option<Value>, ParseError> {
    Parser::parse_str(source)
}

/// Read every form from `source`.
pub fn read_all(source: &str) -> Result<Vec<Value>, ParseError> {
    Parser::parse_all_str(source)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        Parser::parse_str(s).unwrap().unwrap()
    }

    #[test]
    fn test_atoms() {
        assert_eq!(parse("null"), Value::Null);
        assert_eq!(parse("true"), Value::Boolean(true));
        assert_eq!(parse("42"), Value::Number(42.0));
        assert_eq!(parse("\"hi\""), Value::string("hi"));
        assert_eq!(parse("foo"), Value::symbol("foo"));
        assert_eq!(parse("foo:"), Value::keyword("foo"));
        assert_eq!(parse("<number>"), Value::Type(TypeTag::number()));
        assert_eq!(parse(r"#\x"), Value::Character('x'));
    }

    #[test]
    fn test_empty_list() {
        let v = parse("()");
        assert_eq!(v, Value::empty_list());
        assert_ne!(v, Value::Null);
    }

    #[test]
    fn test_nested() {
        let v = parse("(a [1 2] (b))");
        assert_eq!(v.to_string(), "(a [1 2] (b))");
    }

    #[test]
    fn test_struct_literal() {
        let v = parse("{x: 1 \"y\" (+ 1 2)}");
        let Value::Struct(s) = &v else {
            panic!("expected struct, got {}", v);
        };
        assert_eq!(s.len(), 2);
        let key = StructKey::Keyword(Keyword::new("x"));
        assert_eq!(s.get(&key), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_struct_literal_errors() {
        assert!(Parser::parse_str("{x: 1 y:}").is_err());
        assert!(Parser::parse_str("{1 2}").is_err());
    }

    #[test]
    fn test_quote_forms() {
        assert_eq!(parse("'x").to_string(), "(quote x)");
        assert_eq!(parse("`(a ~b ~@c)").to_string(),
            "(quasiquote (a (unquote b) (unquote-splicing c)))");
    }

    #[test]
    fn test_parse_all() {
        let forms = Parser::parse_all_str("(def x 1) x ; trailing comment\n").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_errors_carry_position() {
        let err = Parser::parse_all_str("(a\n  (b").unwrap_err();
        assert_eq!(err.line, 2);
        let err = Parser::parse_str(")").unwrap_err();
        assert!(err.message.contains("closing"));
    }

    #[test]
    fn test_end_of_input() {
        assert_eq!(Parser::parse_str("   ; only a comment").unwrap(), None);
    }
}
