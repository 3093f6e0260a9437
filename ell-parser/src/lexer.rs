// ell-parser - Lexer for Ell
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexer (tokeniser) for Ell source code.
//!
//! Converts a source string into a stream of tokens. Atoms are read as one
//! run of constituent characters and then classified:
//!
//! - anything `f64` accepts (after a leading digit, sign or dot) is a number
//! - `name:` is a keyword
//! - `<name>` is a type tag
//! - `null`, `true` and `false` are literals
//! - everything else is a symbol
//!
//! Commas are whitespace, and a colon directly after a string literal is
//! skipped, so JSON objects read as structs with string keys.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Reader macros
    Quote,         // '
    Backquote,     // `
    Unquote,       // ~
    UnquoteSplice, // ~@

    // Literals
    Null,
    True,
    False,
    Number(f64),
    Char(char),
    String(String),
    Symbol(String),
    /// Keyword name without the trailing colon.
    Keyword(String),
    /// Type name without the angle brackets.
    Type(String),

    Eof,
}

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {line}:{column}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// The lexer converts source code into tokens.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace_and_comments();

        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        let simple = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '\'' => Some(Token::Quote),
            '`' => Some(Token::Backquote),
            _ => None,
        };
        if let Some(token) = simple {
            self.advance();
            return Ok(token);
        }

        match c {
            '~' => {
                self.advance();
                if self.peek() == Some('@') {
                    self.advance();
                    Ok(Token::UnquoteSplice)
                } else {
                    Ok(Token::Unquote)
                }
            }
            '"' => self.read_string(),
            '#' => self.read_char(),
            _ if is_constituent(c) => self.read_atom(),
            _ => Err(self.error(format!("Unexpected character: '{}'", c))),
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if matches!(token, Token::Eof) {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Current line number (1-indexed).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Current column number (1-indexed).
    pub fn column(&self) -> usize {
        self.column
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        c
    }

    fn error(&self, message: String) -> LexerError {
        LexerError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == ',' => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string(&mut self) -> Result<Token, LexerError> {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string".to_string())),
                Some('"') => break,
                Some('\\') => {
                    let escaped = self
                        .advance()
                        .ok_or_else(|| self.error("Unterminated string escape".to_string()))?;
                    s.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '"' => '"',
                        '\\' => '\\',
                        '/' => '/',
                        other => {
                            return Err(self.error(format!("Unknown string escape: \\{}", other)));
                        }
                    });
                }
                Some(c) => s.push(c),
            }
        }
        if self.peek() == Some(':') {
            self.advance();
        }
        Ok(Token::String(s))
    }

    fn read_char(&mut self) -> Result<Token, LexerError> {
        self.advance(); // #
        if self.advance() != Some('\\') {
            return Err(self.error("Expected \\ after #".to_string()));
        }
        let first = self
            .advance()
            .ok_or_else(|| self.error("Expected character after #\\".to_string()))?;
        if !first.is_ascii_alphabetic() {
            return Ok(Token::Char(first));
        }

        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match name.as_str() {
            "newline" => Ok(Token::Char('\n')),
            "space" => Ok(Token::Char(' ')),
            "tab" => Ok(Token::Char('\t')),
            "return" => Ok(Token::Char('\r')),
            _ if name.chars().count() == 1 => Ok(Token::Char(first)),
            _ => Err(self.error(format!("Unknown character name: #\\{}", name))),
        }
    }

    fn read_atom(&mut self) -> Result<Token, LexerError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if is_constituent(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        classify_atom(&text).ok_or_else(|| self.error(format!("Malformed atom: {}", text)))
    }
}

/// Classify a run of constituent characters.
fn classify_atom(text: &str) -> Option<Token> {
    match text {
        "null" => return Some(Token::Null),
        "true" => return Some(Token::True),
        "false" => return Some(Token::False),
        _ => {}
    }
    if looks_numeric(text) {
        return text.parse::<f64>().ok().map(Token::Number);
    }
    if let Some(name) = text.strip_suffix(':') {
        if name.is_empty() || name.contains(':') {
            return None;
        }
        return Some(Token::Keyword(name.to_string()));
    }
    if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>'))
        && !inner.is_empty()
        && inner.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Some(Token::Type(inner.to_string()));
    }
    if text.contains(':') {
        return None;
    }
    Some(Token::Symbol(text.to_string()))
}

/// True when `text` must be read as a number rather than a symbol.
fn looks_numeric(text: &str) -> bool {
    let body = text
        .strip_prefix('-')
        .or_else(|| text.strip_prefix('+'))
        .unwrap_or(text);
    let body = body.strip_prefix('.').unwrap_or(body);
    body.starts_with(|c: char| c.is_ascii_digit())
}

/// Characters that make up atoms.
fn is_constituent(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '!' | '$' | '%' | '&' | '*' | '+' | '-' | '.' | '/' | '<' | '=' | '>' | '?' | '_'
                | ':' | '^' | '|' | '@'
        )
}

// ============================================================================
// Tests
// ============================================================================
