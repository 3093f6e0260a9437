// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Errors raised by the compiler, the expander and the VM.
//!
//! Almost every error is an [`ErrorValue`]: a first-class value keyed by a
//! keyword from the taxonomy in [`error_keys`], so user code can inspect it
//! with `error-key` and `error-data`. Only corrupted bytecode produces
//! [`Error::Internal`].

use ell_parser::value::error_keys;
use ell_parser::{ErrorValue, Keyword, ParseError, Value};
use thiserror::Error;

/// Error from compiling or running Ell code.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A keyword-keyed error value.
    #[error("{0}")]
    Value(ErrorValue),
    /// An internal invariant was violated (corrupted bytecode).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for compiler and VM operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn keyed(key: &str, message: impl AsRef<str>) -> Self {
        Error::Value(ErrorValue::with_message(key, message))
    }

    /// Arity or type mismatch.
    pub fn argument(message: impl AsRef<str>) -> Self {
        Error::keyed(error_keys::ARGUMENT, message)
    }

    /// Malformed special form or assembly; carries the offending form.
    pub fn syntax(message: impl AsRef<str>, form: &Value) -> Self {
        Error::Value(ErrorValue::new(
            Keyword::new(error_keys::SYNTAX),
            vec![Value::string(message.as_ref()), form.clone()],
        ))
    }

    /// Bad macro shape, macro used as a value, misplaced unquote.
    pub fn macro_error(message: impl AsRef<str>) -> Self {
        Error::keyed(error_keys::MACRO, message)
    }

    /// File or module not found or unreadable.
    pub fn io(message: impl AsRef<str>) -> Self {
        Error::keyed(error_keys::IO, message)
    }

    /// Cancellation requested by an interrupt signal.
    pub fn interrupt() -> Self {
        Error::keyed(error_keys::INTERRUPT, "interrupted")
    }

    /// Anything else.
    pub fn generic(message: impl AsRef<str>) -> Self {
        Error::keyed(error_keys::GENERIC, message)
    }

    /// Interrupts bypass `*top-handler*`.
    pub fn is_interrupt(&self) -> bool {
        self.is(error_keys::INTERRUPT)
    }

    /// True when this is an error value keyed by `key`.
    pub fn is(&self, key: &str) -> bool {
        matches!(self, Error::Value(e) if e.is(key))
    }

    /// The error key, if this is an error value.
    pub fn key(&self) -> Option<&Keyword> {
        match self {
            Error::Value(e) => Some(e.key()),
            Error::Internal(_) => None,
        }
    }

    /// The error as an [`ErrorValue`], for primitives that run Ell code.
    pub fn into_error_value(self) -> ErrorValue {
        match self {
            Error::Value(e) => e,
            Error::Internal(msg) => ErrorValue::with_message(error_keys::GENERIC, msg),
        }
    }

    /// The error as a first-class value.
    pub fn to_value(&self) -> Value {
        match self {
            Error::Value(e) => Value::Error(e.clone()),
            Error::Internal(msg) => Value::error(error_keys::GENERIC, msg),
        }
    }
}

impl From<ErrorValue> for Error {
    fn from(e: ErrorValue) -> Self {
        Error::Value(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Value(ErrorValue::new(
            Keyword::new(error_keys::SYNTAX),
            vec![
                Value::string(&e.message),
                Value::Number(e.line as f64),
                Value::Number(e.column as f64),
            ],
        ))
    }
}
