// ell-parser - Value model and reader for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # ell-parser
//!
//! The data model shared by every part of Ell: the `Value` sum type, interned
//! names, compiled `Code` objects, activation `Frame`s, callable `Function`s
//! and `Channel`s. Also the lexer and reader that turn source text into
//! `Value` forms.

pub mod channel;
pub mod code;
pub mod frame;
pub mod function;
pub mod keyword;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod type_tag;
pub mod value;

pub use channel::{Channel, Timeout};
pub use code::Code;
pub use frame::{Frame, Slots};
pub use function::{Continuation, Function, Primitive, PrimitiveFn, Resume};
pub use keyword::Keyword;
pub use lexer::{Lexer, LexerError};
pub use parser::{ParseError, Parser, read, read_all};
pub use symbol::Symbol;
pub use type_tag::TypeTag;
pub use value::{EPSILON, ErrorValue, List, StructKey, Struct, Value, Vector, error_keys};
