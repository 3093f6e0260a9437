// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler: transforms expanded Ell forms into [`Code`].
//!
//! Compilation is a single pass. Lexical variables resolve to
//! `(depth, slot)` addresses at compile time; anything unresolved becomes a
//! global lookup performed at run time.
//!
//! [`Code`]: ell_parser::Code

pub mod codegen;
pub mod emit;
pub mod params;
pub mod types;

pub use codegen::Compiler;
pub use emit::Emitter;
pub use params::{Params, parse_params};
pub use types::{Context, Scope};
