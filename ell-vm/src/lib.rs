// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler and stack-based virtual machine for Ell.
//!
//! Source forms are macro-expanded, compiled to [`ell_parser::Code`] objects
//! holding a flat `i32` instruction array, and executed by the [`Vm`]. The
//! VM supports proper tail calls, first-class re-entrant continuations,
//! threads and channels. [`Runtime`] ties the pipeline together.

pub mod assembler;
pub mod compiler;
pub mod error;
pub mod globals;
pub mod interrupt;
pub mod macros;
pub mod module;
pub mod opcode;
pub mod options;
pub mod pool;
pub mod primitives;
pub mod runtime;
pub mod vm;

pub use assembler::{assemble, decompile};
pub use compiler::Compiler;
pub use error::{Error, Result};
pub use interrupt::{check_for_interrupt, clear_interrupt, interrupt_flag, request_interrupt};
pub use opcode::OpCode;
pub use options::Options;
pub use runtime::Runtime;
pub use vm::Vm;
