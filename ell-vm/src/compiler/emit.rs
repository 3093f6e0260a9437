// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode emission.
//!
//! The `Emitter` trait appends instructions to a [`Code`] under
//! construction. Pool operands are interned here, so callers deal in values
//! rather than indices. Forward jumps are emitted with a placeholder offset
//! and backpatched once the target is known.

use std::sync::Arc;

use ell_parser::{Code, Symbol, Value};

use crate::opcode::OpCode;
use crate::pool;

/// Trait for types that can emit bytecode.
pub trait Emitter {
    fn emit_op(&mut self, op: OpCode);
    fn emit_op1(&mut self, op: OpCode, operand: i32);
    fn emit_op2(&mut self, op: OpCode, a: i32, b: i32);

    /// Emit a jump with a placeholder offset; returns the operand position
    /// to hand to `set_jump_location`.
    fn emit_jump(&mut self, op: OpCode) -> usize;

    /// Point the jump whose operand sits at `loc` at the current end of
    /// code.
    fn set_jump_location(&mut self, loc: usize);

    fn emit_pool_op(&mut self, op: OpCode, value: Value) {
        let idx = pool::intern(value);
        self.emit_op1(op, idx as i32);
    }

    fn emit_literal(&mut self, value: Value) {
        self.emit_pool_op(OpCode::Literal, value);
    }

    fn emit_global(&mut self, name: &Symbol) {
        self.emit_pool_op(OpCode::Global, Value::Symbol(name.clone()));
    }

    fn emit_closure(&mut self, code: Code) {
        self.emit_pool_op(OpCode::Closure, Value::Code(Arc::new(code)));
    }

    fn emit_local(&mut self, depth: usize, slot: usize) {
        self.emit_op2(OpCode::Local, depth as i32, slot as i32);
    }

    fn emit_set_local(&mut self, depth: usize, slot: usize) {
        self.emit_op2(OpCode::SetLocal, depth as i32, slot as i32);
    }

    fn emit_call(&mut self, argc: usize, tail: bool) {
        let op = if tail { OpCode::TailCall } else { OpCode::Call };
        self.emit_op1(op, argc as i32);
    }

    fn emit_return(&mut self) {
        self.emit_op(OpCode::Return);
    }

    fn emit_pop(&mut self) {
        self.emit_op(OpCode::Pop);
    }
}

impl Emitter for Code {
    fn emit_op(&mut self, op: OpCode) {
        self.push_word(op as i32);
    }

    fn emit_op1(&mut self, op: OpCode, operand: i32) {
        self.push_word(op as i32);
        self.push_word(operand);
    }

    fn emit_op2(&mut self, op: OpCode, a: i32, b: i32) {
        self.push_word(op as i32);
        self.push_word(a);
        self.push_word(b);
    }

    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.push_word(op as i32);
        self.push_word(0);
        self.ops.len() - 1
    }

    fn set_jump_location(&mut self, loc: usize) {
        let offset = self.ops.len() - (loc + 1);
        self.set_word(loc, offset as i32);
    }
}
