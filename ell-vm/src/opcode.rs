// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode instruction definitions.
//!
//! Code is a flat `Vec<i32>`: an opcode word followed by 0, 1 or 2 operand
//! words. Jump offsets are relative to the word immediately after the
//! operand.

/// Bytecode instructions for the Ell VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum OpCode {
    /// Push constant `pool[n]`.
    Literal = 1,
    /// Push slot `s` of the frame `d` lexical links out.
    Local = 2,
    /// Pop; jump by `off` if the value is false or null.
    JumpFalse = 3,
    /// Jump by `off`.
    Jump = 4,
    /// Call with `n` arguments, replacing the current frame.
    TailCall = 5,
    /// Call with `n` arguments.
    Call = 6,
    /// Return top of stack to the caller.
    Return = 7,
    /// Push a closure over code `pool[n]` and the current frame.
    Closure = 8,
    Pop = 9,
    /// Push the global named by symbol `pool[n]`.
    Global = 10,
    /// Define global `pool[n]` to top of stack; replace top with the name.
    DefGlobal = 11,
    /// Store top of stack into slot `s` of frame `d` out. Does not pop.
    SetLocal = 12,
    /// Load module `pool[n]`; push its name.
    Use = 13,
    /// Register top of stack as the expander for macro `pool[n]`.
    DefMacro = 14,
    /// Remove global `pool[n]`; push the name.
    UndefGlobal = 15,
    /// Collect `n` stack values into a vector.
    Vector = 16,
    /// Collect `n` stack values (key, value, ...) into a struct.
    Struct = 17,
    /// Assign existing global `pool[n]` from top of stack. Does not pop.
    SetGlobal = 18,
    /// Add one to the number on top of the stack.
    Inc = 19,
    /// Subtract one from the number on top of the stack.
    Dec = 20,
}

const ALL: [OpCode; 20] = [
    OpCode::Literal,
    OpCode::Local,
    OpCode::JumpFalse,
    OpCode::Jump,
    OpCode::TailCall,
    OpCode::Call,
    OpCode::Return,
    OpCode::Closure,
    OpCode::Pop,
    OpCode::Global,
    OpCode::DefGlobal,
    OpCode::SetLocal,
    OpCode::Use,
    OpCode::DefMacro,
    OpCode::UndefGlobal,
    OpCode::Vector,
    OpCode::Struct,
    OpCode::SetGlobal,
    OpCode::Inc,
    OpCode::Dec,
];

impl OpCode {
    /// Decode an opcode word.
    #[inline]
    pub fn from_word(word: i32) -> Option<OpCode> {
        if (1..=ALL.len() as i32).contains(&word) {
            Some(ALL[(word - 1) as usize])
        } else {
            None
        }
    }

    /// Look up an opcode by its assembly name.
    pub fn from_name(name: &str) -> Option<OpCode> {
        ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Instruction width in words, opcode included.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            OpCode::Return | OpCode::Pop | OpCode::Inc | OpCode::Dec => 1,
            OpCode::Local | OpCode::SetLocal => 3,
            _ => 2,
        }
    }

    /// Number of operand words.
    #[inline]
    pub fn operands(self) -> usize {
        self.width() - 1
    }

    /// Whether the operand indexes the constant pool.
    pub fn uses_pool(self) -> bool {
        matches!(
            self,
            OpCode::Literal
                | OpCode::Closure
                | OpCode::Global
                | OpCode::DefGlobal
                | OpCode::SetGlobal
                | OpCode::UndefGlobal
                | OpCode::DefMacro
                | OpCode::Use
        )
    }

    /// Whether the operand is a relative jump offset.
    pub fn is_jump(self) -> bool {
        matches!(self, OpCode::Jump | OpCode::JumpFalse)
    }

    /// Assembly name.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Literal => "literal",
            OpCode::Local => "local",
            OpCode::JumpFalse => "jumpfalse",
            OpCode::Jump => "jump",
            OpCode::TailCall => "tailcall",
            OpCode::Call => "call",
            OpCode::Return => "return",
            OpCode::Closure => "closure",
            OpCode::Pop => "pop",
            OpCode::Global => "global",
            OpCode::DefGlobal => "defglobal",
            OpCode::SetLocal => "setlocal",
            OpCode::Use => "use",
            OpCode::DefMacro => "defmacro",
            OpCode::UndefGlobal => "undefglobal",
            OpCode::Vector => "vector",
            OpCode::Struct => "struct",
            OpCode::SetGlobal => "setglobal",
            OpCode::Inc => "inc",
            OpCode::Dec => "dec",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
