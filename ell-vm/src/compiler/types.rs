// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared types for the bytecode compiler.

use ell_parser::Symbol;

/// The compile-time lexical environment: one symbol list per enclosing
/// function, innermost first. Mirrors the runtime chain of frames linked by
/// `locals`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    frames: Vec<Vec<Symbol>>,
}

impl Scope {
    /// The empty (top-level) scope.
    pub fn new() -> Self {
        Scope { frames: Vec::new() }
    }

    /// A scope with `names` as the innermost frame.
    pub fn extend(&self, names: Vec<Symbol>) -> Scope {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(names);
        frames.extend(self.frames.iter().cloned());
        Scope { frames }
    }

    /// Resolve `name` to `(depth, slot)`, or `None` for a global.
    pub fn resolve(&self, name: &Symbol) -> Option<(usize, usize)> {
        self.frames.iter().enumerate().find_map(|(depth, names)| {
            names
                .iter()
                .position(|n| n == name)
                .map(|slot| (depth, slot))
        })
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Where an expression's value goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// The value is the enclosing function's result: follow with a return.
    pub tail: bool,
    /// The value is unused: pop it.
    pub ignore: bool,
}

impl Context {
    /// Value stays on the stack for further computation.
    pub const VALUE: Context = Context {
        tail: false,
        ignore: false,
    };
    /// Value is the function result.
    pub const TAIL: Context = Context {
        tail: true,
        ignore: false,
    };
    /// Value is discarded.
    pub const IGNORE: Context = Context {
        tail: false,
        ignore: true,
    };
}
