// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime configuration.

use std::path::PathBuf;

/// Default number of value stack slots per VM.
pub const DEFAULT_STACK_SIZE: usize = 100_000;

/// Flags that control compilation and execution.
#[derive(Debug, Clone)]
pub struct Options {
    /// Enable the `inc`/`dec` peephole and the uninstrumented loop.
    pub optimize: bool,
    /// Log each top-level evaluation.
    pub verbose: bool,
    /// Log every executed instruction with a stack dump.
    pub trace: bool,
    /// Log the failing function and pc when an error escapes.
    pub debug: bool,
    /// Make `set!` of an undefined global an error instead of a definition.
    pub strict_set: bool,
    /// Directories searched by `use`.
    pub module_path: Vec<PathBuf>,
    /// Value stack slots.
    pub stack_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            optimize: false,
            verbose: false,
            trace: false,
            debug: false,
            strict_set: false,
            module_path: vec![PathBuf::from(".")],
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl Options {
    /// Whether execution uses the instrumented loop. The fast loop is used
    /// only for optimized runs with verbose and trace both off.
    pub fn instrumented(&self) -> bool {
        !self.optimize || self.verbose || self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selection() {
        let mut options = Options::default();
        assert!(options.instrumented());
        options.optimize = true;
        assert!(!options.instrumented());
        options.trace = true;
        assert!(options.instrumented());
    }
}
