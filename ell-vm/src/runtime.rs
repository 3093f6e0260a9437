// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The embedding entry point: read, expand, compile and execute.

use std::path::Path;
use std::sync::Arc;

use ell_parser::{Frame, Parser, Symbol, Value};

use crate::compiler::Compiler;
use crate::error::{Error, Result};
use crate::globals;
use crate::macros;
use crate::options::Options;
use crate::vm::Vm;

/// An Ell evaluator.
///
/// Globals, macros and the constant pool are process-wide, so definitions
/// made through one `Runtime` are visible to every other. Each `Runtime`
/// owns its own VM and value stack.
///
/// # Example
///
/// ```rust
/// use ell_vm::{Options, Runtime};
///
/// let mut runtime = Runtime::new(Options::default());
/// let result = runtime.eval_str("(def sq (fn (x) (* x x))) (sq 7)").unwrap();
/// assert_eq!(result.to_string(), "49");
/// ```
pub struct Runtime {
    vm: Vm,
    compiler: Compiler,
}

impl Runtime {
    pub fn new(options: Options) -> Self {
        let compiler = Compiler::new(options.optimize);
        Runtime {
            vm: Vm::new(options),
            compiler,
        }
    }

    pub fn options(&self) -> &Options {
        self.vm.options()
    }

    /// The underlying VM.
    pub fn vm(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Evaluate every form in `source`, returning the last value.
    ///
    /// Forms are read one at a time, so a macro defined by one form is
    /// available to the next. An error stops evaluation; earlier forms keep
    /// their effects.
    pub fn eval_str(&mut self, source: &str) -> Result<Value> {
        let mut parser = Parser::new(source)?;
        let mut result = Value::Null;
        while let Some(form) = parser.parse()? {
            result = self.eval(&form)?;
        }
        Ok(result)
    }

    /// Expand, compile and execute one form.
    pub fn eval(&mut self, form: &Value) -> Result<Value> {
        if self.vm.options().verbose {
            tracing::debug!(form = %form, "eval");
        }
        let expanded = macros::expand(&mut self.vm, form)?;
        let code = self.compiler.compile(&expanded)?;
        self.vm.exec(Arc::new(code), Frame::root())
    }

    /// Evaluate a source file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("cannot read {}: {}", path.display(), e)))?;
        self.eval_str(&source)
    }

    /// Call a function value.
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Value> {
        self.vm.call(function, args)
    }

    /// The value of global `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        globals::lookup(&Symbol::new(name))
    }

    /// Bind global `name`.
    pub fn define(&self, name: &str, value: Value) {
        globals::define(Symbol::new(name), value);
    }
}
