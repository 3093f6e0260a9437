// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Stack-based virtual machine for executing Ell bytecode.
//!
//! Execution state is a triple of code, program counter and frame. A call
//! to a closure pushes a new frame whose `previous` link records the caller
//! together with the code and pc to resume. A tail call builds its frame
//! from the *current* frame's return linkage instead, so the current frame
//! is dropped. A self tail call reuses the current frame outright.
//!
//! Two loops share one instruction implementation: `run::<false>` is the
//! fast path; `run::<true>` adds interrupt checks at tail calls and returns
//! plus per-instruction tracing. The choice is made once per execution.

pub mod call;
pub mod stack;
pub mod trace;

use std::sync::Arc;

use ell_parser::{
    Code, Continuation, Frame, Function, Resume, StructKey, Struct, Symbol, Value,
};

use crate::error::{Error, Result};
use crate::globals::{self, TOP_HANDLER};
use crate::interrupt;
use crate::module;
use crate::opcode::OpCode;
use crate::options::Options;
use crate::pool;
use crate::primitives;

pub use call::bind_arguments;
pub use stack::ValueStack;

/// What the loop does after an instruction.
enum Flow {
    Continue,
    Exit(Value),
}

/// The registers of the machine.
struct State {
    code: Arc<Code>,
    pc: usize,
    env: Arc<Frame>,
}

/// The Ell virtual machine.
pub struct Vm {
    options: Options,
    stack: ValueStack,
    /// Stack pointer when the current execution started.
    base: usize,
    /// Set while `*top-handler*` runs, so its own errors propagate.
    handling_error: bool,
    frames_allocated: u64,
}

impl Vm {
    /// Create a VM with its own value stack.
    pub fn new(options: Options) -> Self {
        primitives::install();
        let stack = ValueStack::new(options.stack_size);
        let base = stack.sp();
        Vm {
            options,
            stack,
            base,
            handling_error: false,
            frames_allocated: 0,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Frames created for closure calls so far. Self tail calls reuse
    /// their frame and do not count.
    pub fn frames_allocated(&self) -> u64 {
        self.frames_allocated
    }

    /// Run `code` in `frame` until it returns.
    pub fn exec(&mut self, code: Arc<Code>, frame: Arc<Frame>) -> Result<Value> {
        self.execute_with(code, frame, &[])
    }

    /// Call `function` with `args`.
    pub fn call(&mut self, function: &Value, args: &[Value]) -> Result<Value> {
        let mut trampoline = Code::new("", 0, None, None);
        trampoline.push_word(OpCode::Call as i32);
        trampoline.push_word(args.len() as i32);
        trampoline.push_word(OpCode::Return as i32);

        let mut initial = Vec::with_capacity(args.len() + 1);
        initial.push(function.clone());
        initial.extend_from_slice(args);
        self.execute_with(Arc::new(trampoline), Frame::root(), &initial)
    }

    /// Execute with `initial` (topmost first) pushed on the stack.
    fn execute_with(
        &mut self,
        code: Arc<Code>,
        frame: Arc<Frame>,
        initial: &[Value],
    ) -> Result<Value> {
        let saved_base = self.base;
        let saved_handling = self.handling_error;
        self.base = self.stack.sp();
        self.handling_error = false;

        let result = self.push_all(initial).and_then(|()| {
            let mut state = State { code, pc: 0, env: frame };
            if self.options.instrumented() {
                self.run::<true>(&mut state)
            } else {
                self.run::<false>(&mut state)
            }
        });

        self.stack.reset(self.base);
        self.base = saved_base;
        self.handling_error = saved_handling;
        result
    }

    fn push_all(&mut self, values: &[Value]) -> Result<()> {
        for value in values.iter().rev() {
            self.stack.push(value.clone())?;
        }
        Ok(())
    }

    fn run<const INSTRUMENTED: bool>(&mut self, state: &mut State) -> Result<Value> {
        loop {
            match self.step::<INSTRUMENTED>(state) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(value)) => return Ok(value),
                Err(err) => {
                    if self.options.debug {
                        tracing::debug!(
                            function = %trace::function_name(&state.code),
                            pc = state.pc,
                            error = %err,
                            "error during execution"
                        );
                    }
                    self.handle_error(err, state)?;
                }
            }
        }
    }

    /// Transfer control to `*top-handler*` when it is a one-argument
    /// closure. Interrupts, internal errors and errors raised by the
    /// handler itself propagate.
    fn handle_error(&mut self, err: Error, state: &mut State) -> Result<()> {
        if !matches!(err, Error::Value(_)) || err.is_interrupt() || self.handling_error {
            return Err(err);
        }
        let Some(Value::Function(handler)) = globals::lookup(&Symbol::new(TOP_HANDLER)) else {
            return Err(err);
        };
        let Function::Closure { code, frame } = &*handler else {
            return Err(err);
        };
        if !code.is_fixed_arity() || code.argc != 1 {
            return Err(err);
        }

        self.stack.reset(self.base);
        self.handling_error = true;
        let mut elements = ell_parser::Slots::new();
        elements.push(err.to_value());
        state.env = Frame::activation(
            Arc::clone(frame),
            None,
            Arc::clone(code),
            None,
            0,
            elements,
        );
        self.frames_allocated += 1;
        state.code = Arc::clone(code);
        state.pc = 0;
        Ok(())
    }

    #[inline]
    fn step<const INSTRUMENTED: bool>(&mut self, state: &mut State) -> Result<Flow> {
        let pc = state.pc;
        let op = state
            .code
            .ops
            .get(pc)
            .and_then(|w| OpCode::from_word(*w))
            .ok_or_else(|| {
                Error::Internal(format!("bad instruction at {} in {}", pc, state.code))
            })?;
        if INSTRUMENTED && self.options.trace {
            trace::instruction(&state.code, pc, self.stack.top(usize::MAX), self.stack.depth());
        }
        state.pc += op.width();

        match op {
            OpCode::Literal => {
                let value = constant(operand(state, pc, 1)?)?;
                self.stack.push(value)?;
            }
            OpCode::Local => {
                let frame = lexical_frame(state, pc)?;
                let slot = operand(state, pc, 2)?;
                let value = frame
                    .get(slot)
                    .ok_or_else(|| Error::Internal(format!("no local slot {}", slot)))?;
                self.stack.push(value)?;
            }
            OpCode::SetLocal => {
                let frame = lexical_frame(state, pc)?;
                let slot = operand(state, pc, 2)?;
                if !frame.set(slot, self.stack.peek()?.clone()) {
                    return Err(Error::Internal(format!("no local slot {}", slot)));
                }
            }
            OpCode::JumpFalse => {
                let value = self.stack.pop()?;
                if !value.is_truthy() {
                    jump(state, pc)?;
                }
            }
            OpCode::Jump => jump(state, pc)?,
            OpCode::Call => {
                let argc = operand(state, pc, 1)?;
                return self.call_value::<INSTRUMENTED>(state, argc, false);
            }
            OpCode::TailCall => {
                if INSTRUMENTED {
                    interrupt::check_for_interrupt()?;
                }
                let argc = operand(state, pc, 1)?;
                return self.call_value::<INSTRUMENTED>(state, argc, true);
            }
            OpCode::Return => {
                if INSTRUMENTED {
                    interrupt::check_for_interrupt()?;
                }
                return self.return_to_caller(state);
            }
            OpCode::Closure => match constant(operand(state, pc, 1)?)? {
                Value::Code(code) => {
                    self.stack
                        .push(Function::closure(code, Arc::clone(&state.env)))?;
                }
                other => return Err(Error::Internal(format!("closure over {}", other))),
            },
            OpCode::Pop => {
                self.stack.pop()?;
            }
            OpCode::Global => {
                let name = symbol_operand(state, pc)?;
                let value = match globals::lookup(&name) {
                    Some(value) => value,
                    None if globals::is_macro(&name) => {
                        return Err(Error::macro_error(format!(
                            "macro used as a value: {}",
                            name
                        )));
                    }
                    None => {
                        return Err(Error::generic(format!("undefined variable: {}", name)));
                    }
                };
                self.stack.push(value)?;
            }
            OpCode::DefGlobal => {
                let name = symbol_operand(state, pc)?;
                globals::define(name.clone(), self.stack.peek()?.clone());
                self.stack.set_top(Value::Symbol(name))?;
            }
            OpCode::SetGlobal => {
                let name = symbol_operand(state, pc)?;
                let value = self.stack.peek()?.clone();
                if !globals::assign(&name, value.clone()) {
                    if self.options.strict_set {
                        return Err(Error::generic(format!("undefined variable: {}", name)));
                    }
                    tracing::warn!(name = %name, "set! of undefined global defines it");
                    globals::define(name, value);
                }
            }
            OpCode::UndefGlobal => {
                let name = symbol_operand(state, pc)?;
                globals::undefine(&name);
                self.stack.push(Value::Symbol(name))?;
            }
            OpCode::DefMacro => {
                let name = symbol_operand(state, pc)?;
                globals::define_macro(name.clone(), self.stack.peek()?.clone());
                self.stack.set_top(Value::Symbol(name))?;
            }
            OpCode::Use => {
                let name = symbol_operand(state, pc)?;
                module::load(&name, &self.options)?;
                self.stack.push(Value::Symbol(name))?;
            }
            OpCode::Vector => {
                let n = operand(state, pc, 1)?;
                let items = self.stack.take_n(n)?;
                self.stack.push(Value::vector(items))?;
            }
            OpCode::Struct => {
                let n = operand(state, pc, 1)?;
                let items = self.stack.take_n(n)?;
                let mut pairs = Vec::with_capacity(n / 2);
                for pair in items.chunks_exact(2) {
                    let key = StructKey::from_value(&pair[0]).ok_or_else(|| {
                        Error::argument(format!("bad struct key: {}", pair[0]))
                    })?;
                    pairs.push((key, pair[1].clone()));
                }
                self.stack.push(Value::Struct(Struct::from_pairs(pairs)))?;
            }
            OpCode::Inc | OpCode::Dec => {
                let value = self.stack.pop()?;
                let Value::Number(n) = value else {
                    return Err(Error::argument(format!(
                        "{} expected <number>, got {}",
                        op, value
                    )));
                };
                let delta = if op == OpCode::Inc { 1.0 } else { -1.0 };
                self.stack.push(Value::Number(n + delta))?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Leave the current frame; the result stays on top of the stack.
    fn return_to_caller(&mut self, state: &mut State) -> Result<Flow> {
        let Some(previous) = state.env.previous.clone() else {
            return Ok(Flow::Exit(self.stack.pop()?));
        };
        let ops = state
            .env
            .ops
            .clone()
            .ok_or_else(|| Error::Internal("frame has a caller but no return code".into()))?;
        state.pc = state.env.pc;
        state.code = ops;
        state.env = previous;
        Ok(Flow::Continue)
    }

    /// Call the function on top of the stack with the `argc` values below
    /// it as arguments.
    fn call_value<const INSTRUMENTED: bool>(
        &mut self,
        state: &mut State,
        mut argc: usize,
        tail: bool,
    ) -> Result<Flow> {
        let mut callee = self.stack.pop()?;
        loop {
            let function = match &callee {
                Value::Function(f) => Arc::clone(f),
                Value::Keyword(key) => return self.call_keyword(state, key, argc, tail),
                other => return Err(Error::argument(format!("not a function: {}", other))),
            };
            match &*function {
                Function::Closure { code, frame } => {
                    if INSTRUMENTED && self.options.verbose {
                        tracing::debug!(
                            target: "ell::vm",
                            function = %trace::function_name(code),
                            argc,
                            tail,
                            "call"
                        );
                    }
                    return self.call_closure(state, code, frame, argc, tail);
                }
                Function::Primitive(primitive) => {
                    let result = primitives::invoke(primitive, self.stack.slice(argc)?)?;
                    self.stack.drop_n(argc)?;
                    self.stack.push(result)?;
                    return self.after_value(state, tail);
                }
                Function::Apply => {
                    // (apply f a b '(c d)) becomes (f a b c d)
                    if argc < 2 {
                        return Err(Error::argument(
                            "apply expects a function and an argument list",
                        ));
                    }
                    let mut args = self.stack.take_n(argc)?;
                    let spliced = match args.pop() {
                        Some(Value::List(list)) => list.to_vec(),
                        Some(other) => {
                            return Err(Error::argument(format!(
                                "apply expected <list> as last argument, got {}",
                                other
                            )));
                        }
                        None => Vec::new(),
                    };
                    callee = args.remove(0);
                    args.extend(spliced);
                    argc = args.len();
                    self.push_all(&args)?;
                }
                Function::CallCC => {
                    if argc != 1 {
                        return Err(Error::argument(format!(
                            "callcc expects 1 argument, got {}",
                            argc
                        )));
                    }
                    let receiver = self.stack.pop()?;
                    let continuation = Continuation {
                        resume: resume_point(state, tail),
                        stack: self.stack.segment(self.base),
                        in_handler: self.handling_error,
                    };
                    self.stack.push(Value::Function(Arc::new(Function::Continuation(
                        continuation,
                    ))))?;
                    callee = receiver;
                }
                Function::Continuation(continuation) => {
                    if argc != 1 {
                        return Err(Error::argument(format!(
                            "continuation expects 1 argument, got {}",
                            argc
                        )));
                    }
                    let value = self.stack.pop()?;
                    self.stack.restore(self.base, &continuation.stack)?;
                    // Escaping the handler re-arms it for later errors.
                    self.handling_error = continuation.in_handler;
                    let Some(resume) = &continuation.resume else {
                        return Ok(Flow::Exit(value));
                    };
                    self.stack.push(value)?;
                    state.code = Arc::clone(&resume.code);
                    state.pc = resume.pc;
                    state.env = Arc::clone(&resume.frame);
                    return Ok(Flow::Continue);
                }
                Function::Spawn => {
                    if argc < 1 {
                        return Err(Error::argument("spawn expects a function"));
                    }
                    let mut args = self.stack.take_n(argc)?;
                    let function = args.remove(0);
                    self.spawn(function, args);
                    self.stack.push(Value::Null)?;
                    return self.after_value(state, tail);
                }
            }
        }
    }

    fn call_closure(
        &mut self,
        state: &mut State,
        code: &Arc<Code>,
        frame: &Arc<Frame>,
        argc: usize,
        tail: bool,
    ) -> Result<Flow> {
        let self_call = tail
            && code.is_fixed_arity()
            && state.env.code.as_ref().is_some_and(|c| Arc::ptr_eq(c, code))
            && state.env.locals.as_ref().is_some_and(|l| Arc::ptr_eq(l, frame));
        if self_call && argc == code.argc {
            state.env.overwrite(self.stack.slice(argc)?);
            self.stack.drop_n(argc)?;
            state.pc = 0;
            return Ok(Flow::Continue);
        }

        let elements = bind_arguments(code, self.stack.slice(argc)?)?;
        self.stack.drop_n(argc)?;
        let (previous, ops, pc) = if tail {
            (state.env.previous.clone(), state.env.ops.clone(), state.env.pc)
        } else {
            (
                Some(Arc::clone(&state.env)),
                Some(Arc::clone(&state.code)),
                state.pc,
            )
        };
        state.env = Frame::activation(
            Arc::clone(frame),
            previous,
            Arc::clone(code),
            ops,
            pc,
            elements,
        );
        self.frames_allocated += 1;
        state.code = Arc::clone(code);
        state.pc = 0;
        Ok(Flow::Continue)
    }

    /// `(key: struct)` looks the keyword up in its argument.
    fn call_keyword(
        &mut self,
        state: &mut State,
        key: &ell_parser::Keyword,
        argc: usize,
        tail: bool,
    ) -> Result<Flow> {
        if argc != 1 {
            return Err(Error::argument(format!(
                "{} expects 1 argument, got {}",
                key, argc
            )));
        }
        let value = match self.stack.pop()? {
            Value::Struct(s) => s
                .get(&StructKey::Keyword(key.clone()))
                .unwrap_or(Value::Null),
            other => {
                return Err(Error::argument(format!(
                    "{} expected <struct>, got {}",
                    key, other
                )));
            }
        };
        self.stack.push(value)?;
        self.after_value(state, tail)
    }

    /// A value was pushed without a frame; in tail position, return it.
    #[inline]
    fn after_value(&mut self, state: &mut State, tail: bool) -> Result<Flow> {
        if tail {
            self.return_to_caller(state)
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Run `function` on its own thread and VM. Errors are logged, not
    /// propagated.
    fn spawn(&self, function: Value, args: Vec<Value>) {
        let options = self.options.clone();
        std::thread::spawn(move || {
            tracing::debug!(function = %function, "spawned flow starting");
            let mut vm = Vm::new(options);
            if let Err(err) = vm.call(&function, &args) {
                tracing::error!(function = %function, error = %err, "spawned flow failed");
            }
        });
    }
}

/// Where a continuation captured now would resume. In tail position that
/// is the current frame's caller, or nowhere at the outermost frame.
fn resume_point(state: &State, tail: bool) -> Option<Resume> {
    if !tail {
        return Some(Resume {
            code: Arc::clone(&state.code),
            pc: state.pc,
            frame: Arc::clone(&state.env),
        });
    }
    let previous = state.env.previous.clone()?;
    Some(Resume {
        code: state.env.ops.clone()?,
        pc: state.env.pc,
        frame: previous,
    })
}

#[inline]
fn operand(state: &State, pc: usize, n: usize) -> Result<usize> {
    state
        .code
        .ops
        .get(pc + n)
        .and_then(|w| usize::try_from(*w).ok())
        .ok_or_else(|| Error::Internal(format!("bad operand at {} in {}", pc, state.code)))
}

fn constant(index: usize) -> Result<Value> {
    pool::get(index).ok_or_else(|| Error::Internal(format!("no constant {}", index)))
}

fn symbol_operand(state: &State, pc: usize) -> Result<Symbol> {
    match constant(operand(state, pc, 1)?)? {
        Value::Symbol(name) => Ok(name),
        other => Err(Error::Internal(format!("expected a symbol operand, got {}", other))),
    }
}

fn lexical_frame(state: &State, pc: usize) -> Result<Arc<Frame>> {
    let depth = operand(state, pc, 1)?;
    state
        .env
        .lexical(depth)
        .ok_or_else(|| Error::Internal(format!("no lexical frame at depth {}", depth)))
}

/// Apply the jump whose operand sits at `pc + 1`.
fn jump(state: &mut State, pc: usize) -> Result<()> {
    let offset = state
        .code
        .ops
        .get(pc + 1)
        .copied()
        .ok_or_else(|| Error::Internal("missing jump offset".into()))?;
    let target = (pc + 2) as i64 + offset as i64;
    if target < 0 || target as usize > state.code.ops.len() {
        return Err(Error::Internal(format!("jump out of range: {}", target)));
    }
    state.pc = target as usize;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use ell_parser::{Parser, error_keys};

    fn run(src: &str) -> Result<Value> {
        let mut vm = Vm::new(Options::default());
        let mut last = Value::Null;
        for form in Parser::parse_all_str(src).unwrap() {
            let code = Compiler::new(false).compile(&form)?;
            last = vm.exec(Arc::new(code), Frame::root())?;
        }
        Ok(last)
    }

    #[test]
    fn test_arithmetic_and_branching() {
        assert_eq!(run("(+ 1 2)").unwrap(), Value::Number(3.0));
        assert_eq!(run("(if (< 1 2) 'yes 'no)").unwrap(), Value::symbol("yes"));
        assert_eq!(run("(if false 1)").unwrap(), Value::Null);
    }

    #[test]
    fn test_closures_capture_their_frame() {
        let result = run("((fn (x) ((fn (y) (+ x y)) 2)) 40)").unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn test_set_local() {
        let result = run("((fn (x) (set! x (+ x 1)) x) 1)").unwrap();
        assert_eq!(result, Value::Number(2.0));
    }

    #[test]
    fn test_aggregate_literals_evaluate_elements() {
        assert_eq!(run("[(+ 1 1) 3]").unwrap().to_string(), "[2 3]");
        assert_eq!(run("{a: (+ 1 1)}").unwrap().to_string(), "{a: 2}");
    }

    #[test]
    fn test_keyword_call() {
        assert_eq!(run("(x: {x: 5})").unwrap(), Value::Number(5.0));
        assert!(run("(x: 5)").is_err());
    }

    #[test]
    fn test_apply_splices() {
        assert_eq!(run("(apply + 1 2 '(3 4))").unwrap(), Value::Number(10.0));
        assert!(run("(apply +)").is_err());
        assert!(run("(apply + 1)").is_err());
    }

    #[test]
    fn test_not_a_function() {
        let err = run("(1 2)").unwrap_err();
        assert!(err.is(error_keys::ARGUMENT));
    }

    #[test]
    fn test_undefined_global() {
        let err = run("vm-test-never-defined").unwrap_err();
        assert!(err.is(error_keys::GENERIC));
    }

    #[test]
    fn test_escaping_continuation() {
        let result = run("(+ 1 (callcc (fn (k) (+ 100 (k 2)))))").unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_tail_continuation_at_top_level() {
        assert_eq!(run("(callcc (fn (k) (k 7)))").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn test_call_from_host() {
        let mut vm = Vm::new(Options::default());
        let add = globals::lookup(&Symbol::new("+")).unwrap();
        let result = vm
            .call(&add, &[Value::Number(1.0), Value::Number(2.0)])
            .unwrap();
        assert_eq!(result, Value::Number(3.0));
        // The stack is left balanced.
        assert_eq!(vm.stack.depth(), 0);
    }

    #[test]
    fn test_fast_loop_matches() {
        let options = Options {
            optimize: true,
            ..Options::default()
        };
        assert!(!options.instrumented());
        let mut vm = Vm::new(options);
        let form = Parser::parse_str("((fn (n) (+ n 1)) 41)").unwrap().unwrap();
        let code = Compiler::new(true).compile(&form).unwrap();
        assert_eq!(vm.exec(Arc::new(code), Frame::root()).unwrap(), Value::Number(42.0));
    }
}
