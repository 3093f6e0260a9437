// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Code generation: translates macro-expanded forms into bytecode.
//!
//! Every recursive call carries a [`Context`]. In tail context the emitted
//! value is followed by a return (or the call becomes a tail call); in
//! ignore context it is popped. Call arguments are compiled right to left,
//! then the callee, so that at run time `stack[sp..sp + argc]` holds the
//! arguments in source order.

use ell_parser::{Code, Symbol, Value};

use crate::assembler;
use crate::error::{Error, Result};
use crate::opcode::OpCode;

use super::emit::Emitter;
use super::params::parse_params;
use super::types::{Context, Scope};

/// The bytecode compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    optimize: bool,
}

impl Compiler {
    /// Create a compiler. `optimize` enables the `inc`/`dec` peephole.
    pub fn new(optimize: bool) -> Self {
        Compiler { optimize }
    }

    /// Compile a top-level form into a zero-argument code object.
    pub fn compile(&self, expr: &Value) -> Result<Code> {
        let mut code = Code::new("", 0, None, None);
        self.compile_expr(&mut code, &Scope::new(), expr, Context::TAIL)?;
        Ok(code)
    }

    /// Compile `expr` into `code`.
    pub fn compile_expr(
        &self,
        code: &mut Code,
        scope: &Scope,
        expr: &Value,
        ctx: Context,
    ) -> Result<()> {
        match expr {
            Value::Symbol(sym) => {
                self.compile_symbol(code, scope, sym);
                finish(code, ctx);
                Ok(())
            }
            Value::List(list) if !list.is_empty() => {
                let items = list.to_vec();
                self.compile_list(code, scope, expr, &items, ctx)
            }
            Value::Vector(v) => {
                let items = v.to_vec();
                for item in items.iter().rev() {
                    self.compile_expr(code, scope, item, Context::VALUE)?;
                }
                code.emit_op1(OpCode::Vector, items.len() as i32);
                finish(code, ctx);
                Ok(())
            }
            Value::Struct(s) => {
                let entries = s.entries();
                for (key, value) in entries.iter().rev() {
                    self.compile_expr(code, scope, value, Context::VALUE)?;
                    code.emit_literal(key.to_value());
                }
                code.emit_op1(OpCode::Struct, (entries.len() * 2) as i32);
                finish(code, ctx);
                Ok(())
            }
            constant => {
                if !ctx.ignore {
                    code.emit_literal(constant.clone());
                    finish(code, ctx);
                }
                Ok(())
            }
        }
    }

    fn compile_symbol(&self, code: &mut Code, scope: &Scope, sym: &Symbol) {
        match scope.resolve(sym) {
            Some((depth, slot)) => code.emit_local(depth, slot),
            None => code.emit_global(sym),
        }
    }

    fn compile_list(
        &self,
        code: &mut Code,
        scope: &Scope,
        form: &Value,
        items: &[Value],
        ctx: Context,
    ) -> Result<()> {
        let args = &items[1..];
        if let Value::Symbol(head) = &items[0] {
            match head.name() {
                "quote" => {
                    if args.len() != 1 {
                        return Err(Error::syntax("quote takes exactly one form", form));
                    }
                    if !ctx.ignore {
                        code.emit_literal(args[0].clone());
                        finish(code, ctx);
                    }
                    return Ok(());
                }
                "do" => return self.compile_sequence(code, scope, args, ctx),
                "if" => return self.compile_if(code, scope, form, args, ctx),
                "def" => return self.compile_def(code, scope, form, args, ctx),
                "undef" => {
                    let name = single_symbol(form, args, "undef")?;
                    code.emit_pool_op(OpCode::UndefGlobal, Value::Symbol(name));
                    finish(code, ctx);
                    return Ok(());
                }
                "defmacro" => return self.compile_defmacro(code, scope, form, args, ctx),
                "fn" => {
                    let fn_code = self.compile_fn(scope, form, args, "")?;
                    code.emit_closure(fn_code);
                    finish(code, ctx);
                    return Ok(());
                }
                "set!" => return self.compile_set(code, scope, form, args, ctx),
                "code" => {
                    let assembled = assembler::assemble(form)?;
                    code.emit_closure(assembled);
                    finish(code, ctx);
                    return Ok(());
                }
                "use" => {
                    let name = single_symbol(form, args, "use")?;
                    code.emit_pool_op(OpCode::Use, Value::Symbol(name));
                    finish(code, ctx);
                    return Ok(());
                }
                _ => {}
            }
        }
        self.compile_call(code, scope, &items[0], args, ctx)
    }

    fn compile_sequence(
        &self,
        code: &mut Code,
        scope: &Scope,
        forms: &[Value],
        ctx: Context,
    ) -> Result<()> {
        let Some((last, init)) = forms.split_last() else {
            return self.compile_expr(code, scope, &Value::Null, ctx);
        };
        for form in init {
            self.compile_expr(code, scope, form, Context::IGNORE)?;
        }
        self.compile_expr(code, scope, last, ctx)
    }

    fn compile_if(
        &self,
        code: &mut Code,
        scope: &Scope,
        form: &Value,
        args: &[Value],
        ctx: Context,
    ) -> Result<()> {
        if args.len() != 2 && args.len() != 3 {
            return Err(Error::syntax("if takes 2 or 3 operands", form));
        }
        let otherwise = args.get(2).cloned().unwrap_or(Value::Null);

        self.compile_expr(code, scope, &args[0], Context::VALUE)?;
        let else_jump = code.emit_jump(OpCode::JumpFalse);
        self.compile_expr(code, scope, &args[1], ctx)?;
        if ctx.tail {
            code.set_jump_location(else_jump);
            self.compile_expr(code, scope, &otherwise, ctx)
        } else {
            let end_jump = code.emit_jump(OpCode::Jump);
            code.set_jump_location(else_jump);
            self.compile_expr(code, scope, &otherwise, ctx)?;
            code.set_jump_location(end_jump);
            Ok(())
        }
    }

    fn compile_def(
        &self,
        code: &mut Code,
        scope: &Scope,
        form: &Value,
        args: &[Value],
        ctx: Context,
    ) -> Result<()> {
        let (name, value) = match args {
            [Value::Symbol(name), value] => (name.clone(), value),
            _ => return Err(Error::syntax("def takes a symbol and a value", form)),
        };
        match lambda_parts(value) {
            Some(fn_args) => {
                let fn_code = self.compile_fn(scope, value, &fn_args, name.name())?;
                code.emit_closure(fn_code);
            }
            None => self.compile_expr(code, scope, value, Context::VALUE)?,
        }
        code.emit_pool_op(OpCode::DefGlobal, Value::Symbol(name));
        finish(code, ctx);
        Ok(())
    }

    fn compile_defmacro(
        &self,
        code: &mut Code,
        scope: &Scope,
        form: &Value,
        args: &[Value],
        ctx: Context,
    ) -> Result<()> {
        let name = match args.first() {
            Some(Value::Symbol(name)) if args.len() >= 2 => name.clone(),
            _ => {
                return Err(Error::syntax(
                    "defmacro takes a name, a parameter list and a body",
                    form,
                ));
            }
        };
        let expander = self.compile_fn(scope, form, &args[1..], name.name())?;
        code.emit_closure(expander);
        code.emit_pool_op(OpCode::DefMacro, Value::Symbol(name));
        finish(code, ctx);
        Ok(())
    }

    /// Compile `(fn params body...)` given `[params, body...]`.
    fn compile_fn(&self, scope: &Scope, form: &Value, args: &[Value], name: &str) -> Result<Code> {
        let Some((params, body)) = args.split_first() else {
            return Err(Error::syntax("fn requires a parameter list", form));
        };
        let params = parse_params(params)?;
        let mut fn_code = Code::new(name, params.argc, params.defaults, params.keys);
        let inner = scope.extend(params.names);
        self.compile_sequence(&mut fn_code, &inner, body, Context::TAIL)?;
        Ok(fn_code)
    }

    fn compile_set(
        &self,
        code: &mut Code,
        scope: &Scope,
        form: &Value,
        args: &[Value],
        ctx: Context,
    ) -> Result<()> {
        let (name, value) = match args {
            [Value::Symbol(name), value] => (name, value),
            _ => return Err(Error::syntax("set! takes a symbol and a value", form)),
        };
        self.compile_expr(code, scope, value, Context::VALUE)?;
        match scope.resolve(name) {
            Some((depth, slot)) => code.emit_set_local(depth, slot),
            None => code.emit_pool_op(OpCode::SetGlobal, Value::Symbol(name.clone())),
        }
        finish(code, ctx);
        Ok(())
    }

    fn compile_call(
        &self,
        code: &mut Code,
        scope: &Scope,
        callee: &Value,
        args: &[Value],
        ctx: Context,
    ) -> Result<()> {
        if self.optimize
            && let Some((op, operand)) = increment_form(scope, callee, args)
        {
            self.compile_expr(code, scope, operand, Context::VALUE)?;
            code.emit_op(op);
            finish(code, ctx);
            return Ok(());
        }

        for arg in args.iter().rev() {
            self.compile_expr(code, scope, arg, Context::VALUE)?;
        }
        self.compile_expr(code, scope, callee, Context::VALUE)?;
        code.emit_call(args.len(), ctx.tail);
        if ctx.ignore && !ctx.tail {
            code.emit_pop();
        }
        Ok(())
    }
}

/// Emit whatever follows a value in context `ctx`.
fn finish(code: &mut Code, ctx: Context) {
    if ctx.tail {
        code.emit_return();
    } else if ctx.ignore {
        code.emit_pop();
    }
}

fn single_symbol(form: &Value, args: &[Value], what: &str) -> Result<Symbol> {
    match args {
        [Value::Symbol(name)] => Ok(name.clone()),
        _ => Err(Error::syntax(format!("{} takes a single symbol", what), form)),
    }
}

/// The `[params, body...]` of a `(fn ...)` form.
fn lambda_parts(value: &Value) -> Option<Vec<Value>> {
    let list = value.as_list()?;
    if list.car()?.is_symbol("fn") {
        Some(list.cdr().to_vec())
    } else {
        None
    }
}

/// Recognise `(+ x 1)`, `(+ 1 x)` and `(- x 1)` when `+`/`-` are globals.
fn increment_form<'a>(
    scope: &Scope,
    callee: &Value,
    args: &'a [Value],
) -> Option<(OpCode, &'a Value)> {
    let Value::Symbol(sym) = callee else {
        return None;
    };
    if scope.resolve(sym).is_some() || args.len() != 2 {
        return None;
    }
    let is_one = |v: &Value| matches!(v, Value::Number(n) if *n == 1.0);
    match sym.name() {
        "+" if is_one(&args[1]) => Some((OpCode::Inc, &args[0])),
        "+" if is_one(&args[0]) => Some((OpCode::Inc, &args[1])),
        "-" if is_one(&args[1]) => Some((OpCode::Dec, &args[0])),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
