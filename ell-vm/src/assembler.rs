// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Textual assembly for code objects.
//!
//! The assembly form is an ordinary Ell list:
//!
//! ```text
//! (code name: "fact" argc: 1
//!   (local 0 0) (literal 1) (global <) (call 2) ... (return))
//! ```
//!
//! [`decompile`] produces it, [`assemble`] parses it back. Pool operands are
//! written as the values they refer to, and `closure` operands as nested
//! `(code ...)` forms, so the text is independent of pool indices.

use std::sync::Arc;

use ell_parser::{Code, Keyword, Value};

use crate::error::{Error, Result};
use crate::opcode::OpCode;
use crate::pool;

/// Render `code` as an assembly form.
pub fn decompile(code: &Code) -> Value {
    let mut items = vec![Value::symbol("code")];
    if !code.name.is_empty() {
        items.push(Value::keyword("name"));
        items.push(Value::string(&code.name));
    }
    items.push(Value::keyword("argc"));
    items.push(Value::Number(code.argc as f64));
    if let Some(defaults) = &code.defaults {
        items.push(Value::keyword("defaults"));
        items.push(Value::vector(defaults.clone()));
    }
    if let Some(keys) = &code.keys {
        items.push(Value::keyword("keys"));
        items.push(Value::vector(
            keys.iter().cloned().map(Value::Keyword).collect(),
        ));
    }

    let mut pc = 0;
    while pc < code.ops.len() {
        let Some(op) = OpCode::from_word(code.ops[pc]) else {
            items.push(Value::list(vec![
                Value::symbol("?"),
                Value::Number(code.ops[pc] as f64),
            ]));
            pc += 1;
            continue;
        };
        let mut instr = vec![Value::symbol(op.name())];
        for i in 0..op.operands() {
            let word = code.ops.get(pc + 1 + i).copied().unwrap_or(0);
            instr.push(operand_value(op, word));
        }
        items.push(Value::list(instr));
        pc += op.width();
    }
    Value::list(items)
}

fn operand_value(op: OpCode, word: i32) -> Value {
    if !op.uses_pool() {
        return Value::Number(word as f64);
    }
    match pool::get(word as usize) {
        Some(Value::Code(code)) if op == OpCode::Closure => decompile(&code),
        Some(value) => value,
        None => Value::Null,
    }
}

/// One instruction as text, e.g. `local 0 1` or `global fact`.
/// Returns the text and the instruction width. Used by the tracer.
pub fn instruction_text(code: &Code, pc: usize) -> (String, usize) {
    let Some(op) = code.ops.get(pc).and_then(|w| OpCode::from_word(*w)) else {
        return (format!("? {:?}", code.ops.get(pc)), 1);
    };
    let mut text = op.name().to_string();
    for i in 0..op.operands() {
        let word = code.ops.get(pc + 1 + i).copied().unwrap_or(0);
        text.push(' ');
        if op.uses_pool() {
            match pool::get(word as usize) {
                Some(value) => text.push_str(&value.to_string()),
                None => text.push_str("?"),
            }
        } else {
            text.push_str(&word.to_string());
        }
    }
    (text, op.width())
}

/// Parse an assembly form into a code object.
pub fn assemble(form: &Value) -> Result<Code> {
    let items = match form.as_list() {
        Some(list) if list.car().is_some_and(|h| h.is_symbol("code")) => list.to_vec(),
        _ => return Err(Error::syntax("assembly must be a (code ...) form", form)),
    };

    let mut code = Code::default();
    let mut i = 1;
    while i < items.len() {
        match &items[i] {
            Value::Keyword(attr) => {
                let Some(value) = items.get(i + 1) else {
                    return Err(Error::syntax(format!("missing value for {}", attr), form));
                };
                set_attribute(&mut code, attr, value, form)?;
                i += 2;
            }
            Value::List(_) => {
                assemble_instruction(&mut code, &items[i])?;
                i += 1;
            }
            other => {
                return Err(Error::syntax(format!("bad instruction: {}", other), form));
            }
        }
    }
    Ok(code)
}

fn set_attribute(code: &mut Code, attr: &Keyword, value: &Value, form: &Value) -> Result<()> {
    match (attr.name(), value) {
        ("name", Value::String(s)) => code.name = s.to_string(),
        ("name", Value::Symbol(s)) => code.name = s.name().to_string(),
        ("argc", Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => code.argc = *n as usize,
        ("defaults", Value::Vector(v)) => code.defaults = Some(v.to_vec()),
        ("defaults", Value::List(l)) => code.defaults = Some(l.to_vec()),
        ("keys", Value::Vector(v)) => {
            let mut keys = Vec::with_capacity(v.len());
            for key in v.to_vec() {
                match key {
                    Value::Keyword(k) => keys.push(k),
                    other => {
                        return Err(Error::syntax(format!("key must be a keyword: {}", other), form));
                    }
                }
            }
            code.keys = Some(keys);
        }
        _ => {
            return Err(Error::syntax(
                format!("bad code attribute {} {}", attr, value),
                form,
            ));
        }
    }
    Ok(())
}

fn assemble_instruction(code: &mut Code, instr: &Value) -> Result<()> {
    let parts = instr.as_list().map(|l| l.to_vec()).unwrap_or_default();
    let op = match parts.first() {
        Some(Value::Symbol(name)) => OpCode::from_name(name.name())
            .ok_or_else(|| Error::syntax(format!("unknown opcode: {}", name), instr))?,
        _ => return Err(Error::syntax("instruction must start with an opcode", instr)),
    };
    let operands = &parts[1..];
    if operands.len() != op.operands() {
        return Err(Error::syntax(
            format!("{} takes {} operand(s)", op, op.operands()),
            instr,
        ));
    }

    code.push_word(op as i32);
    for operand in operands {
        let word = if op.uses_pool() {
            pool_operand(op, operand, instr)?
        } else {
            integer_operand(operand, instr)?
        };
        code.push_word(word);
    }
    Ok(())
}

fn pool_operand(op: OpCode, operand: &Value, instr: &Value) -> Result<i32> {
    let value = match op {
        OpCode::Literal => operand.clone(),
        OpCode::Closure => Value::Code(Arc::new(assemble(operand)?)),
        _ => match operand {
            Value::Symbol(_) => operand.clone(),
            _ => return Err(Error::syntax(format!("{} takes a symbol", op), instr)),
        },
    };
    Ok(pool::intern(value) as i32)
}

fn integer_operand(operand: &Value, instr: &Value) -> Result<i32> {
    match operand {
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= i32::MAX as f64 => Ok(*n as i32),
        _ => Err(Error::syntax(
            format!("operand must be an integer: {}", operand),
            instr,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use ell_parser::Parser;

    fn read(src: &str) -> Value {
        Parser::parse_str(src).unwrap().unwrap()
    }

    #[test]
    fn test_decompile_shape() {
        let code = Compiler::new(false).compile(&read("(f 1)")).unwrap();
        let text = decompile(&code).to_string();
        assert_eq!(text, "(code argc: 0 (literal 1) (global f) (tailcall 1))");
    }

    #[test]
    fn test_round_trip_preserves_form() {
        let src = "(def fact (fn (x [y]) (if (< x 1) 1 (* x (fact (- x 1))))))";
        let code = Compiler::new(false).compile(&read(src)).unwrap();
        let form = decompile(&code);
        let again = assemble(&form).unwrap();
        assert_eq!(decompile(&again), form);
        assert_eq!(again.ops.len(), code.ops.len());
    }

    #[test]
    fn test_attributes() {
        let code = assemble(&read(
            "(code name: \"k\" argc: 1 defaults: [1 2] keys: [a: b:] (local 0 0) (return))",
        ))
        .unwrap();
        assert_eq!(code.name, "k");
        assert_eq!(code.argc, 1);
        assert_eq!(code.defaults.as_ref().map(Vec::len), Some(2));
        assert_eq!(code.keys.as_ref().map(Vec::len), Some(2));
        assert_eq!(code.ops, vec![OpCode::Local as i32, 0, 0, OpCode::Return as i32]);
    }

    #[test]
    fn test_instruction_text() {
        let code = assemble(&read("(code (local 1 2) (global car) (return))")).unwrap();
        assert_eq!(instruction_text(&code, 0), ("local 1 2".to_string(), 3));
        assert_eq!(instruction_text(&code, 3), ("global car".to_string(), 2));
    }

    #[test]
    fn test_errors() {
        for src in [
            "(notcode)",
            "(code (frobnicate))",
            "(code (local 1))",
            "(code (global 1))",
            "(code (jump x))",
            "(code argc:)",
            "(code bogus: 1)",
            "(code 42)",
        ] {
            assert!(assemble(&read(src)).is_err(), "{}", src);
        }
    }
}
