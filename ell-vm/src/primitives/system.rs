// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Output, time and introspection.

use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ell_parser::{ErrorValue, Function, Value};

use super::{argument_error, number};
use crate::assembler;
use crate::macros;
use crate::options::Options;
use crate::vm::Vm;

type Result = std::result::Result<Value, ErrorValue>;

/// Stack size for the VM `macroexpand` runs expanders on.
const EXPANDER_STACK_SIZE: usize = 10_000;

fn write_out(args: &[Value], newline: bool) -> Result {
    let text: String = args.iter().map(Value::to_text).collect();
    let mut out = std::io::stdout().lock();
    let written = if newline {
        writeln!(out, "{}", text)
    } else {
        write!(out, "{}", text)
    };
    written
        .and_then(|_| out.flush())
        .map_err(|e| ErrorValue::with_message(ell_parser::error_keys::IO, e.to_string()))?;
    Ok(Value::Null)
}

pub(super) fn builtin_print(args: &[Value]) -> Result {
    write_out(args, false)
}

pub(super) fn builtin_println(args: &[Value]) -> Result {
    write_out(args, true)
}

/// Seconds since the Unix epoch.
pub(super) fn builtin_now(_args: &[Value]) -> Result {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Ok(Value::Number(elapsed.as_secs_f64()))
}

pub(super) fn builtin_sleep(args: &[Value]) -> Result {
    let seconds = number(&args[0]);
    let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
        argument_error(format!(
            "sleep: expected a non-negative duration, got {}",
            args[0]
        ))
    })?;
    std::thread::sleep(duration);
    Ok(Value::Null)
}

pub(super) fn builtin_decompile(args: &[Value]) -> Result {
    match &args[0] {
        Value::Code(code) => Ok(assembler::decompile(code)),
        Value::Function(f) => match &**f {
            Function::Closure { code, .. } => Ok(assembler::decompile(code)),
            other => Err(argument_error(format!(
                "decompile: {} is not compiled code",
                other
            ))),
        },
        other => Err(argument_error(format!(
            "decompile: expected a function or code, got {}",
            other.type_tag()
        ))),
    }
}

pub(super) fn builtin_macroexpand(args: &[Value]) -> Result {
    let options = Options {
        stack_size: EXPANDER_STACK_SIZE,
        ..Options::default()
    };
    let mut vm = Vm::new(options);
    macros::expand(&mut vm, &args[0]).map_err(|e| e.into_error_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_recent() {
        let Value::Number(n) = builtin_now(&[]).unwrap() else {
            panic!("now must return a number");
        };
        assert!(n > 1.6e9);
    }

    #[test]
    fn test_sleep_rejects_negative() {
        assert!(builtin_sleep(&[Value::Number(-1.0)]).is_err());
        assert!(builtin_sleep(&[Value::Number(1e20)]).is_err());
        assert!(builtin_sleep(&[Value::Number(f64::NAN)]).is_err());
        assert!(builtin_sleep(&[Value::Number(0.0)]).is_ok());
    }

    #[test]
    fn test_decompile_rejects_primitives() {
        assert!(builtin_decompile(&[Value::Number(1.0)]).is_err());
    }
}
