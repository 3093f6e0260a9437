// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic, comparison, type predicates and error values.
//!
//! All numbers are `f64`. Comparisons are chained: `(< a b c)` holds when
//! each argument is less than the next.

use ell_parser::{ErrorValue, Keyword, List, Value};

use super::{argument_error, number};

type Result = std::result::Result<Value, ErrorValue>;

// ============================================================================
// Arithmetic
// ============================================================================

pub(super) fn builtin_add(args: &[Value]) -> Result {
    Ok(Value::Number(args.iter().map(number).sum()))
}

pub(super) fn builtin_sub(args: &[Value]) -> Result {
    let first = number(&args[0]);
    if args.len() == 1 {
        return Ok(Value::Number(-first));
    }
    Ok(Value::Number(
        args[1..].iter().map(number).fold(first, |acc, n| acc - n),
    ))
}

pub(super) fn builtin_mul(args: &[Value]) -> Result {
    Ok(Value::Number(args.iter().map(number).product()))
}

pub(super) fn builtin_div(args: &[Value]) -> Result {
    let first = number(&args[0]);
    if args.len() == 1 {
        return Ok(Value::Number(1.0 / first));
    }
    Ok(Value::Number(
        args[1..].iter().map(number).fold(first, |acc, n| acc / n),
    ))
}

fn integer_division(name: &str, args: &[Value]) -> std::result::Result<(f64, f64), ErrorValue> {
    let (a, b) = (number(&args[0]), number(&args[1]));
    if b == 0.0 {
        return Err(argument_error(format!("{}: division by zero", name)));
    }
    Ok((a.trunc(), b.trunc()))
}

pub(super) fn builtin_quotient(args: &[Value]) -> Result {
    let (a, b) = integer_division("quotient", args)?;
    Ok(Value::Number((a / b).trunc()))
}

pub(super) fn builtin_remainder(args: &[Value]) -> Result {
    let (a, b) = integer_division("remainder", args)?;
    Ok(Value::Number(a % b))
}

pub(super) fn builtin_inc(args: &[Value]) -> Result {
    Ok(Value::Number(number(&args[0]) + 1.0))
}

pub(super) fn builtin_dec(args: &[Value]) -> Result {
    Ok(Value::Number(number(&args[0]) - 1.0))
}

// ============================================================================
// Comparison
// ============================================================================

fn chained(args: &[Value], holds: fn(f64, f64) -> bool) -> Result {
    let ok = args
        .windows(2)
        .all(|pair| holds(number(&pair[0]), number(&pair[1])));
    Ok(Value::Boolean(ok))
}

/// `=` compares with [`Value::equals`], so numbers get the epsilon.
pub(super) fn builtin_num_eq(args: &[Value]) -> Result {
    Ok(Value::Boolean(
        args.windows(2).all(|pair| pair[0].equals(&pair[1])),
    ))
}

pub(super) fn builtin_lt(args: &[Value]) -> Result {
    chained(args, |a, b| a < b)
}

pub(super) fn builtin_le(args: &[Value]) -> Result {
    chained(args, |a, b| a <= b)
}

pub(super) fn builtin_gt(args: &[Value]) -> Result {
    chained(args, |a, b| a > b)
}

pub(super) fn builtin_ge(args: &[Value]) -> Result {
    chained(args, |a, b| a >= b)
}

pub(super) fn builtin_not(args: &[Value]) -> Result {
    Ok(Value::Boolean(!args[0].is_truthy()))
}

pub(super) fn builtin_equal_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(args[0].equals(&args[1])))
}

pub(super) fn builtin_identical_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(args[0].identical(&args[1])))
}

// ============================================================================
// Types
// ============================================================================

pub(super) fn builtin_type(args: &[Value]) -> Result {
    Ok(Value::Type(args[0].type_tag()))
}

pub(super) fn builtin_null_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(args[0].is_null()))
}

pub(super) fn builtin_list_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::List(_))))
}

pub(super) fn builtin_number_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::Number(_))))
}

pub(super) fn builtin_string_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

pub(super) fn builtin_symbol_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::Symbol(_))))
}

pub(super) fn builtin_keyword_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::Keyword(_))))
}

pub(super) fn builtin_function_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::Function(_))))
}

pub(super) fn builtin_error_p(args: &[Value]) -> Result {
    Ok(Value::Boolean(matches!(args[0], Value::Error(_))))
}

// ============================================================================
// Errors
// ============================================================================

fn error_value(args: &[Value]) -> ErrorValue {
    let key = args[0]
        .as_keyword()
        .cloned()
        .unwrap_or_else(|| Keyword::new(ell_parser::error_keys::GENERIC));
    ErrorValue::new(key, args[1..].to_vec())
}

/// `(error key: "message" data...)` raises.
pub(super) fn builtin_error(args: &[Value]) -> Result {
    Err(error_value(args))
}

pub(super) fn builtin_make_error(args: &[Value]) -> Result {
    Ok(Value::Error(error_value(args)))
}

pub(super) fn builtin_error_key(args: &[Value]) -> Result {
    match &args[0] {
        Value::Error(e) => Ok(Value::Keyword(e.key().clone())),
        _ => Ok(Value::Null),
    }
}

pub(super) fn builtin_error_data(args: &[Value]) -> Result {
    match &args[0] {
        Value::Error(e) => Ok(Value::List(List::from(e.data().to_vec()))),
        _ => Ok(Value::Null),
    }
}
