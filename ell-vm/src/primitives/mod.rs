// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Built-in primitive functions and the signature-checked registry.
//!
//! Every primitive declares its argument types. [`invoke`] validates a call
//! against the declaration before running the native function, so the
//! functions themselves may index `args` freely.

mod base;
mod channels;
mod collections;
mod conversion;
mod system;

use std::sync::Arc;

use ell_parser::{ErrorValue, Function, Keyword, Primitive, PrimitiveFn, Symbol, TypeTag, Value};
use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::globals;
use crate::vm::call::{bind_keywords, display_name};

use base::{
    builtin_add, builtin_dec, builtin_div, builtin_equal_p, builtin_error, builtin_error_data,
    builtin_error_key, builtin_error_p, builtin_function_p, builtin_ge, builtin_gt,
    builtin_identical_p, builtin_inc, builtin_keyword_p, builtin_le, builtin_list_p, builtin_lt,
    builtin_make_error, builtin_mul, builtin_not, builtin_null_p, builtin_num_eq,
    builtin_number_p, builtin_quotient, builtin_remainder, builtin_string_p, builtin_sub,
    builtin_symbol_p, builtin_type,
};
use channels::{builtin_channel, builtin_close, builtin_receive, builtin_send};
use collections::{
    builtin_car, builtin_cdr, builtin_concat, builtin_cons, builtin_empty_p, builtin_get,
    builtin_has_p, builtin_length, builtin_list, builtin_put, builtin_reverse, builtin_struct,
    builtin_vector, builtin_vector_ref, builtin_vector_set,
};
use conversion::{
    builtin_keyword, builtin_string, builtin_symbol, builtin_to_number, builtin_to_string,
};
use system::{
    builtin_decompile, builtin_macroexpand, builtin_now, builtin_print, builtin_println,
    builtin_sleep,
};

static INSTALLED: Lazy<()> = Lazy::new(register_primitives);

/// Bind every primitive and VM intrinsic as a global. Idempotent.
pub fn install() {
    Lazy::force(&INSTALLED);
}

fn define(primitive: Primitive) {
    let name = Symbol::new(&primitive.name);
    globals::define(name, Function::primitive(primitive));
}

fn define_intrinsic(name: &str, function: Function) {
    globals::define(Symbol::new(name), Value::Function(Arc::new(function)));
}

fn prim(name: &str, fun: PrimitiveFn, result: TypeTag, args: Vec<TypeTag>) -> Primitive {
    Primitive::new(name, fun, result, args)
}

fn register_primitives() {
    use TypeTag as T;

    // Arithmetic
    define(prim("+", builtin_add, T::number(), vec![]).with_rest(T::number()));
    define(prim("-", builtin_sub, T::number(), vec![T::number()]).with_rest(T::number()));
    define(prim("*", builtin_mul, T::number(), vec![]).with_rest(T::number()));
    define(prim("/", builtin_div, T::number(), vec![T::number()]).with_rest(T::number()));
    define(prim("quotient", builtin_quotient, T::number(), vec![T::number(), T::number()]));
    define(prim("remainder", builtin_remainder, T::number(), vec![T::number(), T::number()]));
    define(prim("inc", builtin_inc, T::number(), vec![T::number()]));
    define(prim("dec", builtin_dec, T::number(), vec![T::number()]));

    // Comparison
    define(prim("=", builtin_num_eq, T::boolean(), vec![T::any()]).with_rest(T::any()));
    define(prim("<", builtin_lt, T::boolean(), vec![T::number()]).with_rest(T::number()));
    define(prim("<=", builtin_le, T::boolean(), vec![T::number()]).with_rest(T::number()));
    define(prim(">", builtin_gt, T::boolean(), vec![T::number()]).with_rest(T::number()));
    define(prim(">=", builtin_ge, T::boolean(), vec![T::number()]).with_rest(T::number()));
    define(prim("not", builtin_not, T::boolean(), vec![T::any()]));
    define(prim("equal?", builtin_equal_p, T::boolean(), vec![T::any(), T::any()]));
    define(prim("identical?", builtin_identical_p, T::boolean(), vec![T::any(), T::any()]));

    // Types
    define(prim("type", builtin_type, T::type_tag(), vec![T::any()]));
    define(prim("null?", builtin_null_p, T::boolean(), vec![T::any()]));
    define(prim("list?", builtin_list_p, T::boolean(), vec![T::any()]));
    define(prim("number?", builtin_number_p, T::boolean(), vec![T::any()]));
    define(prim("string?", builtin_string_p, T::boolean(), vec![T::any()]));
    define(prim("symbol?", builtin_symbol_p, T::boolean(), vec![T::any()]));
    define(prim("keyword?", builtin_keyword_p, T::boolean(), vec![T::any()]));
    define(prim("function?", builtin_function_p, T::boolean(), vec![T::any()]));
    define(prim("error?", builtin_error_p, T::boolean(), vec![T::any()]));

    // Errors
    define(prim("error", builtin_error, T::null(), vec![T::keyword()]).with_rest(T::any()));
    define(prim("make-error", builtin_make_error, T::error(), vec![T::keyword()]).with_rest(T::any()));
    define(prim("error-key", builtin_error_key, T::keyword(), vec![T::error()]));
    define(prim("error-data", builtin_error_data, T::list(), vec![T::error()]));

    // Lists
    define(prim("list", builtin_list, T::list(), vec![]).with_rest(T::any()));
    define(prim("cons", builtin_cons, T::list(), vec![T::any(), T::list()]));
    define(prim("car", builtin_car, T::any(), vec![T::list()]));
    define(prim("cdr", builtin_cdr, T::list(), vec![T::list()]));
    define(prim("concat", builtin_concat, T::list(), vec![]).with_rest(T::list()));
    define(prim("reverse", builtin_reverse, T::list(), vec![T::list()]));
    define(prim("length", builtin_length, T::number(), vec![T::any()]));
    define(prim("empty?", builtin_empty_p, T::boolean(), vec![T::any()]));

    // Vectors and structs
    define(prim("vector", builtin_vector, T::vector(), vec![]).with_rest(T::any()));
    define(prim("vector-ref", builtin_vector_ref, T::any(), vec![T::vector(), T::number()]));
    define(prim(
        "vector-set!",
        builtin_vector_set,
        T::null(),
        vec![T::vector(), T::number(), T::any()],
    ));
    define(prim("struct", builtin_struct, T::structure(), vec![]).with_rest(T::any()));
    define(prim("get", builtin_get, T::any(), vec![T::structure(), T::any()]));
    define(prim("put!", builtin_put, T::structure(), vec![T::structure(), T::any(), T::any()]));
    define(prim("has?", builtin_has_p, T::boolean(), vec![T::structure(), T::any()]));

    // Conversions
    define(prim("to-string", builtin_to_string, T::string(), vec![T::any()]));
    define(prim("to-number", builtin_to_number, T::number(), vec![T::any()]));
    define(prim("string", builtin_string, T::string(), vec![]).with_rest(T::any()));
    define(prim("symbol", builtin_symbol, T::symbol(), vec![T::any()]).with_rest(T::any()));
    define(prim("keyword", builtin_keyword, T::keyword(), vec![T::any()]).with_rest(T::any()));

    // Channels
    define(prim("channel", builtin_channel, T::channel(), vec![]).with_keys(vec![
        (Keyword::new("name"), Value::string("")),
        (Keyword::new("bufsize"), Value::Number(0.0)),
    ]));
    define(
        prim("send", builtin_send, T::boolean(), vec![T::channel(), T::any()])
            .with_defaults(vec![Value::Number(-1.0)]),
    );
    define(
        prim("receive", builtin_receive, T::any(), vec![T::channel()])
            .with_defaults(vec![Value::Number(-1.0)]),
    );
    define(prim("close", builtin_close, T::null(), vec![T::channel()]));

    // System
    define(prim("now", builtin_now, T::number(), vec![]));
    define(prim("sleep", builtin_sleep, T::null(), vec![T::number()]));
    define(prim("print", builtin_print, T::null(), vec![]).with_rest(T::any()));
    define(prim("println", builtin_println, T::null(), vec![]).with_rest(T::any()));
    define(prim("decompile", builtin_decompile, T::list(), vec![T::any()]));
    define(prim("macroexpand", builtin_macroexpand, T::any(), vec![T::any()]));

    // Intrinsics implemented by the VM itself
    define_intrinsic("apply", Function::Apply);
    define_intrinsic("callcc", Function::CallCC);
    define_intrinsic("call-with-continuation", Function::CallCC);
    define_intrinsic("spawn", Function::Spawn);
}

/// Validate `args` against the primitive's signature and call it.
pub fn invoke(primitive: &Primitive, args: &[Value]) -> Result<Value> {
    let required = primitive.args.len();
    for (i, (arg, tag)) in args.iter().zip(&primitive.args).enumerate() {
        check_type(primitive, i, arg, tag)?;
    }

    if let Some(rest) = &primitive.rest {
        if args.len() < required {
            return Err(arity_error(primitive, args));
        }
        for (i, arg) in args.iter().enumerate().skip(required) {
            check_type(primitive, i, arg, rest)?;
        }
        return call(primitive, args);
    }

    match (&primitive.defaults, &primitive.keys) {
        (None, _) => {
            if args.len() != required {
                return Err(arity_error(primitive, args));
            }
            call(primitive, args)
        }
        (Some(defaults), None) => {
            if args.len() < required || args.len() > required + defaults.len() {
                return Err(arity_error(primitive, args));
            }
            let mut full = args.to_vec();
            full.extend(defaults[args.len() - required..].iter().cloned());
            call(primitive, &full)
        }
        (Some(defaults), Some(keys)) => {
            if args.len() < required {
                return Err(arity_error(primitive, args));
            }
            let mut full = args[..required].to_vec();
            full.extend(bind_keywords(&primitive.name, keys, defaults, &args[required..])?);
            call(primitive, &full)
        }
    }
}

fn call(primitive: &Primitive, args: &[Value]) -> Result<Value> {
    (primitive.fun)(args).map_err(Error::Value)
}

fn check_type(primitive: &Primitive, index: usize, arg: &Value, tag: &TypeTag) -> Result<()> {
    if *tag == TypeTag::any() || arg.type_tag() == *tag {
        return Ok(());
    }
    Err(Error::argument(format!(
        "{} expected {} for argument {}, got {}",
        display_name(&primitive.name),
        tag,
        index + 1,
        arg
    )))
}

fn arity_error(primitive: &Primitive, args: &[Value]) -> Error {
    Error::argument(format!(
        "{} expects {}, got {} argument(s)",
        primitive.name,
        primitive.signature(),
        args.len()
    ))
}

// ============================================================================
// Helpers shared by the primitive modules
// ============================================================================

pub(crate) fn argument_error(message: impl AsRef<str>) -> ErrorValue {
    ErrorValue::with_message(ell_parser::error_keys::ARGUMENT, message)
}

/// A builtin was handed an argument of the wrong type.
pub(crate) fn wrong_type(name: &str, expected: &str, value: &Value) -> ErrorValue {
    argument_error(format!("{} expected {}, got {}", name, expected, value))
}

pub(crate) fn number(value: &Value) -> f64 {
    value.as_number().unwrap_or(f64::NAN)
}
