// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Macro expansion.
//!
//! Expansion rewrites a form until no macro call remains. A list whose head
//! names a macro is replaced by the result of calling the expander on the
//! unevaluated arguments, and that result is expanded again. Quasiquote is
//! rewritten into calls to `list`, `concat` and `quote`.
//!
//! Expansion is not hygienic.

use ell_parser::{List, Struct, Value};

use crate::error::{Error, Result};
use crate::globals;
use crate::vm::Vm;

/// Fully expand `expr`. Expanders run on `vm`.
pub fn expand(vm: &mut Vm, expr: &Value) -> Result<Value> {
    match expr {
        Value::List(list) if !list.is_empty() => expand_list(vm, list),
        Value::Vector(v) => Ok(Value::vector(expand_all(vm, &v.to_vec())?)),
        Value::Struct(s) => {
            let mut pairs = Vec::with_capacity(s.len());
            for (key, value) in s.entries() {
                pairs.push((key, expand(vm, &value)?));
            }
            Ok(Value::Struct(Struct::from_pairs(pairs)))
        }
        _ => Ok(expr.clone()),
    }
}

fn expand_all(vm: &mut Vm, forms: &[Value]) -> Result<Vec<Value>> {
    forms.iter().map(|form| expand(vm, form)).collect()
}

fn expand_list(vm: &mut Vm, list: &List) -> Result<Value> {
    let items = list.to_vec();
    if let Value::Symbol(head) = &items[0] {
        match head.name() {
            "quote" | "code" => return Ok(Value::List(list.clone())),
            "quasiquote" => {
                let [_, template] = items.as_slice() else {
                    return Err(Error::macro_error("quasiquote takes exactly one form"));
                };
                let rewritten = quasiquote(template)?;
                return expand(vm, &rewritten);
            }
            "unquote" | "unquote-splicing" => {
                return Err(Error::macro_error(format!("{} outside quasiquote", head)));
            }
            // Parameter lists are left alone.
            "fn" if items.len() >= 2 => return expand_body(vm, &items, 2),
            "defmacro" if items.len() >= 3 => return expand_body(vm, &items, 3),
            _ => {
                if let Some(expander) = globals::lookup_macro(head) {
                    if !matches!(expander, Value::Function(_)) {
                        return Err(Error::macro_error(format!(
                            "macro {} has a non-function expander: {}",
                            head, expander
                        )));
                    }
                    tracing::trace!(target: "ell::macros", name = %head, "expanding");
                    let expansion = vm.call(&expander, &items[1..])?;
                    return expand(vm, &expansion);
                }
            }
        }
    }
    Ok(Value::list(expand_all(vm, &items)?))
}

/// Expand everything from index `from` on, keeping the prefix verbatim.
fn expand_body(vm: &mut Vm, items: &[Value], from: usize) -> Result<Value> {
    let mut result = items[..from].to_vec();
    result.extend(expand_all(vm, &items[from..])?);
    Ok(Value::list(result))
}

// ============================================================================
// Quasiquote
// ============================================================================

fn call(name: &str, args: Vec<Value>) -> Value {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::symbol(name));
    items.extend(args);
    Value::list(items)
}

fn quoted(value: Value) -> Value {
    call("quote", vec![value])
}

/// The `(op x)` argument when `form` is a two-element list headed by `op`.
fn unary_form<'a>(form: &'a Value, op: &str) -> Option<&'a Value> {
    let list = form.as_list()?;
    if list.len() == 2 && list.car()?.is_symbol(op) {
        list.nth(1)
    } else {
        None
    }
}

/// Rewrite a quasiquote template into an expression that builds it.
fn quasiquote(template: &Value) -> Result<Value> {
    match template {
        Value::Symbol(_) => Ok(quoted(template.clone())),
        Value::List(list) if list.is_empty() => Ok(quoted(template.clone())),
        Value::List(list) => {
            if let Some(inner) = unary_form(template, "unquote") {
                return Ok(inner.clone());
            }
            match list.car() {
                Some(head) if head.is_symbol("quasiquote") => {
                    Err(Error::macro_error("nested quasiquote is not supported"))
                }
                Some(head) if head.is_symbol("unquote-splicing") => Err(Error::macro_error(
                    "unquote-splicing must appear inside a list",
                )),
                _ => Ok(call("concat", segments(&list.to_vec())?)),
            }
        }
        Value::Vector(v) => Ok(call(
            "apply",
            vec![
                Value::symbol("vector"),
                call("concat", segments(&v.to_vec())?),
            ],
        )),
        Value::Struct(s) => {
            let mut parts = Vec::with_capacity(s.len());
            for (key, value) in s.entries() {
                parts.push(call("list", vec![quoted(key.to_value()), quasiquote(&value)?]));
            }
            Ok(call(
                "apply",
                vec![Value::symbol("struct"), call("concat", parts)],
            ))
        }
        _ => Ok(template.clone()),
    }
}

/// One `concat` argument per element: spliced values directly, everything
/// else wrapped in a one-element `list`.
fn segments(items: &[Value]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| match unary_form(item, "unquote-splicing") {
            Some(spliced) => Ok(spliced.clone()),
            None => Ok(call("list", vec![quasiquote(item)?])),
        })
        .collect()
}
