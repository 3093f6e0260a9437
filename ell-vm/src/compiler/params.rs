// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Parameter list parsing for `fn` and `defmacro`.
//!
//! A parameter list is a list of symbols, optionally ending in exactly one
//! of:
//!
//! - `& rest`: the remaining arguments as a list
//! - `[a (b 2)]`: optional positional arguments with defaults
//! - `{x: 1 y: 2}`: keyword arguments with defaults
//!
//! A bare symbol in place of the list binds every argument as a rest list.

use ell_parser::{Keyword, StructKey, Symbol, Value};

use crate::error::{Error, Result};

/// A parsed parameter list.
#[derive(Debug, Clone)]
pub struct Params {
    /// Frame slot names, in slot order.
    pub names: Vec<Symbol>,
    /// Required positional arguments.
    pub argc: usize,
    /// See [`ell_parser::Code`] for the encoding.
    pub defaults: Option<Vec<Value>>,
    pub keys: Option<Vec<Keyword>>,
}

/// Parse the parameter form of a `fn`.
pub fn parse_params(form: &Value) -> Result<Params> {
    match form {
        Value::Symbol(rest) => Ok(Params {
            names: vec![rest.clone()],
            argc: 0,
            defaults: Some(Vec::new()),
            keys: None,
        }),
        Value::List(list) => parse_list(&list.to_vec(), form),
        _ => Err(Error::syntax("parameter list must be a list or symbol", form)),
    }
}

fn parse_list(items: &[Value], form: &Value) -> Result<Params> {
    let mut names = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let last = i + 1 == items.len();
        match &items[i] {
            Value::Symbol(s) if s.name() == "&" => {
                let rest = match items.get(i + 1) {
                    Some(Value::Symbol(r)) if i + 2 == items.len() => r.clone(),
                    _ => return Err(Error::syntax("& must be followed by one final symbol", form)),
                };
                let argc = names.len();
                names.push(rest);
                return finish(names, argc, Some(Vec::new()), None, form);
            }
            Value::Symbol(s) => names.push(s.clone()),
            Value::Vector(v) if last => {
                let argc = names.len();
                let mut defaults = Vec::new();
                for spec in v.to_vec() {
                    let (name, default) = optional_param(&spec, form)?;
                    names.push(name);
                    defaults.push(default);
                }
                return finish(names, argc, Some(defaults), None, form);
            }
            Value::Struct(s) if last => {
                let argc = names.len();
                let mut keys = Vec::new();
                let mut defaults = Vec::new();
                for (key, default) in s.entries() {
                    let keyword = match key {
                        StructKey::Keyword(k) => k,
                        StructKey::Symbol(s) => Keyword::new(s.name()),
                        _ => return Err(Error::syntax("keyword parameter must be a keyword", form)),
                    };
                    names.push(keyword.to_symbol());
                    keys.push(keyword);
                    defaults.push(constant(&default, form)?);
                }
                return finish(names, argc, Some(defaults), Some(keys), form);
            }
            Value::Vector(_) | Value::Struct(_) => {
                return Err(Error::syntax(
                    "optional or keyword parameters must come last",
                    form,
                ));
            }
            other => {
                return Err(Error::syntax(format!("invalid parameter: {}", other), form));
            }
        }
        i += 1;
    }
    let argc = names.len();
    finish(names, argc, None, None, form)
}

fn finish(
    names: Vec<Symbol>,
    argc: usize,
    defaults: Option<Vec<Value>>,
    keys: Option<Vec<Keyword>>,
    form: &Value,
) -> Result<Params> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(Error::syntax(format!("duplicate parameter: {}", name), form));
        }
    }
    Ok(Params {
        names,
        argc,
        defaults,
        keys,
    })
}

/// `b` or `(b default)`.
fn optional_param(spec: &Value, form: &Value) -> Result<(Symbol, Value)> {
    match spec {
        Value::Symbol(s) => Ok((s.clone(), Value::Null)),
        Value::List(l) if l.len() == 2 => match l.car() {
            Some(Value::Symbol(s)) => {
                let default = l.nth(1).cloned().unwrap_or(Value::Null);
                Ok((s.clone(), constant(&default, form)?))
            }
            _ => Err(Error::syntax("optional parameter name must be a symbol", form)),
        },
        _ => Err(Error::syntax(format!("invalid optional parameter: {}", spec), form)),
    }
}

/// Defaults are constants: self-evaluating atoms or quoted forms.
fn constant(value: &Value, form: &Value) -> Result<Value> {
    match value {
        Value::Symbol(s) => Err(Error::syntax(
            format!("parameter default must be a constant, got {}", s),
            form,
        )),
        Value::List(l) if l.car().is_some_and(|h| h.is_symbol("quote")) && l.len() == 2 => {
            Ok(l.nth(1).cloned().unwrap_or(Value::Null))
        }
        Value::List(l) if !l.is_empty() => Err(Error::syntax(
            "parameter default must be a constant or quoted form",
            form,
        )),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ell_parser::Parser;

    fn params(src: &str) -> Result<Params> {
        parse_params(&Parser::parse_str(src).unwrap().unwrap())
    }

    #[test]
    fn test_fixed() {
        let p = params("(a b)").unwrap();
        assert_eq!(p.argc, 2);
        assert!(p.defaults.is_none());
        assert!(p.keys.is_none());
    }

    #[test]
    fn test_rest() {
        let p = params("(a & more)").unwrap();
        assert_eq!(p.argc, 1);
        assert_eq!(p.defaults, Some(vec![]));
        assert_eq!(p.names.len(), 2);

        let p = params("args").unwrap();
        assert_eq!(p.argc, 0);
        assert_eq!(p.defaults, Some(vec![]));
    }

    #[test]
    fn test_optional() {
        let p = params("(a [b (c 3)])").unwrap();
        assert_eq!(p.argc, 1);
        assert_eq!(p.defaults, Some(vec![Value::Null, Value::Number(3.0)]));
        assert!(p.keys.is_none());
        assert_eq!(p.names[2], Symbol::new("c"));
    }

    #[test]
    fn test_keywords() {
        let p = params("(a {x: 1 y: 2})").unwrap();
        assert_eq!(p.argc, 1);
        assert_eq!(p.defaults, Some(vec![Value::Number(1.0), Value::Number(2.0)]));
        assert_eq!(p.keys, Some(vec![Keyword::new("x"), Keyword::new("y")]));
        assert_eq!(p.names[1], Symbol::new("x"));
    }

    #[test]
    fn test_quoted_default() {
        let p = params("([a (b '(1 2))])").unwrap();
        assert_eq!(p.defaults.unwrap()[1].to_string(), "(1 2)");
    }

    #[test]
    fn test_malformed() {
        assert!(params("(a &)").is_err());
        assert!(params("(a & b c)").is_err());
        assert!(params("([b] c)").is_err());
        assert!(params("(a a)").is_err());
        assert!(params("(1)").is_err());
        assert!(params("([(b x)])").is_err());
        assert!(params("42").is_err());
    }
}
