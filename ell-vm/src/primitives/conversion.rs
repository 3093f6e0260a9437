// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Conversions between strings, numbers, symbols and keywords.

use ell_parser::{ErrorValue, Keyword, Symbol, Value};

use super::argument_error;

type Result = std::result::Result<Value, ErrorValue>;

fn concatenated(args: &[Value]) -> String {
    args.iter().map(Value::to_text).collect()
}

pub(super) fn builtin_to_string(args: &[Value]) -> Result {
    match &args[0] {
        Value::String(_) => Ok(args[0].clone()),
        other => Ok(Value::string(&other.to_text())),
    }
}

/// Accepts `f64` syntax with optional surrounding whitespace. Infinities
/// and NaN are rejected.
pub(super) fn builtin_to_number(args: &[Value]) -> Result {
    match &args[0] {
        Value::Number(_) => Ok(args[0].clone()),
        Value::Character(c) => Ok(Value::Number(*c as u32 as f64)),
        Value::String(s) => parse_number(s)
            .map(Value::Number)
            .ok_or_else(|| argument_error(format!("to-number: not a number: {}", args[0]))),
        other => Err(argument_error(format!(
            "to-number: cannot convert {} to a number",
            other.type_tag()
        ))),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let n: f64 = text.trim().parse().ok()?;
    n.is_finite().then_some(n)
}

pub(super) fn builtin_string(args: &[Value]) -> Result {
    Ok(Value::string(&concatenated(args)))
}

pub(super) fn builtin_symbol(args: &[Value]) -> Result {
    let name = concatenated(args);
    if name.is_empty() {
        return Err(argument_error("symbol: name must not be empty"));
    }
    Ok(Value::Symbol(Symbol::new(&name)))
}

/// A trailing colon in the name is dropped, so `(keyword "a:")` is `a:`.
pub(super) fn builtin_keyword(args: &[Value]) -> Result {
    let name = concatenated(args);
    let name = name.strip_suffix(':').unwrap_or(&name);
    if name.is_empty() {
        return Err(argument_error("keyword: name must not be empty"));
    }
    Ok(Value::Keyword(Keyword::new(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_accepts() {
        for (text, n) in [("12", 12.0), (" -3.5 ", -3.5), ("1e3", 1000.0)] {
            assert_eq!(
                builtin_to_number(&[Value::string(text)]).unwrap(),
                Value::Number(n)
            );
        }
    }

    #[test]
    fn test_to_number_rejects() {
        for text in ["", "abc", "1.2.3", "inf", "nan", "12x"] {
            let err = builtin_to_number(&[Value::string(text)]).unwrap_err();
            assert!(err.is(ell_parser::error_keys::ARGUMENT), "{}", text);
        }
        assert!(builtin_to_number(&[Value::Null]).is_err());
    }

    #[test]
    fn test_to_string() {
        assert_eq!(
            builtin_to_string(&[Value::Number(3.0)]).unwrap(),
            Value::string("3")
        );
        assert_eq!(
            builtin_to_string(&[Value::string("x")]).unwrap(),
            Value::string("x")
        );
        assert_eq!(
            builtin_to_string(&[Value::list(vec![Value::string("a")])]).unwrap(),
            Value::string("(\"a\")")
        );
    }

    #[test]
    fn test_names() {
        let args = [Value::string("foo"), Value::Number(1.0)];
        assert_eq!(builtin_symbol(&args).unwrap(), Value::symbol("foo1"));
        assert_eq!(
            builtin_keyword(&[Value::string("bar:")]).unwrap(),
            Value::keyword("bar")
        );
        assert_eq!(builtin_string(&args).unwrap(), Value::string("foo1"));
    }
}
