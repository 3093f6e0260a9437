// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lists, vectors and structs.

use ell_parser::{ErrorValue, List, Struct, StructKey, Value};

use super::{argument_error, number, wrong_type};

type Result = std::result::Result<Value, ErrorValue>;

// ============================================================================
// Lists
// ============================================================================

pub(super) fn builtin_list(args: &[Value]) -> Result {
    Ok(Value::list(args.to_vec()))
}

pub(super) fn builtin_cons(args: &[Value]) -> Result {
    let tail = args[1].as_list().cloned().unwrap_or_default();
    Ok(Value::List(List::cons(args[0].clone(), tail)))
}

/// The car of the empty list is null.
pub(super) fn builtin_car(args: &[Value]) -> Result {
    Ok(args[0]
        .as_list()
        .and_then(|l| l.car().cloned())
        .unwrap_or(Value::Null))
}

pub(super) fn builtin_cdr(args: &[Value]) -> Result {
    Ok(Value::List(
        args[0].as_list().map(List::cdr).unwrap_or_default(),
    ))
}

pub(super) fn builtin_concat(args: &[Value]) -> Result {
    let items: Vec<Value> = args
        .iter()
        .filter_map(Value::as_list)
        .flat_map(|l| l.iter().cloned())
        .collect();
    Ok(Value::list(items))
}

pub(super) fn builtin_reverse(args: &[Value]) -> Result {
    Ok(Value::List(
        args[0].as_list().map(List::reverse).unwrap_or_default(),
    ))
}

pub(super) fn builtin_length(args: &[Value]) -> Result {
    let n = match &args[0] {
        Value::Null => 0,
        Value::List(l) => l.len(),
        Value::Vector(v) => v.len(),
        Value::Struct(s) => s.len(),
        Value::String(s) => s.chars().count(),
        Value::Blob(b) => b.len(),
        Value::Channel(c) => c.len(),
        other => {
            return Err(argument_error(format!(
                "length: no length for {}",
                other.type_tag()
            )));
        }
    };
    Ok(Value::Number(n as f64))
}

pub(super) fn builtin_empty_p(args: &[Value]) -> Result {
    let empty = match &args[0] {
        Value::Null => true,
        Value::List(l) => l.is_empty(),
        Value::Vector(v) => v.is_empty(),
        Value::Struct(s) => s.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(empty))
}

// ============================================================================
// Vectors
// ============================================================================

pub(super) fn builtin_vector(args: &[Value]) -> Result {
    Ok(Value::vector(args.to_vec()))
}

fn index(name: &str, value: &Value, len: usize) -> std::result::Result<usize, ErrorValue> {
    let n = number(value);
    if n.fract() != 0.0 || n < 0.0 || n >= len as f64 {
        return Err(argument_error(format!(
            "{}: index {} out of range for length {}",
            name, value, len
        )));
    }
    Ok(n as usize)
}

pub(super) fn builtin_vector_ref(args: &[Value]) -> Result {
    let Value::Vector(v) = &args[0] else {
        return Err(wrong_type("vector-ref", "<vector>", &args[0]));
    };
    let i = index("vector-ref", &args[1], v.len())?;
    Ok(v.get(i).unwrap_or(Value::Null))
}

pub(super) fn builtin_vector_set(args: &[Value]) -> Result {
    let Value::Vector(v) = &args[0] else {
        return Err(wrong_type("vector-set!", "<vector>", &args[0]));
    };
    let i = index("vector-set!", &args[1], v.len())?;
    v.set(i, args[2].clone());
    Ok(Value::Null)
}

// ============================================================================
// Structs
// ============================================================================

fn struct_key(name: &str, value: &Value) -> std::result::Result<StructKey, ErrorValue> {
    StructKey::from_value(value).ok_or_else(|| {
        argument_error(format!(
            "{}: struct keys must be strings, symbols, keywords or types, got {}",
            name, value
        ))
    })
}

pub(super) fn builtin_struct(args: &[Value]) -> Result {
    if args.len() % 2 != 0 {
        return Err(argument_error("struct: expected key/value pairs"));
    }
    let mut pairs = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        pairs.push((struct_key("struct", &pair[0])?, pair[1].clone()));
    }
    Ok(Value::Struct(Struct::from_pairs(pairs)))
}

pub(super) fn builtin_get(args: &[Value]) -> Result {
    let Value::Struct(s) = &args[0] else {
        return Err(wrong_type("get", "<struct>", &args[0]));
    };
    let key = struct_key("get", &args[1])?;
    Ok(s.get(&key).unwrap_or(Value::Null))
}

pub(super) fn builtin_put(args: &[Value]) -> Result {
    let Value::Struct(s) = &args[0] else {
        return Err(wrong_type("put!", "<struct>", &args[0]));
    };
    s.put(struct_key("put!", &args[1])?, args[2].clone());
    Ok(args[0].clone())
}

pub(super) fn builtin_has_p(args: &[Value]) -> Result {
    let Value::Struct(s) = &args[0] else {
        return Err(wrong_type("has?", "<struct>", &args[0]));
    };
    Ok(Value::Boolean(s.has(&struct_key("has?", &args[1])?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_list_operations() {
        let l = builtin_list(&[num(1.0), num(2.0)]).unwrap();
        assert_eq!(builtin_car(&[l.clone()]).unwrap(), num(1.0));
        assert_eq!(builtin_cdr(&[l.clone()]).unwrap().to_string(), "(2)");
        assert_eq!(builtin_car(&[Value::empty_list()]).unwrap(), Value::Null);
        assert_eq!(
            builtin_concat(&[l.clone(), l.clone()]).unwrap().to_string(),
            "(1 2 1 2)"
        );
        assert_eq!(builtin_reverse(&[l.clone()]).unwrap().to_string(), "(2 1)");
        assert_eq!(builtin_length(&[l]).unwrap(), num(2.0));
        assert_eq!(builtin_empty_p(&[Value::empty_list()]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_vector_bounds() {
        let v = builtin_vector(&[num(1.0), num(2.0)]).unwrap();
        assert_eq!(builtin_vector_ref(&[v.clone(), num(1.0)]).unwrap(), num(2.0));
        assert!(builtin_vector_ref(&[v.clone(), num(2.0)]).is_err());
        assert!(builtin_vector_ref(&[v.clone(), num(0.5)]).is_err());
        builtin_vector_set(&[v.clone(), num(0.0), num(9.0)]).unwrap();
        assert_eq!(v.to_string(), "[9 2]");
    }

    #[test]
    fn test_struct_access() {
        let s = builtin_struct(&[Value::keyword("a"), num(1.0)]).unwrap();
        assert_eq!(builtin_get(&[s.clone(), Value::keyword("a")]).unwrap(), num(1.0));
        assert_eq!(builtin_get(&[s.clone(), Value::keyword("b")]).unwrap(), Value::Null);
        builtin_put(&[s.clone(), Value::keyword("b"), num(2.0)]).unwrap();
        assert_eq!(builtin_has_p(&[s.clone(), Value::keyword("b")]).unwrap(), Value::Boolean(true));
        assert!(builtin_get(&[s, num(1.0)]).is_err());
        assert!(builtin_struct(&[Value::keyword("a")]).is_err());
    }

    #[test]
    fn test_wrong_container_type() {
        let l = builtin_list(&[num(1.0)]).unwrap();
        assert!(builtin_vector_ref(&[l.clone(), num(0.0)]).is_err());
        assert!(builtin_vector_set(&[l.clone(), num(0.0), num(2.0)]).is_err());
        let err = builtin_get(&[num(3.0), Value::keyword("a")]).unwrap_err();
        assert!(err.is(ell_parser::error_keys::ARGUMENT));
        assert!(builtin_put(&[l.clone(), Value::keyword("a"), num(1.0)]).is_err());
        assert!(builtin_has_p(&[l, Value::keyword("a")]).is_err());
    }
}
