// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Binding call arguments to frame slots.

use ell_parser::{Code, Keyword, List, Slots, Value};

use crate::error::{Error, Result};

/// Build the frame slots for a call to `code` with `args` in source order.
pub fn bind_arguments(code: &Code, args: &[Value]) -> Result<Slots> {
    let argc = code.argc;
    match (&code.defaults, &code.keys) {
        (None, _) => {
            if args.len() != argc {
                return Err(arity_error(code, args));
            }
            Ok(Slots::from(args))
        }
        (Some(defaults), None) if defaults.is_empty() => {
            if args.len() < argc {
                return Err(arity_error(code, args));
            }
            let mut slots = Slots::from(&args[..argc]);
            slots.push(Value::List(List::from(args[argc..].to_vec())));
            Ok(slots)
        }
        (Some(defaults), None) => {
            if args.len() < argc || args.len() > argc + defaults.len() {
                return Err(arity_error(code, args));
            }
            let mut slots = Slots::from(args);
            slots.extend(defaults[args.len() - argc..].iter().cloned());
            Ok(slots)
        }
        (Some(defaults), Some(keys)) => {
            if args.len() < argc {
                return Err(arity_error(code, args));
            }
            let mut slots = Slots::from(&args[..argc]);
            slots.extend(bind_keywords(&code.name, keys, defaults, &args[argc..])?);
            Ok(slots)
        }
    }
}

/// Match alternating `key: value` pairs against `keys`, starting from
/// `defaults`.
pub fn bind_keywords(
    name: &str,
    keys: &[Keyword],
    defaults: &[Value],
    pairs: &[Value],
) -> Result<Vec<Value>> {
    if pairs.len() % 2 != 0 {
        return Err(Error::argument(format!(
            "{}: keyword arguments must come in pairs",
            display_name(name)
        )));
    }
    let mut bound = defaults.to_vec();
    for pair in pairs.chunks_exact(2) {
        let Value::Keyword(key) = &pair[0] else {
            return Err(Error::argument(format!(
                "{}: expected a keyword, got {}",
                display_name(name),
                pair[0]
            )));
        };
        match keys.iter().position(|k| k == key) {
            Some(i) => bound[i] = pair[1].clone(),
            None => {
                return Err(Error::argument(format!(
                    "{}: unknown keyword argument {}",
                    display_name(name),
                    key
                )));
            }
        }
    }
    Ok(bound)
}

fn arity_error(code: &Code, args: &[Value]) -> Error {
    Error::argument(format!(
        "{} expects {}, got {}",
        display_name(&code.name),
        code.signature(),
        args.len()
    ))
}

pub(crate) fn display_name(name: &str) -> &str {
    if name.is_empty() { "anonymous function" } else { name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ell_parser::error_keys;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_fixed_arity_is_exact() {
        let code = Code::new("f", 2, None, None);
        assert_eq!(bind_arguments(&code, &[num(1.0), num(2.0)]).unwrap().len(), 2);
        for args in [vec![num(1.0)], vec![num(1.0), num(2.0), num(3.0)]] {
            let err = bind_arguments(&code, &args).unwrap_err();
            assert!(err.is(error_keys::ARGUMENT));
            assert!(err.to_string().contains("f expects 2 argument(s)"));
        }
    }

    #[test]
    fn test_rest() {
        let code = Code::new("f", 1, Some(vec![]), None);
        let slots = bind_arguments(&code, &[num(1.0), num(2.0), num(3.0)]).unwrap();
        assert_eq!(slots[1].to_string(), "(2 3)");
        let slots = bind_arguments(&code, &[num(1.0)]).unwrap();
        assert_eq!(slots[1], Value::empty_list());
        assert!(bind_arguments(&code, &[]).is_err());
    }

    #[test]
    fn test_optionals() {
        let code = Code::new("f", 1, Some(vec![Value::Null, num(3.0)]), None);
        let slots = bind_arguments(&code, &[num(1.0)]).unwrap();
        assert_eq!(slots.as_slice(), &[num(1.0), Value::Null, num(3.0)]);
        let slots = bind_arguments(&code, &[num(1.0), num(2.0)]).unwrap();
        assert_eq!(slots.as_slice(), &[num(1.0), num(2.0), num(3.0)]);
        assert!(bind_arguments(&code, &[num(1.0), num(2.0), num(3.0), num(4.0)]).is_err());
    }

    #[test]
    fn test_keywords() {
        let code = Code::new(
            "f",
            1,
            Some(vec![num(1.0), num(2.0)]),
            Some(vec![Keyword::new("x"), Keyword::new("y")]),
        );
        let slots = bind_arguments(&code, &[num(10.0), Value::keyword("y"), num(99.0)]).unwrap();
        assert_eq!(slots.as_slice(), &[num(10.0), num(1.0), num(99.0)]);

        let err = bind_arguments(&code, &[num(10.0), Value::keyword("z"), num(0.0)]).unwrap_err();
        assert!(err.to_string().contains("unknown keyword argument z:"));
        assert!(bind_arguments(&code, &[num(10.0), Value::keyword("x")]).is_err());
        assert!(bind_arguments(&code, &[num(10.0), num(1.0), num(2.0)]).is_err());
    }
}
