// ell-parser - Compiled code objects
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The compiled body of a function: a flat array of opcode words plus the
//! metadata the VM needs to bind arguments.
//!
//! The argument convention is encoded by `defaults` and `keys`:
//!
//! | `defaults`        | `keys`   | convention                          |
//! |-------------------|----------|-------------------------------------|
//! | `None`            | `None`   | exactly `argc` arguments            |
//! | `Some([])`        | `None`   | `argc` required, then a rest list   |
//! | `Some([d, ...])`  | `None`   | `argc` required, then optionals     |
//! | `Some([d, ...])`  | `Some`   | `argc` required, then keyword pairs |
//!
//! A `Code` is mutable only while the compiler builds it. Once wrapped in an
//! `Arc` it is never modified.

use std::fmt;

use crate::keyword::Keyword;
use crate::value::Value;

/// A compiled function body.
#[derive(Debug, Clone, Default)]
pub struct Code {
    /// Debug name (empty for anonymous functions and top-level forms).
    pub name: String,
    /// Opcode words. Each instruction is 1, 2 or 3 words wide.
    pub ops: Vec<i32>,
    /// Number of required positional arguments.
    pub argc: usize,
    /// Defaults for optional/keyword arguments, or `Some([])` for a rest arg.
    pub defaults: Option<Vec<Value>>,
    /// Keyword names, paired 1:1 with `defaults`.
    pub keys: Option<Vec<Keyword>>,
}

impl Code {
    /// Create an empty code object with the given calling convention.
    pub fn new(
        name: impl Into<String>,
        argc: usize,
        defaults: Option<Vec<Value>>,
        keys: Option<Vec<Keyword>>,
    ) -> Self {
        Code {
            name: name.into(),
            ops: Vec::new(),
            argc,
            defaults,
            keys,
        }
    }

    /// True when the function takes exactly `argc` arguments.
    #[inline]
    pub fn is_fixed_arity(&self) -> bool {
        self.defaults.is_none()
    }

    /// True when the function collects trailing arguments into a list.
    #[inline]
    pub fn has_rest(&self) -> bool {
        matches!(&self.defaults, Some(d) if d.is_empty())
    }

    /// Number of frame slots a call to this code fills.
    pub fn frame_size(&self) -> usize {
        match &self.defaults {
            None => self.argc,
            Some(d) if d.is_empty() => self.argc + 1,
            Some(d) => self.argc + d.len(),
        }
    }

    /// Append one opcode word.
    #[inline]
    pub fn push_word(&mut self, word: i32) {
        self.ops.push(word);
    }

    /// Overwrite an already emitted word (jump backpatching).
    #[inline]
    pub fn set_word(&mut self, pos: usize, word: i32) {
        self.ops[pos] = word;
    }

    /// Human readable description of the calling convention.
    pub fn signature(&self) -> String {
        match (&self.defaults, &self.keys) {
            (None, _) => format!("{} argument(s)", self.argc),
            (Some(d), _) if d.is_empty() => format!("at least {} argument(s)", self.argc),
            (Some(d), None) => format!("{} to {} argument(s)", self.argc, self.argc + d.len()),
            (Some(_), Some(keys)) => {
                let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                format!("{} argument(s) and keys {}", self.argc, names.join(" "))
            }
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "#[code]")
        } else {
            write!(f, "#[code {}]", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventions() {
        let fixed = Code::new("f", 2, None, None);
        assert!(fixed.is_fixed_arity());
        assert_eq!(fixed.frame_size(), 2);

        let rest = Code::new("r", 1, Some(vec![]), None);
        assert!(rest.has_rest());
        assert_eq!(rest.frame_size(), 2);

        let optional = Code::new("o", 1, Some(vec![Value::Null, Value::Number(3.0)]), None);
        assert!(!optional.has_rest());
        assert_eq!(optional.frame_size(), 3);
    }

    #[test]
    fn test_backpatch() {
        let mut code = Code::default();
        code.push_word(4);
        code.push_word(0);
        code.set_word(1, 7);
        assert_eq!(code.ops, vec![4, 7]);
    }
}
