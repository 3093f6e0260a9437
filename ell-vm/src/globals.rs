// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Process-wide global bindings and macro table.
//!
//! Both tables are shared by every VM in the process, including spawned
//! flows. Callers receive cloned values, never references into a table.
//! Concurrent definitions of the same name are last-writer-wins.

use std::collections::HashMap;

use ell_parser::{Symbol, Value};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// The global that, when bound to a one-argument closure, receives errors
/// raised during execution.
pub const TOP_HANDLER: &str = "*top-handler*";

static GLOBALS: Lazy<RwLock<HashMap<Symbol, Value>>> = Lazy::new(|| RwLock::new(HashMap::new()));

static MACROS: Lazy<RwLock<HashMap<Symbol, Value>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Bind (or rebind) a global.
pub fn define(name: Symbol, value: Value) {
    GLOBALS.write().insert(name, value);
}

/// Look up a global.
#[inline]
pub fn lookup(name: &Symbol) -> Option<Value> {
    GLOBALS.read().get(name).cloned()
}

/// Assign an existing global. Returns false when `name` is unbound.
pub fn assign(name: &Symbol, value: Value) -> bool {
    match GLOBALS.write().get_mut(name) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Remove a global binding. Returns whether it existed.
pub fn undefine(name: &Symbol) -> bool {
    GLOBALS.write().remove(name).is_some()
}

pub fn is_defined(name: &Symbol) -> bool {
    GLOBALS.read().contains_key(name)
}

/// Names of every bound global, sorted.
pub fn names() -> Vec<Symbol> {
    let mut names: Vec<Symbol> = GLOBALS.read().keys().cloned().collect();
    names.sort();
    names
}

/// Register a macro expander, replacing (with a warning) any previous one.
pub fn define_macro(name: Symbol, expander: Value) {
    if MACROS.write().insert(name.clone(), expander).is_some() {
        tracing::warn!(name = %name, "redefining macro");
    }
}

/// The expander for macro `name`.
pub fn lookup_macro(name: &Symbol) -> Option<Value> {
    MACROS.read().get(name).cloned()
}

pub fn is_macro(name: &Symbol) -> bool {
    MACROS.read().contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_lookup_undefine() {
        let name = Symbol::new("globals-test-x");
        assert!(lookup(&name).is_none());
        define(name.clone(), Value::Number(1.0));
        assert_eq!(lookup(&name), Some(Value::Number(1.0)));
        assert!(assign(&name, Value::Number(2.0)));
        assert_eq!(lookup(&name), Some(Value::Number(2.0)));
        assert!(undefine(&name));
        assert!(!is_defined(&name));
    }

    #[test]
    fn test_assign_unbound_fails() {
        let name = Symbol::new("globals-test-never-bound");
        assert!(!assign(&name, Value::Null));
        assert!(!is_defined(&name));
    }

    #[test]
    fn test_macro_table() {
        let name = Symbol::new("globals-test-macro");
        define_macro(name.clone(), Value::Null);
        define_macro(name.clone(), Value::Boolean(true));
        assert!(is_macro(&name));
        assert_eq!(lookup_macro(&name), Some(Value::Boolean(true)));
        assert!(!is_defined(&name));
    }
}
