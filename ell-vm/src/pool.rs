// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Process-wide constant pool.
//!
//! Bytecode refers to literals, global names and nested code by a small
//! index into this table. Entries are appended and never evicted. Atoms are
//! deduplicated by value; aggregates, functions and code are deduplicated by
//! identity, so the same object interned from many code objects still
//! occupies a single slot.

use std::collections::HashMap;
use std::sync::Arc;

use ell_parser::{Keyword, Symbol, TypeTag, Value};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

#[derive(Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Null,
    Boolean(bool),
    Number(u64),
    Character(char),
    String(Arc<str>),
    Symbol(Symbol),
    Keyword(Keyword),
    Type(TypeTag),
    /// Aggregate identity: variant tag and address.
    Identity(u8, usize),
}

impl PoolKey {
    /// `None` for values that are never deduplicated.
    fn of(value: &Value) -> Option<PoolKey> {
        Some(match value {
            Value::Null => PoolKey::Null,
            Value::Boolean(b) => PoolKey::Boolean(*b),
            Value::Number(n) => PoolKey::Number(n.to_bits()),
            Value::Character(c) => PoolKey::Character(*c),
            Value::String(s) => PoolKey::String(Arc::clone(s)),
            Value::Symbol(s) => PoolKey::Symbol(s.clone()),
            Value::Keyword(k) => PoolKey::Keyword(k.clone()),
            Value::Type(t) => PoolKey::Type(t.clone()),
            Value::List(l) => PoolKey::Identity(0, l.as_ptr()),
            Value::Vector(v) => PoolKey::Identity(1, v.as_ptr()),
            Value::Struct(s) => PoolKey::Identity(2, s.as_ptr()),
            Value::Function(f) => PoolKey::Identity(3, Arc::as_ptr(f) as usize),
            Value::Code(c) => PoolKey::Identity(4, Arc::as_ptr(c) as usize),
            Value::Error(_) | Value::Blob(_) | Value::Channel(_) => return None,
        })
    }
}

#[derive(Default)]
struct Pool {
    index: HashMap<PoolKey, usize>,
    values: Vec<Value>,
}

static POOL: Lazy<RwLock<Pool>> = Lazy::new(|| RwLock::new(Pool::default()));

/// Intern `value`, returning its index.
pub fn intern(value: Value) -> usize {
    let Some(key) = PoolKey::of(&value) else {
        let mut pool = POOL.write();
        pool.values.push(value);
        return pool.values.len() - 1;
    };
    if let Some(&idx) = POOL.read().index.get(&key) {
        return idx;
    }
    let mut pool = POOL.write();
    if let Some(&idx) = pool.index.get(&key) {
        return idx;
    }
    let idx = pool.values.len();
    pool.values.push(value);
    pool.index.insert(key, idx);
    idx
}

/// The constant at `idx`.
#[inline]
pub fn get(idx: usize) -> Option<Value> {
    POOL.read().values.get(idx).cloned()
}

/// Number of constants interned so far.
pub fn len() -> usize {
    POOL.read().values.len()
}
