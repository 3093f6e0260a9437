// ell-parser - Symbol type with interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Symbols are identifiers whose textual name is their only identity.
//!
//! # Interning
//!
//! Symbols, keywords and type tags share one process-wide interner, guarded
//! by a single `Mutex`. Each kind has its own table, so `foo`, `foo:` and
//! `<foo>` are three distinct objects. Two interned names of the same kind
//! with the same text share the same `Arc<str>`, which gives:
//!
//! - **O(1) equality**: comparison is a pointer comparison
//! - **O(1) hashing**: hash is computed from the pointer address
//!
//! # Memory Behaviour
//!
//! Interned names are never deallocated. The tables grow monotonically for
//! the lifetime of the process.
//!
//! # Thread Safety
//!
//! Interning takes the lock; comparison and lookup of an already interned
//! name do not. Spawned flows may intern freely.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};

/// Which table a name is interned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameKind {
    Symbol = 0,
    Keyword = 1,
    Type = 2,
}

/// Global name interner
static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();

struct Interner {
    tables: [HashSet<Arc<str>>; 3],
}

impl Interner {
    fn new() -> Self {
        Interner {
            tables: [HashSet::new(), HashSet::new(), HashSet::new()],
        }
    }

    fn intern(&mut self, kind: NameKind, name: &str) -> Arc<str> {
        let table = &mut self.tables[kind as usize];
        if let Some(existing) = table.get(name) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(name);
        table.insert(Arc::clone(&interned));
        interned
    }
}

fn get_interner() -> &'static Mutex<Interner> {
    INTERNER.get_or_init(|| Mutex::new(Interner::new()))
}

/// Intern `name` in the table for `kind`.
pub(crate) fn intern_name(kind: NameKind, name: &str) -> Arc<str> {
    get_interner()
        .lock()
        .expect("Name interner mutex poisoned: another thread panicked while holding the lock")
        .intern(kind, name)
}

/// Number of distinct names interned for `kind`.
pub(crate) fn interned_count(kind: NameKind) -> usize {
    get_interner()
        .lock()
        .expect("Name interner mutex poisoned: another thread panicked while holding the lock")
        .tables[kind as usize]
        .len()
}

/// An interned symbol.
#[derive(Clone)]
pub struct Symbol {
    name: Arc<str>,
}

impl Symbol {
    /// Intern a symbol.
    pub fn new(name: &str) -> Self {
        Symbol {
            name: intern_name(NameKind::Symbol, name),
        }
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of distinct symbols interned so far.
    pub fn interned_count() -> usize {
        interned_count(NameKind::Symbol)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.name)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        // Due to interning, pointer comparison is sufficient
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.name).cast::<u8>().hash(state);
    }
}

// ============================================================================
// Tests
// ============================================================================
