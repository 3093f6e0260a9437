// ell-parser - Keyword type with interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Keywords are self-evaluating identifiers spelled with a trailing colon
//! (`name:`).
//!
//! Keywords live in their own interner table (see [`crate::symbol`]), so
//! the keyword `foo:` and the symbol `foo` are unrelated objects even though
//! they share the text `foo`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::symbol::{NameKind, Symbol, intern_name, interned_count};

/// An interned keyword.
///
/// The stored name excludes the trailing colon; it is added back when
/// printed.
#[derive(Clone)]
pub struct Keyword {
    name: Arc<str>,
}

impl Keyword {
    /// Create a keyword from its bare name (`"foo"` for `foo:`).
    pub fn new(name: &str) -> Self {
        Keyword {
            name: intern_name(NameKind::Keyword, name),
        }
    }

    /// Parse a keyword from its spelling. The trailing colon is optional.
    pub fn parse(s: &str) -> Self {
        Keyword::new(s.strip_suffix(':').unwrap_or(s))
    }

    /// Get the name, without the colon.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The symbol with the same name, used when a keyword names a parameter.
    pub fn to_symbol(&self) -> Symbol {
        Symbol::new(&self.name)
    }

    /// Number of distinct keywords interned so far.
    pub fn interned_count() -> usize {
        interned_count(NameKind::Keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keyword({})", self)
    }
}

impl PartialEq for Keyword {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Keyword {}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Keyword {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Keyword {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.name).cast::<u8>().hash(state);
    }
}

// ============================================================================
// Tests
// ============================================================================
