// ell-parser - Type tags
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Interned type tags, spelled `<name>`.
//!
//! A type tag is both the result of [`crate::Value::type_tag`] and a
//! first-class value used in primitive signatures.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::symbol::{NameKind, intern_name};

/// An interned type tag.
#[derive(Clone)]
pub struct TypeTag {
    name: Arc<str>,
}

impl TypeTag {
    /// Intern a type tag from its bare name (`"number"` for `<number>`).
    pub fn new(name: &str) -> Self {
        TypeTag {
            name: intern_name(NameKind::Type, name),
        }
    }

    /// Parse `<name>`; the angle brackets are optional.
    pub fn parse(s: &str) -> Self {
        let inner = s
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap_or(s);
        TypeTag::new(inner)
    }

    /// Get the bare name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

macro_rules! well_known_types {
    ($($fn_name:ident => $text:literal),* $(,)?) => {
        impl TypeTag {
            $(
                #[doc = concat!("The `<", $text, ">` type tag.")]
                pub fn $fn_name() -> TypeTag {
                    static TAG: OnceLock<TypeTag> = OnceLock::new();
                    TAG.get_or_init(|| TypeTag::new($text)).clone()
                }
            )*
        }
    };
}

well_known_types! {
    any => "any",
    null => "null",
    boolean => "boolean",
    number => "number",
    character => "character",
    string => "string",
    symbol => "symbol",
    keyword => "keyword",
    type_tag => "type",
    list => "list",
    vector => "vector",
    structure => "struct",
    function => "function",
    code => "code",
    error => "error",
    blob => "blob",
    channel => "channel",
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.name).cast::<u8>().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TypeTag::number().to_string(), "<number>");
    }

    #[test]
    fn test_parse() {
        assert_eq!(TypeTag::parse("<number>"), TypeTag::number());
        assert_eq!(TypeTag::parse("string"), TypeTag::string());
    }

    #[test]
    fn test_well_known_is_interned() {
        assert_eq!(TypeTag::any(), TypeTag::new("any"));
    }
}
