// ell-parser - Value types for Ell
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Core value type for Ell.
//!
//! `Value` is a closed sum type over every runtime entity. Atoms are stored
//! inline; aggregates are reference counted so that cloning a value is
//! always cheap. Vectors and structs are shared and mutable; lists are
//! immutable cons chains.
//!
//! Equality ([`Value::equals`]) is structural for lists, vectors, structs
//! and errors, tolerant within [`EPSILON`] for numbers, and by identity for
//! functions, code and channels.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::channel::Channel;
use crate::code::Code;
use crate::function::Function;
use crate::keyword::Keyword;
use crate::symbol::Symbol;
use crate::type_tag::TypeTag;

/// Numbers closer than this compare equal.
pub const EPSILON: f64 = 1e-9;

/// The universal runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// The null value. Distinct from the empty list.
    #[default]
    Null,
    Boolean(bool),
    /// The only numeric type.
    Number(f64),
    Character(char),
    /// Immutable text.
    String(Arc<str>),
    Symbol(Symbol),
    Keyword(Keyword),
    Type(TypeTag),
    /// Immutable singly linked list.
    List(List),
    /// Mutable fixed-length sequence.
    Vector(Vector),
    /// Mutable key/value mapping.
    Struct(Struct),
    Function(Arc<Function>),
    Code(Arc<Code>),
    Error(ErrorValue),
    Blob(Arc<[u8]>),
    Channel(Channel),
}

// ============================================================================
// Lists
// ============================================================================

/// An immutable cons list. The empty list is `List::empty()`, which is not
/// the same value as `Value::Null`.
#[derive(Clone, Default)]
pub struct List {
    head: Option<Arc<Cons>>,
}

/// A single cons cell.
pub struct Cons {
    car: Value,
    cdr: List,
}

impl List {
    /// The empty list.
    pub fn empty() -> Self {
        List { head: None }
    }

    /// Prepend `car` to `cdr`.
    pub fn cons(car: Value, cdr: List) -> Self {
        List {
            head: Some(Arc::new(Cons { car, cdr })),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// First element, or `None` for the empty list.
    #[inline]
    pub fn car(&self) -> Option<&Value> {
        self.head.as_ref().map(|cell| &cell.car)
    }

    /// Everything after the first element. The empty list's tail is empty.
    pub fn cdr(&self) -> List {
        match &self.head {
            Some(cell) => cell.cdr.clone(),
            None => List::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Element at position `n`.
    pub fn nth(&self, n: usize) -> Option<&Value> {
        self.iter().nth(n)
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            next: self.head.as_deref(),
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    pub fn reverse(&self) -> List {
        let mut result = List::empty();
        for item in self.iter() {
            result = List::cons(item.clone(), result);
        }
        result
    }

    /// Identity of the first cell, used for identity-based deduplication.
    pub fn as_ptr(&self) -> usize {
        self.head
            .as_ref()
            .map(|cell| Arc::as_ptr(cell) as usize)
            .unwrap_or(0)
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Drop for List {
    // Long lists would otherwise drop recursively.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cons) => next = cons.cdr.head.take(),
                Err(_) => break,
            }
        }
    }
}

/// Borrowing iterator over a list's elements.
pub struct ListIter<'a> {
    next: Option<&'a Cons>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        let cell = self.next?;
        self.next = cell.cdr.head.as_deref();
        Some(&cell.car)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> ListIter<'a> {
        self.iter()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        List::from(items)
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        let mut result = List::empty();
        for item in items.into_iter().rev() {
            result = List::cons(item, result);
        }
        result
    }
}

// ============================================================================
// Vectors
// ============================================================================

/// A shared, mutable vector. Clones alias the same storage.
#[derive(Clone)]
pub struct Vector(Arc<RwLock<Vec<Value>>>);

impl Vector {
    pub fn new(items: Vec<Value>) -> Self {
        Vector(Arc::new(RwLock::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.read().get(index).cloned()
    }

    /// Replace element `index`. Returns false when out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// A snapshot of the current elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    pub fn as_ptr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Vector) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Structs
// ============================================================================

/// The value kinds allowed as struct keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum StructKey {
    String(Arc<str>),
    Symbol(Symbol),
    Keyword(Keyword),
    Type(TypeTag),
}

impl StructKey {
    /// Convert a value into a key, if its kind is allowed as one.
    pub fn from_value(value: &Value) -> Option<StructKey> {
        match value {
            Value::String(s) => Some(StructKey::String(Arc::clone(s))),
            Value::Symbol(s) => Some(StructKey::Symbol(s.clone())),
            Value::Keyword(k) => Some(StructKey::Keyword(k.clone())),
            Value::Type(t) => Some(StructKey::Type(t.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            StructKey::String(s) => Value::String(Arc::clone(s)),
            StructKey::Symbol(s) => Value::Symbol(s.clone()),
            StructKey::Keyword(k) => Value::Keyword(k.clone()),
            StructKey::Type(t) => Value::Type(t.clone()),
        }
    }
}

impl fmt::Display for StructKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl fmt::Debug for StructKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A shared, mutable struct. Entries keep insertion order.
#[derive(Clone)]
pub struct Struct(Arc<RwLock<IndexMap<StructKey, Value>>>);

impl Struct {
    pub fn new() -> Self {
        Struct(Arc::new(RwLock::new(IndexMap::new())))
    }

    pub fn from_pairs(pairs: Vec<(StructKey, Value)>) -> Self {
        Struct(Arc::new(RwLock::new(pairs.into_iter().collect())))
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    pub fn get(&self, key: &StructKey) -> Option<Value> {
        self.0.read().get(key).cloned()
    }

    pub fn has(&self, key: &StructKey) -> bool {
        self.0.read().contains_key(key)
    }

    /// Insert or replace an entry.
    pub fn put(&self, key: StructKey, value: Value) {
        self.0.write().insert(key, value);
    }

    /// A snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(StructKey, Value)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn as_ptr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Struct) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Struct {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Keys of the built-in error taxonomy.
pub mod error_keys {
    pub const ARGUMENT: &str = "argument-error";
    pub const SYNTAX: &str = "syntax-error";
    pub const MACRO: &str = "macro-error";
    pub const IO: &str = "io-error";
    pub const INTERRUPT: &str = "interrupt";
    pub const GENERIC: &str = "error";
}

/// An error object: a keyword key followed by arbitrary data.
///
/// By convention the first data element is a message string. `ErrorValue`
/// is both a first-class value and the error type returned by primitives.
#[derive(Clone)]
pub struct ErrorValue {
    inner: Arc<ErrorData>,
}

struct ErrorData {
    key: Keyword,
    data: Vec<Value>,
}

impl ErrorValue {
    pub fn new(key: Keyword, data: Vec<Value>) -> Self {
        ErrorValue {
            inner: Arc::new(ErrorData { key, data }),
        }
    }

    /// An error whose only datum is `message`.
    pub fn with_message(key: &str, message: impl AsRef<str>) -> Self {
        ErrorValue::new(Keyword::new(key), vec![Value::string(message.as_ref())])
    }

    pub fn key(&self) -> &Keyword {
        &self.inner.key
    }

    pub fn data(&self) -> &[Value] {
        &self.inner.data
    }

    /// The message text, or an empty string when the first datum is not a
    /// string.
    pub fn message(&self) -> String {
        match self.inner.data.first() {
            Some(Value::String(s)) => s.to_string(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// True when the key is `key` (given without the colon).
    pub fn is(&self, key: &str) -> bool {
        self.inner.key.name() == key
    }

    pub fn ptr_eq(&self, other: &ErrorValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[error {}", self.inner.key)?;
        for datum in &self.inner.data {
            write!(f, " {}", datum)?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for ErrorValue {}

impl PartialEq for ErrorValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.inner.key == other.inner.key
                && slices_equal(&self.inner.data, &other.inner.data))
    }
}

// ============================================================================
// Constructors and predicates
// ============================================================================

impl Value {
    pub fn string(s: &str) -> Value {
        Value::String(Arc::from(s))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::new(name))
    }

    /// A keyword from its bare name (no colon).
    pub fn keyword(name: &str) -> Value {
        Value::Keyword(Keyword::new(name))
    }

    pub fn empty_list() -> Value {
        Value::List(List::empty())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(List::from(items))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Vector::new(items))
    }

    pub fn structure(pairs: Vec<(StructKey, Value)>) -> Value {
        Value::Struct(Struct::from_pairs(pairs))
    }

    pub fn error(key: &str, message: impl AsRef<str>) -> Value {
        Value::Error(ErrorValue::with_message(key, message))
    }

    /// Only `null` and `false` are false.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&Keyword> {
        match self {
            Value::Keyword(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for a symbol named `name`.
    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Value::Symbol(s) if s.name() == name)
    }

    /// The value's type tag.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::null(),
            Value::Boolean(_) => TypeTag::boolean(),
            Value::Number(_) => TypeTag::number(),
            Value::Character(_) => TypeTag::character(),
            Value::String(_) => TypeTag::string(),
            Value::Symbol(_) => TypeTag::symbol(),
            Value::Keyword(_) => TypeTag::keyword(),
            Value::Type(_) => TypeTag::type_tag(),
            Value::List(_) => TypeTag::list(),
            Value::Vector(_) => TypeTag::vector(),
            Value::Struct(_) => TypeTag::structure(),
            Value::Function(_) => TypeTag::function(),
            Value::Code(_) => TypeTag::code(),
            Value::Error(_) => TypeTag::error(),
            Value::Blob(_) => TypeTag::blob(),
            Value::Channel(_) => TypeTag::channel(),
        }
    }

    /// Structural equality.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_equal(*a, *b),
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::List(a), Value::List(b)) => lists_equal(a, b),
            (Value::Vector(a), Value::Vector(b)) => {
                a.ptr_eq(b) || slices_equal(&a.to_vec(), &b.to_vec())
            }
            (Value::Struct(a), Value::Struct(b)) => a.ptr_eq(b) || structs_equal(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Code(a), Value::Code(b)) => Arc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Channel(a), Value::Channel(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Identity comparison: atoms by value, aggregates by reference.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Vector(a), Value::Vector(b)) => a.ptr_eq(b),
            (Value::Struct(a), Value::Struct(b)) => a.ptr_eq(b),
            (Value::Error(a), Value::Error(b)) => a.ptr_eq(b),
            (Value::Blob(a), Value::Blob(b)) => Arc::ptr_eq(a, b),
            _ => self.equals(other),
        }
    }

    /// The `display` form: like `Display`, but strings and characters are
    /// written without quoting.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            Value::Character(c) => c.to_string(),
            other => other.to_string(),
        }
    }
}

fn numbers_equal(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < EPSILON || (a.is_nan() && b.is_nan())
}

fn lists_equal(a: &List, b: &List) -> bool {
    let mut left = a.iter();
    let mut right = b.iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.equals(y) => {}
            _ => return false,
        }
    }
}

fn slices_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

fn structs_equal(a: &Struct, b: &Struct) -> bool {
    let left = a.entries();
    left.len() == b.len()
        && left
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|other| v.equals(&other)))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Option<Value>> for Value {
    fn from(v: Option<Value>) -> Self {
        v.unwrap_or(Value::Null)
    }
}

// ============================================================================
// Printing
// ============================================================================

/// Format a number, printing integral values without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_char(c: char) -> String {
    match c {
        '\n' => "newline".to_string(),
        ' ' => "space".to_string(),
        '\t' => "tab".to_string(),
        '\r' => "return".to_string(),
        _ => c.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, "(", self.iter(), ")")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Character(c) => write!(f, "#\\{}", format_char(*c)),
            Value::String(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Keyword(k) => write!(f, "{}", k),
            Value::Type(t) => write!(f, "{}", t),
            Value::List(l) => write!(f, "{}", l),
            Value::Vector(v) => write_seq(f, "[", v.to_vec().iter(), "]"),
            Value::Struct(s) => {
                write!(f, "{{")?;
                for (i, (k, v)) in s.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "{}", func),
            Value::Code(code) => write!(f, "{}", code),
            Value::Error(e) => write!(f, "{}", e),
            Value::Blob(b) => write!(f, "#[blob {} bytes]", b.len()),
            Value::Channel(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

// ============================================================================
// Tests
// ============================================================================
