// ell-parser - Function values
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The callable variants of [`Value`].
//!
//! Closures pair compiled code with the frame they were created in.
//! Primitives are native functions with a declared signature; the VM checks
//! arguments against it before calling `fun`. Continuations hold a resume
//! point plus a copy of the value stack taken when they were captured.
//! `Apply`, `CallCC` and `Spawn` are markers the VM recognises and handles
//! itself, since each needs direct access to the value stack.

use std::fmt;
use std::sync::Arc;

use crate::code::Code;
use crate::frame::Frame;
use crate::keyword::Keyword;
use crate::type_tag::TypeTag;
use crate::value::{ErrorValue, Value};

/// Signature of a native function. Arguments arrive already validated and,
/// for optional or keyword conventions, fully expanded.
pub type PrimitiveFn = fn(&[Value]) -> Result<Value, ErrorValue>;

/// A native function with its declared calling convention.
#[derive(Clone)]
pub struct Primitive {
    pub name: String,
    pub fun: PrimitiveFn,
    /// Declared result type, used only for documentation.
    pub result: TypeTag,
    /// Types of the required positional arguments.
    pub args: Vec<TypeTag>,
    /// Element type of a trailing rest argument.
    pub rest: Option<TypeTag>,
    /// Defaults for trailing optional (or keyword) arguments.
    pub defaults: Option<Vec<Value>>,
    /// Keyword names paired with `defaults`.
    pub keys: Option<Vec<Keyword>>,
}

impl Primitive {
    /// A primitive taking exactly the listed argument types.
    pub fn new(name: &str, fun: PrimitiveFn, result: TypeTag, args: Vec<TypeTag>) -> Self {
        Primitive {
            name: name.to_string(),
            fun,
            result,
            args,
            rest: None,
            defaults: None,
            keys: None,
        }
    }

    /// Accept any number of trailing arguments of type `rest`.
    pub fn with_rest(mut self, rest: TypeTag) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Accept trailing optional positional arguments.
    pub fn with_defaults(mut self, defaults: Vec<Value>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Accept trailing keyword arguments, each with a default.
    pub fn with_keys(mut self, keys: Vec<(Keyword, Value)>) -> Self {
        let (names, defaults): (Vec<_>, Vec<_>) = keys.into_iter().unzip();
        self.keys = Some(names);
        self.defaults = Some(defaults);
        self
    }

    /// Text form of the signature, e.g. `(<number> <number>*) <number>`.
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self.args.iter().map(|t| t.to_string()).collect();
        if let Some(rest) = &self.rest {
            parts.push(format!("{}*", rest));
        }
        match (&self.defaults, &self.keys) {
            (Some(defaults), Some(keys)) => {
                for (key, default) in keys.iter().zip(defaults) {
                    parts.push(format!("{} {}", key, default));
                }
            }
            (Some(defaults), None) => {
                for default in defaults {
                    parts.push(format!("[{}]", default));
                }
            }
            _ => {}
        }
        format!("({}) {}", parts.join(" "), self.result)
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#[primitive {} {}]", self.name, self.signature())
    }
}

/// Where a continuation resumes.
#[derive(Clone, Debug)]
pub struct Resume {
    pub code: Arc<Code>,
    pub pc: usize,
    pub frame: Arc<Frame>,
}

/// A captured point of execution.
#[derive(Clone, Debug)]
pub struct Continuation {
    /// `None` means the capture happened in tail position of the outermost
    /// frame, so resuming returns from execution.
    pub resume: Option<Resume>,
    /// The live part of the value stack, top first.
    pub stack: Vec<Value>,
    /// Captured while the top-level error handler was running.
    pub in_handler: bool,
}

/// A callable value.
pub enum Function {
    Closure { code: Arc<Code>, frame: Arc<Frame> },
    Primitive(Primitive),
    Continuation(Continuation),
    Apply,
    CallCC,
    Spawn,
}

impl Function {
    /// Debug name, empty when anonymous.
    pub fn name(&self) -> &str {
        match self {
            Function::Closure { code, .. } => &code.name,
            Function::Primitive(p) => &p.name,
            Function::Continuation(_) => "continuation",
            Function::Apply => "apply",
            Function::CallCC => "callcc",
            Function::Spawn => "spawn",
        }
    }

    /// Build a closure value.
    pub fn closure(code: Arc<Code>, frame: Arc<Frame>) -> Value {
        Value::Function(Arc::new(Function::Closure { code, frame }))
    }

    /// Build a primitive value.
    pub fn primitive(primitive: Primitive) -> Value {
        Value::Function(Arc::new(Function::Primitive(primitive)))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if name.is_empty() {
            write!(f, "#[function]")
        } else {
            write!(f, "#[function {}]", name)
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Primitive(p) => write!(f, "{:?}", p),
            _ => write!(f, "{}", self),
        }
    }
}
