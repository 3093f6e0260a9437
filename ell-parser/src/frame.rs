// ell-parser - Activation records
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime activation records.
//!
//! A frame has two outgoing links: `locals`, the lexical parent used to
//! resolve free variables, and `previous`, the dynamic caller used by
//! `return`. Frames are shared (`Arc`) because closures and continuations
//! can outlive the call that created them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::code::Code;
use crate::value::Value;

/// Argument slots; arities up to 5 stay inline.
pub type Slots = SmallVec<[Value; 5]>;

/// An activation record.
pub struct Frame {
    /// Lexically enclosing frame (the closure's captured frame).
    pub locals: Option<Arc<Frame>>,
    /// Dynamic caller; `None` ends execution on return.
    pub previous: Option<Arc<Frame>>,
    /// The code running in this frame.
    pub code: Option<Arc<Code>>,
    /// The caller's code to resume on return.
    pub ops: Option<Arc<Code>>,
    /// The caller's program counter to resume on return.
    pub pc: usize,
    /// Argument and local slots.
    pub elements: RwLock<Slots>,
}

impl Frame {
    /// A frame with no links and no slots, used for top-level execution.
    pub fn root() -> Arc<Frame> {
        Arc::new(Frame {
            locals: None,
            previous: None,
            code: None,
            ops: None,
            pc: 0,
            elements: RwLock::new(SmallVec::new()),
        })
    }

    /// A frame holding `elements` whose lexical parent is `locals`, with no
    /// caller.
    pub fn with_elements(locals: Option<Arc<Frame>>, elements: Slots) -> Arc<Frame> {
        Arc::new(Frame {
            locals,
            previous: None,
            code: None,
            ops: None,
            pc: 0,
            elements: RwLock::new(elements),
        })
    }

    /// The frame for a call to `code`. `ops` and `pc` are where `return`
    /// resumes in `previous`.
    pub fn activation(
        locals: Arc<Frame>,
        previous: Option<Arc<Frame>>,
        code: Arc<Code>,
        ops: Option<Arc<Code>>,
        pc: usize,
        elements: Slots,
    ) -> Arc<Frame> {
        Arc::new(Frame {
            locals: Some(locals),
            previous,
            code: Some(code),
            ops,
            pc,
            elements: RwLock::new(elements),
        })
    }

    /// Read slot `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<Value> {
        self.elements.read().get(slot).cloned()
    }

    /// Write slot `slot`. Returns false when out of range.
    #[inline]
    pub fn set(&self, slot: usize, value: Value) -> bool {
        match self.elements.write().get_mut(slot) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Replace every slot in place.
    pub fn overwrite(&self, values: &[Value]) {
        let mut elements = self.elements.write();
        elements.clear();
        elements.extend(values.iter().cloned());
    }

    /// Walk `depth` lexical links outward.
    pub fn lexical(self: &Arc<Self>, depth: usize) -> Option<Arc<Frame>> {
        let mut frame = Arc::clone(self);
        for _ in 0..depth {
            frame = frame.locals.clone()?;
        }
        Some(frame)
    }

    /// Length of the dynamic chain, this frame included.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut cursor = self.previous.clone();
        while let Some(frame) = cursor {
            depth += 1;
            cursor = frame.previous.clone();
        }
        depth
    }
}

impl Drop for Frame {
    // Long dynamic chains would otherwise drop recursively.
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(frame) = next {
            match Arc::try_unwrap(frame) {
                Ok(mut inner) => next = inner.previous.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.code.as_ref().map(|c| c.name.as_str()).unwrap_or("");
        write!(f, "#[frame {} {:?}]", name, self.elements.read().as_slice())
    }
}
