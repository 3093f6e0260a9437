// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Value stack for the VM.
//!
//! The stack is preallocated and grows downward: pushing decrements `sp`.
//! The top `n` values therefore sit in `values[sp..sp + n]` in the order
//! the compiler arranged them, which for a call is argument order.

use ell_parser::Value;

use crate::error::{Error, Result};

/// The VM's value stack.
#[derive(Debug)]
pub struct ValueStack {
    values: Vec<Value>,
    sp: usize,
}

impl ValueStack {
    /// Create an empty stack holding at most `size` values.
    pub fn new(size: usize) -> Self {
        ValueStack {
            values: vec![Value::Null; size],
            sp: size,
        }
    }

    /// Current stack pointer. Equal to the capacity when empty.
    #[inline]
    pub fn sp(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Number of values on the stack.
    #[inline]
    pub fn depth(&self) -> usize {
        self.values.len() - self.sp
    }

    /// Up to `n` values from the top, topmost first.
    pub fn top(&self, n: usize) -> &[Value] {
        &self.values[self.sp..self.sp + n.min(self.depth())]
    }

    /// Push a value onto the stack.
    #[inline]
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.sp == 0 {
            return Err(Error::generic("stack overflow"));
        }
        self.sp -= 1;
        self.values[self.sp] = value;
        Ok(())
    }

    /// Pop a value from the stack.
    #[inline]
    pub fn pop(&mut self) -> Result<Value> {
        if self.sp >= self.values.len() {
            return Err(underflow());
        }
        let value = std::mem::take(&mut self.values[self.sp]);
        self.sp += 1;
        Ok(value)
    }

    /// The value on top of the stack.
    #[inline]
    pub fn peek(&self) -> Result<&Value> {
        self.values.get(self.sp).ok_or_else(underflow)
    }

    /// Replace the value on top of the stack.
    #[inline]
    pub fn set_top(&mut self, value: Value) -> Result<()> {
        match self.values.get_mut(self.sp) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(underflow()),
        }
    }

    /// The top `n` values, topmost first.
    #[inline]
    pub fn slice(&self, n: usize) -> Result<&[Value]> {
        self.values.get(self.sp..self.sp + n).ok_or_else(underflow)
    }

    /// Discard the top `n` values.
    pub fn drop_n(&mut self, n: usize) -> Result<()> {
        let end = self.sp + n;
        if end > self.values.len() {
            return Err(underflow());
        }
        for slot in &mut self.values[self.sp..end] {
            *slot = Value::Null;
        }
        self.sp = end;
        Ok(())
    }

    /// Remove the top `n` values, topmost first.
    pub fn take_n(&mut self, n: usize) -> Result<Vec<Value>> {
        let end = self.sp + n;
        if end > self.values.len() {
            return Err(underflow());
        }
        let taken = self.values[self.sp..end]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        self.sp = end;
        Ok(taken)
    }

    /// Copy of everything between the top and `base`.
    pub fn segment(&self, base: usize) -> Vec<Value> {
        self.values[self.sp.min(base)..base].to_vec()
    }

    /// Discard everything above `base`.
    pub fn reset(&mut self, base: usize) {
        for slot in &mut self.values[self.sp.min(base)..base] {
            *slot = Value::Null;
        }
        self.sp = base;
    }

    /// Replace everything above `base` with a saved segment.
    pub fn restore(&mut self, base: usize, segment: &[Value]) -> Result<()> {
        if segment.len() > base {
            return Err(Error::generic("stack overflow"));
        }
        self.reset(base);
        self.sp = base - segment.len();
        self.values[self.sp..base].clone_from_slice(segment);
        Ok(())
    }
}

fn underflow() -> Error {
    Error::Internal("stack underflow".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_grows_downward() {
        let mut stack = ValueStack::new(8);
        assert_eq!(stack.sp(), 8);
        stack.push(num(2.0)).unwrap();
        stack.push(num(1.0)).unwrap();
        assert_eq!(stack.sp(), 6);
        assert_eq!(stack.slice(2).unwrap(), &[num(1.0), num(2.0)]);
        assert_eq!(stack.pop().unwrap(), num(1.0));
        assert_eq!(stack.peek().unwrap(), &num(2.0));
    }

    #[test]
    fn test_overflow_and_underflow() {
        let mut stack = ValueStack::new(1);
        stack.push(Value::Null).unwrap();
        assert!(stack.push(Value::Null).is_err());
        stack.pop().unwrap();
        assert!(matches!(stack.pop(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_take_and_drop() {
        let mut stack = ValueStack::new(8);
        for n in [3.0, 2.0, 1.0] {
            stack.push(num(n)).unwrap();
        }
        assert_eq!(stack.take_n(2).unwrap(), vec![num(1.0), num(2.0)]);
        stack.drop_n(1).unwrap();
        assert_eq!(stack.sp(), 8);
        assert!(stack.drop_n(1).is_err());
    }

    #[test]
    fn test_segment_restore() {
        let mut stack = ValueStack::new(8);
        stack.push(num(9.0)).unwrap();
        let base = stack.sp();
        stack.push(num(2.0)).unwrap();
        stack.push(num(1.0)).unwrap();
        let saved = stack.segment(base);
        assert_eq!(saved, vec![num(1.0), num(2.0)]);

        stack.reset(base);
        stack.push(num(5.0)).unwrap();
        stack.restore(base, &saved).unwrap();
        assert_eq!(stack.sp(), base - 2);
        assert_eq!(stack.pop().unwrap(), num(1.0));
        assert_eq!(stack.pop().unwrap(), num(2.0));
        assert_eq!(stack.pop().unwrap(), num(9.0));
    }
}
