// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Process-wide interrupt latch.
//!
//! A signal handler sets the latch; the instrumented VM loop checks it at
//! tail calls and returns and raises a non-catchable interrupt error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

static INTERRUPTED: Lazy<Arc<AtomicBool>> = Lazy::new(|| Arc::new(AtomicBool::new(false)));

/// Request that the current evaluation stop.
pub fn request_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// The shared flag, for registration with `signal_hook::flag::register`.
pub fn interrupt_flag() -> Arc<AtomicBool> {
    Arc::clone(&INTERRUPTED)
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

pub fn clear_interrupt() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Consume a pending interrupt, turning it into an error.
pub fn check_for_interrupt() -> Result<()> {
    if INTERRUPTED.swap(false, Ordering::SeqCst) {
        Err(Error::interrupt())
    } else {
        Ok(())
    }
}
