// ell-vm - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for Ell integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! Globals are process-wide, and tests in one file run in parallel, so each
//! test should define globals under names no other test in the file uses.

#[allow(unused_imports)]
pub use ell_parser::{Value, error_keys};
#[allow(unused_imports)]
pub use ell_vm::{Error, Options, Runtime};

/// Evaluate every form in `src` in a fresh runtime with default options.
#[allow(dead_code)]
pub fn eval(src: &str) -> Result<Value, Error> {
    Runtime::new(Options::default()).eval_str(src)
}

/// Evaluate with the optimizing compiler and the fast loop.
#[allow(dead_code)]
pub fn eval_optimized(src: &str) -> Result<Value, Error> {
    let options = Options {
        optimize: true,
        ..Options::default()
    };
    Runtime::new(options).eval_str(src)
}

/// Evaluate `src` and print the result, or `Error: ...` on failure.
#[allow(dead_code)]
pub fn eval_to_string(src: &str) -> String {
    match eval(src) {
        Ok(value) => value.to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

/// Assert that evaluating `input` prints as `expected`.
#[macro_export]
macro_rules! assert_eval {
    ($input:expr, $expected:expr) => {
        let result = $crate::common::eval($input);
        assert!(
            result.is_ok(),
            "Failed to evaluate '{}': {:?}",
            $input,
            result.err()
        );
        assert_eq!(
            result.unwrap().to_string(),
            $expected,
            "Evaluation of '{}' did not match expected",
            $input
        );
    };
}

/// Assert that evaluating `input` fails with an error keyed by `key`.
#[macro_export]
macro_rules! assert_eval_err {
    ($input:expr, $key:expr) => {
        let result = $crate::common::eval($input);
        match result {
            Err(e) => assert!(e.is($key), "'{}' failed with {} instead of {}", $input, e, $key),
            Ok(v) => panic!("Expected error for '{}' but got {}", $input, v),
        }
    };
}
