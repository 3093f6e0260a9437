// ell-vm - Interrupt tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The interrupt latch is process-wide, so this file holds a single test.

mod common;

use std::thread;
use std::time::Duration;

use common::*;
use ell_vm::{clear_interrupt, request_interrupt};

#[test]
fn test_interrupt_stops_a_loop_and_bypasses_the_handler() {
    clear_interrupt();
    let mut rt = Runtime::new(Options::default());
    rt.eval_str("(def interrupt-spin (fn (n) (interrupt-spin (+ n 1))))")
        .unwrap();
    rt.eval_str("(def *top-handler* (fn (e) 'caught))").unwrap();

    let interrupter = thread::spawn(|| {
        thread::sleep(Duration::from_millis(50));
        request_interrupt();
    });
    let err = rt.eval_str("(interrupt-spin 0)").unwrap_err();
    interrupter.join().unwrap();
    assert!(err.is_interrupt(), "{}", err);

    // The latch is consumed, and ordinary errors still reach the handler.
    assert_eq!(rt.eval_str("(car 5)").unwrap(), Value::symbol("caught"));
    rt.eval_str("(undef *top-handler*)").unwrap();
}
