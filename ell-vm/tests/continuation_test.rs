// ell-vm - Continuation tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::*;

#[test]
fn test_unused_continuation() {
    assert_eval!("(+ 1 (callcc (fn (k) 2)))", "3");
}

#[test]
fn test_escape() {
    assert_eval!("(+ 1 (callcc (fn (k) (+ 100 (k 2)))))", "3");
    assert_eval!("(call-with-continuation (fn (k) (k 'out) 'never))", "out");
}

#[test]
fn test_early_exit_from_loop() {
    assert_eval!(
        "(def find-first-test
           (fn (pred items)
             (callcc
               (fn (return)
                 ((fn (walk) (walk walk items))
                  (fn (self xs)
                    (if (empty? xs)
                        null
                        (do (if (pred (car xs)) (return (car xs)))
                            (self self (cdr xs))))))))))
         (find-first-test (fn (x) (> x 2)) '(1 2 3 4))",
        "3"
    );
}

#[test]
fn test_reentry() {
    // Invoking k after callcc has returned resumes the continuation again,
    // rebuilding the stack below the capture point.
    assert_eval!(
        "(def reentry-k null)
         (def reentry-n 0)
         (def reentry-f (fn () (+ 1 (callcc (fn (c) (set! reentry-k c) 1)))))
         (do (def reentry-r (reentry-f))
             (set! reentry-n (+ reentry-n 1))
             (if (< reentry-n 3) (reentry-k reentry-n) (list reentry-r reentry-n)))",
        "(3 3)"
    );
}

#[test]
fn test_reentry_restores_pending_arguments() {
    // Arguments are evaluated last to first, so the 10 is already on the
    // stack when the continuation is captured and is restored on re-entry.
    assert_eval!(
        "(def pending-k null)
         (def pending-count 0)
         (do (def pending-sum (+ (callcc (fn (c) (set! pending-k c) 0)) 10))
             (set! pending-count (+ pending-count 1))
             (if (< pending-count 2) (pending-k 5) pending-sum))",
        "15"
    );
}

#[test]
fn test_continuation_arity() {
    assert_eval_err!("(callcc (fn (k) (k 1 2)))", error_keys::ARGUMENT);
    assert_eval_err!("(callcc 1 2)", error_keys::ARGUMENT);
}

#[test]
fn test_continuation_is_a_function() {
    assert_eval!("(function? (callcc (fn (k) k)))", "true");
}
