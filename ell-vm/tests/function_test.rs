// ell-vm - Function call tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::*;

#[test]
fn test_literals() {
    assert_eval!("42", "42");
    assert_eval!("3.5", "3.5");
    assert_eval!("true", "true");
    assert_eval!("null", "null");
    assert_eval!("\"hello\"", "\"hello\"");
    assert_eval!("x:", "x:");
    assert_eval!("'()", "()");
}

#[test]
fn test_if_and_do() {
    assert_eval!("(if true 1 2)", "1");
    assert_eval!("(if false 1 2)", "2");
    assert_eval!("(if null 1 2)", "2");
    assert_eval!("(if 0 1 2)", "1");
    assert_eval!("(do 1 2 3)", "3");
    assert_eval!("(do)", "null");
}

#[test]
fn test_factorial() {
    assert_eval!(
        "(def fact-test (fn (n) (if (<= n 1) 1 (* n (fact-test (- n 1)))))) (fact-test 5)",
        "120"
    );
}

#[test]
fn test_factorial_optimized() {
    let result = eval_optimized(
        "(def fact-opt (fn (n) (if (<= n 1) 1 (* n (fact-opt (- n 1)))))) (fact-opt 10)",
    )
    .unwrap();
    assert_eq!(result, Value::Number(3_628_800.0));
}

#[test]
fn test_optional_arguments() {
    assert_eval!("((fn (a [b (c 3)]) (list a b c)) 1)", "(1 null 3)");
    assert_eval!("((fn (a [b (c 3)]) (list a b c)) 1 2)", "(1 2 3)");
    assert_eval!("((fn (a [b (c 3)]) (list a b c)) 1 2 4)", "(1 2 4)");
    assert_eval_err!("((fn (a [b]) a) 1 2 3)", error_keys::ARGUMENT);
}

#[test]
fn test_keyword_arguments() {
    assert_eval!("((fn (a {x: 1 y: 2}) (list a x y)) 0)", "(0 1 2)");
    assert_eval!("((fn (a {x: 1 y: 2}) (list a x y)) 0 y: 5)", "(0 1 5)");
    assert_eval!("((fn ({x: 1 y: 2}) (list x y)) y: 5 x: 4)", "(4 5)");
    assert_eval_err!("((fn ({x: 1}) x) z: 1)", error_keys::ARGUMENT);
    assert_eval_err!("((fn ({x: 1}) x) x:)", error_keys::ARGUMENT);
    assert_eval_err!("((fn ({x: 1}) x) 1 2)", error_keys::ARGUMENT);
}

#[test]
fn test_rest_arguments() {
    assert_eval!("((fn (a & more) more) 1 2 3)", "(2 3)");
    assert_eval!("((fn (a & more) more) 1)", "()");
    assert_eval!("((fn args args) 1 2)", "(1 2)");
    assert_eval_err!("((fn (a & more) a))", error_keys::ARGUMENT);
}

#[test]
fn test_arity_is_exact_for_fixed_functions() {
    assert_eval!("((fn (a b) (+ a b)) 1 2)", "3");
    assert_eval_err!("((fn (a b) a) 1)", error_keys::ARGUMENT);
    assert_eval_err!("((fn (a b) a) 1 2 3)", error_keys::ARGUMENT);
    assert_eval_err!("(car)", error_keys::ARGUMENT);
    assert_eval_err!("(car '(1) '(2))", error_keys::ARGUMENT);
}

#[test]
fn test_closures() {
    assert_eval!(
        "(def make-adder-test (fn (n) (fn (x) (+ x n)))) ((make-adder-test 10) 5)",
        "15"
    );
    assert_eval!(
        "(def counter-test ((fn (n) (fn () (set! n (+ n 1)) n)) 0)) (counter-test) (counter-test)",
        "2"
    );
}

#[test]
fn test_def_returns_symbol_and_set_returns_value() {
    assert_eval!("(def def-test-x 1)", "def-test-x");
    assert_eval!("(def def-test-y 1) (set! def-test-y 5)", "5");
    assert_eval!("(def def-test-z 1) (set! def-test-z 5) def-test-z", "5");
    assert_eval!("(def def-test-u 1) (undef def-test-u)", "def-test-u");
    assert_eval_err!("(def def-test-v 1) (undef def-test-v) def-test-v", error_keys::GENERIC);
}

#[test]
fn test_set_of_undefined_global() {
    // Lenient by default: the global is defined.
    assert_eval!("(set! set-test-lenient 3) set-test-lenient", "3");

    let options = Options {
        strict_set: true,
        ..Options::default()
    };
    let err = Runtime::new(options)
        .eval_str("(set! set-test-strict 3)")
        .unwrap_err();
    assert!(err.is(error_keys::GENERIC));
}

#[test]
fn test_self_tail_call_reuses_frame() {
    let mut rt = Runtime::new(Options::default());
    rt.eval_str("(def tail-loop (fn (n) (if (= n 0) 'done (tail-loop (- n 1)))))")
        .unwrap();
    let before = rt.vm().frames_allocated();
    let result = rt.eval_str("(tail-loop 1000000)").unwrap();
    assert_eq!(result, Value::symbol("done"));
    assert!(rt.vm().frames_allocated() - before < 10);
}

#[test]
fn test_self_tail_call_optimized() {
    let options = Options {
        optimize: true,
        ..Options::default()
    };
    let mut rt = Runtime::new(options);
    rt.eval_str("(def tail-loop-opt (fn (n acc) (if (= n 0) acc (tail-loop-opt (- n 1) (+ acc 1)))))")
        .unwrap();
    let result = rt.eval_str("(tail-loop-opt 1000000 0)").unwrap();
    assert_eq!(result, Value::Number(1_000_000.0));
}

#[test]
fn test_mutual_tail_calls_run_in_constant_space() {
    assert_eval!(
        "(def even-test? (fn (n) (if (= n 0) true (odd-test? (- n 1)))))
         (def odd-test? (fn (n) (if (= n 0) false (even-test? (- n 1)))))
         (even-test? 200001)",
        "false"
    );
}

#[test]
fn test_deep_non_tail_recursion_overflows_cleanly() {
    let options = Options {
        stack_size: 1_000,
        ..Options::default()
    };
    let err = Runtime::new(options)
        .eval_str("(def deep-test (fn (n) (+ (deep-test n) 1))) (deep-test 0)")
        .unwrap_err();
    assert!(err.is(error_keys::GENERIC));
}

#[test]
fn test_apply() {
    assert_eval!("(apply list 1 2 '(3))", "(1 2 3)");
    assert_eval!("(apply (fn (a b) (- a b)) '(10 3))", "7");
    assert_eval_err!("(apply + 1 2)", error_keys::ARGUMENT);
}

#[test]
fn test_aggregates() {
    assert_eval!("(vector-ref [1 (+ 1 1) 3] 1)", "2");
    assert_eval!("(get {a: 1 b: (+ 1 1)} b:)", "2");
    assert_eval!("(b: {a: 1 b: 2})", "2");
    assert_eval!("(missing: {a: 1})", "null");
}
