// ell-vm - Macro and quasiquote tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::*;

#[test]
fn test_defmacro_returns_name() {
    assert_eval!("(defmacro returns-name-test (x) x)", "returns-name-test");
}

#[test]
fn test_simple_macro() {
    assert_eval!(
        "(defmacro unless-test (c then else) (list 'if c else then))
         (unless-test false 1 2)",
        "1"
    );
}

#[test]
fn test_macro_arguments_are_unevaluated() {
    assert_eval!(
        "(defmacro quote-it-test (form) (list 'quote form))
         (quote-it-test (this is not evaluated))",
        "(this is not evaluated)"
    );
}

#[test]
fn test_quasiquote() {
    assert_eval!("(def qq-x 5) `(a ~qq-x c)", "(a 5 c)");
    assert_eval!("(def qq-xs '(1 2)) `(0 ~@qq-xs 3)", "(0 1 2 3)");
    assert_eval!("`[1 ~(+ 1 1)]", "[1 2]");
    assert_eval!("`{a: ~(+ 1 1)}", "{a: 2}");
    assert_eval!("`sym", "sym");
    assert_eval!("`()", "()");
    assert_eval!("`(1 (2 ~(+ 1 2)))", "(1 (2 3))");
}

#[test]
fn test_quasiquote_errors() {
    assert_eval_err!("~x", error_keys::MACRO);
    assert_eval_err!("`~@x", error_keys::MACRO);
    assert_eval_err!("`(a `(b))", error_keys::MACRO);
}

#[test]
fn test_macro_with_quasiquote_and_rest() {
    assert_eval!(
        "(defmacro when-test (c & body) `(if ~c (do ~@body) null))
         (when-test true 1 2 3)",
        "3"
    );
    assert_eval!(
        "(defmacro when-test2 (c & body) `(if ~c (do ~@body) null))
         (when-test2 false 1 2 3)",
        "null"
    );
}

#[test]
fn test_macro_expanding_to_macro() {
    assert_eval!(
        "(defmacro inner-m-test (x) `(+ ~x 1))
         (defmacro outer-m-test (x) `(inner-m-test (* ~x 2)))
         (outer-m-test 5)",
        "11"
    );
}

#[test]
fn test_macros_expand_inside_fn_bodies() {
    assert_eval!(
        "(defmacro twice-test (x) `(+ ~x ~x))
         ((fn (n) (twice-test n)) 4)",
        "8"
    );
}

#[test]
fn test_macro_defining_a_function() {
    assert_eval!(
        "(defmacro defn-test (name params & body) `(def ~name (fn ~params ~@body)))
         (defn-test square-test (x) (* x x))
         (square-test 9)",
        "81"
    );
}

#[test]
fn test_macroexpand() {
    assert_eval!(
        "(defmacro expand-me-test (x) `(list ~x ~x))
         (macroexpand '(expand-me-test 1))",
        "(list 1 1)"
    );
}

#[test]
fn test_malformed_defmacro() {
    assert_eval_err!("(defmacro broken-params-test 5 1)", error_keys::SYNTAX);
    assert_eval_err!("(defmacro)", error_keys::SYNTAX);
}
