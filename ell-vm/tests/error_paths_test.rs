// ell-vm - Error path tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use common::*;

#[test]
fn test_undefined_variable() {
    assert_eval_err!("error-test-never-defined", error_keys::GENERIC);
    let message = eval_to_string("error-test-never-defined");
    assert!(message.contains("undefined variable"), "{}", message);
}

#[test]
fn test_calling_a_non_function() {
    assert_eval_err!("(1 2)", error_keys::ARGUMENT);
    assert_eval_err!("(\"f\")", error_keys::ARGUMENT);
    let message = eval_to_string("(1 2)");
    assert!(message.contains("not a function"), "{}", message);
}

#[test]
fn test_primitive_type_errors() {
    assert_eval_err!("(+ 1 x:)", error_keys::ARGUMENT);
    assert_eval_err!("(car 5)", error_keys::ARGUMENT);
    assert_eval_err!("(quotient 1 0)", error_keys::ARGUMENT);
    assert_eval_err!("(vector-ref [1] 3)", error_keys::ARGUMENT);
}

#[test]
fn test_arity_message_names_function() {
    let message = eval_to_string("(def arity-named (fn (a b) a)) (arity-named 1)");
    assert!(message.contains("arity-named"), "{}", message);
    let message = eval_to_string("((fn (a) a))");
    assert!(message.contains("anonymous function"), "{}", message);
}

#[test]
fn test_malformed_special_forms() {
    assert_eval_err!("(if)", error_keys::SYNTAX);
    assert_eval_err!("(if 1 2 3 4)", error_keys::SYNTAX);
    assert_eval_err!("(def)", error_keys::SYNTAX);
    assert_eval_err!("(def 1 2)", error_keys::SYNTAX);
    assert_eval_err!("(fn)", error_keys::SYNTAX);
    assert_eval_err!("(fn (a a) a)", error_keys::SYNTAX);
    assert_eval_err!("(set! 1 2)", error_keys::SYNTAX);
    assert_eval_err!("(quote)", error_keys::SYNTAX);
}

#[test]
fn test_reader_errors() {
    assert_eval_err!("(1 2", error_keys::SYNTAX);
    assert_eval_err!(")", error_keys::SYNTAX);
    assert_eval_err!("\"unterminated", error_keys::SYNTAX);
}

#[test]
fn test_macro_used_as_value() {
    assert_eval_err!(
        "(defmacro value-macro-test (x) x) value-macro-test",
        error_keys::MACRO
    );
}

#[test]
fn test_user_raised_errors() {
    assert_eval_err!("(error my-error: \"boom\")", "my-error");
    assert_eval!("(error-key (make-error my-error: 1 2))", "my-error:");
    assert_eval!("(error-data (make-error my-error: 1 2))", "(1 2)");
    assert_eval!("(error? (make-error oops: \"x\"))", "true");
}

#[test]
fn test_vm_survives_an_error() {
    let mut rt = Runtime::new(Options::default());
    assert!(rt.eval_str("(car 5)").is_err());
    assert_eq!(rt.eval_str("(+ 1 2)").unwrap(), Value::Number(3.0));
    // A failing host call leaves the stack usable too.
    let car = rt.get("car").unwrap();
    assert!(rt.call(&car, &[Value::Number(1.0)]).is_err());
    assert_eq!(rt.eval_str("(list 1 2)").unwrap().to_string(), "(1 2)");
}
