// ell-vm - Module loading tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;

use std::fs;

use common::*;

fn runtime_with_path(dir: &std::path::Path) -> Runtime {
    Runtime::new(Options {
        module_path: vec![dir.to_path_buf()],
        ..Options::default()
    })
}

#[test]
fn test_use_loads_definitions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("use-defs-test.ell"),
        "(def use-defs-value 42)\n(def use-defs-double (fn (x) (* 2 x)))\n",
    )
    .unwrap();
    let mut rt = runtime_with_path(dir.path());
    assert_eq!(
        rt.eval_str("(use use-defs-test)").unwrap(),
        Value::symbol("use-defs-test")
    );
    assert_eq!(
        rt.eval_str("(use-defs-double use-defs-value)").unwrap(),
        Value::Number(84.0)
    );
}

#[test]
fn test_use_loads_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("use-once-test.ell"),
        "(set! use-once-count (+ use-once-count 1))",
    )
    .unwrap();
    let mut rt = runtime_with_path(dir.path());
    let result = rt
        .eval_str("(def use-once-count 0) (use use-once-test) (use use-once-test) use-once-count")
        .unwrap();
    assert_eq!(result, Value::Number(1.0));
}

#[test]
fn test_module_macros_are_visible() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("use-macro-test.ell"),
        "(defmacro use-macro-swap (a b) `(list ~b ~a))",
    )
    .unwrap();
    let mut rt = runtime_with_path(dir.path());
    rt.eval_str("(use use-macro-test)").unwrap();
    assert_eq!(rt.eval_str("(use-macro-swap 1 2)").unwrap().to_string(), "(2 1)");
}

#[test]
fn test_missing_module() {
    let dir = tempfile::tempdir().unwrap();
    let err = runtime_with_path(dir.path())
        .eval_str("(use no-such-module-test)")
        .unwrap_err();
    assert!(err.is(error_keys::IO));
}

#[test]
fn test_failed_module_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("use-retry-test.ell");
    fs::write(&path, "(car 5)").unwrap();
    let mut rt = runtime_with_path(dir.path());
    assert!(rt.eval_str("(use use-retry-test)").is_err());

    fs::write(&path, "(def use-retry-value 'fixed)").unwrap();
    rt.eval_str("(use use-retry-test)").unwrap();
    assert_eq!(rt.eval_str("use-retry-value").unwrap(), Value::symbol("fixed"));
}

#[test]
fn test_use_syntax() {
    assert_eval_err!("(use)", error_keys::SYNTAX);
    assert_eval_err!("(use \"name\")", error_keys::SYNTAX);
}

#[test]
fn test_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.ell");
    fs::write(&path, "(def load-file-a 2)\n(* load-file-a 21)").unwrap();
    let mut rt = Runtime::new(Options::default());
    assert_eq!(rt.load_file(&path).unwrap(), Value::Number(42.0));
}

#[test]
fn test_concurrent_use_waits_for_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("use-race-test.ell"),
        "(sleep 0.2)\n(def use-race-value 7)\n",
    )
    .unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = dir.path().to_path_buf();
            std::thread::spawn(move || {
                let mut rt = runtime_with_path(&path);
                rt.eval_str("(use use-race-test) use-race-value")
            })
        })
        .collect();

    for handle in handles {
        let value = handle.join().unwrap().unwrap();
        assert_eq!(value, Value::Number(7.0));
    }
}
