//! The JavaScript subset user expressions and CommonJS modules rely on.

extern crate atjs;

use pretty_assertions::assert_eq;

use atjs::runner::api::{eval_expression, eval_script};
use atjs::runner::ds::operations::inspect::inspect;
use atjs::runner::ds::value::JsValue;
use atjs::runner::plugin::types::EvalContext;

fn script(source: &str) -> String {
    let mut ctx = EvalContext::new();
    match eval_script(source, &mut ctx) {
        Ok(value) => inspect(&value),
        Err(e) => panic!("{} failed: {}", source, e),
    }
}

fn expression(source: &str) -> String {
    match eval_expression(source, &mut EvalContext::new()) {
        Ok(value) => inspect(&value),
        Err(e) => panic!("{} failed: {}", source, e),
    }
}

#[test]
fn test_declarations_and_control_flow() {
    assert_eq!(
        script(
            "let total = 0;\n\
             for (const n of [1, 2, 3, 4]) {\n\
               if (n % 2 === 0) { total = total + n } else total = total - 1\n\
             }\n\
             total"
        ),
        "4"
    );
    assert_eq!(script("var a = 1, b = a + 1; `${a}-${b}`"), "'1-2'");
}

#[test]
fn test_functions_and_closures() {
    assert_eq!(
        script(
            "function counter(start = 10) {\n\
               let n = start;\n\
               return () => { n = n + 1; return n };\n\
             }\n\
             const next = counter();\n\
             next(); next()"
        ),
        "12"
    );
    assert_eq!(expression("((first, ...rest) => rest.length + first)(1, 2, 3)"), "3");
    assert_eq!(expression("(function named() { return typeof named })()"), "'function'");
    assert_eq!(expression("Math.max(...[3, 9, 4])"), "9");
}

#[test]
fn test_objects_and_arrays() {
    assert_eq!(
        expression("({ a: 1, ...{ b: 2 }, ['c' + 1]: 3, d() { return this.a } }).d()"),
        "1"
    );
    assert_eq!(expression("Object.keys({ z: 1, a: 2, b: 3 })"), "[ 'z', 'a', 'b' ]");
    assert_eq!(expression("[3, 1, 2].sort().map(n => n * 2)"), "[ 2, 4, 6 ]");
    assert_eq!(expression("[[1, [2]], [3]].flat(Infinity).reduce((a, b) => a + b, 0)"), "6");
    assert_eq!(expression("({ a: { b: 1 } }).a?.c?.d"), "undefined");
    assert_eq!(expression("null ?? 'fallback'"), "'fallback'");
}

#[test]
fn test_strings_and_regexps() {
    assert_eq!(expression("'a-b-c'.split('-').join('+')"), "'a+b+c'");
    assert_eq!(expression("'Hello World'.replace(/o/g, '0')"), "'Hell0 W0rld'");
    assert_eq!(expression("/^\\d+$/.test('123')"), "true");
    assert_eq!(expression("'abc'.padStart(5, '*').toUpperCase()"), "'**ABC'");
}

#[test]
fn test_coercions() {
    assert_eq!(expression("1 + '2'"), "'12'");
    assert_eq!(expression("'3' * '4'"), "12");
    assert_eq!(expression("[] + {}"), "'[object Object]'");
    assert_eq!(expression("typeof null"), "'object'");
    assert_eq!(expression("0.1 + 0.2 === 0.3"), "false");
}

#[test]
fn test_thrown_values_become_errors() {
    let mut ctx = EvalContext::new();
    let err = eval_script("throw new TypeError('bad input')", &mut ctx).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: bad input");

    let err = eval_expression("undefined.x", &mut ctx).unwrap_err();
    assert!(err.to_string().starts_with("TypeError: Cannot read properties of undefined"));

    let err = eval_expression("(x => ", &mut ctx).unwrap_err();
    assert!(err.to_string().starts_with("SyntaxError"));
}

#[test]
fn test_bindings_persist_in_a_context() {
    let mut ctx = EvalContext::new();
    eval_script("var shared = 5", &mut ctx).unwrap();
    assert_eq!(eval_expression("shared * 2", &mut ctx).unwrap(), JsValue::integer(10));
}

#[test]
fn test_oversized_strings_and_arrays_are_range_errors() {
    let mut ctx = EvalContext::new();
    let cases = [
        ("'ab'.repeat(2 ** 40)", "RangeError: Invalid string length"),
        ("'ab'.repeat(2 ** 62)", "RangeError: Invalid string length"),
        ("'a'.padStart(2 ** 30)", "RangeError: Invalid string length"),
        ("'a'.padEnd(2 ** 30, 'xy')", "RangeError: Invalid string length"),
        ("Array(4294967295)", "RangeError: Invalid array length"),
        ("new Array(2 ** 32)", "RangeError: Invalid array length"),
        ("(a => { a.length = 4294967295 })([])", "RangeError: Invalid array length"),
        ("(a => { a[4294967294] = 1 })([])", "RangeError: Invalid array length"),
        ("Array.from({ length: 2 ** 32 })", "RangeError: Invalid array length"),
    ];
    for (source, message) in cases {
        match eval_expression(source, &mut ctx) {
            Err(e) => assert_eq!(e.to_string(), message, "{}", source),
            Ok(v) => panic!("{} evaluated to {}", source, inspect(&v)),
        }
    }

    // Empty strings repeat to nothing however large the count.
    assert_eq!(expression("''.repeat(2 ** 40)"), "''");
    assert_eq!(expression("Array(3).length"), "3");
    assert_eq!(expression("'ab'.repeat(3)"), "'ababab'");
}
