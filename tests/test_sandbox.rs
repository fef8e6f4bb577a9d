//! Sandbox namespace tests: auto-resolution of installed packages, the
//! strict and tolerant lookup policies, and the module environment.

extern crate atjs;

mod common;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use atjs::config::EngineConfig;
use atjs::engine::{EngineError, Sandbox};
use atjs::runner::ds::error::JErrorType;
use atjs::runner::ds::value::JsValue;

use common::{install_package, with_captured_logs, write_file};

fn sandbox_in(dir: &TempDir) -> Sandbox {
    Sandbox::new(&EngineConfig::new(dir.path()).with_color(false))
}

fn eval(sandbox: &mut Sandbox, expression: &str) -> JsValue {
    match sandbox.run_expression(expression) {
        Ok(value) => value,
        Err(e) => panic!("{} failed: {}", expression, e),
    }
}

#[test]
fn test_hyphen_case_package_is_auto_required_once() {
    let dir = TempDir::new().unwrap();
    install_package(
        dir.path(),
        "left-pad",
        "module.exports = (s, n) => ' '.repeat(n - s.length) + s;",
    );
    let mut sandbox = sandbox_in(&dir);

    let (value, logs) = with_captured_logs(|| eval(&mut sandbox, "leftPad('ab', 4)"));
    assert_eq!(value, JsValue::string("  ab"));
    let resolved: Vec<_> = logs.iter().filter(|l| l.contains("auto-required")).collect();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].contains(r#"auto-required "left-pad" as leftPad"#));

    let (_, logs) = with_captured_logs(|| eval(&mut sandbox, "leftPad('abc', 4)"));
    assert!(logs.iter().all(|l| !l.contains("auto-required")));
    assert!(sandbox.namespace().get("leftPad").is_some());
}

#[test]
fn test_verbatim_name_wins_over_hyphen_case() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "fooBar", "module.exports = 'verbatim';");
    install_package(dir.path(), "foo-bar", "module.exports = 'hyphenated';");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "fooBar"), JsValue::string("verbatim"));
}

#[test]
fn test_scoped_package_names() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "@babel/types", "exports.kind = 'scoped';");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "__babel_types.kind"), JsValue::string("scoped"));
}

#[test]
fn test_package_main_field() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "node_modules/entry-point/package.json", r#"{"main": "lib/entry.js"}"#);
    write_file(
        dir.path(),
        "node_modules/entry-point/lib/entry.js",
        "exports.where = __filename.endsWith('lib/entry.js');",
    );
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "entryPoint.where"), JsValue::Boolean(true));
}

#[test]
fn test_modules_exporting_null_are_found() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "nothing", "module.exports = null;");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "nothing === null"), JsValue::Boolean(true));
}

#[test]
fn test_unresolved_identifiers() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox_in(&dir);

    match sandbox.run_expression("nothingHere + 1") {
        Err(EngineError::Evaluation(JErrorType::ReferenceError(message))) => {
            assert_eq!(message, "nothingHere is not defined")
        }
        other => panic!("expected a ReferenceError, got {:?}", other.map(|_| ())),
    }
    assert_eq!(eval(&mut sandbox, "globalThis.nothingHere"), JsValue::Undefined);
    assert_eq!(eval(&mut sandbox, "typeof nothingHere"), JsValue::string("undefined"));
    assert_eq!(sandbox.get_tolerant("nothingHere").unwrap(), JsValue::Undefined);
    assert!(sandbox.get_strict("nothingHere").is_err());
}

#[test]
fn test_broken_packages_fall_through_to_not_defined() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "broken", "this is not javascript");
    let mut sandbox = sandbox_in(&dir);
    let err = sandbox.run_expression("broken").unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: broken is not defined");
}

#[test]
fn test_require_is_rooted_at_the_working_directory() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "helper.js", "module.exports = { twice: n => n * 2 };");
    write_file(dir.path(), "data.json", r#"{"list": [1, 2, 3]}"#);
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "require('./helper').twice(4)"), JsValue::integer(8));
    assert_eq!(eval(&mut sandbox, "require('./data.json').list.length"), JsValue::integer(3));
    assert_eq!(
        eval(&mut sandbox, "require('./data.json') === require('./data')"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_module_values_share_the_realm() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "list.js", "module.exports = [1, 2];");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(eval(&mut sandbox, "require('./list') instanceof Array"), JsValue::Boolean(true));
    assert_eq!(eval(&mut sandbox, "Array.isArray(require('./list'))"), JsValue::Boolean(true));
}

#[test]
fn test_require_errors_reach_the_expression() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox_in(&dir);
    let err = sandbox.run_expression("require('./missing')").unwrap_err();
    assert!(err.to_string().starts_with("Error: Cannot find module './missing'"));
    let err = sandbox.run_expression("require(42)").unwrap_err();
    assert!(err.to_string().starts_with("TypeError: The \"id\" argument"));
}

#[test]
fn test_process_globals() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::new(dir.path())
        .with_color(false)
        .with_argv(vec!["atjs".to_string(), "run".to_string()]);
    let mut sandbox = Sandbox::new(&config);
    assert_eq!(eval(&mut sandbox, "process.argv[1]"), JsValue::string("run"));
    assert_eq!(
        eval(&mut sandbox, "process.cwd()"),
        JsValue::String(dir.path().display().to_string())
    );
    assert_eq!(eval(&mut sandbox, "typeof process.env"), JsValue::string("object"));
    assert_eq!(eval(&mut sandbox, "typeof process.pid"), JsValue::string("number"));
}

#[test]
fn test_node_builtins_are_requirable() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "notes/todo.txt", "buy milk");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(
        eval(&mut sandbox, "require('path').join('a', 'b', '../c')"),
        JsValue::string("a/c")
    );
    assert_eq!(
        eval(&mut sandbox, "require('node:fs').readFileSync('notes/todo.txt', 'utf8')"),
        JsValue::string("buy milk")
    );
    assert_eq!(eval(&mut sandbox, "require('os').EOL"), JsValue::string("\n"));
    assert_eq!(eval(&mut sandbox, "require('fs') === require('node:fs')"), JsValue::Boolean(true));
}

#[test]
fn test_child_process_is_auto_required() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "notes/todo.txt", "buy milk");
    let mut sandbox = sandbox_in(&dir);
    assert_eq!(
        eval(&mut sandbox, "child_process.execSync('cat notes/todo.txt')"),
        JsValue::string("buy milk")
    );
    assert_eq!(
        eval(&mut sandbox, "child_process.spawnSync('sh', ['-c', 'exit 4']).status"),
        JsValue::integer(4)
    );
    assert_eq!(
        eval(&mut sandbox, "require('node:child_process') === child_process"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_implicit_globals_persist_within_a_sandbox() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox_in(&dir);
    eval(&mut sandbox, "counter = 1");
    assert_eq!(eval(&mut sandbox, "counter + 1"), JsValue::integer(2));
    assert_eq!(eval(&mut sandbox, "globalThis.counter"), JsValue::integer(1));
}

#[test]
fn test_runaway_recursion_fails_cleanly_on_a_small_thread_stack() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let mut sandbox = Sandbox::new(&EngineConfig::new(path).with_color(false));
            let expressions = [
                "(f => f(f))(f => f(f))",
                "[1].map(function again(x) { return [x].map(again) })",
            ];
            let outcomes: Vec<String> = expressions
                .iter()
                .map(|expression| match sandbox.run_expression(expression) {
                    Ok(_) => format!("{} returned", expression),
                    Err(e) => e.to_string(),
                })
                .collect();
            outcomes
        })
        .unwrap();
    assert_eq!(
        worker.join().unwrap(),
        vec!["RangeError: Maximum call stack size exceeded".to_string(); 2]
    );
}
