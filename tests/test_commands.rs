//! The pipeline commands end to end, the way the binary drives them.

extern crate atjs;

mod common;

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use atjs::config::EngineConfig;
use atjs::engine::commands;
use atjs::engine::{EngineError, Sandbox};

use common::{install_package, write_file};

fn sandbox(dir: &TempDir) -> Sandbox {
    Sandbox::new(&EngineConfig::new(dir.path()).with_color(false))
}

#[test]
fn test_run_applies_functions_to_parsed_input() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    assert_eq!(
        commands::run(&mut sandbox, "x => x.count + 1", Some(r#"{"count": 41}"#), None).unwrap(),
        "42"
    );
    assert_eq!(
        commands::run(&mut sandbox, ".toUpperCase()", Some("not json"), None).unwrap(),
        "NOT JSON"
    );
    assert_eq!(
        commands::run(&mut sandbox, "Object.keys($it)", Some(r#"{"b": 1, "a": 2}"#), None).unwrap(),
        "[\n  \"b\",\n  \"a\"\n]"
    );
}

#[test]
fn test_run_without_input_prints_the_value() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    assert_eq!(commands::run(&mut sandbox, "[1, 2].map(n => n * 2)", None, None).unwrap(), "[\n  2,\n  4\n]");
    assert_eq!(commands::run(&mut sandbox, "x => x", None, None).unwrap(), "[Function (anonymous)]");
    assert!(matches!(
        commands::run(&mut sandbox, "   ", None, None),
        Err(EngineError::InvalidExpression(_))
    ));
}

#[test]
fn test_run_with_a_wildcard_target() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    let input = r#"{"users": [{"name": "ada"}, {"name": "linus"}], "total": 2}"#;
    let output = commands::run(&mut sandbox, ".toUpperCase()", Some(input), Some(".users[*].name")).unwrap();
    assert_eq!(
        output,
        r#"{
  "users": [
    {
      "name": "ADA"
    },
    {
      "name": "LINUS"
    }
  ],
  "total": 2
}"#
    );
}

#[test]
fn test_target_errors() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    let err = commands::run(&mut sandbox, "x => x", Some(r#"{"a": 1}"#), Some(".b")).unwrap_err();
    assert_eq!(err.to_string(), "Your target string didn't match anything: \".b\"");

    let err = commands::run(&mut sandbox, "x => x", None, Some(".a")).unwrap_err();
    assert!(matches!(err, EngineError::Input(_)));
}

#[test]
fn test_map_passes_index_and_array() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    let output = commands::map(&mut sandbox, "(x, i, all) => `${i}/${all.length}:${x}`", r#"["a", "b"]"#).unwrap();
    assert_eq!(output, "[\n  \"0/2:a\",\n  \"1/2:b\"\n]");

    let err = commands::map(&mut sandbox, "x => x", r#"{"a": 1}"#).unwrap_err();
    assert_eq!(err.to_string(), "Input wasn't a JSON array:\n{\"a\": 1}");
    let err = commands::map(&mut sandbox, "x => x", "[1,").unwrap_err();
    assert_eq!(err.to_string(), "Failed to parse input as JSON:\n[1,");
}

#[test]
fn test_for_each_runs_for_side_effects() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    commands::for_each(
        &mut sandbox,
        "name => require('fs').appendFileSync('seen.txt', name + ';')",
        r#"["x", "y", "z"]"#,
    )
    .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("seen.txt")).unwrap(), "x;y;z;");
}

#[test]
fn test_join_and_split() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    assert_eq!(commands::join(&mut sandbox, r#"["a", null, 3]"#, None).unwrap(), "a\n\n3");
    assert_eq!(commands::join(&mut sandbox, r#"["a", "b"]"#, Some(", ")).unwrap(), "a, b");
    assert_eq!(
        commands::split(&mut sandbox, "one\ntwo\n", None).unwrap(),
        "[\n  \"one\",\n  \"two\"\n]"
    );
    assert_eq!(
        commands::split(&mut sandbox, "a,b,,", Some(",")).unwrap(),
        "[\n  \"a\",\n  \"b\",\n  \"\"\n]"
    );
}

#[test]
fn test_log_uses_helpers_and_packages() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "shout", "module.exports = s => s.toUpperCase() + '!';");
    let mut sandbox = sandbox(&dir);
    assert_eq!(commands::log(&mut sandbox, "shout('hey')").unwrap(), "HEY!");
    assert_eq!(commands::log(&mut sandbox, "String(exec('echo', 'hi')).trim()").unwrap(), "hi");
    assert_eq!(commands::log(&mut sandbox, "red('plain')").unwrap(), "plain");
}

#[test]
fn test_evaluation_errors_carry_the_script_message() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "fail.js", "module.exports = () => { throw new RangeError('nope') };");
    let mut sandbox = sandbox(&dir);
    let err = commands::log(&mut sandbox, "require('./fail')()").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: nope");

    let err = commands::log(&mut sandbox, "notDefinedAnywhere").unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: notDefinedAnywhere is not defined");
}

#[test]
fn test_delimiters_are_decoded_like_arguments() {
    let dir = TempDir::new().unwrap();
    let mut sandbox = sandbox(&dir);
    assert_eq!(commands::join(&mut sandbox, r#"["a", "b"]"#, Some(r#""\t""#)).unwrap(), "a\tb");
    assert_eq!(commands::join(&mut sandbox, r#"["a", "b"]"#, Some("'|'.repeat(2)")).unwrap(), "a||b");
    assert_eq!(commands::join(&mut sandbox, r#"["a", "b"]"#, Some(" - ")).unwrap(), "a - b");
    assert_eq!(
        commands::split(&mut sandbox, "one\ttwo", Some(r#""\t""#)).unwrap(),
        "[\n  \"one\",\n  \"two\"\n]"
    );
    assert_eq!(
        commands::parse_delimiter(&mut sandbox, Some("0")).unwrap(),
        "0"
    );
}
