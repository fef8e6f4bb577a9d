//! Module resolution and CommonJS loading against throwaway directory trees.

extern crate atjs;

mod common;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use atjs::engine::module_loader::{ModuleError, ModuleLoader, NodeModuleLoader};
use atjs::runner::ds::operations::object::get_property;
use atjs::runner::ds::value::JsValue;
use atjs::runner::plugin::types::EvalContext;

use common::{install_package, write_file};

fn load(loader: &NodeModuleLoader, ctx: &mut EvalContext, specifier: &str) -> JsValue {
    match loader.load(specifier, ctx) {
        Ok(value) => value,
        Err(e) => panic!("loading {} failed: {}", specifier, e),
    }
}

#[test]
fn test_packages_are_found_in_ancestor_directories() {
    let dir = TempDir::new().unwrap();
    install_package(dir.path(), "shared", "exports.name = 'shared';");
    let nested = dir.path().join("a").join("b");
    std::fs::create_dir_all(&nested).unwrap();

    let loader = NodeModuleLoader::new(&nested);
    let mut ctx = EvalContext::new();
    let module = load(&loader, &mut ctx, "shared");
    assert_eq!(get_property(&mut ctx, &module, "name").unwrap(), JsValue::string("shared"));
}

#[test]
fn test_resolution_order() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "thing.js", "module.exports = 'file';");
    write_file(dir.path(), "thing/index.js", "module.exports = 'directory';");
    write_file(dir.path(), "only-dir/index.json", "[1]");

    let loader = NodeModuleLoader::new(dir.path());
    assert_eq!(loader.resolve("./thing", dir.path()), Some(dir.path().join("thing.js")));
    assert_eq!(
        loader.resolve("./only-dir", dir.path()),
        Some(dir.path().join("only-dir").join("index.json"))
    );
    assert_eq!(loader.resolve("./absent", dir.path()), None);

    let mut ctx = EvalContext::new();
    assert_eq!(load(&loader, &mut ctx, "./thing"), JsValue::string("file"));
}

#[test]
fn test_modules_are_cached_by_path() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "counter.js", "module.exports = { loads: 1 };");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    let first = load(&loader, &mut ctx, "./counter");
    let second = load(&loader, &mut ctx, "./counter.js");
    assert!(first.strict_equals(&second));
}

#[test]
fn test_nested_requires_resolve_from_the_module_directory() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "lib/main.js", "const util = require('./util');\nmodule.exports = util.greet('x');");
    write_file(dir.path(), "lib/util.js", "exports.greet = name => `hello ${name}`;");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    assert_eq!(load(&loader, &mut ctx, "./lib/main"), JsValue::string("hello x"));
}

#[test]
fn test_cycles_see_partial_exports() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "a.js",
        "exports.early = 'a';\nconst b = require('./b');\nexports.fromB = b.sawEarly;",
    );
    write_file(dir.path(), "b.js", "exports.sawEarly = require('./a').early;");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    let a = load(&loader, &mut ctx, "./a");
    assert_eq!(get_property(&mut ctx, &a, "fromB").unwrap(), JsValue::string("a"));
}

#[test]
fn test_module_scope_does_not_leak() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "scoped.js", "const secret = 1;\nmodule.exports = typeof secret;");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    assert_eq!(load(&loader, &mut ctx, "./scoped"), JsValue::string("number"));
    assert!(ctx.get_binding("secret").is_err());
    assert!(ctx.get_binding("module").is_err());
}

#[test]
fn test_failures_are_classified() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "bad.json", "{ nope");
    write_file(dir.path(), "throws.js", "throw new Error('boom');");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    assert!(matches!(loader.load("./bad.json", &mut ctx), Err(ModuleError::Json { .. })));
    match loader.load("./throws", &mut ctx) {
        Err(ModuleError::Evaluation { source, .. }) => assert_eq!(source.to_string(), "Error: boom"),
        other => panic!("expected an evaluation error, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(loader.load("left-pad", &mut ctx), Err(ModuleError::NotFound { .. })));
}

#[test]
fn test_builtin_modules() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "hello.txt", "hi");

    let loader = NodeModuleLoader::new(dir.path());
    let mut ctx = EvalContext::new();
    let fs = load(&loader, &mut ctx, "fs");
    let exists = get_property(&mut ctx, &fs, "existsSync").unwrap();
    let found = atjs::runner::eval::call_function(&mut ctx, &exists, fs.clone(), vec![JsValue::string("hello.txt")])
        .unwrap();
    assert_eq!(found, JsValue::Boolean(true));

    let path = load(&loader, &mut ctx, "node:path");
    assert_eq!(get_property(&mut ctx, &path, "sep").unwrap(), JsValue::string("/"));
}
