//! The namespace expressions are evaluated in.
//!
//! A sandbox owns one [`EvalContext`] whose only plugin resolver is a
//! [`SandboxNamespace`]. The namespace is a flat map built from four layers,
//! later layers winning on collision:
//!
//! 1. common language globals (`Object`, `JSON`, `Math`, ...)
//! 2. the module environment (`require`, `module`, `exports`, `__filename`,
//!    `__dirname`)
//! 3. every realm global, `process`, `global` and `globalThis`
//! 4. helpers (`exec`, `quote`, styling functions)
//!
//! Names missing from the map are handed to [`auto_require`]; a found module
//! is stored back into the map. Bare identifiers that stay unresolved are a
//! `ReferenceError`, reads through the global object yield `undefined`.

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::auto_require::{auto_require, Resolution};
use crate::engine::desugar::desugar;
use crate::engine::error::EngineError;
use crate::engine::helpers::helpers;
use crate::engine::module_loader::{ModuleLoader, NodeModuleLoader};
use crate::engine::node_builtins::node_platform;
use crate::runner::api::eval_expression;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObject, ObjectData};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::types::EvalContext;

/// Globals every JavaScript environment is expected to have. Reading one of
/// these never triggers auto-resolution, even when this engine lacks it.
pub const COMMON_GLOBAL_NAMES: &[&str] = &[
    "Infinity", "NaN", "undefined", "eval", "isFinite", "isNaN", "parseFloat", "parseInt",
    "encodeURI", "encodeURIComponent", "decodeURI", "decodeURIComponent", "escape", "unescape",
    "Object", "Function", "Boolean", "Symbol", "Error", "AggregateError", "EvalError",
    "InternalError", "RangeError", "ReferenceError", "SyntaxError", "TypeError", "URIError",
    "Number", "BigInt", "Math", "Date", "String", "RegExp", "Array", "Int8Array", "Uint8Array",
    "Uint8ClampedArray", "Int16Array", "Uint16Array", "Int32Array", "Uint32Array",
    "Float32Array", "Float64Array", "BigInt64Array", "BigUint64Array", "Map", "Set", "WeakMap",
    "WeakSet", "ArrayBuffer", "SharedArrayBuffer", "Atomics", "DataView", "JSON", "Promise",
    "Generator", "GeneratorFunction", "AsyncFunction", "AsyncGenerator",
    "AsyncGeneratorFunction", "Reflect", "Proxy", "Intl", "WebAssembly", "setTimeout",
    "clearTimeout", "setInterval", "clearInterval", "setImmediate", "clearImmediate",
    "queueMicrotask", "performance", "console", "FinalizationRegistry", "WeakRef",
];

/// Constructors resolved through a literal so that `x instanceof Array`
/// holds for values the expression builds itself.
const LITERAL_CONSTRUCTORS: [(&str, &str); 5] = [
    ("Array", "[].constructor"),
    ("Object", "({}).constructor"),
    ("String", "''.constructor"),
    ("Number", "(4).constructor"),
    ("Boolean", "true.constructor"),
];

/// File name the expression pretends to live in.
pub const FUNCTION_FILE_NAME: &str = "command-line-function.js";

/// Flattened sandbox bindings plus the auto-resolution fallback.
pub struct SandboxNamespace {
    bindings: RefCell<IndexMap<String, JsValue>>,
    loader: Rc<dyn ModuleLoader>,
}

impl SandboxNamespace {
    pub fn new(layers: Vec<IndexMap<String, JsValue>>, loader: Rc<dyn ModuleLoader>) -> Self {
        let mut bindings = IndexMap::new();
        for layer in layers {
            bindings.extend(layer);
        }
        SandboxNamespace {
            bindings: RefCell::new(bindings),
            loader,
        }
    }

    pub fn get(&self, name: &str) -> Option<JsValue> {
        self.bindings.borrow().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }
}

impl PluginResolver for SandboxNamespace {
    fn has_binding(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn try_get(&self, name: &str, ctx: &mut EvalContext) -> Result<Option<JsValue>, JErrorType> {
        if let Some((_, literal)) = LITERAL_CONSTRUCTORS.iter().find(|(ctor, _)| *ctor == name) {
            return eval_expression(literal, ctx).map(Some);
        }
        if let Some(value) = self.get(name) {
            return Ok(Some(value));
        }
        if COMMON_GLOBAL_NAMES.contains(&name) {
            return Ok(Some(JsValue::Undefined));
        }
        match auto_require(self.loader.as_ref(), ctx, name) {
            Resolution::Found { value, .. } => {
                self.bindings.borrow_mut().insert(name.to_string(), value.clone());
                Ok(Some(value))
            }
            Resolution::Absent => Ok(None),
        }
    }

    fn set(&self, name: &str, value: JsValue) -> bool {
        self.bindings.borrow_mut().insert(name.to_string(), value);
        true
    }

    fn name(&self) -> &str {
        "sandbox"
    }
}

/// An evaluation environment rooted at a working directory.
pub struct Sandbox {
    ctx: EvalContext,
    namespace: Rc<SandboxNamespace>,
    global: JsValue,
}

impl Sandbox {
    /// A sandbox loading modules from `config.working_dir`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_loader(config, Rc::new(NodeModuleLoader::new(&config.working_dir)))
    }

    pub fn with_loader(config: &EngineConfig, loader: Rc<dyn ModuleLoader>) -> Self {
        let mut ctx = EvalContext::with_registry(&BuiltInRegistry::with_core());
        let realm = ctx.realm.clone();
        let global = JsValue::Object(
            JsObject::new(ObjectData::GlobalProxy, Some(realm.object_prototype.clone())).into_shared(),
        );

        let layers = vec![
            common_globals(&realm),
            module_environment(&realm, config, loader.clone()),
            ambient_globals(&realm, config, &global),
            helpers(&realm, config.color),
        ];
        let namespace = Rc::new(SandboxNamespace::new(layers, loader));
        ctx.add_resolver(namespace.clone());
        ctx.this_value = global.clone();

        Sandbox { ctx, namespace, global }
    }

    pub fn context(&mut self) -> &mut EvalContext {
        &mut self.ctx
    }

    pub fn namespace(&self) -> &SandboxNamespace {
        &self.namespace
    }

    /// The object behind `global`, `globalThis` and top-level `this`.
    pub fn global_object(&self) -> JsValue {
        self.global.clone()
    }

    /// Evaluates an expression that has already been desugared.
    pub fn evaluate(&mut self, source: &str) -> Result<JsValue, JErrorType> {
        eval_expression(source, &mut self.ctx)
    }

    /// Validates, desugars and evaluates a user expression.
    pub fn run_expression(&mut self, expression: &str) -> Result<JsValue, EngineError> {
        if expression.trim().is_empty() {
            return Err(EngineError::InvalidExpression(expression.to_string()));
        }
        let desugared = desugar(expression);
        if desugared != expression {
            debug!(from = expression, to = %desugared, "desugared expression");
        }
        Ok(self.evaluate(&desugared)?)
    }

    /// A bare identifier read: misses are `ReferenceError`s.
    pub fn get_strict(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        self.ctx.get_binding(name)
    }

    /// A read through the global object: misses are `undefined`.
    pub fn get_tolerant(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        self.ctx.get_global_tolerant(name)
    }

    pub fn call(&mut self, function: &JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        call_function(&mut self.ctx, function, JsValue::Undefined, args)
    }
}

fn common_globals(realm: &Realm) -> IndexMap<String, JsValue> {
    COMMON_GLOBAL_NAMES
        .iter()
        .filter_map(|name| realm.global(name).map(|value| (name.to_string(), value)))
        .collect()
}

fn module_environment(realm: &Realm, config: &EngineConfig, loader: Rc<dyn ModuleLoader>) -> IndexMap<String, JsValue> {
    let exports = JsValue::Object(realm.new_object());
    let filename = config.working_dir.join(FUNCTION_FILE_NAME).display().to_string();
    let module = realm.new_object_from(vec![
        ("id", JsValue::string(".")),
        ("filename", JsValue::String(filename.clone())),
        ("exports", exports.clone()),
    ]);
    let require = realm.new_plugin_function("require", move |ctx, _this, args| match args.first() {
        Some(JsValue::String(specifier)) => loader
            .load(specifier, ctx)
            .map_err(|e| e.into_script_error(&ctx.realm)),
        _ => Err(JErrorType::TypeError(
            "The \"id\" argument must be of type string".to_string(),
        )),
    });

    let mut layer = IndexMap::new();
    layer.insert("require".to_string(), require);
    layer.insert("module".to_string(), module);
    layer.insert("exports".to_string(), exports);
    layer.insert("__filename".to_string(), JsValue::String(filename));
    layer.insert(
        "__dirname".to_string(),
        JsValue::String(config.working_dir.display().to_string()),
    );
    layer
}

fn process_object(realm: &Realm, config: &EngineConfig) -> JsValue {
    let env_object = realm.new_object();
    {
        let mut env_ref = env_object.borrow_mut();
        for (key, value) in env::vars() {
            env_ref.set_own(&key, JsValue::String(value));
        }
    }
    let cwd = config.working_dir.display().to_string();
    let process = realm.new_object_from(vec![
        (
            "argv",
            realm.new_array(config.argv.iter().cloned().map(JsValue::String).collect()),
        ),
        ("env", JsValue::Object(env_object)),
        ("platform", JsValue::string(node_platform())),
        ("pid", JsValue::number(std::process::id() as f64)),
    ]);
    let cwd_fn = realm.new_plugin_function("cwd", move |_ctx, _this, _args| Ok(JsValue::String(cwd.clone())));
    if let JsValue::Object(o) = &process {
        o.borrow_mut().set_own("cwd", cwd_fn);
    }
    process
}

fn ambient_globals(realm: &Realm, config: &EngineConfig, global: &JsValue) -> IndexMap<String, JsValue> {
    let mut layer: IndexMap<String, JsValue> = realm
        .global_names()
        .filter_map(|name| realm.global(name).map(|value| (name.clone(), value)))
        .collect();
    layer.insert("process".to_string(), process_object(realm, config));
    layer.insert("global".to_string(), global.clone());
    layer.insert("globalThis".to_string(), global.clone());
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::module_loader::ModuleError;

    struct NoModules;

    impl ModuleLoader for NoModules {
        fn load(&self, specifier: &str, _ctx: &mut EvalContext) -> Result<JsValue, ModuleError> {
            Err(ModuleError::NotFound {
                specifier: specifier.to_string(),
                from: "/".into(),
            })
        }
    }

    fn sandbox() -> Sandbox {
        Sandbox::with_loader(&EngineConfig::new("/tmp/project").with_color(false), Rc::new(NoModules))
    }

    #[test]
    fn strict_and_tolerant_reads_differ_on_a_miss() {
        let mut sandbox = sandbox();
        assert_eq!(sandbox.get_tolerant("leftPad").unwrap(), JsValue::Undefined);
        let err = sandbox.get_strict("leftPad").unwrap_err();
        assert_eq!(err.to_string(), "ReferenceError: leftPad is not defined");
    }

    #[test]
    fn common_names_never_auto_resolve() {
        let mut sandbox = sandbox();
        assert_eq!(sandbox.get_strict("Map").unwrap(), JsValue::Undefined);
        assert_eq!(sandbox.run_expression("typeof undefined").unwrap(), JsValue::string("undefined"));
    }

    #[test]
    fn literal_constructors_match_literals() {
        let mut sandbox = sandbox();
        assert_eq!(sandbox.run_expression("[] instanceof Array").unwrap(), JsValue::Boolean(true));
        assert_eq!(
            sandbox.run_expression("({}).constructor === Object").unwrap(),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn module_environment_is_rooted_at_the_working_dir() {
        let mut sandbox = sandbox();
        assert_eq!(
            sandbox.run_expression("__filename").unwrap(),
            JsValue::string("/tmp/project/command-line-function.js")
        );
        assert_eq!(sandbox.run_expression("process.cwd()").unwrap(), JsValue::string("/tmp/project"));
        assert_eq!(sandbox.run_expression("module.exports === exports").unwrap(), JsValue::Boolean(true));
    }

    #[test]
    fn global_object_reads_and_writes_the_namespace() {
        let mut sandbox = sandbox();
        assert_eq!(sandbox.run_expression("globalThis.JSON === JSON").unwrap(), JsValue::Boolean(true));
        assert_eq!(sandbox.run_expression("this === global").unwrap(), JsValue::Boolean(true));
        sandbox.run_expression("globalThis.answer = 42").unwrap();
        assert_eq!(sandbox.namespace().get("answer"), Some(JsValue::integer(42)));
        assert_eq!(sandbox.run_expression("answer + 1").unwrap(), JsValue::integer(43));
    }

    #[test]
    fn global_object_is_global_this() {
        let mut sandbox = sandbox();
        let global = sandbox.global_object();
        assert!(sandbox.run_expression("globalThis").unwrap().strict_equals(&global));
        assert!(sandbox.get_strict("global").unwrap().strict_equals(&global));
    }

    #[test]
    fn names_list_every_layer_once() {
        let sandbox = sandbox();
        let names = sandbox.namespace().names();
        for name in ["JSON", "require", "__dirname", "process", "globalThis", "exec", "quote"] {
            assert_eq!(names.iter().filter(|n| *n == name).count(), 1, "{}", name);
        }
        assert!(!names.iter().any(|n| n == "leftPad"));
    }

    #[test]
    fn helpers_win_over_lower_layers() {
        let mut sandbox = sandbox();
        assert_eq!(sandbox.run_expression("typeof exec").unwrap(), JsValue::string("function"));
        assert_eq!(sandbox.run_expression("red('x')").unwrap(), JsValue::string("x"));
    }

    #[test]
    fn empty_expressions_are_rejected() {
        let mut sandbox = sandbox();
        assert!(matches!(
            sandbox.run_expression("   "),
            Err(EngineError::InvalidExpression(_))
        ));
    }

    #[test]
    fn shorthand_becomes_a_function() {
        let mut sandbox = sandbox();
        let function = sandbox.run_expression(".length").unwrap();
        assert_eq!(
            sandbox.call(&function, vec![JsValue::string("abc")]).unwrap(),
            JsValue::integer(3)
        );
    }
}
