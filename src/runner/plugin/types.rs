//! Core types for the plugin architecture.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{assign_binding, lookup_binding, EnvironmentType, LexEnvironment};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::core_resolver::CorePluginResolver;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::resolver::PluginResolver;
use crate::runner::plugin::super_global::{LookupPolicy, SuperGlobalEnvironment};

/// Shared handle to the super-global environment of a context.
pub type SharedSuperGlobal = Rc<RefCell<SuperGlobalEnvironment>>;

const MAX_CALL_DEPTH: usize = 400;

/// Execution context passed to native functions and threaded through the
/// evaluator.
///
/// Scope resolution order for a bare identifier:
/// 1. the lexical chain starting at `lex_env`,
/// 2. the super-global environment (plugin resolvers, in order).
pub struct EvalContext {
    pub realm: Rc<Realm>,
    pub lex_env: EnvironmentType,
    pub this_value: JsValue,
    /// Set while a constructor runs under `new`.
    pub new_target: Option<JsValue>,
    super_global: SharedSuperGlobal,
    call_depth: usize,
}

impl EvalContext {
    /// A context with the core built-ins reachable through the core resolver.
    pub fn new() -> Self {
        let mut ctx = Self::with_registry(&BuiltInRegistry::with_core());
        let core = CorePluginResolver::new(ctx.realm.clone());
        ctx.add_resolver(Rc::new(core));
        ctx
    }

    /// A context whose realm is built from `registry`, with no resolvers yet.
    pub fn with_registry(registry: &BuiltInRegistry) -> Self {
        Self::with_realm(Realm::new(registry))
    }

    pub fn with_realm(realm: Rc<Realm>) -> Self {
        EvalContext {
            realm,
            lex_env: LexEnvironment::new_function_scope(None),
            this_value: JsValue::Undefined,
            new_target: None,
            super_global: Rc::new(RefCell::new(SuperGlobalEnvironment::new())),
            call_depth: 0,
        }
    }

    /// Register a plugin resolver. Resolvers are queried in registration order.
    pub fn add_resolver(&mut self, resolver: Rc<dyn PluginResolver>) {
        self.super_global.borrow_mut().add_resolver(resolver);
    }

    pub fn super_global(&self) -> SharedSuperGlobal {
        self.super_global.clone()
    }

    /// Strict identifier read: misses raise `ReferenceError`.
    pub fn get_binding(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        if let Some(value) = lookup_binding(&self.lex_env, name) {
            return Ok(value);
        }
        SuperGlobalEnvironment::resolve(&self.super_global(), name, self, LookupPolicy::Strict)
    }

    /// Tolerant read (`typeof x`, `globalThis.x`): misses are `undefined`.
    pub fn get_binding_tolerant(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        if let Some(value) = lookup_binding(&self.lex_env, name) {
            return Ok(value);
        }
        self.get_global_tolerant(name)
    }

    /// Tolerant read that skips the lexical chain.
    pub fn get_global_tolerant(&mut self, name: &str) -> Result<JsValue, JErrorType> {
        SuperGlobalEnvironment::resolve(&self.super_global(), name, self, LookupPolicy::Tolerant)
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.super_global.borrow().has_name(name)
    }

    /// Assignment to an identifier. Undeclared names go to the first
    /// resolver that accepts writes.
    pub fn set_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if assign_binding(&self.lex_env, name, value.clone())? {
            return Ok(());
        }
        self.assign_global(name, value)
    }

    pub fn assign_global(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        if self.super_global.borrow().assign(name, value) {
            Ok(())
        } else {
            Err(JErrorType::ReferenceError(format!("{} is not defined", name)))
        }
    }

    /// Declare in the current lexical scope.
    pub fn declare_binding(&mut self, name: &str, value: JsValue, mutable: bool) {
        self.lex_env.borrow_mut().declare(name, value, mutable);
    }

    pub fn enter_call(&mut self) -> Result<(), JErrorType> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Turns an engine error into the value script code would observe.
    pub fn error_to_value(&self, error: &JErrorType) -> JsValue {
        match error {
            JErrorType::Thrown(value) => value.clone(),
            other => self.realm.new_error(other.constructor_name(), &other.message()),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Closure-backed built-in, for functions that capture state.
pub type PluginFn = Rc<dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>;

/// Built-in function - either compiled-in or plugin-provided.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Plugin-provided function - small vtable indirection cost.
    Plugin(PluginFn),
}

impl BuiltInFn {
    /// Execute this built-in function.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Built-in object definition.
/// Represents a JavaScript built-in object like Array, Object, String, etc.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Parent prototype name, if any (e.g., "Error" for "TypeError").
    pub prototype: Option<String>,

    /// Static methods, installed on the global object itself.
    pub methods: IndexMap<String, BuiltInFn>,

    /// Methods installed on `<name>.prototype`.
    pub prototype_methods: IndexMap<String, BuiltInFn>,

    /// Static properties.
    pub properties: IndexMap<String, JsValue>,

    /// Properties installed on `<name>.prototype`.
    pub prototype_properties: IndexMap<String, JsValue>,

    /// Constructor function, if this object is constructable.
    pub constructor: Option<BuiltInFn>,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: IndexMap::new(),
            prototype_methods: IndexMap::new(),
            properties: IndexMap::new(),
            prototype_properties: IndexMap::new(),
            constructor: None,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Set no prototype (for objects like Object.prototype itself).
    pub fn with_no_prototype(mut self) -> Self {
        self.prototype = None;
        self
    }

    /// Add a native static method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a native method on the prototype.
    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods.insert(name.into(), BuiltInFn::Native(func));
        self
    }

    /// Add a property.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Add a property on the prototype.
    pub fn add_prototype_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.prototype_properties.insert(name.into(), value);
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(constructor));
        self
    }
}
