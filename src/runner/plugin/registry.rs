//! Built-in registry: the declarative description a `Realm` is built from.

use indexmap::IndexMap;

use super::types::{BuiltInFn, BuiltInObject, NativeFn};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_core_builtins;

/// Registry for built-in objects, global functions and global values.
///
/// Registration order matters: a realm installs objects in this order, so a
/// parent prototype (e.g. `Error`) must be registered before its children.
pub struct BuiltInRegistry {
    objects: IndexMap<String, BuiltInObject>,
    functions: IndexMap<String, BuiltInFn>,
    values: IndexMap<String, JsValue>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: IndexMap::new(),
            functions: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Register a built-in object (programmatic API).
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    /// Register a global function such as `parseInt`.
    pub fn register_function(&mut self, name: impl Into<String>, func: NativeFn) {
        self.functions.insert(name.into(), BuiltInFn::Native(func));
    }

    /// Register a global value such as `NaN`.
    pub fn register_value(&mut self, name: impl Into<String>, value: JsValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    /// Get a mutable reference to a registered object.
    pub fn get_object_mut(&mut self, name: &str) -> Option<&mut BuiltInObject> {
        self.objects.get_mut(name)
    }

    /// Override (or add) a static method on a registered object.
    pub fn override_method(&mut self, object: &str, method: &str, func: BuiltInFn) -> bool {
        match self.objects.get_mut(object) {
            Some(obj) => {
                obj.methods.insert(method.to_string(), func);
                true
            }
            None => false,
        }
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &BuiltInObject> {
        self.objects.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = (&String, &BuiltInFn)> {
        self.functions.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = (&String, &JsValue)> {
        self.values.iter()
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_registry_has_error_before_its_subclasses() {
        let registry = BuiltInRegistry::with_core();
        let names: Vec<&str> = registry.objects().map(|o| o.name.as_str()).collect();
        let error = names.iter().position(|n| *n == "Error").unwrap();
        let type_error = names.iter().position(|n| *n == "TypeError").unwrap();
        assert!(error < type_error);
        assert!(registry.has_object("Math"));
    }
}
