use std::rc::Rc;

use indexmap::IndexMap;
use regex::RegexBuilder;

use crate::parser::ast::FunctionData;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::EnvironmentType;
use crate::runner::ds::object::{
    ClosureData, FunctionKind, FunctionObject, JsObject, JsObjectType, ObjectData, RegExpData,
};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInFn, BuiltInObject, EvalContext, NativeFn};

/// The intrinsic objects of one evaluation context.
///
/// Every literal evaluated in a context is tagged with this realm's
/// prototypes, so `[] instanceof Array` holds only against this realm's
/// `Array`.
pub struct Realm {
    pub object_prototype: JsObjectType,
    pub function_prototype: JsObjectType,
    pub array_prototype: JsObjectType,
    pub string_prototype: JsObjectType,
    pub number_prototype: JsObjectType,
    pub boolean_prototype: JsObjectType,
    pub error_prototype: JsObjectType,
    pub regexp_prototype: JsObjectType,
    globals: IndexMap<String, JsValue>,
}

impl Realm {
    pub fn new(registry: &BuiltInRegistry) -> Rc<Realm> {
        let object_prototype = JsObject::new(ObjectData::Ordinary, None).into_shared();
        let derived = |data: ObjectData| JsObject::new(data, Some(object_prototype.clone())).into_shared();
        let mut realm = Realm {
            function_prototype: derived(ObjectData::Ordinary),
            array_prototype: derived(ObjectData::Array(vec![])),
            string_prototype: derived(ObjectData::Primitive(JsValue::String(String::new()))),
            number_prototype: derived(ObjectData::Primitive(JsValue::integer(0))),
            boolean_prototype: derived(ObjectData::Primitive(JsValue::Boolean(false))),
            error_prototype: derived(ObjectData::Ordinary),
            regexp_prototype: derived(ObjectData::Ordinary),
            object_prototype,
            globals: IndexMap::new(),
        };
        for def in registry.objects() {
            realm.install_object(def);
        }
        for (name, func) in registry.functions() {
            let function = realm.new_builtin_function(name, func.clone());
            realm.globals.insert(name.clone(), function);
        }
        for (name, value) in registry.values() {
            realm.globals.insert(name.clone(), value.clone());
        }
        Rc::new(realm)
    }

    fn intrinsic_prototype(&self, name: &str) -> Option<JsObjectType> {
        Some(
            match name {
                "Object" => &self.object_prototype,
                "Function" => &self.function_prototype,
                "Array" => &self.array_prototype,
                "String" => &self.string_prototype,
                "Number" => &self.number_prototype,
                "Boolean" => &self.boolean_prototype,
                "Error" => &self.error_prototype,
                "RegExp" => &self.regexp_prototype,
                _ => return None,
            }
            .clone(),
        )
    }

    /// `<name>.prototype` of an installed global constructor.
    pub fn prototype_of(&self, name: &str) -> Option<JsObjectType> {
        if let Some(proto) = self.intrinsic_prototype(name) {
            return Some(proto);
        }
        match self.globals.get(name) {
            Some(JsValue::Object(ctor)) => match ctor.borrow().get_own("prototype") {
                Some(JsValue::Object(proto)) => Some(proto),
                _ => None,
            },
            _ => None,
        }
    }

    fn install_object(&mut self, def: &BuiltInObject) {
        let target = match &def.constructor {
            Some(ctor) => {
                let proto = match self.intrinsic_prototype(&def.name) {
                    Some(proto) => proto,
                    None => {
                        let parent = def
                            .prototype
                            .as_deref()
                            .and_then(|p| self.prototype_of(p))
                            .unwrap_or_else(|| self.object_prototype.clone());
                        JsObject::new(ObjectData::Ordinary, Some(parent)).into_shared()
                    }
                };
                let ctor_obj = self.new_function_object(&def.name, FunctionKind::BuiltIn(ctor.clone()));
                for (name, func) in &def.prototype_methods {
                    let method = self.new_builtin_function(name, func.clone());
                    proto.borrow_mut().properties.insert(name.clone(), method);
                }
                for (name, value) in &def.prototype_properties {
                    proto.borrow_mut().properties.insert(name.clone(), value.clone());
                }
                proto
                    .borrow_mut()
                    .properties
                    .insert("constructor".to_string(), JsValue::Object(ctor_obj.clone()));
                ctor_obj
                    .borrow_mut()
                    .properties
                    .insert("prototype".to_string(), JsValue::Object(proto));
                ctor_obj
            }
            None => {
                let parent = match &def.prototype {
                    Some(p) => self.prototype_of(p),
                    None => None,
                };
                JsObject::new(ObjectData::Ordinary, parent.or_else(|| Some(self.object_prototype.clone())))
                    .into_shared()
            }
        };
        for (name, func) in &def.methods {
            let method = self.new_builtin_function(name, func.clone());
            target.borrow_mut().properties.insert(name.clone(), method);
        }
        for (name, value) in &def.properties {
            target.borrow_mut().properties.insert(name.clone(), value.clone());
        }
        self.globals.insert(def.name.clone(), JsValue::Object(target));
    }

    pub fn global(&self, name: &str) -> Option<JsValue> {
        self.globals.get(name).cloned()
    }

    pub fn global_names(&self) -> impl Iterator<Item = &String> {
        self.globals.keys()
    }

    // ── Object factories ──────────────────────────────────────

    pub fn new_object(&self) -> JsObjectType {
        JsObject::new(ObjectData::Ordinary, Some(self.object_prototype.clone())).into_shared()
    }

    pub fn new_object_from(&self, entries: Vec<(&str, JsValue)>) -> JsValue {
        let obj = self.new_object();
        {
            let mut obj_ref = obj.borrow_mut();
            for (key, value) in entries {
                obj_ref.properties.insert(key.to_string(), value);
            }
        }
        JsValue::Object(obj)
    }

    pub fn new_array(&self, items: Vec<JsValue>) -> JsValue {
        JsValue::Object(
            JsObject::new(ObjectData::Array(items), Some(self.array_prototype.clone())).into_shared(),
        )
    }

    fn new_function_object(&self, name: &str, kind: FunctionKind) -> JsObjectType {
        JsObject::new(
            ObjectData::Function(FunctionObject {
                name: name.to_string(),
                kind,
            }),
            Some(self.function_prototype.clone()),
        )
        .into_shared()
    }

    pub fn new_builtin_function(&self, name: &str, func: BuiltInFn) -> JsValue {
        JsValue::Object(self.new_function_object(name, FunctionKind::BuiltIn(func)))
    }

    pub fn new_native_function(&self, name: &str, func: NativeFn) -> JsValue {
        self.new_builtin_function(name, BuiltInFn::Native(func))
    }

    pub fn new_plugin_function<F>(&self, name: &str, func: F) -> JsValue
    where
        F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        self.new_builtin_function(name, BuiltInFn::Plugin(Rc::new(func)))
    }

    /// Closure over `env`. Non-arrow functions get a fresh `prototype`
    /// object so they can be used with `new`.
    pub fn new_script_function(
        &self,
        data: Rc<FunctionData>,
        env: EnvironmentType,
        this_value: Option<JsValue>,
    ) -> JsValue {
        let is_arrow = data.is_arrow;
        let name = data.name().to_string();
        let function = self.new_function_object(
            &name,
            FunctionKind::Script(ClosureData {
                data,
                env,
                this_value,
            }),
        );
        if !is_arrow {
            let proto = self.new_object();
            proto
                .borrow_mut()
                .properties
                .insert("constructor".to_string(), JsValue::Object(function.clone()));
            function
                .borrow_mut()
                .properties
                .insert("prototype".to_string(), JsValue::Object(proto));
        }
        JsValue::Object(function)
    }

    /// `new String(..)`-style wrapper around a primitive.
    pub fn new_boxed_primitive(&self, value: JsValue) -> JsValue {
        let proto = match &value {
            JsValue::String(_) => self.string_prototype.clone(),
            JsValue::Number(_) => self.number_prototype.clone(),
            JsValue::Boolean(_) => self.boolean_prototype.clone(),
            _ => self.object_prototype.clone(),
        };
        JsValue::Object(JsObject::new(ObjectData::Primitive(value), Some(proto)).into_shared())
    }

    /// An error object whose prototype is `<kind>.prototype`.
    pub fn new_error(&self, kind: &str, message: &str) -> JsValue {
        let proto = self
            .prototype_of(kind)
            .unwrap_or_else(|| self.error_prototype.clone());
        let mut error = JsObject::new(ObjectData::Error, Some(proto));
        error
            .properties
            .insert("message".to_string(), JsValue::String(message.to_string()));
        JsValue::Object(error.into_shared())
    }

    /// Compiles a JavaScript regular expression for the `regex` crate.
    pub fn new_regexp(&self, source: &str, flags: &str) -> Result<JsValue, JErrorType> {
        for flag in flags.chars() {
            if !"gimsuy".contains(flag) || flags.matches(flag).count() > 1 {
                return Err(JErrorType::SyntaxError(format!(
                    "Invalid regular expression flags '{}'",
                    flags
                )));
            }
        }
        let regex = RegexBuilder::new(&translate_regex_source(source))
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| {
                JErrorType::SyntaxError(format!("Invalid regular expression: /{}/: {}", source, e))
            })?;
        let mut obj = JsObject::new(
            ObjectData::RegExp(RegExpData {
                source: source.to_string(),
                flags: flags.to_string(),
                regex,
            }),
            Some(self.regexp_prototype.clone()),
        );
        obj.properties
            .insert("lastIndex".to_string(), JsValue::Number(JsNumberType::Integer(0)));
        Ok(JsValue::Object(obj.into_shared()))
    }
}

/// Rewrites the few JavaScript-only spellings the `regex` crate rejects.
fn translate_regex_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('/') => out.push('/'),
                Some('d') => out.push_str("[0-9]"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str("\\\\"),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclass_prototypes_chain_to_error() {
        let realm = Realm::new(&BuiltInRegistry::with_core());
        let type_error_proto = realm.prototype_of("TypeError").unwrap();
        let parent = type_error_proto.borrow().prototype.clone().unwrap();
        assert!(Rc::ptr_eq(&parent, &realm.error_prototype));
    }

    #[test]
    fn regexp_flags_are_validated() {
        let realm = Realm::new(&BuiltInRegistry::with_core());
        assert!(realm.new_regexp("a+", "gi").is_ok());
        assert!(realm.new_regexp("a+", "gg").is_err());
        assert!(realm.new_regexp("(", "").is_err());
    }
}
