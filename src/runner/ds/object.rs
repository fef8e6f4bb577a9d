use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use regex::Regex;

use crate::parser::ast::{FunctionData, ParameterData};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::EnvironmentType;
use crate::runner::ds::limits::{check_array_length, MAX_ARRAY_LENGTH};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::BuiltInFn;

pub type JsObjectType = Rc<RefCell<JsObject>>;

/// Heap object. Ordinary properties keep insertion order; exotic storage
/// (array elements, boxed primitives, callable bodies) lives in `data`.
pub struct JsObject {
    pub data: ObjectData,
    pub properties: IndexMap<String, JsValue>,
    pub prototype: Option<JsObjectType>,
}

pub enum ObjectData {
    Ordinary,
    Array(Vec<JsValue>),
    Function(FunctionObject),
    /// Boxed `String`, `Number` or `Boolean`.
    Primitive(JsValue),
    RegExp(RegExpData),
    Error,
    /// The sandbox's `global`/`globalThis`; property access goes to the
    /// context's tolerant global lookup instead of `properties`.
    GlobalProxy,
}

pub struct FunctionObject {
    pub name: String,
    pub kind: FunctionKind,
}

pub enum FunctionKind {
    BuiltIn(BuiltInFn),
    Script(ClosureData),
}

pub struct ClosureData {
    pub data: Rc<FunctionData>,
    pub env: EnvironmentType,
    /// Arrow functions capture `this` at creation.
    pub this_value: Option<JsValue>,
}

pub struct RegExpData {
    pub source: String,
    pub flags: String,
    pub regex: Regex,
}

impl RegExpData {
    pub fn is_global(&self) -> bool {
        self.flags.contains('g')
    }
}

impl JsObject {
    pub fn new(data: ObjectData, prototype: Option<JsObjectType>) -> JsObject {
        JsObject {
            data,
            properties: IndexMap::new(),
            prototype,
        }
    }

    pub fn into_shared(self) -> JsObjectType {
        Rc::new(RefCell::new(self))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.data, ObjectData::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data, ObjectData::Array(_))
    }

    /// The `[object X]` tag.
    pub fn class_name(&self) -> &'static str {
        match &self.data {
            ObjectData::Ordinary | ObjectData::GlobalProxy => "Object",
            ObjectData::Array(_) => "Array",
            ObjectData::Function(_) => "Function",
            ObjectData::Primitive(JsValue::String(_)) => "String",
            ObjectData::Primitive(JsValue::Number(_)) => "Number",
            ObjectData::Primitive(JsValue::Boolean(_)) => "Boolean",
            ObjectData::Primitive(_) => "Object",
            ObjectData::RegExp(_) => "RegExp",
            ObjectData::Error => "Error",
        }
    }

    /// Own property lookup, including the virtual properties exotic objects
    /// expose (`length`, indices, function `name`).
    pub fn get_own(&self, key: &str) -> Option<JsValue> {
        match &self.data {
            ObjectData::Array(items) => {
                if key == "length" {
                    return Some(JsValue::integer(items.len() as i64));
                }
                if let Some(index) = array_index(key) {
                    return items.get(index).cloned();
                }
            }
            ObjectData::Primitive(JsValue::String(s)) => {
                if key == "length" {
                    return Some(JsValue::integer(s.encode_utf16().count() as i64));
                }
                if let Some(index) = array_index(key) {
                    if let Some(c) = s.chars().nth(index) {
                        return Some(JsValue::String(c.to_string()));
                    }
                }
            }
            ObjectData::Function(f) => {
                if let Some(value) = self.properties.get(key) {
                    return Some(value.clone());
                }
                if key == "name" {
                    return Some(JsValue::String(f.name.clone()));
                }
                if key == "length" {
                    return Some(JsValue::integer(f.arity() as i64));
                }
            }
            ObjectData::RegExp(r) => match key {
                "source" => return Some(JsValue::String(r.source.clone())),
                "flags" => return Some(JsValue::String(r.flags.clone())),
                "global" => return Some(JsValue::Boolean(r.is_global())),
                _ => {}
            },
            _ => {}
        }
        self.properties.get(key).cloned()
    }

    pub fn has_own(&self, key: &str) -> bool {
        match &self.data {
            ObjectData::Array(items) => {
                if let Some(index) = array_index(key) {
                    return index < items.len();
                }
                key == "length" || self.properties.contains_key(key)
            }
            ObjectData::Primitive(JsValue::String(s)) => match array_index(key) {
                Some(index) => index < s.chars().count(),
                None => key == "length" || self.properties.contains_key(key),
            },
            _ => self.properties.contains_key(key),
        }
    }

    /// Enumerable own keys in iteration order: indices first, then
    /// insertion order.
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        match &self.data {
            ObjectData::Array(items) => keys.extend((0..items.len()).map(|i| i.to_string())),
            ObjectData::Primitive(JsValue::String(s)) => {
                keys.extend((0..s.chars().count()).map(|i| i.to_string()))
            }
            _ => {}
        }
        // Error messages are non-enumerable, as they would be if set by the
        // Error constructor.
        let is_error = matches!(self.data, ObjectData::Error);
        keys.extend(
            self.properties
                .keys()
                .filter(|k| !(is_error && (k.as_str() == "message" || k.as_str() == "stack")))
                .cloned(),
        );
        keys
    }

    /// A script-visible write. Like [`set_own`](Self::set_own), except that
    /// growing an array past [`MAX_ARRAY_LENGTH`] is a `RangeError`.
    pub fn put(&mut self, key: &str, value: JsValue) -> Result<bool, JErrorType> {
        if let ObjectData::Array(_) = &self.data {
            let wanted = match (key, &value) {
                ("length", JsValue::Number(n)) => Some(n.as_f64()),
                _ => array_index(key).map(|index| index as f64 + 1.0),
            };
            if let Some(len) = wanted {
                check_array_length(len)?;
            }
        }
        Ok(self.set_own(key, value))
    }

    /// Stores an own property; returns false when the key cannot be
    /// written (e.g. a string index on a boxed string, or an array length
    /// over [`MAX_ARRAY_LENGTH`]).
    pub fn set_own(&mut self, key: &str, value: JsValue) -> bool {
        match &mut self.data {
            ObjectData::Array(items) => {
                if key == "length" {
                    if let JsValue::Number(n) = &value {
                        let len = n.as_f64();
                        if len >= 0.0 && len.fract() == 0.0 && len <= MAX_ARRAY_LENGTH as f64 {
                            items.resize(len as usize, JsValue::Undefined);
                            return true;
                        }
                    }
                    return false;
                }
                if let Some(index) = array_index(key) {
                    if index >= MAX_ARRAY_LENGTH {
                        return false;
                    }
                    if index >= items.len() {
                        items.resize(index + 1, JsValue::Undefined);
                    }
                    items[index] = value;
                    return true;
                }
            }
            ObjectData::Primitive(JsValue::String(_)) => {
                if key == "length" || array_index(key).is_some() {
                    return false;
                }
            }
            _ => {}
        }
        self.properties.insert(key.to_string(), value);
        true
    }

    pub fn delete_own(&mut self, key: &str) -> bool {
        if let ObjectData::Array(items) = &mut self.data {
            if let Some(index) = array_index(key) {
                if index < items.len() {
                    items[index] = JsValue::Undefined;
                }
                return true;
            }
        }
        self.properties.shift_remove(key);
        true
    }
}

impl FunctionObject {
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::BuiltIn(_) => 0,
            FunctionKind::Script(closure) => closure
                .data
                .params
                .iter()
                .take_while(|p| matches!(p, ParameterData::Simple { default: None, .. }))
                .count(),
        }
    }
}

/// Canonical array index (`"0"`, `"17"`, not `"01"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<usize>().ok()
}
