//! JSON built-in object.
//!
//! Provides JSON.parse and JSON.stringify on top of `serde_json`, plus the
//! value conversions the pipeline commands share.

use std::rc::Rc;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number, Value};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, own_entries, set_property, to_js_number, to_js_string};
use crate::runner::ds::operations::type_conversion::{lookup_in_chain, to_property_key};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::eval::function::{call_function, is_callable};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let json = BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify);

    registry.register_object(json);
}

/// Builds script values from parsed JSON, with this realm's prototypes.
pub fn json_to_value(realm: &Realm, json: &Value) -> JsValue {
    match json {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => JsValue::number(i as f64),
            None => JsValue::number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => JsValue::String(s.clone()),
        Value::Array(items) => realm.new_array(items.iter().map(|v| json_to_value(realm, v)).collect()),
        Value::Object(map) => {
            let obj = realm.new_object();
            {
                let mut obj_ref = obj.borrow_mut();
                for (key, value) in map {
                    obj_ref.set_own(key, json_to_value(realm, value));
                }
            }
            JsValue::Object(obj)
        }
    }
}

/// Parses JSON text into script values.
pub fn parse_json(realm: &Realm, text: &str) -> Result<JsValue, JErrorType> {
    let json: Value = serde_json::from_str(text)
        .map_err(|e| JErrorType::SyntaxError(format!("Unexpected JSON input: {}", e)))?;
    Ok(json_to_value(realm, &json))
}

fn number_to_json(n: &JsNumberType) -> Value {
    match n {
        JsNumberType::Integer(i) => Value::Number(Number::from(*i)),
        JsNumberType::Float(f) if *f == 0.0 => Value::Number(Number::from(0)),
        JsNumberType::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Property filter or transform given as the `replacer` argument.
enum Replacer {
    None,
    Keys(Vec<String>),
    Function(JsValue),
}

struct Stringifier<'a> {
    ctx: &'a mut EvalContext,
    replacer: Replacer,
    stack: Vec<*const ()>,
}

impl<'a> Stringifier<'a> {
    /// `SerializeJSONProperty`: `None` means the property is omitted.
    fn property(&mut self, holder: &JsValue, key: &str, value: JsValue) -> Result<Option<Value>, JErrorType> {
        let mut value = value;
        if let JsValue::Object(o) = &value {
            let to_json = lookup_in_chain(o, "toJSON");
            if let Some(to_json) = to_json.filter(is_callable) {
                value = call_function(self.ctx, &to_json, value.clone(), vec![JsValue::string(key)])?;
            }
        }
        if let Replacer::Function(f) = &self.replacer {
            let f = f.clone();
            value = call_function(self.ctx, &f, holder.clone(), vec![JsValue::string(key), value])?;
        }
        self.serialize(value)
    }

    fn serialize(&mut self, value: JsValue) -> Result<Option<Value>, JErrorType> {
        let obj = match &value {
            JsValue::Undefined => return Ok(None),
            JsValue::Null => return Ok(Some(Value::Null)),
            JsValue::Boolean(b) => return Ok(Some(Value::Bool(*b))),
            JsValue::Number(n) => return Ok(Some(number_to_json(n))),
            JsValue::String(s) => return Ok(Some(Value::String(s.clone()))),
            JsValue::Object(o) => o.clone(),
        };
        let unboxed = match &obj.borrow().data {
            ObjectData::Function(_) => return Ok(None),
            ObjectData::Primitive(p) => Some(p.clone()),
            _ => None,
        };
        if let Some(primitive) = unboxed {
            let primitive = match primitive {
                JsValue::Number(_) => JsValue::number(to_js_number(self.ctx, &value)?),
                JsValue::String(_) => JsValue::String(to_js_string(self.ctx, &value)?),
                other => other,
            };
            return self.serialize(primitive);
        }

        let id = Rc::as_ptr(&obj) as *const ();
        if self.stack.contains(&id) {
            return Err(JErrorType::TypeError(
                "Converting circular structure to JSON".to_string(),
            ));
        }
        self.stack.push(id);
        let result = self.serialize_object(&value);
        self.stack.pop();
        result.map(Some)
    }

    fn serialize_object(&mut self, value: &JsValue) -> Result<Value, JErrorType> {
        let items = match value {
            JsValue::Object(o) => match &o.borrow().data {
                ObjectData::Array(items) => Some(items.clone()),
                _ => None,
            },
            _ => None,
        };
        if let Some(items) = items {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let json = self.property(value, &i.to_string(), item)?;
                out.push(json.unwrap_or(Value::Null));
            }
            return Ok(Value::Array(out));
        }

        let entries = match &self.replacer {
            Replacer::Keys(keys) => {
                let keys = keys.clone();
                let mut entries = vec![];
                for key in keys {
                    let has = value.as_object().map(|o| o.borrow().has_own(&key)).unwrap_or(false);
                    if has {
                        let v = get_property(self.ctx, value, &key)?;
                        entries.push((key, v));
                    }
                }
                entries
            }
            _ => own_entries(value),
        };
        let mut map = Map::new();
        for (key, item) in entries {
            if let Some(json) = self.property(value, &key, item)? {
                map.insert(key, json);
            }
        }
        Ok(Value::Object(map))
    }
}

/// Renders JSON with `indent` per level; empty indent means compact output.
pub fn write_json(json: &Value, indent: &str) -> String {
    if indent.is_empty() {
        return json.to_string();
    }
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
    if json.serialize(&mut serializer).is_err() {
        return json.to_string();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// `JSON.stringify(value, replacer, space)`; `None` when the value itself
/// is not serializable (undefined, functions).
pub fn stringify(
    ctx: &mut EvalContext,
    value: &JsValue,
    replacer: &JsValue,
    space: &JsValue,
) -> Result<Option<String>, JErrorType> {
    let replacer = if is_callable(replacer) {
        Replacer::Function(replacer.clone())
    } else {
        let keys = match replacer {
            JsValue::Object(o) => match &o.borrow().data {
                ObjectData::Array(items) => Some(
                    items
                        .iter()
                        .filter(|k| matches!(k, JsValue::String(_) | JsValue::Number(_)))
                        .map(to_property_key)
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            },
            _ => None,
        };
        keys.map(Replacer::Keys).unwrap_or(Replacer::None)
    };
    let indent = match space {
        JsValue::Number(n) => " ".repeat(n.as_f64().clamp(0.0, 10.0) as usize),
        JsValue::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };

    let holder = JsValue::Object(ctx.realm.new_object());
    let mut stringifier = Stringifier {
        ctx,
        replacer,
        stack: vec![],
    };
    let json = stringifier.property(&holder, "", value.clone())?;
    Ok(json.map(|j| write_json(&j, &indent)))
}

/// JSON.parse
fn json_parse(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let text = to_js_string(ctx, &arg(&args, 0))?;
    let parsed = parse_json(&ctx.realm, &text)?;
    let reviver = arg(&args, 1);
    if !is_callable(&reviver) {
        return Ok(parsed);
    }
    let root = JsValue::Object(ctx.realm.new_object());
    set_property(ctx, &root, "", parsed)?;
    revive(ctx, &root, "", &reviver)
}

/// Applies a reviver bottom-up; `undefined` results delete the property.
fn revive(ctx: &mut EvalContext, holder: &JsValue, key: &str, reviver: &JsValue) -> Result<JsValue, JErrorType> {
    let value = get_property(ctx, holder, key)?;
    if value.is_object() {
        for (child_key, _) in own_entries(&value) {
            let revived = revive(ctx, &value, &child_key, reviver)?;
            if matches!(revived, JsValue::Undefined) {
                if let JsValue::Object(o) = &value {
                    o.borrow_mut().delete_own(&child_key);
                }
            } else {
                set_property(ctx, &value, &child_key, revived)?;
            }
        }
    }
    call_function(ctx, reviver, holder.clone(), vec![JsValue::string(key), value])
}

/// JSON.stringify
fn json_stringify(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(stringify(ctx, &arg(&args, 0), &arg(&args, 1), &arg(&args, 2))?
        .map(JsValue::String)
        .unwrap_or(JsValue::Undefined))
}

#[cfg(test)]
mod tests {
    use crate::runner::api::eval_expression;
    use crate::runner::ds::value::JsValue;
    use crate::runner::plugin::types::EvalContext;

    fn eval(source: &str) -> JsValue {
        eval_expression(source, &mut EvalContext::new()).unwrap()
    }

    #[test]
    fn stringify_skips_unserializable_values() {
        assert_eq!(
            eval("JSON.stringify({a: 1, b: undefined, c: () => 1, d: [undefined, NaN]})"),
            JsValue::string(r#"{"a":1,"d":[null,null]}"#)
        );
        assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
    }

    #[test]
    fn stringify_indents_and_filters() {
        assert_eq!(
            eval("JSON.stringify({a: [1]}, null, 2)"),
            JsValue::string("{\n  \"a\": [\n    1\n  ]\n}")
        );
        assert_eq!(eval("JSON.stringify({a: 1, b: 2}, ['b'])"), JsValue::string(r#"{"b":2}"#));
        assert_eq!(
            eval("JSON.stringify({a: 1, b: 2}, (k, v) => k === 'a' ? undefined : v)"),
            JsValue::string(r#"{"b":2}"#)
        );
    }

    #[test]
    fn circular_structures_are_rejected() {
        let err = eval_expression("((o) => { o.self = o; return JSON.stringify(o) })({})", &mut EvalContext::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Converting circular structure to JSON");
    }

    #[test]
    fn parse_keeps_key_order_and_revives() {
        assert_eq!(eval("Object.keys(JSON.parse('{\"z\": 1, \"a\": 2}')).join()"), JsValue::string("z,a"));
        assert_eq!(eval("JSON.parse('[1, 2]', (k, v) => typeof v === 'number' ? v * 10 : v)[1]"), JsValue::integer(20));
        assert!(eval_expression("JSON.parse('{')", &mut EvalContext::new()).is_err());
    }
}
