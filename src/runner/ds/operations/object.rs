use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{array_index, JsObjectType, ObjectData};
use crate::runner::ds::operations::type_conversion::{lookup_in_chain, to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::types::EvalContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

fn primitive_prototype(ctx: &EvalContext, value: &JsValue) -> Option<JsObjectType> {
    match value {
        JsValue::String(_) => Some(ctx.realm.string_prototype.clone()),
        JsValue::Number(_) => Some(ctx.realm.number_prototype.clone()),
        JsValue::Boolean(_) => Some(ctx.realm.boolean_prototype.clone()),
        _ => None,
    }
}

fn describe_target(value: &JsValue) -> &'static str {
    if matches!(value, JsValue::Null) {
        "null"
    } else {
        "undefined"
    }
}

/// `target[key]`, following prototype chains and boxing primitives.
pub fn get_property(ctx: &mut EvalContext, target: &JsValue, key: &str) -> Result<JsValue, JErrorType> {
    match target {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            describe_target(target),
            key
        ))),
        JsValue::String(s) => {
            if key == "length" {
                return Ok(JsValue::integer(s.encode_utf16().count() as i64));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| JsValue::String(c.to_string()))
                    .unwrap_or(JsValue::Undefined));
            }
            Ok(lookup_in_chain(&ctx.realm.string_prototype, key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Number(_) | JsValue::Boolean(_) => Ok(primitive_prototype(ctx, target)
            .and_then(|proto| lookup_in_chain(&proto, key))
            .unwrap_or(JsValue::Undefined)),
        JsValue::Object(obj) => {
            let is_global_proxy = matches!(obj.borrow().data, ObjectData::GlobalProxy);
            if is_global_proxy {
                let value = ctx.get_global_tolerant(key)?;
                if !matches!(value, JsValue::Undefined) {
                    return Ok(value);
                }
            }
            Ok(lookup_in_chain(obj, key).unwrap_or(JsValue::Undefined))
        }
    }
}

/// `target[key] = value`. Writes to primitives are silently dropped.
pub fn set_property(
    ctx: &mut EvalContext,
    target: &JsValue,
    key: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    match target {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            describe_target(target),
            key
        ))),
        JsValue::Object(obj) => {
            let is_global_proxy = matches!(obj.borrow().data, ObjectData::GlobalProxy);
            if is_global_proxy {
                ctx.assign_global(key, value)
            } else {
                obj.borrow_mut().put(key, value)?;
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

pub fn delete_property(target: &JsValue, key: &str) -> Result<bool, JErrorType> {
    match target {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        )),
        JsValue::Object(obj) => Ok(obj.borrow_mut().delete_own(key)),
        _ => Ok(true),
    }
}

/// The `in` operator.
pub fn has_property(ctx: &EvalContext, target: &JsValue, key: &str) -> Result<bool, JErrorType> {
    let obj = match target {
        JsValue::Object(obj) => obj,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key,
                to_string(other)
            )))
        }
    };
    if matches!(obj.borrow().data, ObjectData::GlobalProxy) && ctx.has_global(key) {
        return Ok(true);
    }
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if o_ref.has_own(key) || o_ref.get_own(key).is_some() {
            return Ok(true);
        }
        current = o_ref.prototype.clone();
    }
    Ok(false)
}

/// `value instanceof constructor`: identity walk of the prototype chain.
pub fn instance_of(ctx: &mut EvalContext, value: &JsValue, constructor: &JsValue) -> Result<bool, JErrorType> {
    let callable = match constructor {
        JsValue::Object(c) => c.borrow().is_callable(),
        _ => false,
    };
    if !callable {
        return Err(JErrorType::TypeError(
            "Right-hand side of 'instanceof' is not callable".to_string(),
        ));
    }
    let proto = match get_property(ctx, constructor, "prototype")? {
        JsValue::Object(p) => p,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Function has non-object prototype '{}' in instanceof check",
                to_string(&other)
            )))
        }
    };
    let mut current = match value {
        JsValue::Object(o) => o.borrow().prototype.clone(),
        _ => return Ok(false),
    };
    while let Some(o) = current {
        if Rc::ptr_eq(&o, &proto) {
            return Ok(true);
        }
        current = o.borrow().prototype.clone();
    }
    Ok(false)
}

/// Looks up `name` on `this` and calls it.
pub fn call_method(
    ctx: &mut EvalContext,
    this: &JsValue,
    name: &str,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let method = get_property(ctx, this, name)?;
    call_function(ctx, &method, this.clone(), args)
}

/// ToPrimitive: unboxes wrappers, otherwise tries `valueOf`/`toString`
/// (order depending on `hint`) and keeps the first primitive result.
pub fn to_primitive(ctx: &mut EvalContext, value: &JsValue, hint: PreferredType) -> Result<JsValue, JErrorType> {
    let obj = match value {
        JsValue::Object(o) => o,
        _ => return Ok(value.clone()),
    };
    if let ObjectData::Primitive(p) = &obj.borrow().data {
        return Ok(p.clone());
    }
    let order = if hint == PreferredType::String {
        ["toString", "valueOf"]
    } else {
        ["valueOf", "toString"]
    };
    for name in order {
        let method = lookup_in_chain(obj, name).unwrap_or(JsValue::Undefined);
        let callable = method.as_object().map(|m| m.borrow().is_callable()).unwrap_or(false);
        if callable {
            let result = call_function(ctx, &method, value.clone(), vec![])?;
            if !result.is_object() {
                return Ok(result);
            }
        }
    }
    Err(JErrorType::TypeError(
        "Cannot convert object to primitive value".to_string(),
    ))
}

/// `String(value)`, honoring script-defined `toString`.
pub fn to_js_string(ctx: &mut EvalContext, value: &JsValue) -> Result<String, JErrorType> {
    match value {
        JsValue::Object(_) => {
            let primitive = to_primitive(ctx, value, PreferredType::String)?;
            Ok(to_string(&primitive))
        }
        other => Ok(to_string(other)),
    }
}

/// `Number(value)`, honoring script-defined `valueOf`.
pub fn to_js_number(ctx: &mut EvalContext, value: &JsValue) -> Result<f64, JErrorType> {
    match value {
        JsValue::Object(_) => {
            let primitive = to_primitive(ctx, value, PreferredType::Number)?;
            Ok(to_number(&primitive))
        }
        other => Ok(to_number(other)),
    }
}

/// Elements of an iterable for spread and `for...of`: arrays yield their
/// items, strings their characters.
pub fn iterate_values(value: &JsValue) -> Result<Vec<JsValue>, JErrorType> {
    match value {
        JsValue::String(s) => Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect()),
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Array(items) => Ok(items.clone()),
            ObjectData::Primitive(JsValue::String(s)) => {
                Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect())
            }
            _ => Err(JErrorType::TypeError(format!(
                "{} is not iterable",
                to_string(value)
            ))),
        },
        other => Err(JErrorType::TypeError(format!(
            "{} is not iterable",
            to_string(other)
        ))),
    }
}

/// Own enumerable `[key, value]` pairs, as `Object.entries` sees them.
pub fn own_entries(value: &JsValue) -> Vec<(String, JsValue)> {
    match value {
        JsValue::Object(o) => {
            let o_ref = o.borrow();
            o_ref
                .own_keys()
                .into_iter()
                .map(|k| {
                    let v = o_ref.get_own(&k).unwrap_or(JsValue::Undefined);
                    (k, v)
                })
                .collect()
        }
        JsValue::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), JsValue::String(c.to_string())))
            .collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_from_undefined_names_the_key() {
        let mut ctx = EvalContext::new();
        let err = get_property(&mut ctx, &JsValue::Undefined, "name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of undefined (reading 'name')"
        );
    }

    #[test]
    fn string_primitives_expose_length_and_methods() {
        let mut ctx = EvalContext::new();
        let s = JsValue::string("héllo");
        assert_eq!(get_property(&mut ctx, &s, "length").unwrap(), JsValue::integer(5));
        assert_eq!(get_property(&mut ctx, &s, "1").unwrap(), JsValue::string("é"));
        assert!(get_property(&mut ctx, &s, "toUpperCase").unwrap().is_object());
    }

    #[test]
    fn arrays_are_instances_of_their_realm_array() {
        let mut ctx = EvalContext::new();
        let array = ctx.realm.new_array(vec![]);
        let ctor = ctx.get_binding("Array").unwrap();
        let object_ctor = ctx.get_binding("Object").unwrap();
        assert!(instance_of(&mut ctx, &array, &ctor).unwrap());
        assert!(instance_of(&mut ctx, &array, &object_ctor).unwrap());
        assert!(instance_of(&mut ctx, &array, &JsValue::integer(1)).is_err());
    }
}
