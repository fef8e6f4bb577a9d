//! Object built-in.
//!
//! Provides Object constructor and prototype methods.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObject, ObjectData};
use crate::runner::ds::operations::object::{get_property, iterate_values, own_entries, set_property};
use crate::runner::ds::operations::test_and_comparison::same_value_zero;
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_no_prototype()
        .with_constructor(object_constructor)
        .add_method("keys", object_keys)
        .add_method("values", object_values)
        .add_method("entries", object_entries)
        .add_method("assign", object_assign)
        .add_method("fromEntries", object_from_entries)
        .add_method("freeze", object_freeze)
        .add_method("create", object_create)
        .add_method("getPrototypeOf", object_get_prototype_of)
        .add_method("is", object_is)
        .add_prototype_method("hasOwnProperty", object_has_own_property)
        .add_prototype_method("toString", object_to_string)
        .add_prototype_method("valueOf", object_value_of);

    registry.register_object(object);
}

fn require_object_coercible(value: &JsValue) -> Result<(), JErrorType> {
    if value.is_nullish() {
        Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Object constructor.
fn object_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match arg(&args, 0) {
        JsValue::Undefined | JsValue::Null => JsValue::Object(ctx.realm.new_object()),
        value @ JsValue::Object(_) => value,
        primitive => ctx.realm.new_boxed_primitive(primitive),
    })
}

/// Object.keys
fn object_keys(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let keys = own_entries(&target)
        .into_iter()
        .map(|(k, _)| JsValue::String(k))
        .collect();
    Ok(ctx.realm.new_array(keys))
}

/// Object.values
fn object_values(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let values = own_entries(&target).into_iter().map(|(_, v)| v).collect();
    Ok(ctx.realm.new_array(values))
}

/// Object.entries
fn object_entries(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let entries = own_entries(&target)
        .into_iter()
        .map(|(k, v)| ctx.realm.new_array(vec![JsValue::String(k), v]))
        .collect();
    Ok(ctx.realm.new_array(entries))
}

/// Object.assign
fn object_assign(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    for source in args.iter().skip(1) {
        for (key, value) in own_entries(source) {
            set_property(ctx, &target, &key, value)?;
        }
    }
    Ok(target)
}

/// Object.fromEntries
fn object_from_entries(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let result = JsValue::Object(ctx.realm.new_object());
    for entry in iterate_values(&arg(&args, 0))? {
        let key = get_property(ctx, &entry, "0")?;
        let value = get_property(ctx, &entry, "1")?;
        set_property(ctx, &result, &to_property_key(&key), value)?;
    }
    Ok(result)
}

/// Object.freeze is accepted but does not make anything immutable.
fn object_freeze(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(arg(&args, 0))
}

/// Object.create
fn object_create(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let prototype = match arg(&args, 0) {
        JsValue::Object(p) => Some(p),
        JsValue::Null => None,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Object prototype may only be an Object or null: {}",
                other
            )))
        }
    };
    Ok(JsValue::Object(
        JsObject::new(ObjectData::Ordinary, prototype).into_shared(),
    ))
}

/// Object.getPrototypeOf
fn object_get_prototype_of(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let prototype = match &target {
        JsValue::Object(o) => o.borrow().prototype.clone(),
        JsValue::String(_) => Some(ctx.realm.string_prototype.clone()),
        JsValue::Number(_) => Some(ctx.realm.number_prototype.clone()),
        JsValue::Boolean(_) => Some(ctx.realm.boolean_prototype.clone()),
        _ => None,
    };
    Ok(prototype.map(JsValue::Object).unwrap_or(JsValue::Null))
}

/// Object.is
fn object_is(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let (x, y) = (arg(&args, 0), arg(&args, 1));
    let same = match (&x, &y) {
        (JsValue::Number(a), JsValue::Number(b)) if a.as_f64() == 0.0 && b.as_f64() == 0.0 => {
            a.as_f64().is_sign_negative() == b.as_f64().is_sign_negative()
        }
        _ => same_value_zero(&x, &y),
    };
    Ok(JsValue::Boolean(same))
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key = to_property_key(&arg(&args, 0));
    Ok(JsValue::Boolean(match &this {
        JsValue::Object(o) => o.borrow().has_own(&key),
        JsValue::String(s) => key == "length" || key.parse::<usize>().map(|i| i < s.chars().count()).unwrap_or(false),
        _ => false,
    }))
}

/// Object.prototype.toString
fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Object(o) => o.borrow().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this)
}

#[cfg(test)]
mod tests {
    use crate::runner::api::eval_expression;
    use crate::runner::ds::operations::inspect::inspect;
    use crate::runner::plugin::types::EvalContext;

    fn eval_inspect(source: &str) -> String {
        inspect(&eval_expression(source, &mut EvalContext::new()).unwrap())
    }

    #[test]
    fn keys_values_and_entries_keep_insertion_order() {
        assert_eq!(eval_inspect("Object.keys({b: 1, a: 2})"), "[ 'b', 'a' ]");
        assert_eq!(eval_inspect("Object.entries({b: 1})"), "[ [ 'b', 1 ] ]");
        assert_eq!(
            eval_inspect("Object.fromEntries([['x', 1], ['y', 2]])"),
            "{ x: 1, y: 2 }"
        );
    }

    #[test]
    fn assign_merges_left_to_right() {
        assert_eq!(eval_inspect("Object.assign({a: 1}, {b: 2}, {a: 3})"), "{ a: 3, b: 2 }");
    }

    #[test]
    fn to_string_uses_the_class_tag() {
        assert_eq!(eval_inspect("Object.prototype.toString.call([])"), "'[object Array]'");
    }
}
