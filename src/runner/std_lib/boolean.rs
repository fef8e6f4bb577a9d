//! Boolean built-in.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Boolean built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let boolean = BuiltInObject::new("Boolean")
        .with_constructor(boolean_constructor)
        .add_prototype_method("toString", boolean_to_string)
        .add_prototype_method("valueOf", boolean_value_of);

    registry.register_object(boolean);
}

fn boolean_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let value = JsValue::Boolean(to_boolean(&arg(&args, 0)));
    if ctx.new_target.is_some() {
        Ok(ctx.realm.new_boxed_primitive(value))
    } else {
        Ok(value)
    }
}

fn this_boolean(this: &JsValue) -> Result<bool, JErrorType> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Primitive(JsValue::Boolean(b)) => Ok(*b),
            _ => Err(JErrorType::TypeError(
                "Boolean.prototype.valueOf requires that 'this' be a Boolean".to_string(),
            )),
        },
        _ => Err(JErrorType::TypeError(
            "Boolean.prototype.valueOf requires that 'this' be a Boolean".to_string(),
        )),
    }
}

fn boolean_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_boolean(&this)?.to_string()))
}

fn boolean_value_of(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(this_boolean(&this)?))
}

#[cfg(test)]
mod tests {
    use crate::runner::api::eval_expression;
    use crate::runner::ds::value::JsValue;
    use crate::runner::plugin::types::EvalContext;

    #[test]
    fn wrappers_are_truthy_objects() {
        let mut ctx = EvalContext::new();
        assert_eq!(eval_expression("Boolean('')", &mut ctx).unwrap(), JsValue::Boolean(false));
        assert_eq!(eval_expression("!!new Boolean(false)", &mut ctx).unwrap(), JsValue::Boolean(true));
        assert_eq!(
            eval_expression("new Boolean(false).valueOf()", &mut ctx).unwrap(),
            JsValue::Boolean(false)
        );
    }
}
