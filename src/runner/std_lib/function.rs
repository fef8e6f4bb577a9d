//! Function built-in: `call`, `apply` and `bind` on every function.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, iterate_values};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, is_callable};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Function built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_constructor(function_constructor)
        .add_prototype_method("call", function_call)
        .add_prototype_method("apply", function_apply)
        .add_prototype_method("bind", function_bind)
        .add_prototype_method("toString", function_to_string);

    registry.register_object(function);
}

/// Compiling source at runtime is not supported.
fn function_constructor(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Err(JErrorType::TypeError(
        "Code generation from strings is not supported".to_string(),
    ))
}

fn require_callable(this: &JsValue, method: &str) -> Result<(), JErrorType> {
    if is_callable(this) {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!(
            "Function.prototype.{} called on a non-function",
            method
        )))
    }
}

/// Function.prototype.call
fn function_call(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "call")?;
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call_function(ctx, &this, this_arg, args.collect())
}

/// Function.prototype.apply
fn function_apply(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "apply")?;
    let call_args = match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => vec![],
        list => iterate_values(&list)?,
    };
    call_function(ctx, &this, arg(&args, 0), call_args)
}

/// Function.prototype.bind
fn function_bind(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "bind")?;
    let name = match get_property(ctx, &this, "name")? {
        JsValue::String(name) => format!("bound {}", name),
        _ => "bound ".to_string(),
    };
    let mut args = args.into_iter();
    let bound_this = args.next().unwrap_or(JsValue::Undefined);
    let bound_args: Vec<JsValue> = args.collect();
    let target = this;
    Ok(ctx.realm.new_plugin_function(&name, move |ctx, _this, args| {
        let mut all = bound_args.clone();
        all.extend(args);
        call_function(ctx, &target, bound_this.clone(), all)
    }))
}

/// Function.prototype.toString
fn function_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::Object(o) if matches!(o.borrow().data, ObjectData::Function(_)) => {
            Ok(JsValue::String(to_string(&this)))
        }
        _ => Err(JErrorType::TypeError(
            "Function.prototype.toString requires that 'this' be a Function".to_string(),
        )),
    }
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
    fn call_apply_and_bind_set_this() {
        assert_eq!(eval("(function (a) { return this.x + a }).call({x: 1}, 2)"), JsValue::integer(3));
        assert_eq!(eval("(function (a, b) { return this.x + a + b }).apply({x: 1}, [2, 3])"), JsValue::integer(6));
        assert_eq!(eval("(function (a, b) { return this.x * a + b }).bind({x: 2}, 5)(1)"), JsValue::integer(11));
    }

    #[test]
    fn bound_functions_are_named() {
        assert_eq!(eval("(function f() {}).bind(null).name"), JsValue::string("bound f"));
    }
}
