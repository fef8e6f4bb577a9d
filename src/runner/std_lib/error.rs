//! Error built-in objects.
//!
//! Provides Error, TypeError, ReferenceError, SyntaxError, RangeError constructors.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObject, ObjectData};
use crate::runner::ds::operations::object::{get_property, to_js_string};
use crate::runner::ds::operations::type_conversion::error_summary;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::arg;

/// Defines the constructor of one error kind.
macro_rules! error_constructor {
    ($name:ident, $kind:expr) => {
        fn $name(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
            construct_error(ctx, $kind, args)
        }
    };
}

error_constructor!(error_constructor, "Error");
error_constructor!(type_error_constructor, "TypeError");
error_constructor!(reference_error_constructor, "ReferenceError");
error_constructor!(syntax_error_constructor, "SyntaxError");
error_constructor!(range_error_constructor, "RangeError");

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let error = BuiltInObject::new("Error")
        .with_constructor(error_constructor)
        .add_prototype_property("name", JsValue::string("Error"))
        .add_prototype_property("message", JsValue::string(""))
        .add_prototype_method("toString", error_to_string);
    registry.register_object(error);

    let subclasses: [(&str, NativeFn); 4] = [
        ("TypeError", type_error_constructor),
        ("ReferenceError", reference_error_constructor),
        ("SyntaxError", syntax_error_constructor),
        ("RangeError", range_error_constructor),
    ];
    for (name, constructor) in subclasses {
        let subclass = BuiltInObject::new(name)
            .with_prototype("Error")
            .with_constructor(constructor)
            .add_prototype_property("name", JsValue::string(name))
            .add_prototype_property("message", JsValue::string(""));
        registry.register_object(subclass);
    }
}

/// `new Error(message, { cause })`; calling without `new` behaves the same.
fn construct_error(ctx: &mut EvalContext, kind: &str, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let prototype = match ctx.new_target.clone() {
        Some(target) => match get_property(ctx, &target, "prototype")? {
            JsValue::Object(p) => Some(p),
            _ => None,
        },
        None => None,
    }
    .or_else(|| ctx.realm.prototype_of(kind))
    .unwrap_or_else(|| ctx.realm.error_prototype.clone());

    let error = JsObject::new(ObjectData::Error, Some(prototype)).into_shared();
    let message = arg(&args, 0);
    if !matches!(message, JsValue::Undefined) {
        let message = to_js_string(ctx, &message)?;
        error.borrow_mut().set_own("message", JsValue::String(message));
    }
    let options = arg(&args, 1);
    if let JsValue::Object(o) = &options {
        if o.borrow().has_own("cause") {
            let cause = get_property(ctx, &options, "cause")?;
            error.borrow_mut().set_own("cause", cause);
        }
    }
    let stack = format!("{}\n    at <anonymous>", error_summary(&error));
    error.borrow_mut().set_own("stack", JsValue::String(stack));
    Ok(JsValue::Object(error))
}

/// Error.prototype.toString
fn error_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::Object(o) => Ok(JsValue::String(error_summary(o))),
        _ => Err(JErrorType::TypeError(
            "Error.prototype.toString called on non-object".to_string(),
        )),
    }
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
    fn subclasses_chain_to_error() {
        assert_eq!(eval_inspect("new TypeError('x') instanceof Error"), "true");
        assert_eq!(eval_inspect("String(new RangeError('too big'))"), "'RangeError: too big'");
        assert_eq!(eval_inspect("Error('plain').message"), "'plain'");
        assert_eq!(eval_inspect("new Error().toString()"), "'Error'");
    }

    #[test]
    fn message_is_not_enumerable() {
        assert_eq!(eval_inspect("Object.keys(new Error('m', { cause: 1 }))"), "[ 'cause' ]");
    }

    #[test]
    fn thrown_errors_report_their_summary() {
        let err = eval_expression("(() => { throw new SyntaxError('bad') })()", &mut EvalContext::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "SyntaxError: bad");
    }
}
