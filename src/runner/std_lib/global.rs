//! Global functions and values: `parseInt`, `parseFloat`, `isNaN`,
//! `isFinite`, `NaN`, `Infinity` and `undefined`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::to_js_number;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::arg;
use super::number::{parse_float, parse_int};

pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_function("parseInt", parse_int);
    registry.register_function("parseFloat", parse_float);
    registry.register_function("isNaN", global_is_nan);
    registry.register_function("isFinite", global_is_finite);

    registry.register_value("NaN", JsValue::Number(JsNumberType::NaN));
    registry.register_value("Infinity", JsValue::Number(JsNumberType::PositiveInfinity));
    registry.register_value("undefined", JsValue::Undefined);
}

/// `isNaN` coerces, unlike `Number.isNaN`.
fn global_is_nan(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_js_number(ctx, &arg(&args, 0))?.is_nan()))
}

fn global_is_finite(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_js_number(ctx, &arg(&args, 0))?.is_finite()))
}

#[cfg(test)]
mod tests {
    use crate::runner::api::eval_expression;
    use crate::runner::ds::value::JsValue;
    use crate::runner::plugin::types::EvalContext;

    #[test]
    fn global_functions_coerce_their_argument() {
        let mut ctx = EvalContext::new();
        assert_eq!(eval_expression("isNaN('abc')", &mut ctx).unwrap(), JsValue::Boolean(true));
        assert_eq!(eval_expression("isFinite('12')", &mut ctx).unwrap(), JsValue::Boolean(true));
        assert_eq!(eval_expression("parseInt('08')", &mut ctx).unwrap(), JsValue::integer(8));
        assert_eq!(eval_expression("typeof undefined", &mut ctx).unwrap(), JsValue::string("undefined"));
    }
}
