//! Math built-in object.
//!
//! Provides mathematical constants and functions.

use rand::Rng;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::to_js_number;
use crate::runner::ds::operations::type_conversion::to_uint32;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Defines a one-argument Math method over `f64`.
macro_rules! unary_math_fn {
    ($name:ident, $op:expr) => {
        fn $name(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
            let x = to_js_number(ctx, &arg(&args, 0))?;
            let op: fn(f64) -> f64 = $op;
            Ok(JsValue::number(op(x)))
        }
    };
}

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        // Constants
        .add_property("E", JsValue::number(std::f64::consts::E))
        .add_property("LN10", JsValue::number(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::number(std::f64::consts::LN_2))
        .add_property("LOG10E", JsValue::number(std::f64::consts::LOG10_E))
        .add_property("LOG2E", JsValue::number(std::f64::consts::LOG2_E))
        .add_property("PI", JsValue::number(std::f64::consts::PI))
        .add_property("SQRT1_2", JsValue::number(std::f64::consts::FRAC_1_SQRT_2))
        .add_property("SQRT2", JsValue::number(std::f64::consts::SQRT_2))
        // Methods
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("pow", math_pow)
        .add_method("exp", math_exp)
        .add_method("log", math_log)
        .add_method("log10", math_log10)
        .add_method("log2", math_log2)
        .add_method("sin", math_sin)
        .add_method("cos", math_cos)
        .add_method("tan", math_tan)
        .add_method("atan", math_atan)
        .add_method("atan2", math_atan2)
        .add_method("hypot", math_hypot)
        .add_method("random", math_random)
        .add_method("clz32", math_clz32);

    registry.register_object(math);
}

unary_math_fn!(math_abs, f64::abs);
unary_math_fn!(math_floor, f64::floor);
unary_math_fn!(math_ceil, f64::ceil);
unary_math_fn!(math_trunc, f64::trunc);
unary_math_fn!(math_sqrt, f64::sqrt);
unary_math_fn!(math_cbrt, f64::cbrt);
unary_math_fn!(math_exp, f64::exp);
unary_math_fn!(math_log, f64::ln);
unary_math_fn!(math_log10, f64::log10);
unary_math_fn!(math_log2, f64::log2);
unary_math_fn!(math_sin, f64::sin);
unary_math_fn!(math_cos, f64::cos);
unary_math_fn!(math_tan, f64::tan);
unary_math_fn!(math_atan, f64::atan);
// JavaScript rounds halves towards +Infinity: Math.round(-2.5) is -2.
unary_math_fn!(math_round, |x| (x + 0.5).floor());
unary_math_fn!(math_sign, |x| if x.is_nan() || x == 0.0 { x } else { x.signum() });

fn numbers(ctx: &mut EvalContext, args: &[JsValue]) -> Result<Vec<f64>, JErrorType> {
    args.iter().map(|a| to_js_number(ctx, a)).collect()
}

/// Math.min
fn math_min(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let values = numbers(ctx, &args)?;
    let result = values.into_iter().fold(f64::INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            acc.min(x)
        }
    });
    Ok(JsValue::number(result))
}

/// Math.max
fn math_max(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let values = numbers(ctx, &args)?;
    let result = values.into_iter().fold(f64::NEG_INFINITY, |acc, x| {
        if acc.is_nan() || x.is_nan() {
            f64::NAN
        } else {
            acc.max(x)
        }
    });
    Ok(JsValue::number(result))
}

/// Math.pow
fn math_pow(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let base = to_js_number(ctx, &arg(&args, 0))?;
    let exponent = to_js_number(ctx, &arg(&args, 1))?;
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::number(base.powf(exponent)))
}

/// Math.atan2
fn math_atan2(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let y = to_js_number(ctx, &arg(&args, 0))?;
    let x = to_js_number(ctx, &arg(&args, 1))?;
    Ok(JsValue::number(y.atan2(x)))
}

/// Math.hypot
fn math_hypot(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let values = numbers(ctx, &args)?;
    if values.iter().any(|x| x.is_infinite()) {
        return Ok(JsValue::number(f64::INFINITY));
    }
    Ok(JsValue::number(values.iter().map(|x| x * x).sum::<f64>().sqrt()))
}

/// Math.random
fn math_random(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::number(rand::thread_rng().gen::<f64>()))
}

/// Math.clz32 - Count leading zeros in 32-bit integer.
fn math_clz32(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let x = to_js_number(ctx, &arg(&args, 0))?;
    Ok(JsValue::integer(to_uint32(&JsValue::number(x)).leading_zeros() as i64))
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
    fn rounding_follows_javascript() {
        assert_eq!(eval("Math.round(-2.5)"), JsValue::integer(-2));
        assert_eq!(eval("Math.round(2.5)"), JsValue::integer(3));
        assert_eq!(eval("Math.max()"), JsValue::number(f64::NEG_INFINITY));
        assert_eq!(eval("Math.max(1, '7', 3)"), JsValue::integer(7));
    }

    #[test]
    fn random_is_in_unit_interval() {
        let r = match eval("Math.random()") {
            JsValue::Number(n) => n.as_f64(),
            other => panic!("not a number: {:?}", other),
        };
        assert!((0.0..1.0).contains(&r));
    }
}
