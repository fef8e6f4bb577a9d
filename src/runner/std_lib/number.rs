//! Number built-in.
//!
//! Provides Number constructor and methods. `parseInt` and `parseFloat` are
//! shared with the global functions of the same name.

use regex::Regex;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{to_js_number, to_js_string};
use crate::runner::ds::operations::type_conversion::number_to_string;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

lazy_static! {
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^[+-]?(Infinity|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)").unwrap();
}

/// Register the Number built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        .add_property("MAX_VALUE", JsValue::Number(JsNumberType::Float(f64::MAX)))
        .add_property("MIN_VALUE", JsValue::Number(JsNumberType::Float(5e-324)))
        .add_property("POSITIVE_INFINITY", JsValue::Number(JsNumberType::PositiveInfinity))
        .add_property("NEGATIVE_INFINITY", JsValue::Number(JsNumberType::NegativeInfinity))
        .add_property("NaN", JsValue::Number(JsNumberType::NaN))
        .add_property("MAX_SAFE_INTEGER", JsValue::integer(9007199254740991))
        .add_property("MIN_SAFE_INTEGER", JsValue::integer(-9007199254740991))
        .add_property("EPSILON", JsValue::Number(JsNumberType::Float(f64::EPSILON)))
        .add_method("isNaN", number_is_nan)
        .add_method("isFinite", number_is_finite)
        .add_method("isInteger", number_is_integer)
        .add_method("isSafeInteger", number_is_safe_integer)
        .add_method("parseFloat", parse_float)
        .add_method("parseInt", parse_int)
        .add_prototype_method("toString", number_to_string_method)
        .add_prototype_method("toFixed", number_to_fixed)
        .add_prototype_method("toPrecision", number_to_precision)
        .add_prototype_method("valueOf", number_value_of);

    registry.register_object(number);
}

/// Number constructor: a primitive when called, a wrapper under `new`.
fn number_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = match args.first() {
        Some(value) => to_js_number(ctx, value)?,
        None => 0.0,
    };
    if ctx.new_target.is_some() {
        Ok(ctx.realm.new_boxed_primitive(JsValue::number(n)))
    } else {
        Ok(JsValue::number(n))
    }
}

/// The number argument without coercion; `None` for non-numbers.
fn number_arg(args: &[JsValue]) -> Option<f64> {
    match args.first() {
        Some(JsValue::Number(n)) => Some(n.as_f64()),
        _ => None,
    }
}

/// Number.isNaN
fn number_is_nan(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(number_arg(&args).map(f64::is_nan).unwrap_or(false)))
}

/// Number.isFinite
fn number_is_finite(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(number_arg(&args).map(f64::is_finite).unwrap_or(false)))
}

/// Number.isInteger
fn number_is_integer(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        number_arg(&args)
            .map(|n| n.is_finite() && n.trunc() == n)
            .unwrap_or(false),
    ))
}

/// Number.isSafeInteger
fn number_is_safe_integer(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(
        number_arg(&args)
            .map(|n| n.is_finite() && n.trunc() == n && n.abs() <= MAX_SAFE_INTEGER)
            .unwrap_or(false),
    ))
}

/// `parseFloat`: the longest numeric prefix after leading whitespace.
pub(crate) fn parse_float(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let input = to_js_string(ctx, &arg(&args, 0))?;
    let trimmed = input.trim_start();
    let n = match FLOAT_PREFIX.find(trimmed) {
        Some(m) => {
            let text = m.as_str();
            if text.ends_with("Infinity") {
                if text.starts_with('-') {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            } else {
                text.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        None => f64::NAN,
    };
    Ok(JsValue::number(n))
}

/// `parseInt(string, radix)`: digits are read until the first one invalid
/// in the radix; no digits at all is NaN.
pub(crate) fn parse_int(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let input = to_js_string(ctx, &arg(&args, 0))?;
    let mut s = input.trim_start();
    let mut sign = 1.0;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1.0;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let mut radix = match arg(&args, 1) {
        JsValue::Undefined => 0,
        value => to_js_number(ctx, &value)? as i32 as u32,
    };
    if radix != 0 && !(2..=36).contains(&radix) {
        return Ok(JsValue::number(f64::NAN));
    }
    if (radix == 0 || radix == 16) && (s.starts_with("0x") || s.starts_with("0X")) {
        s = &s[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(JsValue::number(f64::NAN));
    }
    let value = digits
        .into_iter()
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    Ok(JsValue::number(sign * value))
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JErrorType> {
    match this {
        JsValue::Number(n) => Ok(n.as_f64()),
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Primitive(JsValue::Number(n)) => Ok(n.as_f64()),
            _ => Err(JErrorType::TypeError(format!(
                "Number.prototype.{} requires that 'this' be a Number",
                method
            ))),
        },
        _ => Err(JErrorType::TypeError(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

/// Digits of `n` in `radix`, with up to 20 fractional digits.
fn to_radix_string(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n.is_nan() || n.is_infinite() || radix == 10 {
        return number_to_string(n);
    }
    let negative = n < 0.0;
    let abs = n.abs();
    let mut int_part = abs.trunc();
    let mut frac = abs - int_part;
    let mut int_digits = vec![];
    if int_part == 0.0 {
        int_digits.push(b'0');
    }
    while int_part >= 1.0 {
        let d = (int_part % radix as f64) as usize;
        int_digits.push(DIGITS[d]);
        int_part = (int_part / radix as f64).trunc();
    }
    int_digits.reverse();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&String::from_utf8_lossy(&int_digits));
    if frac > 0.0 {
        out.push('.');
        for _ in 0..20 {
            frac *= radix as f64;
            let d = frac.trunc() as usize;
            out.push(DIGITS[d] as char);
            frac -= d as f64;
            if frac == 0.0 {
                break;
            }
        }
    }
    out
}

/// Number.prototype.toString
fn number_to_string_method(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        value => to_js_number(ctx, &value)?.trunc(),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    Ok(JsValue::String(to_radix_string(n, radix as u32)))
}

/// Number.prototype.toFixed
fn number_to_fixed(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toFixed")?;
    let digits = match arg(&args, 0) {
        JsValue::Undefined => 0.0,
        value => to_js_number(ctx, &value)?.trunc(),
    };
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(JsValue::String(number_to_string(n)));
    }
    let formatted = format!("{:.*}", digits as usize, n);
    // -0.00 prints without its sign.
    let formatted = match formatted.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => formatted,
    };
    Ok(JsValue::String(formatted))
}

/// Number.prototype.toPrecision
fn number_to_precision(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toPrecision")?;
    let precision = match arg(&args, 0) {
        JsValue::Undefined => return Ok(JsValue::String(number_to_string(n))),
        value => to_js_number(ctx, &value)?.trunc(),
    };
    if !(1.0..=100.0).contains(&precision) {
        return Err(JErrorType::RangeError(
            "toPrecision() argument must be between 1 and 100".to_string(),
        ));
    }
    if !n.is_finite() {
        return Ok(JsValue::String(number_to_string(n)));
    }
    let p = precision as usize;
    let scientific = format!("{:.*e}", p - 1, n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return Ok(JsValue::String(scientific)),
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let text = if exponent < -6 || exponent >= p as i32 {
        let sign = if exponent < 0 { "-" } else { "+" };
        format!("{}e{}{}", mantissa, sign, exponent.abs())
    } else {
        format!("{:.*}", (p as i32 - 1 - exponent).max(0) as usize, n)
    };
    Ok(JsValue::String(text))
}

/// Number.prototype.valueOf
fn number_value_of(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::number(this_number(&this, "valueOf")?))
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
    fn parse_functions_read_prefixes() {
        assert_eq!(eval_inspect("Number.parseInt('42px')"), "42");
        assert_eq!(eval_inspect("Number.parseInt('ff', 16)"), "255");
        assert_eq!(eval_inspect("Number.parseInt('0x1A')"), "26");
        assert_eq!(eval_inspect("Number.parseInt('px')"), "NaN");
        assert_eq!(eval_inspect("Number.parseFloat(' 3.5e2abc')"), "350");
    }

    #[test]
    fn predicates_do_not_coerce() {
        assert_eq!(eval_inspect("Number.isNaN('abc')"), "false");
        assert_eq!(eval_inspect("Number.isInteger(5.0)"), "true");
        assert_eq!(eval_inspect("Number.isSafeInteger(2 ** 53)"), "false");
    }

    #[test]
    fn formatting_methods() {
        assert_eq!(eval_inspect("(3.14159).toFixed(2)"), "'3.14'");
        assert_eq!(eval_inspect("(255).toString(16)"), "'ff'");
        assert_eq!(eval_inspect("(0.5).toString(2)"), "'0.1'");
        assert_eq!(eval_inspect("(123.456).toPrecision(4)"), "'123.5'");
        assert_eq!(eval_inspect("Number('12')"), "12");
    }

    #[test]
    fn bad_radix_is_a_range_error() {
        let err = eval_expression("(1).toString(1)", &mut EvalContext::new()).unwrap_err();
        assert_eq!(err.to_string(), "RangeError: toString() radix must be between 2 and 36");
    }
}
