use std::rc::Rc;

use crate::runner::ds::object::{JsObjectType, ObjectData};
use crate::runner::ds::value::JsValue;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

pub fn type_of(value: &JsValue) -> &'static str {
    match value {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

pub fn to_boolean(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Number(n) => {
            let f = n.as_f64();
            !(f == 0.0 || f.is_nan())
        }
        JsValue::Object(_) => true,
    }
}

pub fn to_number(value: &JsValue) -> f64 {
    match value {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => n.as_f64(),
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(o) => {
            let primitive = match &o.borrow().data {
                ObjectData::Primitive(p) => Some(p.clone()),
                _ => None,
            };
            match primitive {
                Some(p) => to_number(&p),
                None => string_to_number(&to_string(value)),
            }
        }
    }
}

/// `Number("...")` semantics: whitespace-trimmed, empty is zero, radix
/// prefixes allowed, anything else unparsable is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = |digits: &str, radix: u32| {
        if digits.is_empty() {
            return f64::NAN;
        }
        digits.chars().try_fold(0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN)
    };
    match trimmed.get(..2) {
        Some("0x") | Some("0X") => return radix(&trimmed[2..], 16),
        Some("0o") | Some("0O") => return radix(&trimmed[2..], 8),
        Some("0b") | Some("0B") => return radix(&trimmed[2..], 2),
        _ => {}
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        trimmed.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// JavaScript `Number.prototype.toString()` formatting for base 10.
pub fn number_to_string(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let abs = f.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{:e}", f);
        // Rust writes `1e21`/`1.5e-7`; JavaScript wants an explicit `+`.
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else if f.fract() == 0.0 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

pub fn to_int32(value: &JsValue) -> i32 {
    to_uint32(value) as i32
}

pub fn to_uint32(value: &JsValue) -> u32 {
    let f = to_number(value);
    if !f.is_finite() {
        return 0;
    }
    let truncated = f.trunc();
    truncated.rem_euclid(4294967296.0) as u32
}

/// ToIntegerOrInfinity, with NaN mapped to zero.
pub fn to_integer(value: &JsValue) -> f64 {
    let f = to_number(value);
    if f.is_nan() {
        0.0
    } else {
        f.trunc()
    }
}

pub fn to_property_key(value: &JsValue) -> String {
    to_string(value)
}

/// Structural `ToString`. Arrays join their elements, errors render as
/// `Name: message`, other objects as `[object Object]`.
pub fn to_string(value: &JsValue) -> String {
    let mut seen = vec![];
    to_string_guarded(value, &mut seen)
}

/// Same as [`to_string`]; used by `Display`.
pub fn to_display_string(value: &JsValue) -> String {
    to_string(value)
}

fn to_string_guarded(value: &JsValue, seen: &mut Vec<*const ()>) -> String {
    match value {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.clone(),
        JsValue::Number(n) => number_to_string(n.as_f64()),
        JsValue::Object(o) => {
            let id = Rc::as_ptr(o) as *const ();
            if seen.contains(&id) {
                return String::new();
            }
            seen.push(id);
            let result = object_to_string(o, seen);
            seen.pop();
            result
        }
    }
}

fn object_to_string(obj: &JsObjectType, seen: &mut Vec<*const ()>) -> String {
    let obj_ref = obj.borrow();
    match &obj_ref.data {
        ObjectData::Array(items) => items
            .iter()
            .map(|item| {
                if item.is_nullish() {
                    String::new()
                } else {
                    to_string_guarded(item, seen)
                }
            })
            .collect::<Vec<_>>()
            .join(","),
        ObjectData::Primitive(p) => to_string_guarded(p, seen),
        ObjectData::Function(f) => format!("function {}() {{ [native code] }}", f.name),
        ObjectData::RegExp(r) => format!("/{}/{}", r.source, r.flags),
        ObjectData::Error => error_summary(obj),
        ObjectData::Ordinary | ObjectData::GlobalProxy => "[object Object]".to_string(),
    }
}

/// Reads a property through the prototype chain without running any
/// script code.
pub fn lookup_in_chain(obj: &JsObjectType, key: &str) -> Option<JsValue> {
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if let Some(v) = o_ref.get_own(key) {
            return Some(v);
        }
        current = o_ref.prototype.clone();
    }
    None
}

/// `Error.prototype.toString` behavior.
pub fn error_summary(obj: &JsObjectType) -> String {
    let name = match lookup_in_chain(obj, "name") {
        Some(JsValue::Undefined) | None => "Error".to_string(),
        Some(v) => to_string(&v),
    };
    let message = match lookup_in_chain(obj, "message") {
        Some(JsValue::Undefined) | None => String::new(),
        Some(v) => to_string(&v),
    };
    if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }
}

/// Text for an uncaught thrown value: errors summarize, anything else
/// is prefixed the way an uncaught non-error would be reported.
pub fn describe_thrown(value: &JsValue) -> String {
    match value {
        JsValue::Object(o) if matches!(o.borrow().data, ObjectData::Error) => error_summary(o),
        other => format!("Uncaught {}", to_string(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_javascript() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e-7), "1.5e-7");
        assert_eq!(number_to_string(-0.0), "0");
    }

    #[test]
    fn parses_numeric_strings() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert!(string_to_number("12px").is_nan());
    }

    #[test]
    fn wraps_to_int32() {
        assert_eq!(to_int32(&JsValue::number(4294967297.0)), 1);
        assert_eq!(to_int32(&JsValue::number(-1.0)), -1);
    }
}
