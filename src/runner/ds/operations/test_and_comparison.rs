use crate::runner::ds::object::{JsObjectType, ObjectData};
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::JsValue;

/// `===`
pub fn strict_equals(x: &JsValue, y: &JsValue) -> bool {
    x.strict_equals(y)
}

/// `==`, including the primitive coercions between numbers, strings and
/// booleans, and unboxing of wrapper objects.
pub fn loose_equals(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(x) == to_number(y)
        }
        (JsValue::Boolean(_), _) => loose_equals(&JsValue::number(to_number(x)), y),
        (_, JsValue::Boolean(_)) => loose_equals(x, &JsValue::number(to_number(y))),
        (JsValue::Object(_), JsValue::Object(_)) => x.strict_equals(y),
        (JsValue::Object(o), _) => match unboxed(o) {
            Some(p) => loose_equals(&p, y),
            None => loose_equals(&JsValue::String(to_string(x)), y),
        },
        (_, JsValue::Object(_)) => loose_equals(y, x),
        _ => x.strict_equals(y),
    }
}

fn unboxed(o: &JsObjectType) -> Option<JsValue> {
    match &o.borrow().data {
        ObjectData::Primitive(p) => Some(p.clone()),
        _ => None,
    }
}

/// SameValueZero, used by `includes`: like `===` except `NaN` equals `NaN`.
pub fn same_value_zero(x: &JsValue, y: &JsValue) -> bool {
    match (x, y) {
        (JsValue::Number(a), JsValue::Number(b)) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            (a.is_nan() && b.is_nan()) || a == b
        }
        _ => x.strict_equals(y),
    }
}

/// Abstract relational comparison on already-primitive operands.
/// `None` means the comparison is undefined (a `NaN` was involved), which
/// every relational operator treats as `false`.
pub fn less_than(x: &JsValue, y: &JsValue) -> Option<bool> {
    if let (JsValue::String(a), JsValue::String(b)) = (x, y) {
        let a: Vec<u16> = a.encode_utf16().collect();
        let b: Vec<u16> = b.encode_utf16().collect();
        return Some(a < b);
    }
    let (a, b) = (to_number(x), to_number(y));
    if a.is_nan() || b.is_nan() {
        None
    } else {
        Some(a < b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_equality_coerces_primitives() {
        assert!(loose_equals(&JsValue::integer(1), &JsValue::string("1")));
        assert!(loose_equals(&JsValue::Boolean(true), &JsValue::integer(1)));
        assert!(loose_equals(&JsValue::Null, &JsValue::Undefined));
        assert!(!loose_equals(&JsValue::Null, &JsValue::integer(0)));
    }

    #[test]
    fn nan_handling() {
        let nan = JsValue::number(f64::NAN);
        assert!(!strict_equals(&nan, &nan));
        assert!(same_value_zero(&nan, &nan));
        assert_eq!(less_than(&nan, &JsValue::integer(1)), None);
    }

    #[test]
    fn strings_compare_lexically() {
        assert_eq!(less_than(&JsValue::string("a"), &JsValue::string("b")), Some(true));
        assert_eq!(less_than(&JsValue::string("10"), &JsValue::string("9")), Some(true));
        assert_eq!(less_than(&JsValue::string("10"), &JsValue::integer(9)), Some(false));
    }
}
