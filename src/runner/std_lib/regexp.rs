//! RegExp built-in.
//!
//! Patterns compile to the `regex` crate; see `Realm::new_regexp` for the
//! accepted flags. Backreferences and lookaround are not supported.

use regex::{Captures, Regex};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, set_property, to_js_number, to_js_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the RegExp built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let regexp = BuiltInObject::new("RegExp")
        .with_constructor(regexp_constructor)
        .add_prototype_method("test", regexp_test)
        .add_prototype_method("exec", regexp_exec)
        .add_prototype_method("toString", regexp_to_string);

    registry.register_object(regexp);
}

/// The compiled pattern and its global flag, when `value` is a RegExp.
pub(crate) fn regexp_parts(value: &JsValue) -> Option<(Regex, bool)> {
    match value {
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::RegExp(r) => Some((r.regex.clone(), r.is_global())),
            _ => None,
        },
        _ => None,
    }
}

/// UTF-16 offset of a byte position, as script code sees indices.
pub(crate) fn utf16_offset(input: &str, byte_pos: usize) -> usize {
    input[..byte_pos].encode_utf16().count()
}

/// Byte position of a UTF-16 offset, clamped to the end of `input`.
pub(crate) fn byte_offset(input: &str, utf16_pos: usize) -> usize {
    let mut units = 0;
    for (i, c) in input.char_indices() {
        if units >= utf16_pos {
            return i;
        }
        units += c.len_utf16();
    }
    input.len()
}

/// The array `exec` and `match` produce: captures, then `index`, `input`
/// and `groups`.
pub(crate) fn match_array(ctx: &mut EvalContext, regex: &Regex, caps: &Captures, input: &str) -> JsValue {
    let items = caps
        .iter()
        .map(|m| match m {
            Some(m) => JsValue::String(m.as_str().to_string()),
            None => JsValue::Undefined,
        })
        .collect();
    let array = ctx.realm.new_array(items);
    let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
    let groups = if regex.capture_names().flatten().next().is_some() {
        let groups = ctx.realm.new_object();
        for name in regex.capture_names().flatten() {
            let value = caps
                .name(name)
                .map(|m| JsValue::String(m.as_str().to_string()))
                .unwrap_or(JsValue::Undefined);
            groups.borrow_mut().set_own(name, value);
        }
        JsValue::Object(groups)
    } else {
        JsValue::Undefined
    };
    if let JsValue::Object(o) = &array {
        let mut o = o.borrow_mut();
        o.set_own("index", JsValue::integer(utf16_offset(input, start) as i64));
        o.set_own("input", JsValue::String(input.to_string()));
        o.set_own("groups", groups);
    }
    array
}

fn this_regexp(this: &JsValue, method: &str) -> Result<(Regex, bool), JErrorType> {
    regexp_parts(this).ok_or_else(|| {
        JErrorType::TypeError(format!(
            "RegExp.prototype.{} called on incompatible receiver",
            method
        ))
    })
}

/// Runs one match honoring `lastIndex` for global patterns.
fn exec_at(ctx: &mut EvalContext, this: &JsValue, input: &str, method: &str) -> Result<Option<JsValue>, JErrorType> {
    let (regex, global) = this_regexp(this, method)?;
    let start = if global {
        let last_index = get_property(ctx, this, "lastIndex")?;
        let last_index = to_js_number(ctx, &last_index)?;
        if last_index.is_nan() || last_index < 0.0 {
            0
        } else {
            last_index as usize
        }
    } else {
        0
    };
    if start > input.encode_utf16().count() {
        set_property(ctx, this, "lastIndex", JsValue::integer(0))?;
        return Ok(None);
    }
    match regex.captures_at(input, byte_offset(input, start)) {
        Some(caps) => {
            if global {
                let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let end = utf16_offset(input, end);
                let next = if caps.get(0).map(|m| m.as_str().is_empty()).unwrap_or(false) {
                    end + 1
                } else {
                    end
                };
                set_property(ctx, this, "lastIndex", JsValue::integer(next as i64))?;
            }
            Ok(Some(match_array(ctx, &regex, &caps, input)))
        }
        None => {
            if global {
                set_property(ctx, this, "lastIndex", JsValue::integer(0))?;
            }
            Ok(None)
        }
    }
}

/// RegExp constructor: `RegExp(pattern, flags)`; a RegExp pattern keeps its
/// source and, without explicit flags, its flags.
fn regexp_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let pattern = arg(&args, 0);
    let (source, own_flags) = match &pattern {
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::RegExp(r) => (Some(r.source.clone()), Some(r.flags.clone())),
            _ => (None, None),
        },
        _ => (None, None),
    };
    let source = match (source, &pattern) {
        (Some(source), _) => source,
        (None, JsValue::Undefined) => "(?:)".to_string(),
        (None, other) => to_js_string(ctx, other)?,
    };
    let flags = match arg(&args, 1) {
        JsValue::Undefined => own_flags.unwrap_or_default(),
        other => to_js_string(ctx, &other)?,
    };
    ctx.realm.new_regexp(&source, &flags)
}

/// RegExp.prototype.test
fn regexp_test(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let input = to_js_string(ctx, &arg(&args, 0))?;
    Ok(JsValue::Boolean(exec_at(ctx, &this, &input, "test")?.is_some()))
}

/// RegExp.prototype.exec
fn regexp_exec(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let input = to_js_string(ctx, &arg(&args, 0))?;
    Ok(exec_at(ctx, &this, &input, "exec")?.unwrap_or(JsValue::Null))
}

/// RegExp.prototype.toString
fn regexp_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::RegExp(r) => Ok(JsValue::String(format!("/{}/{}", r.source, r.flags))),
            _ => Err(JErrorType::TypeError(
                "RegExp.prototype.toString called on incompatible receiver".to_string(),
            )),
        },
        _ => Err(JErrorType::TypeError(
            "RegExp.prototype.toString called on incompatible receiver".to_string(),
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
    fn exec_reports_index_and_captures() {
        assert_eq!(eval_inspect("/(\\d+)-(\\d+)/.exec('a 12-34')[2]"), "'34'");
        assert_eq!(eval_inspect("/(\\d+)/.exec('ab 7').index"), "3");
        assert_eq!(eval_inspect("/x/.exec('abc')"), "null");
    }

    #[test]
    fn global_patterns_advance_last_index() {
        assert_eq!(
            eval_inspect("((r) => [r.test('a1b2'), r.lastIndex, r.test('a1b2'), r.test('a1b2')])(/\\d/g)"),
            "[ true, 2, true, false ]"
        );
    }

    #[test]
    fn constructor_accepts_strings_and_regexps() {
        assert_eq!(eval_inspect("new RegExp('a+', 'i').test('AAA')"), "true");
        assert_eq!(eval_inspect("String(RegExp(/x/g))"), "'/x/g'");
        assert!(eval_expression("new RegExp('(')", &mut EvalContext::new()).is_err());
    }
}
