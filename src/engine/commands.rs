//! The pipeline commands behind the `atjs` subcommands.
//!
//! Each command takes the sandbox to evaluate in and the text read from
//! stdin, and returns the text to print.

use std::rc::Rc;

use crate::engine::error::EngineError;
use crate::engine::sandbox::Sandbox;
use crate::engine::targeting::apply_at_path;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectData};
use crate::runner::ds::operations::inspect::inspect;
use crate::runner::ds::operations::object::to_js_string;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, is_callable};
use crate::runner::plugin::types::EvalContext;
use crate::runner::std_lib::json::{parse_json, stringify};

pub const DEFAULT_DELIMITER: &str = "\n";

/// Input as JSON when it parses, otherwise the raw text.
pub fn parse_input(realm: &Realm, text: &str) -> JsValue {
    parse_json(realm, text).unwrap_or_else(|_| JsValue::String(text.to_string()))
}

/// Input that must be a JSON array. Returns the array and its items.
pub fn parse_array(realm: &Realm, text: &str) -> Result<(JsValue, Vec<JsValue>), EngineError> {
    let value = parse_json(realm, text)
        .map_err(|_| EngineError::Input(format!("Failed to parse input as JSON:\n{}", text)))?;
    let items = match &value {
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Array(items) => Some(items.clone()),
            _ => None,
        },
        _ => None,
    };
    match items {
        Some(items) => Ok((value, items)),
        None => Err(EngineError::Input(format!("Input wasn't a JSON array:\n{}", text))),
    }
}

/// A command-line argument as a value: an expression if it evaluates,
/// else JSON, else the string itself.
pub fn parse_arg(sandbox: &mut Sandbox, arg: &str) -> JsValue {
    if let Ok(value) = sandbox.run_expression(arg) {
        return value;
    }
    parse_input(&sandbox.context().realm.clone(), arg)
}

/// Whether `value` is made only of plain objects, arrays and primitives.
pub fn is_representable_as_json(value: &JsValue) -> bool {
    fn check(value: &JsValue, stack: &mut Vec<JsObjectType>) -> bool {
        let obj = match value {
            JsValue::Object(o) => o,
            _ => return true,
        };
        if stack.iter().any(|seen| Rc::ptr_eq(seen, obj)) {
            return false;
        }
        let children: Vec<JsValue> = {
            let o = obj.borrow();
            match &o.data {
                ObjectData::Array(items) => items.clone(),
                ObjectData::Ordinary => o
                    .own_keys()
                    .iter()
                    .filter_map(|k| o.get_own(k))
                    .collect(),
                _ => return false,
            }
        };
        stack.push(obj.clone());
        let ok = children.iter().all(|child| check(child, stack));
        stack.pop();
        ok
    }
    check(value, &mut vec![])
}

/// Strings print raw, JSON-like values as indented JSON, anything else in
/// inspect form.
pub fn format_output(ctx: &mut EvalContext, value: &JsValue) -> Result<String, JErrorType> {
    if let JsValue::String(s) = value {
        return Ok(s.clone());
    }
    if is_representable_as_json(value) {
        let json = stringify(ctx, value, &JsValue::Undefined, &JsValue::integer(2))?;
        return Ok(json.unwrap_or_else(|| "undefined".to_string()));
    }
    Ok(inspect(value))
}

/// `run EXPR [--target PATH]`.
pub fn run(
    sandbox: &mut Sandbox,
    expression: &str,
    input: Option<&str>,
    target: Option<&str>,
) -> Result<String, EngineError> {
    let value = sandbox.run_expression(expression)?;
    let realm = sandbox.context().realm.clone();
    let input = match input {
        Some(text) => parse_input(&realm, text),
        None if target.is_some() => {
            return Err(EngineError::Input(
                "--target needs input to apply the function to".to_string(),
            ))
        }
        None => return Ok(format_output(sandbox.context(), &value)?),
    };

    let result = match target {
        Some(target) => {
            let mut transform =
                |ctx: &mut EvalContext, item: JsValue| call_function(ctx, &value, JsValue::Undefined, vec![item]);
            apply_at_path(sandbox.context(), input, target, &mut transform)?
        }
        None if is_callable(&value) => sandbox.call(&value, vec![input])?,
        None => value,
    };
    Ok(format_output(sandbox.context(), &result)?)
}

/// `map EXPR`: `fn(item, index, array)` over a JSON array.
pub fn map(sandbox: &mut Sandbox, expression: &str, input: &str) -> Result<String, EngineError> {
    let function = sandbox.run_expression(expression)?;
    let realm = sandbox.context().realm.clone();
    let (array, items) = parse_array(&realm, input)?;
    let mut mapped = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        mapped.push(sandbox.call(&function, vec![item, JsValue::integer(index as i64), array.clone()])?);
    }
    let result = realm.new_array(mapped);
    Ok(format_output(sandbox.context(), &result)?)
}

/// `for-each EXPR`: calls the function for its side effects.
pub fn for_each(sandbox: &mut Sandbox, expression: &str, input: &str) -> Result<(), EngineError> {
    let function = sandbox.run_expression(expression)?;
    let realm = sandbox.context().realm.clone();
    let (array, items) = parse_array(&realm, input)?;
    for (index, item) in items.into_iter().enumerate() {
        sandbox.call(&function, vec![item, JsValue::integer(index as i64), array.clone()])?;
    }
    Ok(())
}

/// A delimiter argument as text: `'"\t"'` is a tab, `,` stays a comma.
pub fn parse_delimiter(sandbox: &mut Sandbox, delimiter: Option<&str>) -> Result<String, EngineError> {
    match delimiter {
        Some(arg) => {
            let value = parse_arg(sandbox, arg);
            Ok(to_js_string(sandbox.context(), &value)?)
        }
        None => Ok(DEFAULT_DELIMITER.to_string()),
    }
}

/// `join [DELIMITER]`, with `Array.prototype.join` conversions.
pub fn join(sandbox: &mut Sandbox, input: &str, delimiter: Option<&str>) -> Result<String, EngineError> {
    let delimiter = parse_delimiter(sandbox, delimiter)?;
    let realm = sandbox.context().realm.clone();
    let (_, items) = parse_array(&realm, input)?;
    let mut parts = Vec::with_capacity(items.len());
    for item in &items {
        parts.push(if item.is_nullish() {
            String::new()
        } else {
            to_js_string(sandbox.context(), item)?
        });
    }
    Ok(parts.join(&delimiter))
}

/// `split [DELIMITER]`: a single trailing empty piece is dropped.
pub fn split(sandbox: &mut Sandbox, input: &str, delimiter: Option<&str>) -> Result<String, EngineError> {
    let delimiter = parse_delimiter(sandbox, delimiter)?;
    let mut pieces: Vec<&str> = if delimiter.is_empty() {
        let mut chars: Vec<&str> = input.split("").collect();
        chars.retain(|c| !c.is_empty());
        chars
    } else {
        input.split(delimiter.as_str()).collect()
    };
    if pieces.len() > 1 && pieces.last() == Some(&"") {
        pieces.pop();
    }
    let realm = sandbox.context().realm.clone();
    let array = realm.new_array(pieces.into_iter().map(JsValue::string).collect());
    Ok(format_output(sandbox.context(), &array)?)
}

/// `log EXPR`: evaluates without reading input.
pub fn log(sandbox: &mut Sandbox, expression: &str) -> Result<String, EngineError> {
    let value = sandbox.run_expression(expression)?;
    Ok(format_output(sandbox.context(), &value)?)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::module_loader::{ModuleError, ModuleLoader};

    struct NoModules;

    impl ModuleLoader for NoModules {
        fn load(&self, specifier: &str, _ctx: &mut EvalContext) -> Result<JsValue, ModuleError> {
            Err(ModuleError::NotFound {
                specifier: specifier.to_string(),
                from: "/".into(),
            })
        }
    }

    fn sandbox() -> Sandbox {
        Sandbox::with_loader(&EngineConfig::new("/tmp").with_color(false), Rc::new(NoModules))
    }

    #[test]
    fn output_formats() {
        let mut sb = sandbox();
        assert_eq!(log(&mut sb, "'plain'").unwrap(), "plain");
        assert_eq!(log(&mut sb, "({a: [1, null]})").unwrap(), "{\n  \"a\": [\n    1,\n    null\n  ]\n}");
        assert_eq!(log(&mut sb, "undefined").unwrap(), "undefined");
        assert_eq!(log(&mut sb, "function named() {}").unwrap(), "[Function: named]");
    }

    #[test]
    fn run_calls_functions_with_the_input() {
        let mut sb = sandbox();
        assert_eq!(run(&mut sb, ".toUpperCase()", Some("abc"), None).unwrap(), "ABC");
        assert_eq!(run(&mut sb, "$it.a + 1", Some(r#"{"a": 1}"#), None).unwrap(), "2");
        assert_eq!(run(&mut sb, "40 + 2", Some("ignored"), None).unwrap(), "42");
    }

    #[test]
    fn run_with_a_target_prints_the_whole_input() {
        let mut sb = sandbox();
        let out = run(&mut sb, "n => n * 10", Some(r#"{"a": {"b": 1}, "c": 2}"#), Some(".a.b")).unwrap();
        assert_eq!(out, "{\n  \"a\": {\n    \"b\": 10\n  },\n  \"c\": 2\n}");
        let err = run(&mut sb, "n => n", Some("{}"), Some("nope")).unwrap_err();
        assert_eq!(err.to_string(), "Your target string didn't match anything: \"nope\"");
    }

    #[test]
    fn map_and_join() {
        let mut sb = sandbox();
        assert_eq!(map(&mut sb, "(x, i) => x + i", "[10, 20]").unwrap(), "[\n  10,\n  21\n]");
        assert_eq!(join(&mut sb, r#"["a", null, 3]"#, Some(",")).unwrap(), "a,,3");
        let err = map(&mut sb, "x => x", r#"{"a": 1}"#).unwrap_err();
        assert_eq!(err.to_string(), "Input wasn't a JSON array:\n{\"a\": 1}");
    }

    #[test]
    fn split_drops_one_trailing_empty_piece() {
        let mut sb = sandbox();
        assert_eq!(split(&mut sb, "a\nb\n", None).unwrap(), "[\n  \"a\",\n  \"b\"\n]");
        assert_eq!(split(&mut sb, "a,,", Some(",")).unwrap(), "[\n  \"a\",\n  \"\"\n]");
    }

    #[test]
    fn args_fall_back_to_json_then_text() {
        let mut sb = sandbox();
        assert_eq!(parse_arg(&mut sb, "1 + 1"), JsValue::integer(2));
        assert_eq!(parse_arg(&mut sb, "hello world"), JsValue::string("hello world"));
    }

    #[test]
    fn representable_values() {
        let mut sb = sandbox();
        let plain = sb.run_expression("({a: [1, 'x', {b: null}]})").unwrap();
        assert!(is_representable_as_json(&plain));
        let with_function = sb.run_expression("({f: () => 1})").unwrap();
        assert!(!is_representable_as_json(&with_function));
        let cyclic = sb.run_expression("((o) => { o.o = o; return o })({})").unwrap();
        assert!(!is_representable_as_json(&cyclic));
    }
}
