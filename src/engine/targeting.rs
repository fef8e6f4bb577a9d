//! Applying a function at the locations a path selects.
//!
//! A target path is written the way property access is: `users[0].name`,
//! `.users.*.tags` or `["odd.key"].x`. A `*` segment fans out over every own
//! key of the value it is applied to. Each selected location is replaced in
//! place by the transform's result and the root itself is returned.
//!
//! ```
//! use atjs::engine::targeting::{parse_target, PathSegment};
//!
//! assert_eq!(
//!     parse_target(".users[0].*"),
//!     vec![
//!         PathSegment::Key("users".to_string()),
//!         PathSegment::Index(0),
//!         PathSegment::Wildcard,
//!     ]
//! );
//! ```

use std::fmt;

use thiserror::Error;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::array_index;
use crate::runner::ds::operations::object::{get_property, own_entries, set_property};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
    Wildcard,
}

impl PathSegment {
    fn from_name(name: String) -> Self {
        if name == "*" {
            PathSegment::Wildcard
        } else {
            PathSegment::Key(name)
        }
    }

    /// Property key for a concrete segment.
    pub fn key(&self) -> Option<String> {
        match self {
            PathSegment::Key(k) => Some(k.clone()),
            PathSegment::Index(i) => Some(i.to_string()),
            PathSegment::Wildcard => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Wildcard => write!(f, "*"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Your target string didn't match anything: {}", serde_json::Value::String(.target.clone()))]
    MatchedNothing {
        target: String,
        parsed_path: Vec<PathSegment>,
    },
    #[error(transparent)]
    Transform(#[from] JErrorType),
}

/// Splits a target string into segments. A leading `.` is ignored.
pub fn parse_target(target: &str) -> Vec<PathSegment> {
    let target = target.strip_prefix('.').unwrap_or(target);
    let chars: Vec<char> = target.chars().collect();
    let mut segments = vec![];
    let mut current = String::new();
    // Set when the previous segment ended at `]`, so a following `.` does
    // not produce an empty key.
    let mut after_bracket = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' => {
                if !after_bracket {
                    segments.push(PathSegment::from_name(std::mem::take(&mut current)));
                }
                after_bracket = false;
                i += 1;
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::from_name(std::mem::take(&mut current)));
                }
                let (segment, next) = parse_bracket(&chars, i + 1);
                segments.push(segment);
                after_bracket = true;
                i = next;
            }
            c => {
                after_bracket = false;
                current.push(c);
                i += 1;
            }
        }
    }
    if !current.is_empty() || (!after_bracket && target.ends_with('.')) {
        segments.push(PathSegment::from_name(current));
    }
    segments
}

/// Parses the inside of `[...]` starting at `start`; returns the segment and
/// the index just past the closing bracket.
fn parse_bracket(chars: &[char], start: usize) -> (PathSegment, usize) {
    if let Some(&quote) = chars.get(start).filter(|c| **c == '"' || **c == '\'') {
        let mut key = String::new();
        let mut i = start + 1;
        while i < chars.len() && chars[i] != quote {
            if chars[i] == '\\' && i + 1 < chars.len() {
                i += 1;
            }
            key.push(chars[i]);
            i += 1;
        }
        // Skip the closing quote and bracket.
        while i < chars.len() && chars[i] != ']' {
            i += 1;
        }
        return (PathSegment::Key(key), i + 1);
    }
    let mut inner = String::new();
    let mut i = start;
    while i < chars.len() && chars[i] != ']' {
        inner.push(chars[i]);
        i += 1;
    }
    let segment = match array_index(&inner) {
        Some(index) => PathSegment::Index(index),
        None => PathSegment::from_name(inner),
    };
    (segment, i + 1)
}

type Transform<'a> = dyn FnMut(&mut EvalContext, JsValue) -> Result<JsValue, JErrorType> + 'a;

/// Replaces every location `target` selects in `root` with
/// `transform(value)` and returns `root`. Fails when nothing was selected;
/// locations replaced before a failing transform stay replaced.
pub fn apply_at_path(
    ctx: &mut EvalContext,
    root: JsValue,
    target: &str,
    transform: &mut Transform<'_>,
) -> Result<JsValue, TargetError> {
    let path = parse_target(target);
    let mut matches = 0usize;
    let result = apply(ctx, root, &path, transform, &mut matches)?;
    if matches == 0 {
        return Err(TargetError::MatchedNothing {
            target: target.to_string(),
            parsed_path: path,
        });
    }
    Ok(result)
}

fn ensure_object_coercible(value: &JsValue) -> Result<(), JErrorType> {
    if value.is_nullish() {
        Err(JErrorType::TypeError(
            "Cannot convert undefined or null to object".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn owns(value: &JsValue, key: &str) -> bool {
    match value {
        JsValue::Object(o) => o.borrow().has_own(key),
        JsValue::String(s) => key == "length" || array_index(key).map_or(false, |i| i < s.chars().count()),
        _ => false,
    }
}

fn apply(
    ctx: &mut EvalContext,
    value: JsValue,
    path: &[PathSegment],
    transform: &mut Transform<'_>,
    matches: &mut usize,
) -> Result<JsValue, JErrorType> {
    let (segment, rest) = match path.split_first() {
        None => {
            *matches += 1;
            return transform(ctx, value);
        }
        Some(split) => split,
    };
    ensure_object_coercible(&value)?;
    let keys = match segment.key() {
        Some(key) if owns(&value, &key) => vec![key],
        Some(_) => vec![],
        None => own_entries(&value).into_iter().map(|(key, _)| key).collect(),
    };
    for key in keys {
        let child = get_property(ctx, &value, &key)?;
        let replaced = apply(ctx, child, rest, transform, matches)?;
        set_property(ctx, &value, &key, replaced)?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::api::eval_expression;
    use crate::runner::ds::operations::inspect::inspect;
    use crate::runner::ds::operations::type_conversion::to_number;
    use crate::runner::eval::function::call_function;
    use crate::runner::std_lib::json::stringify;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn parses_dots_brackets_and_wildcards() {
        assert_eq!(parse_target("a.b"), vec![key("a"), key("b")]);
        assert_eq!(parse_target(".a"), vec![key("a")]);
        assert_eq!(parse_target("a[0].b"), vec![key("a"), PathSegment::Index(0), key("b")]);
        assert_eq!(parse_target("*.tags.*"), vec![PathSegment::Wildcard, key("tags"), PathSegment::Wildcard]);
        assert_eq!(parse_target("a[*]"), vec![key("a"), PathSegment::Wildcard]);
        assert_eq!(parse_target("[\"x.y\"].z"), vec![key("x.y"), key("z")]);
        assert_eq!(parse_target("['it\\'s']"), vec![key("it's")]);
        assert_eq!(parse_target("[0][1]"), vec![PathSegment::Index(0), PathSegment::Index(1)]);
    }

    #[test]
    fn only_canonical_numbers_are_indices() {
        assert_eq!(parse_target("[01]"), vec![key("01")]);
        assert_eq!(parse_target("[+1]"), vec![key("+1")]);
        assert_eq!(parse_target("[ 1]"), vec![key(" 1")]);
        assert_eq!(parse_target("[10]"), vec![PathSegment::Index(10)]);
    }

    #[test]
    fn padded_indices_select_nothing() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("(['a', 'b'])", &mut ctx).unwrap();
        assert!(matches!(
            apply_at_path(&mut ctx, root.clone(), "[01]", &mut upper),
            Err(TargetError::MatchedNothing { .. })
        ));
        let result = apply_at_path(&mut ctx, root, "[1]", &mut upper).unwrap();
        assert_eq!(json(&mut ctx, &result), r#"["a","B"]"#);
        let text = JsValue::string("ab");
        assert!(matches!(
            apply_at_path(&mut ctx, text, "01", &mut upper),
            Err(TargetError::MatchedNothing { .. })
        ));
    }

    #[test]
    fn empty_segments_are_keys() {
        assert_eq!(parse_target("a..b"), vec![key("a"), key(""), key("b")]);
        assert_eq!(parse_target("a."), vec![key("a"), key("")]);
        assert_eq!(parse_target("."), vec![]);
    }

    fn json(ctx: &mut EvalContext, value: &JsValue) -> String {
        stringify(ctx, value, &JsValue::Undefined, &JsValue::Undefined)
            .unwrap()
            .unwrap()
    }

    fn upper(ctx: &mut EvalContext, value: JsValue) -> Result<JsValue, JErrorType> {
        let f = eval_expression("s => s.toUpperCase()", ctx)?;
        call_function(ctx, &f, JsValue::Undefined, vec![value])
    }

    #[test]
    fn wildcards_visit_every_sibling() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("({x: {tags: ['a', 'b']}, y: {tags: ['c']}})", &mut ctx).unwrap();
        let result = apply_at_path(&mut ctx, root.clone(), "*.tags.*", &mut upper).unwrap();
        assert_eq!(json(&mut ctx, &result), r#"{"x":{"tags":["A","B"]},"y":{"tags":["C"]}}"#);
        assert!(result.strict_equals(&root));
    }

    #[test]
    fn siblings_do_not_alias() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("[1, 2, 3]", &mut ctx).unwrap();
        let mut seen = vec![];
        let mut record = |_: &mut EvalContext, v: JsValue| -> Result<JsValue, JErrorType> {
            seen.push(inspect(&v));
            Ok(JsValue::integer(0))
        };
        apply_at_path(&mut ctx, root.clone(), "*", &mut record).unwrap();
        assert_eq!(seen, vec!["1", "2", "3"]);
        assert_eq!(json(&mut ctx, &root), "[0,0,0]");
    }

    #[test]
    fn an_empty_path_selects_the_root() {
        let mut ctx = EvalContext::new();
        let root = JsValue::string("abc");
        let result = apply_at_path(&mut ctx, root, ".", &mut upper).unwrap();
        assert_eq!(result, JsValue::string("ABC"));
    }

    #[test]
    fn missing_targets_fail() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("({a: 1})", &mut ctx).unwrap();
        let mut double =
            |_: &mut EvalContext, v: JsValue| -> Result<JsValue, JErrorType> { Ok(JsValue::number(to_number(&v) * 2.0)) };
        match apply_at_path(&mut ctx, root.clone(), "b", &mut double) {
            Err(err @ TargetError::MatchedNothing { .. }) => {
                assert_eq!(err.to_string(), "Your target string didn't match anything: \"b\"")
            }
            other => panic!("expected MatchedNothing, got {:?}", other.map(|v| inspect(&v))),
        }
        let result = apply_at_path(&mut ctx, root, "a", &mut double).unwrap();
        assert_eq!(json(&mut ctx, &result), r#"{"a":2}"#);
    }

    #[test]
    fn undefined_values_at_real_locations_still_match() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("({a: undefined})", &mut ctx).unwrap();
        let mut fill = |_: &mut EvalContext, _: JsValue| -> Result<JsValue, JErrorType> { Ok(JsValue::string("filled")) };
        let result = apply_at_path(&mut ctx, root, ".a", &mut fill).unwrap();
        assert_eq!(json(&mut ctx, &result), r#"{"a":"filled"}"#);
    }

    #[test]
    fn transform_errors_propagate() {
        let mut ctx = EvalContext::new();
        let root = eval_expression("({a: null})", &mut ctx).unwrap();
        let err = apply_at_path(&mut ctx, root, "a.b", &mut upper).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Cannot convert undefined or null to object");
    }
}
