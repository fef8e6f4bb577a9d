//! String built-in.
//!
//! Provides String constructor and prototype methods. Positions and lengths
//! are counted in UTF-16 code units, as script code observes them.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::limits::{self, check_string_length};
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, iterate_values, to_js_number, to_js_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, is_callable};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;
use super::regexp::{match_array, regexp_parts, utf16_offset};

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_method("fromCharCode", string_from_char_code)
        .add_method("raw", string_raw)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("charCodeAt", string_char_code_at)
        .add_prototype_method("at", string_at)
        .add_prototype_method("substring", string_substring)
        .add_prototype_method("substr", string_substr)
        .add_prototype_method("slice", string_slice)
        .add_prototype_method("indexOf", string_index_of)
        .add_prototype_method("lastIndexOf", string_last_index_of)
        .add_prototype_method("includes", string_includes)
        .add_prototype_method("startsWith", string_starts_with)
        .add_prototype_method("endsWith", string_ends_with)
        .add_prototype_method("search", string_search)
        .add_prototype_method("match", string_match)
        .add_prototype_method("split", string_split)
        .add_prototype_method("trim", string_trim)
        .add_prototype_method("trimStart", string_trim_start)
        .add_prototype_method("trimEnd", string_trim_end)
        .add_prototype_method("toUpperCase", string_to_upper_case)
        .add_prototype_method("toLowerCase", string_to_lower_case)
        .add_prototype_method("repeat", string_repeat)
        .add_prototype_method("padStart", string_pad_start)
        .add_prototype_method("padEnd", string_pad_end)
        .add_prototype_method("replace", string_replace)
        .add_prototype_method("replaceAll", string_replace_all)
        .add_prototype_method("concat", string_concat)
        .add_prototype_method("localeCompare", string_locale_compare)
        .add_prototype_method("toString", string_value_of)
        .add_prototype_method("valueOf", string_value_of);

    registry.register_object(string);
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// `this` coerced to a string; `null` and `undefined` are rejected.
fn this_string(ctx: &mut EvalContext, this: &JsValue, method: &str) -> Result<String, JErrorType> {
    if this.is_nullish() {
        return Err(JErrorType::TypeError(format!(
            "String.prototype.{} called on null or undefined",
            method
        )));
    }
    to_js_string(ctx, this)
}

/// Integer argument with NaN mapped to zero; `default` when absent.
fn integer_arg(ctx: &mut EvalContext, args: &[JsValue], i: usize, default: f64) -> Result<f64, JErrorType> {
    match arg(args, i) {
        JsValue::Undefined => Ok(default),
        value => {
            let n = to_js_number(ctx, &value)?;
            Ok(if n.is_nan() { 0.0 } else { n.trunc() })
        }
    }
}

fn clamp(n: f64, len: usize) -> usize {
    n.max(0.0).min(len as f64) as usize
}

fn relative(n: f64, len: usize) -> usize {
    if n < 0.0 {
        clamp(len as f64 + n, len)
    } else {
        clamp(n, len)
    }
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// String constructor: a primitive when called, a wrapper under `new`.
fn string_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = if args.is_empty() {
        String::new()
    } else {
        to_js_string(ctx, &args[0])?
    };
    if ctx.new_target.is_some() {
        Ok(ctx.realm.new_boxed_primitive(JsValue::String(value)))
    } else {
        Ok(JsValue::String(value))
    }
}

/// String.fromCharCode
fn string_from_char_code(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut codes = Vec::with_capacity(args.len());
    for value in &args {
        let n = to_js_number(ctx, value)?;
        codes.push(if n.is_finite() { n.trunc().rem_euclid(65536.0) as u16 } else { 0 });
    }
    Ok(JsValue::String(from_units(&codes)))
}

/// String.raw as a template tag.
fn string_raw(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let strings = arg(&args, 0);
    let raw = get_property(ctx, &strings, "raw")?;
    let parts = iterate_values(&raw)?;
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        out.push_str(&to_js_string(ctx, part)?);
        if i + 1 < parts.len() {
            if let Some(sub) = args.get(i + 1) {
                out.push_str(&to_js_string(ctx, sub)?);
            }
        }
    }
    Ok(JsValue::String(out))
}

/// String.prototype.charAt
fn string_char_at(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "charAt")?);
    let index = integer_arg(ctx, &args, 0, 0.0)?;
    if index < 0.0 || index as usize >= s.len() {
        return Ok(JsValue::String(String::new()));
    }
    let i = index as usize;
    Ok(JsValue::String(from_units(&s[i..i + 1])))
}

/// String.prototype.charCodeAt
fn string_char_code_at(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "charCodeAt")?);
    let index = integer_arg(ctx, &args, 0, 0.0)?;
    if index < 0.0 || index as usize >= s.len() {
        return Ok(JsValue::number(f64::NAN));
    }
    Ok(JsValue::integer(s[index as usize] as i64))
}

/// String.prototype.at
fn string_at(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "at")?);
    let n = integer_arg(ctx, &args, 0, 0.0)?;
    let index = if n < 0.0 { s.len() as f64 + n } else { n };
    if index < 0.0 || index as usize >= s.len() {
        return Ok(JsValue::Undefined);
    }
    let i = index as usize;
    Ok(JsValue::String(from_units(&s[i..i + 1])))
}

/// String.prototype.substring: arguments are clamped and swapped if needed.
fn string_substring(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "substring")?);
    let len = s.len();
    let start = clamp(integer_arg(ctx, &args, 0, 0.0)?, len);
    let end = clamp(integer_arg(ctx, &args, 1, len as f64)?, len);
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(JsValue::String(from_units(&s[from..to])))
}

/// String.prototype.substr
fn string_substr(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "substr")?);
    let len = s.len();
    let start = relative(integer_arg(ctx, &args, 0, 0.0)?, len);
    let count = clamp(integer_arg(ctx, &args, 1, len as f64)?, len - start);
    Ok(JsValue::String(from_units(&s[start..start + count])))
}

/// String.prototype.slice: negative positions count from the end.
fn string_slice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "slice")?);
    let len = s.len();
    let start = relative(integer_arg(ctx, &args, 0, 0.0)?, len);
    let end = relative(integer_arg(ctx, &args, 1, len as f64)?, len);
    if start >= end {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(from_units(&s[start..end])))
}

/// String.prototype.indexOf
fn string_index_of(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "indexOf")?);
    let needle = units(&to_js_string(ctx, &arg(&args, 0))?);
    let from = clamp(integer_arg(ctx, &args, 1, 0.0)?, s.len());
    Ok(JsValue::integer(
        find_units(&s, &needle, from).map(|i| i as i64).unwrap_or(-1),
    ))
}

/// String.prototype.lastIndexOf
fn string_last_index_of(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "lastIndexOf")?);
    let needle = units(&to_js_string(ctx, &arg(&args, 0))?);
    if needle.len() > s.len() {
        return Ok(JsValue::integer(-1));
    }
    let last_start = s.len() - needle.len();
    let from = match arg(&args, 1) {
        JsValue::Undefined => last_start,
        value => {
            let n = to_js_number(ctx, &value)?;
            if n.is_nan() {
                last_start
            } else {
                clamp(n.trunc(), last_start)
            }
        }
    };
    let found = (0..=from)
        .rev()
        .find(|&i| s[i..i + needle.len()] == needle[..])
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(JsValue::integer(found))
}

fn reject_regexp(value: &JsValue, method: &str) -> Result<(), JErrorType> {
    if regexp_parts(value).is_some() {
        return Err(JErrorType::TypeError(format!(
            "First argument to String.prototype.{} must not be a regular expression",
            method
        )));
    }
    Ok(())
}

/// String.prototype.includes
fn string_includes(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "includes")?);
    reject_regexp(&arg(&args, 0), "includes")?;
    let needle = units(&to_js_string(ctx, &arg(&args, 0))?);
    let from = clamp(integer_arg(ctx, &args, 1, 0.0)?, s.len());
    Ok(JsValue::Boolean(find_units(&s, &needle, from).is_some()))
}

/// String.prototype.startsWith
fn string_starts_with(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "startsWith")?);
    reject_regexp(&arg(&args, 0), "startsWith")?;
    let needle = units(&to_js_string(ctx, &arg(&args, 0))?);
    let from = clamp(integer_arg(ctx, &args, 1, 0.0)?, s.len());
    Ok(JsValue::Boolean(s[from..].starts_with(&needle)))
}

/// String.prototype.endsWith
fn string_ends_with(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "endsWith")?);
    reject_regexp(&arg(&args, 0), "endsWith")?;
    let needle = units(&to_js_string(ctx, &arg(&args, 0))?);
    let end = clamp(integer_arg(ctx, &args, 1, s.len() as f64)?, s.len());
    Ok(JsValue::Boolean(s[..end].ends_with(&needle)))
}

/// String.prototype.search
fn string_search(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "search")?;
    let pattern = arg(&args, 0);
    let regex = match regexp_parts(&pattern) {
        Some((regex, _)) => regex,
        None => {
            let source = to_js_string(ctx, &pattern)?;
            let compiled = ctx.realm.new_regexp(&source, "")?;
            match regexp_parts(&compiled) {
                Some((regex, _)) => regex,
                None => return Ok(JsValue::integer(-1)),
            }
        }
    };
    Ok(JsValue::integer(
        regex
            .find(&s)
            .map(|m| utf16_offset(&s, m.start()) as i64)
            .unwrap_or(-1),
    ))
}

/// String.prototype.match: all matches for a global pattern, otherwise the
/// same result as `exec`.
fn string_match(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "match")?;
    let pattern = arg(&args, 0);
    let (regex, global) = match regexp_parts(&pattern) {
        Some(parts) => parts,
        None => {
            let source = match &pattern {
                JsValue::Undefined => String::new(),
                other => to_js_string(ctx, other)?,
            };
            let compiled = ctx.realm.new_regexp(&source, "")?;
            match regexp_parts(&compiled) {
                Some(parts) => parts,
                None => return Ok(JsValue::Null),
            }
        }
    };
    if global {
        let found: Vec<JsValue> = regex
            .find_iter(&s)
            .map(|m| JsValue::String(m.as_str().to_string()))
            .collect();
        if found.is_empty() {
            return Ok(JsValue::Null);
        }
        return Ok(ctx.realm.new_array(found));
    }
    Ok(match regex.captures(&s) {
        Some(caps) => match_array(ctx, &regex, &caps, &s),
        None => JsValue::Null,
    })
}

/// String.prototype.split
fn string_split(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "split")?;
    let separator = arg(&args, 0);
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        value => to_js_number(ctx, &value)? as u32 as usize,
    };
    let mut parts: Vec<String> = if let Some((regex, _)) = regexp_parts(&separator) {
        if s.is_empty() {
            if regex.is_match(&s) { vec![] } else { vec![s.clone()] }
        } else {
            let mut parts = vec![];
            let mut last = 0;
            for caps in regex.captures_iter(&s) {
                let m = match caps.get(0) {
                    Some(m) => m,
                    None => continue,
                };
                if m.as_str().is_empty() && (m.start() == 0 || m.start() >= s.len()) {
                    continue;
                }
                parts.push(s[last..m.start()].to_string());
                for group in caps.iter().skip(1) {
                    parts.push(group.map(|g| g.as_str().to_string()).unwrap_or_default());
                }
                last = m.end();
            }
            parts.push(s[last..].to_string());
            parts
        }
    } else if matches!(separator, JsValue::Undefined) {
        vec![s.clone()]
    } else {
        let separator = to_js_string(ctx, &separator)?;
        if separator.is_empty() {
            s.encode_utf16().map(|u| from_units(&[u])).collect()
        } else {
            s.split(separator.as_str()).map(str::to_string).collect()
        }
    };
    parts.truncate(limit);
    let items = parts.into_iter().map(JsValue::String).collect();
    Ok(ctx.realm.new_array(items))
}

/// String.prototype.trim
fn string_trim(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(ctx, &this, "trim")?.trim().to_string()))
}

/// String.prototype.trimStart
fn string_trim_start(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(ctx, &this, "trimStart")?.trim_start().to_string()))
}

/// String.prototype.trimEnd
fn string_trim_end(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(ctx, &this, "trimEnd")?.trim_end().to_string()))
}

/// String.prototype.toUpperCase
fn string_to_upper_case(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(ctx, &this, "toUpperCase")?.to_uppercase()))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_string(ctx, &this, "toLowerCase")?.to_lowercase()))
}

/// String.prototype.repeat
fn string_repeat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "repeat")?;
    let count = integer_arg(ctx, &args, 0, 0.0)?;
    if count < 0.0 || count.is_infinite() {
        return Err(JErrorType::RangeError(format!("Invalid count value: {}", count)));
    }
    if s.is_empty() {
        return Ok(JsValue::String(s));
    }
    check_string_length(s.encode_utf16().count() as f64 * count)?;
    Ok(JsValue::String(s.repeat(count as usize)))
}

fn padding(ctx: &mut EvalContext, s: &str, args: &[JsValue]) -> Result<String, JErrorType> {
    let target = integer_arg(ctx, args, 0, 0.0)?;
    let len = s.encode_utf16().count();
    if target <= len as f64 {
        return Ok(String::new());
    }
    let filler = match arg(args, 1) {
        JsValue::Undefined => vec![b' ' as u16],
        value => units(&to_js_string(ctx, &value)?),
    };
    if filler.is_empty() {
        return Ok(String::new());
    }
    check_string_length(target)?;
    let needed = target as usize - len;
    let pad: Vec<u16> = filler.iter().copied().cycle().take(needed).collect();
    Ok(from_units(&pad))
}

/// String.prototype.padStart
fn string_pad_start(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "padStart")?;
    let pad = padding(ctx, &s, &args)?;
    Ok(JsValue::String(pad + &s))
}

/// String.prototype.padEnd
fn string_pad_end(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "padEnd")?;
    let pad = padding(ctx, &s, &args)?;
    Ok(JsValue::String(s + &pad))
}

/// One match for the replacement step: byte span plus capture texts.
struct Found {
    start: usize,
    end: usize,
    groups: Vec<Option<String>>,
}

/// Expands `$$`, `$&`, `` $` ``, `$'` and `$n` in a replacement pattern.
fn expand_replacement(template: &str, input: &str, found: &Found) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('&') => {
                chars.next();
                out.push_str(&input[found.start..found.end]);
            }
            Some('`') => {
                chars.next();
                out.push_str(&input[..found.start]);
            }
            Some('\'') => {
                chars.next();
                out.push_str(&input[found.end..]);
            }
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let mut index = d.to_digit(10).unwrap_or(0) as usize;
                if let Some(next) = chars.peek().and_then(|n| n.to_digit(10)) {
                    let two = index * 10 + next as usize;
                    if two >= 1 && two <= found.groups.len() {
                        chars.next();
                        index = two;
                    }
                }
                if index >= 1 && index <= found.groups.len() {
                    out.push_str(found.groups[index - 1].as_deref().unwrap_or(""));
                } else {
                    out.push('$');
                    out.push(d);
                }
            }
            _ => out.push('$'),
        }
    }
    out
}

fn replace_matches(
    ctx: &mut EvalContext,
    input: &str,
    matches: Vec<Found>,
    replacement: &JsValue,
) -> Result<String, JErrorType> {
    let template = if is_callable(replacement) {
        None
    } else {
        Some(to_js_string(ctx, replacement)?)
    };
    let mut out = String::new();
    let mut last = 0;
    for found in matches {
        out.push_str(&input[last..found.start]);
        let text = match &template {
            Some(template) => expand_replacement(template, input, &found),
            None => {
                let mut call_args = vec![JsValue::String(input[found.start..found.end].to_string())];
                call_args.extend(found.groups.iter().map(|g| match g {
                    Some(g) => JsValue::String(g.clone()),
                    None => JsValue::Undefined,
                }));
                call_args.push(JsValue::integer(utf16_offset(input, found.start) as i64));
                call_args.push(JsValue::String(input.to_string()));
                let result = call_function(ctx, replacement, JsValue::Undefined, call_args)?;
                to_js_string(ctx, &result)?
            }
        };
        out.push_str(&text);
        last = found.end;
    }
    out.push_str(&input[last..]);
    Ok(out)
}

fn collect_matches(
    ctx: &mut EvalContext,
    input: &str,
    pattern: &JsValue,
    all: bool,
) -> Result<Vec<Found>, JErrorType> {
    if let Some((regex, global)) = regexp_parts(pattern) {
        let caps: Vec<_> = if all || global {
            regex.captures_iter(input).collect()
        } else {
            regex.captures(input).into_iter().collect()
        };
        return Ok(caps
            .iter()
            .filter_map(|c| {
                let m = c.get(0)?;
                Some(Found {
                    start: m.start(),
                    end: m.end(),
                    groups: c.iter().skip(1).map(|g| g.map(|g| g.as_str().to_string())).collect(),
                })
            })
            .collect());
    }
    let needle = to_js_string(ctx, pattern)?;
    let spans: Vec<(usize, &str)> = if all {
        if needle.is_empty() {
            input
                .char_indices()
                .map(|(i, _)| (i, ""))
                .chain(std::iter::once((input.len(), "")))
                .collect()
        } else {
            input.match_indices(needle.as_str()).collect()
        }
    } else {
        input.match_indices(needle.as_str()).take(1).collect()
    };
    Ok(spans
        .into_iter()
        .map(|(start, m)| Found {
            start,
            end: start + m.len(),
            groups: vec![],
        })
        .collect())
}

/// String.prototype.replace
fn string_replace(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "replace")?;
    let matches = collect_matches(ctx, &s, &arg(&args, 0), false)?;
    Ok(JsValue::String(replace_matches(ctx, &s, matches, &arg(&args, 1))?))
}

/// String.prototype.replaceAll
fn string_replace_all(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = this_string(ctx, &this, "replaceAll")?;
    let pattern = arg(&args, 0);
    if let Some((_, false)) = regexp_parts(&pattern) {
        return Err(JErrorType::TypeError(
            "replaceAll must be called with a global RegExp".to_string(),
        ));
    }
    let matches = collect_matches(ctx, &s, &pattern, true)?;
    Ok(JsValue::String(replace_matches(ctx, &s, matches, &arg(&args, 1))?))
}

/// String.prototype.concat
fn string_concat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut s = this_string(ctx, &this, "concat")?;
    for value in &args {
        s = limits::concat(s, &to_js_string(ctx, value)?)?;
    }
    Ok(JsValue::String(s))
}

/// String.prototype.localeCompare, by code unit order.
fn string_locale_compare(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let s = units(&this_string(ctx, &this, "localeCompare")?);
    let other = units(&to_js_string(ctx, &arg(&args, 0))?);
    Ok(JsValue::integer(match s.cmp(&other) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }))
}

/// String.prototype.valueOf and toString.
fn string_value_of(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::String(_) => Ok(this),
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Primitive(p @ JsValue::String(_)) => Ok(p.clone()),
            _ => Err(JErrorType::TypeError(
                "String.prototype.valueOf requires that 'this' be a String".to_string(),
            )),
        },
        other => Ok(JsValue::String(to_js_string(ctx, other)?)),
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
    fn slicing_counts_from_the_end() {
        assert_eq!(eval_inspect("'hello'.slice(-3, -1)"), "'ll'");
        assert_eq!(eval_inspect("'hello'.substring(4, 1)"), "'ell'");
        assert_eq!(eval_inspect("'hello'.at(-1)"), "'o'");
    }

    #[test]
    fn split_with_strings_and_patterns() {
        assert_eq!(eval_inspect("'a,b,,c'.split(',')"), "[ 'a', 'b', '', 'c' ]");
        assert_eq!(eval_inspect("'abc'.split('')"), "[ 'a', 'b', 'c' ]");
        assert_eq!(eval_inspect("'a1b22c'.split(/\\d+/)"), "[ 'a', 'b', 'c' ]");
        assert_eq!(eval_inspect("'a b c'.split(' ', 2)"), "[ 'a', 'b' ]");
    }

    #[test]
    fn replace_expands_patterns_and_calls_functions() {
        assert_eq!(eval_inspect("'john smith'.replace(/(\\w+) (\\w+)/, '$2, $1')"), "'smith, john'");
        assert_eq!(eval_inspect("'aaa'.replace('a', 'b')"), "'baa'");
        assert_eq!(eval_inspect("'aaa'.replaceAll('a', 'b')"), "'bbb'");
        assert_eq!(eval_inspect("'a-b-c'.replace(/-/g, m => m + m)"), "'a--b--c'");
    }

    #[test]
    fn match_returns_all_global_matches() {
        assert_eq!(eval_inspect("'a1b22'.match(/\\d+/g)"), "[ '1', '22' ]");
        assert_eq!(eval_inspect("'abc'.match(/z/)"), "null");
    }

    #[test]
    fn padding_and_constructor() {
        assert_eq!(eval_inspect("'7'.padStart(3, '0')"), "'007'");
        assert_eq!(eval_inspect("String(12)"), "'12'");
        assert_eq!(eval_inspect("typeof new String('x')"), "'object'");
    }
}
