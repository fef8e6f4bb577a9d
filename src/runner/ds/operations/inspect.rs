//! `util.inspect`-style rendering used by `console.log` and for printing
//! values that are not plain JSON.

use std::rc::Rc;

use crate::runner::ds::object::{JsObjectType, ObjectData};
use crate::runner::ds::operations::type_conversion::{error_summary, lookup_in_chain, number_to_string};
use crate::runner::ds::value::JsValue;

const MAX_DEPTH: usize = 2;
const BREAK_LENGTH: usize = 72;
const MAX_ARRAY_ITEMS: usize = 100;

/// Renders `value` the way a REPL would echo it (strings are quoted).
pub fn inspect(value: &JsValue) -> String {
    Inspector { seen: vec![] }.format(value, 0, 0)
}

/// Renders `value` for log output: top-level strings are printed raw.
pub fn inspect_for_log(value: &JsValue) -> String {
    match value {
        JsValue::String(s) => s.clone(),
        other => inspect(other),
    }
}

struct Inspector {
    seen: Vec<*const ()>,
}

impl Inspector {
    fn format(&mut self, value: &JsValue, depth: usize, indent: usize) -> String {
        match value {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(b) => b.to_string(),
            JsValue::Number(n) => {
                let f = n.as_f64();
                if f == 0.0 && f.is_sign_negative() {
                    "-0".to_string()
                } else {
                    number_to_string(f)
                }
            }
            JsValue::String(s) => quote(s),
            JsValue::Object(o) => {
                let id = Rc::as_ptr(o) as *const ();
                if self.seen.contains(&id) {
                    return "[Circular]".to_string();
                }
                self.seen.push(id);
                let out = self.format_object(o, depth, indent);
                self.seen.pop();
                out
            }
        }
    }

    fn format_object(&mut self, obj: &JsObjectType, depth: usize, indent: usize) -> String {
        let (head, items, keys) = {
            let o = obj.borrow();
            let keys: Vec<String> = match &o.data {
                ObjectData::Array(_) | ObjectData::Primitive(JsValue::String(_)) => {
                    o.properties.keys().cloned().collect()
                }
                ObjectData::Function(_) => o
                    .own_keys()
                    .into_iter()
                    .filter(|k| k != "prototype")
                    .collect(),
                _ => o.own_keys(),
            };
            let head = match &o.data {
                ObjectData::Function(f) if f.name.is_empty() => Some("[Function (anonymous)]".to_string()),
                ObjectData::Function(f) => Some(format!("[Function: {}]", f.name)),
                ObjectData::Primitive(p) => Some(format!(
                    "[{}: {}]",
                    o.class_name(),
                    Inspector { seen: vec![] }.format(p, depth, indent)
                )),
                ObjectData::RegExp(r) => Some(format!("/{}/{}", r.source, r.flags)),
                _ => None,
            };
            let items = match &o.data {
                ObjectData::Array(items) => Some(items.clone()),
                _ => None,
            };
            (head, items, keys)
        };
        let is_error = matches!(obj.borrow().data, ObjectData::Error);
        let head = if is_error { Some(error_summary(obj)) } else { head };

        if let Some(items) = items {
            if depth > MAX_DEPTH {
                return "[Array]".to_string();
            }
            let mut entries: Vec<String> = items
                .iter()
                .take(MAX_ARRAY_ITEMS)
                .map(|item| self.format(item, depth + 1, indent + 2))
                .collect();
            if items.len() > MAX_ARRAY_ITEMS {
                let more = items.len() - MAX_ARRAY_ITEMS;
                entries.push(format!("... {} more item{}", more, if more > 1 { "s" } else { "" }));
            }
            entries.extend(self.format_properties(obj, &keys, depth, indent));
            return wrap("", "[", "]", entries, indent);
        }

        if let Some(head) = head {
            if keys.is_empty() {
                return head;
            }
            if depth > MAX_DEPTH {
                return head;
            }
            let entries = self.format_properties(obj, &keys, depth, indent);
            return wrap(&format!("{} ", head), "{", "}", entries, indent);
        }

        let prefix = constructor_prefix(obj);
        if depth > MAX_DEPTH {
            return match prefix.as_str() {
                "" => "[Object]".to_string(),
                name => format!("[{}]", name.trim_end()),
            };
        }
        let entries = self.format_properties(obj, &keys, depth, indent);
        wrap(&prefix, "{", "}", entries, indent)
    }

    fn format_properties(&mut self, obj: &JsObjectType, keys: &[String], depth: usize, indent: usize) -> Vec<String> {
        keys.iter()
            .map(|key| {
                let value = obj.borrow().get_own(key).unwrap_or(JsValue::Undefined);
                format!("{}: {}", format_key(key), self.format(&value, depth + 1, indent + 2))
            })
            .collect()
    }
}

fn wrap(prefix: &str, open: &str, close: &str, entries: Vec<String>, indent: usize) -> String {
    if entries.is_empty() {
        return format!("{}{}{}", prefix, open, close);
    }
    let single = format!("{}{} {} {}", prefix, open, entries.join(", "), close);
    if single.len() + indent <= BREAK_LENGTH && !single.contains('\n') {
        return single;
    }
    let pad = " ".repeat(indent + 2);
    format!(
        "{}{}\n{}{}\n{}{}",
        prefix,
        open,
        pad,
        entries.join(&format!(",\n{}", pad)),
        " ".repeat(indent),
        close
    )
}

/// `Foo ` for objects made by a script constructor, `[Object: null
/// prototype] ` for prototype-less objects, empty for plain objects.
fn constructor_prefix(obj: &JsObjectType) -> String {
    let proto = match obj.borrow().prototype.clone() {
        Some(p) => p,
        None => return "[Object: null prototype] ".to_string(),
    };
    let name = match lookup_in_chain(&proto, "constructor") {
        Some(JsValue::Object(ctor)) => match &ctor.borrow().data {
            ObjectData::Function(f) => f.name.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    };
    if name.is_empty() || name == "Object" {
        String::new()
    } else {
        format!("{} ", name)
    }
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if is_identifier {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::plugin::types::EvalContext;

    #[test]
    fn nested_values_render_like_a_repl() {
        let ctx = EvalContext::new();
        let inner = ctx.realm.new_array(vec![JsValue::integer(1), JsValue::string("two")]);
        let obj = ctx.realm.new_object_from(vec![("a", inner), ("b-c", JsValue::Null)]);
        assert_eq!(inspect(&obj), "{ a: [ 1, 'two' ], 'b-c': null }");
        assert_eq!(inspect_for_log(&JsValue::string("raw")), "raw");
    }

    #[test]
    fn functions_show_their_name() {
        let ctx = EvalContext::new();
        let f = ctx.realm.new_native_function("double", |_, _, _| Ok(JsValue::Undefined));
        assert_eq!(inspect(&f), "[Function: double]");
    }

    #[test]
    fn long_objects_break_across_lines() {
        let ctx = EvalContext::new();
        let long = "x".repeat(40);
        let obj = ctx.realm.new_object_from(vec![
            ("first", JsValue::string(long.clone())),
            ("second", JsValue::string(long)),
        ]);
        let rendered = inspect(&obj);
        assert!(rendered.starts_with("{\n  first: '"));
        assert!(rendered.ends_with("'\n}"));
    }
}
