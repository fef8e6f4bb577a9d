//! Array built-in.
//!
//! Provides Array constructor and prototype methods.

use std::cmp::Ordering;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::limits::{self, check_array_length, invalid_array_length};
use crate::runner::ds::object::ObjectData;
use crate::runner::ds::operations::object::{get_property, iterate_values, to_js_number, to_js_string};
use crate::runner::ds::operations::test_and_comparison::{same_value_zero, strict_equals};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_integer};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, is_callable};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(array_constructor)
        .add_method("isArray", array_is_array)
        .add_method("from", array_from)
        .add_method("of", array_of)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("shift", array_shift)
        .add_prototype_method("unshift", array_unshift)
        .add_prototype_method("slice", array_slice)
        .add_prototype_method("splice", array_splice)
        .add_prototype_method("concat", array_concat)
        .add_prototype_method("join", array_join)
        .add_prototype_method("toString", array_to_string)
        .add_prototype_method("reverse", array_reverse)
        .add_prototype_method("indexOf", array_index_of)
        .add_prototype_method("lastIndexOf", array_last_index_of)
        .add_prototype_method("includes", array_includes)
        .add_prototype_method("at", array_at)
        .add_prototype_method("fill", array_fill)
        .add_prototype_method("forEach", array_for_each)
        .add_prototype_method("map", array_map)
        .add_prototype_method("filter", array_filter)
        .add_prototype_method("reduce", array_reduce)
        .add_prototype_method("reduceRight", array_reduce_right)
        .add_prototype_method("find", array_find)
        .add_prototype_method("findIndex", array_find_index)
        .add_prototype_method("findLast", array_find_last)
        .add_prototype_method("some", array_some)
        .add_prototype_method("every", array_every)
        .add_prototype_method("sort", array_sort)
        .add_prototype_method("flat", array_flat)
        .add_prototype_method("flatMap", array_flat_map);

    registry.register_object(array);
}

/// Snapshot of the elements of `this`.
fn items_of(this: &JsValue, method: &str) -> Result<Vec<JsValue>, JErrorType> {
    if let JsValue::Object(o) = this {
        if let ObjectData::Array(items) = &o.borrow().data {
            return Ok(items.clone());
        }
    }
    Err(JErrorType::TypeError(format!(
        "Array.prototype.{} called on a non-array",
        method
    )))
}

/// Run `f` over the live element storage of `this`.
fn with_items_mut<R>(this: &JsValue, method: &str, f: impl FnOnce(&mut Vec<JsValue>) -> R) -> Result<R, JErrorType> {
    if let JsValue::Object(o) = this {
        if let ObjectData::Array(items) = &mut o.borrow_mut().data {
            return Ok(f(items));
        }
    }
    Err(JErrorType::TypeError(format!(
        "Array.prototype.{} called on a non-array",
        method
    )))
}

fn callback_arg(args: &[JsValue], method: &str) -> Result<JsValue, JErrorType> {
    let callback = arg(args, 0);
    if is_callable(&callback) {
        Ok(callback)
    } else {
        Err(JErrorType::TypeError(format!(
            "{} is not a function (in Array.prototype.{})",
            callback, method
        )))
    }
}

/// `(item, index, array)` callback invocation.
fn invoke(
    ctx: &mut EvalContext,
    callback: &JsValue,
    this_arg: &JsValue,
    item: JsValue,
    index: usize,
    array: &JsValue,
) -> Result<JsValue, JErrorType> {
    call_function(
        ctx,
        callback,
        this_arg.clone(),
        vec![item, JsValue::integer(index as i64), array.clone()],
    )
}

/// Resolves a relative index argument against `len` (negative counts from
/// the end), clamped to `0..=len`.
fn relative_index(ctx: &mut EvalContext, value: &JsValue, len: usize, default: usize) -> Result<usize, JErrorType> {
    if matches!(value, JsValue::Undefined) {
        return Ok(default);
    }
    let n = to_js_number(ctx, value)?;
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let len_f = len as f64;
    Ok(if n < 0.0 {
        (len_f + n).max(0.0) as usize
    } else {
        n.min(len_f) as usize
    })
}

/// Array constructor.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let len = n.as_f64();
        if len < 0.0 || len.fract() != 0.0 || len > u32::MAX as f64 {
            return Err(invalid_array_length());
        }
        check_array_length(len)?;
        return Ok(ctx.realm.new_array(vec![JsValue::Undefined; len as usize]));
    }
    Ok(ctx.realm.new_array(args))
}

/// Array.isArray
fn array_is_array(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let is_array = match arg(&args, 0) {
        JsValue::Object(o) => o.borrow().is_array(),
        _ => false,
    };
    Ok(JsValue::Boolean(is_array))
}

/// Array.from: iterables, plus array-likes with a `length`.
fn array_from(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let source = arg(&args, 0);
    let items = match &source {
        JsValue::Object(o) if !o.borrow().is_array() && !matches!(o.borrow().data, ObjectData::Primitive(_)) => {
            let length = get_property(ctx, &source, "length")?;
            let len = to_integer(&length).max(0.0);
            check_array_length(len)?;
            let len = len as usize;
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                items.push(get_property(ctx, &source, &i.to_string())?);
            }
            items
        }
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(format!("{} is not iterable", source)))
        }
        JsValue::Number(_) | JsValue::Boolean(_) => vec![],
        _ => iterate_values(&source)?,
    };
    let mapper = arg(&args, 1);
    if matches!(mapper, JsValue::Undefined) {
        return Ok(ctx.realm.new_array(items));
    }
    if !is_callable(&mapper) {
        return Err(JErrorType::TypeError(format!("{} is not a function", mapper)));
    }
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(call_function(ctx, &mapper, JsValue::Undefined, vec![item, JsValue::integer(i as i64)])?);
    }
    Ok(ctx.realm.new_array(mapped))
}

/// Array.of
fn array_of(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(ctx.realm.new_array(args))
}

/// Array.prototype.push
fn array_push(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let len = with_items_mut(&this, "push", |items| {
        items.extend(args);
        items.len()
    })?;
    Ok(JsValue::integer(len as i64))
}

/// Array.prototype.pop
fn array_pop(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    with_items_mut(&this, "pop", |items| items.pop().unwrap_or(JsValue::Undefined))
}

/// Array.prototype.shift
fn array_shift(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    with_items_mut(&this, "shift", |items| {
        if items.is_empty() {
            JsValue::Undefined
        } else {
            items.remove(0)
        }
    })
}

/// Array.prototype.unshift
fn array_unshift(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let len = with_items_mut(&this, "unshift", |items| {
        items.splice(0..0, args);
        items.len()
    })?;
    Ok(JsValue::integer(len as i64))
}

/// Array.prototype.slice
fn array_slice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "slice")?;
    let start = relative_index(ctx, &arg(&args, 0), items.len(), 0)?;
    let end = relative_index(ctx, &arg(&args, 1), items.len(), items.len())?;
    let slice = if start < end { items[start..end].to_vec() } else { vec![] };
    Ok(ctx.realm.new_array(slice))
}

/// Array.prototype.splice
fn array_splice(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let len = items_of(&this, "splice")?.len();
    let start = relative_index(ctx, &arg(&args, 0), len, 0)?;
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let n = to_js_number(ctx, &args[1])?;
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            (n.max(0.0) as usize).min(len - start)
        }
    };
    let inserted: Vec<JsValue> = args.into_iter().skip(2).collect();
    let removed = with_items_mut(&this, "splice", |items| {
        items.splice(start..start + delete_count, inserted).collect::<Vec<_>>()
    })?;
    Ok(ctx.realm.new_array(removed))
}

/// Array.prototype.concat
fn array_concat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut items = items_of(&this, "concat")?;
    for value in args {
        let spread = match &value {
            JsValue::Object(o) => match &o.borrow().data {
                ObjectData::Array(inner) => Some(inner.clone()),
                _ => None,
            },
            _ => None,
        };
        match spread {
            Some(inner) => items.extend(inner),
            None => items.push(value),
        }
    }
    Ok(ctx.realm.new_array(items))
}

/// Array.prototype.join
fn array_join(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "join")?;
    let separator = match arg(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        other => to_js_string(ctx, &other)?,
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in &items {
        parts.push(if item.is_nullish() {
            String::new()
        } else {
            to_js_string(ctx, item)?
        });
    }
    Ok(JsValue::String(limits::join(&parts, &separator)?))
}

/// Array.prototype.toString
fn array_to_string(ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    array_join(ctx, this, vec![])
}

/// Array.prototype.reverse
fn array_reverse(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    with_items_mut(&this, "reverse", |items| items.reverse())?;
    Ok(this)
}

/// Array.prototype.indexOf
fn array_index_of(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "indexOf")?;
    let needle = arg(&args, 0);
    let from = relative_index(ctx, &arg(&args, 1), items.len(), 0)?;
    let found = items
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, item)| strict_equals(item, &needle))
        .map(|(i, _)| i as i64)
        .unwrap_or(-1);
    Ok(JsValue::integer(found))
}

/// Array.prototype.lastIndexOf
fn array_last_index_of(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "lastIndexOf")?;
    let needle = arg(&args, 0);
    let found = items
        .iter()
        .rposition(|item| strict_equals(item, &needle))
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(JsValue::integer(found))
}

/// Array.prototype.includes
fn array_includes(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "includes")?;
    let needle = arg(&args, 0);
    let from = relative_index(ctx, &arg(&args, 1), items.len(), 0)?;
    Ok(JsValue::Boolean(
        items.iter().skip(from).any(|item| same_value_zero(item, &needle)),
    ))
}

/// Array.prototype.at
fn array_at(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "at")?;
    let n = to_js_number(ctx, &arg(&args, 0))?;
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    let index = if n < 0.0 { items.len() as f64 + n } else { n };
    if index < 0.0 {
        return Ok(JsValue::Undefined);
    }
    Ok(items.get(index as usize).cloned().unwrap_or(JsValue::Undefined))
}

/// Array.prototype.fill
fn array_fill(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let len = items_of(&this, "fill")?.len();
    let value = arg(&args, 0);
    let start = relative_index(ctx, &arg(&args, 1), len, 0)?;
    let end = relative_index(ctx, &arg(&args, 2), len, len)?;
    with_items_mut(&this, "fill", |items| {
        for item in items.iter_mut().take(end).skip(start) {
            *item = value.clone();
        }
    })?;
    Ok(this)
}

/// Array.prototype.forEach
fn array_for_each(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "forEach")?;
    let callback = callback_arg(&args, "forEach")?;
    let this_arg = arg(&args, 1);
    for (i, item) in items.into_iter().enumerate() {
        invoke(ctx, &callback, &this_arg, item, i, &this)?;
    }
    Ok(JsValue::Undefined)
}

/// Array.prototype.map
fn array_map(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "map")?;
    let callback = callback_arg(&args, "map")?;
    let this_arg = arg(&args, 1);
    let mut mapped = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        mapped.push(invoke(ctx, &callback, &this_arg, item, i, &this)?);
    }
    Ok(ctx.realm.new_array(mapped))
}

/// Array.prototype.filter
fn array_filter(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "filter")?;
    let callback = callback_arg(&args, "filter")?;
    let this_arg = arg(&args, 1);
    let mut kept = vec![];
    for (i, item) in items.into_iter().enumerate() {
        if to_boolean(&invoke(ctx, &callback, &this_arg, item.clone(), i, &this)?) {
            kept.push(item);
        }
    }
    Ok(ctx.realm.new_array(kept))
}

fn reduce(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
    method: &str,
    from_right: bool,
) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, method)?;
    let callback = callback_arg(&args, method)?;
    let mut indexed: Vec<(usize, JsValue)> = items.into_iter().enumerate().collect();
    if from_right {
        indexed.reverse();
    }
    let mut iter = indexed.into_iter();
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.clone(),
        None => match iter.next() {
            Some((_, first)) => first,
            None => {
                return Err(JErrorType::TypeError(
                    "Reduce of empty array with no initial value".to_string(),
                ))
            }
        },
    };
    for (i, item) in iter {
        accumulator = call_function(
            ctx,
            &callback,
            JsValue::Undefined,
            vec![accumulator, item, JsValue::integer(i as i64), this.clone()],
        )?;
    }
    Ok(accumulator)
}

/// Array.prototype.reduce
fn array_reduce(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    reduce(ctx, this, args, "reduce", false)
}

/// Array.prototype.reduceRight
fn array_reduce_right(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    reduce(ctx, this, args, "reduceRight", true)
}

/// First `(index, item)` the predicate accepts, scanning in the given
/// direction.
fn find_entry(
    ctx: &mut EvalContext,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    from_right: bool,
) -> Result<Option<(usize, JsValue)>, JErrorType> {
    let items = items_of(this, method)?;
    let callback = callback_arg(args, method)?;
    let this_arg = arg(args, 1);
    let mut indexed: Vec<(usize, JsValue)> = items.into_iter().enumerate().collect();
    if from_right {
        indexed.reverse();
    }
    for (i, item) in indexed {
        if to_boolean(&invoke(ctx, &callback, &this_arg, item.clone(), i, this)?) {
            return Ok(Some((i, item)));
        }
    }
    Ok(None)
}

/// Array.prototype.find
fn array_find(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(find_entry(ctx, &this, &args, "find", false)?
        .map(|(_, item)| item)
        .unwrap_or(JsValue::Undefined))
}

/// Array.prototype.findIndex
fn array_find_index(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::integer(
        find_entry(ctx, &this, &args, "findIndex", false)?
            .map(|(i, _)| i as i64)
            .unwrap_or(-1),
    ))
}

/// Array.prototype.findLast
fn array_find_last(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(find_entry(ctx, &this, &args, "findLast", true)?
        .map(|(_, item)| item)
        .unwrap_or(JsValue::Undefined))
}

/// Array.prototype.some
fn array_some(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(find_entry(ctx, &this, &args, "some", false)?.is_some()))
}

/// Array.prototype.every
fn array_every(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "every")?;
    let callback = callback_arg(&args, "every")?;
    let this_arg = arg(&args, 1);
    for (i, item) in items.into_iter().enumerate() {
        if !to_boolean(&invoke(ctx, &callback, &this_arg, item, i, &this)?) {
            return Ok(JsValue::Boolean(false));
        }
    }
    Ok(JsValue::Boolean(true))
}

/// Array.prototype.sort: stable; `undefined`s always sort last.
fn array_sort(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "sort")?;
    let comparator = arg(&args, 0);
    if !matches!(comparator, JsValue::Undefined) && !is_callable(&comparator) {
        return Err(JErrorType::TypeError(
            "The comparison function must be either a function or undefined".to_string(),
        ));
    }
    let (undefined, defined): (Vec<JsValue>, Vec<JsValue>) =
        items.into_iter().partition(|v| matches!(v, JsValue::Undefined));

    let mut compare = |ctx: &mut EvalContext, a: &JsValue, b: &JsValue| -> Result<Ordering, JErrorType> {
        if matches!(comparator, JsValue::Undefined) {
            let a: Vec<u16> = to_js_string(ctx, a)?.encode_utf16().collect();
            let b: Vec<u16> = to_js_string(ctx, b)?.encode_utf16().collect();
            return Ok(a.cmp(&b));
        }
        let result = call_function(ctx, &comparator, JsValue::Undefined, vec![a.clone(), b.clone()])?;
        let n = to_js_number(ctx, &result)?;
        Ok(if n > 0.0 {
            Ordering::Greater
        } else if n < 0.0 {
            Ordering::Less
        } else {
            Ordering::Equal
        })
    };
    let mut sorted = merge_sort(ctx, defined, &mut compare)?;
    sorted.extend(undefined);
    with_items_mut(&this, "sort", |items| *items = sorted)?;
    Ok(this)
}

/// Stable merge sort with a fallible comparator; a script comparator need
/// not be a consistent total order.
fn merge_sort(
    ctx: &mut EvalContext,
    mut items: Vec<JsValue>,
    compare: &mut dyn FnMut(&mut EvalContext, &JsValue, &JsValue) -> Result<Ordering, JErrorType>,
) -> Result<Vec<JsValue>, JErrorType> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(ctx, items, compare)?;
    let right = merge_sort(ctx, right, compare)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare(ctx, l, r)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn flatten_into(out: &mut Vec<JsValue>, items: Vec<JsValue>, depth: f64) {
    for item in items {
        let inner = match &item {
            JsValue::Object(o) if depth >= 1.0 => match &o.borrow().data {
                ObjectData::Array(inner) => Some(inner.clone()),
                _ => None,
            },
            _ => None,
        };
        match inner {
            Some(inner) => flatten_into(out, inner, depth - 1.0),
            None => out.push(item),
        }
    }
}

/// Array.prototype.flat
fn array_flat(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let items = items_of(&this, "flat")?;
    let depth = match arg(&args, 0) {
        JsValue::Undefined => 1.0,
        other => to_integer(&other),
    };
    let mut out = vec![];
    flatten_into(&mut out, items, depth);
    Ok(ctx.realm.new_array(out))
}

/// Array.prototype.flatMap
fn array_flat_map(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mapped = array_map(ctx, this, args)?;
    array_flat(ctx, mapped, vec![])
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
    fn higher_order_methods() {
        assert_eq!(eval_inspect("[1, 2, 3].map(x => x * 2)"), "[ 2, 4, 6 ]");
        assert_eq!(eval_inspect("[1, 2, 3, 4].filter(x => x % 2)"), "[ 1, 3 ]");
        assert_eq!(eval_inspect("[1, 2, 3].reduce((a, b) => a + b)"), "6");
        assert_eq!(eval_inspect("[[1], [2, [3]]].flat()"), "[ 1, 2, [ 3 ] ]");
        assert_eq!(eval_inspect("['a', 'b'].flatMap((x, i) => [x, i])"), "[ 'a', 0, 'b', 1 ]");
    }

    #[test]
    fn default_sort_is_by_string() {
        assert_eq!(eval_inspect("[10, 9, 1, undefined, 2].sort()"), "[ 1, 10, 2, 9, undefined ]");
        assert_eq!(eval_inspect("[10, 9, 1].sort((a, b) => a - b)"), "[ 1, 9, 10 ]");
    }

    #[test]
    fn mutators_update_in_place() {
        assert_eq!(
            eval_inspect("((a) => [a.push(4), a.shift(), a.splice(1, 1, 'x'), a])([1, 2, 3])"),
            "[ 4, 1, [ 3 ], [ 2, 'x', 4 ] ]"
        );
    }

    #[test]
    fn from_accepts_array_likes() {
        assert_eq!(eval_inspect("Array.from({length: 3}, (_, i) => i * i)"), "[ 0, 1, 4 ]");
        assert_eq!(eval_inspect("Array.from('ab')"), "[ 'a', 'b' ]");
    }

    #[test]
    fn reduce_of_empty_array_throws() {
        let err = eval_expression("[].reduce((a, b) => a)", &mut EvalContext::new()).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Reduce of empty array with no initial value");
    }
}
