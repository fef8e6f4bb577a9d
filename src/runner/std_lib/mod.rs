//! Standard library built-in objects.
//!
//! This module contains implementations of JavaScript built-in objects
//! like console, Object, Array, String, Number, Math, JSON, RegExp and the
//! Error family, plus the global functions.

pub mod core;
pub mod console;
pub mod object;
pub mod function;
pub mod array;
pub mod string;
pub mod number;
pub mod boolean;
pub mod math;
pub mod json;
pub mod regexp;
pub mod error;
pub mod global;

pub use core::register_core_builtins;

use crate::runner::ds::value::JsValue;

/// The `i`th argument, `undefined` when absent.
pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}
