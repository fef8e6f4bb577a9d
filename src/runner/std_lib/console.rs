//! Console built-in object.
//!
//! Provides console.log, console.error, console.warn, and console.info methods.

use std::io::Write;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::inspect::inspect_for_log;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register the console object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_log)
        .add_method("debug", console_log)
        .add_method("error", console_error)
        .add_method("warn", console_error);

    registry.register_object(console);
}

/// Format all arguments for console output.
pub fn format_args(args: &[JsValue]) -> String {
    args.iter()
        .map(inspect_for_log)
        .collect::<Vec<_>>()
        .join(" ")
}

/// console.log - Log to stdout.
fn console_log(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut stdout = std::io::stdout().lock();
    // A closed pipe is not a script error.
    let _ = writeln!(stdout, "{}", format_args(&args));
    Ok(JsValue::Undefined)
}

/// console.error - Log to stderr.
fn console_error(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let _ = writeln!(std::io::stderr(), "{}", format_args(&args));
    Ok(JsValue::Undefined)
}
