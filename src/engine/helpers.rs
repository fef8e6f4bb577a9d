//! Helper functions every expression can use: `exec`, `quote` and the
//! text-styling functions (`red`, `bold`, `bgBlue`, ...).

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use indexmap::IndexMap;
use owo_colors::Style;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::{get_property, to_js_string};
use crate::runner::ds::operations::type_conversion::{to_boolean, to_string};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;
use crate::runner::std_lib::json::stringify;

/// Names and styles of the styling helpers.
pub fn styles() -> Vec<(&'static str, Style)> {
    let plain = Style::new();
    vec![
        ("reset", plain),
        ("bold", plain.bold()),
        ("dim", plain.dimmed()),
        ("italic", plain.italic()),
        ("underline", plain.underline()),
        ("inverse", plain.reversed()),
        ("hidden", plain.hidden()),
        ("strikethrough", plain.strikethrough()),
        ("black", plain.black()),
        ("red", plain.red()),
        ("green", plain.green()),
        ("yellow", plain.yellow()),
        ("blue", plain.blue()),
        ("magenta", plain.magenta()),
        ("cyan", plain.cyan()),
        ("white", plain.white()),
        ("gray", plain.bright_black()),
        ("grey", plain.bright_black()),
        ("bgBlack", plain.on_black()),
        ("bgRed", plain.on_red()),
        ("bgGreen", plain.on_green()),
        ("bgYellow", plain.on_yellow()),
        ("bgBlue", plain.on_blue()),
        ("bgMagenta", plain.on_magenta()),
        ("bgCyan", plain.on_cyan()),
        ("bgWhite", plain.on_white()),
    ]
}

/// The helper layer of the sandbox namespace.
pub fn helpers(realm: &Realm, color: bool) -> IndexMap<String, JsValue> {
    let mut helpers = IndexMap::new();
    helpers.insert("exec".to_string(), exec_function(realm));
    helpers.insert("quote".to_string(), realm.new_native_function("quote", quote));
    for (name, style) in styles() {
        let function = realm.new_plugin_function(name, move |ctx, _this, args| {
            let text = match args.first() {
                Some(value) => to_js_string(ctx, value)?,
                None => String::new(),
            };
            Ok(JsValue::String(if color {
                style.style(text).to_string()
            } else {
                text
            }))
        });
        helpers.insert(name.to_string(), function);
    }
    helpers
}

/// `quote(value)`: the JSON text of `value`.
fn quote(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let value = args.first().cloned().unwrap_or(JsValue::Undefined);
    Ok(stringify(ctx, &value, &JsValue::Undefined, &JsValue::Undefined)?
        .map(JsValue::String)
        .unwrap_or(JsValue::Undefined))
}

fn exec_function(realm: &Realm) -> JsValue {
    let exec = realm.new_native_function("exec", exec);
    if let JsValue::Object(o) = &exec {
        o.borrow_mut()
            .set_own("with", realm.new_native_function("with", exec_with));
    }
    exec
}

/// Splits `exec` arguments into the command line and the options object.
fn command_and_options(ctx: &EvalContext, args: &[JsValue]) -> Result<(Option<String>, JsValue), JErrorType> {
    let mut command: Option<String> = None;
    let mut options: Option<JsValue> = None;
    for arg in args {
        match arg {
            JsValue::String(_) | JsValue::Number(_) | JsValue::Boolean(_) => {
                let part = to_string(arg);
                command = Some(match command {
                    Some(command) => format!("{} {}", command, part),
                    None => part,
                });
            }
            other if options.is_none() => options = Some(other.clone()),
            other => {
                let error = ctx
                    .realm
                    .new_error("Error", "Invalid or unexpected second options argument");
                if let JsValue::Object(o) = &error {
                    o.borrow_mut().set_own("argument", other.clone());
                }
                return Err(JErrorType::Thrown(error));
            }
        }
    }
    Ok((command, options.unwrap_or(JsValue::Undefined)))
}

/// `exec(...parts, options?)`: runs a shell command.
///
/// Synchronously the result is a String object holding stdout, with
/// `stdout`, `stderr` and `code` attached. With `{ async: true }` the child
/// is left running and `{ detached: true }` comes back at once.
fn exec(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let (command, options) = command_and_options(ctx, &args)?;
    let command = command.ok_or_else(|| JErrorType::TypeError("exec requires a command".to_string()))?;
    let detached = options.is_object() && to_boolean(&get_property(ctx, &options, "async")?);

    if detached {
        Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .process_group(0)
            .spawn()
            .map_err(|e| JErrorType::Thrown(ctx.realm.new_error("Error", &format!("spawn sh ENOENT: {}", e))))?;
        return Ok(ctx
            .realm
            .new_object_from(vec![("detached", JsValue::Boolean(true))]));
    }

    let output = Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| JErrorType::Thrown(ctx.realm.new_error("Error", &format!("spawnSync sh: {}", e))))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let code = output
        .status
        .code()
        .map(|c| JsValue::integer(c as i64))
        .unwrap_or(JsValue::Null);

    let result = if output.status.success() {
        ctx.realm.new_boxed_primitive(JsValue::String(stdout.clone()))
    } else {
        ctx.realm
            .new_error("Error", &format!("{} failed: {}", command, stderr))
    };
    if let JsValue::Object(o) = &result {
        let mut o = o.borrow_mut();
        o.set_own("stdout", JsValue::String(stdout));
        o.set_own("stderr", JsValue::String(stderr));
        o.set_own("status", code.clone());
        o.set_own("code", code);
    }
    if output.status.success() {
        Ok(result)
    } else {
        Err(JErrorType::Thrown(result))
    }
}

/// `exec.with(program, { quote = true })`: a function running
/// `program <args>`, the joined arguments passed as one JSON-quoted word.
fn exec_with(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let program = to_js_string(ctx, &args.first().cloned().unwrap_or(JsValue::Undefined))?;
    let options = args.get(1).cloned().unwrap_or(JsValue::Undefined);
    let quoted = if options.is_object() {
        match get_property(ctx, &options, "quote")? {
            JsValue::Undefined => true,
            other => to_boolean(&other),
        }
    } else {
        true
    };

    let name = program.clone();
    Ok(ctx.realm.new_plugin_function(&name, move |ctx, this, args| {
        let mut parts = Vec::with_capacity(args.len());
        for arg in &args {
            parts.push(if arg.is_nullish() {
                String::new()
            } else {
                to_js_string(ctx, arg)?
            });
        }
        let joined = parts.join(" ");
        let argument = if quoted {
            stringify(ctx, &JsValue::String(joined), &JsValue::Undefined, &JsValue::Undefined)?.unwrap_or_default()
        } else {
            joined
        };
        exec(ctx, this, vec![JsValue::String(format!("{} {}", program, argument))])
    }))
}
