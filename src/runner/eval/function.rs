//! Function call execution.
//!
//! Built-ins run directly; script functions get a fresh function scope
//! chained to the environment they closed over.

use std::mem;
use std::rc::Rc;

use crate::parser::ast::{FunctionBodyOrExpression, FunctionData, ParameterData};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{EnvironmentType, LexEnvironment};
use crate::runner::ds::object::{FunctionKind, JsObject, ObjectData};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{BuiltInFn, EvalContext};

use super::expression::evaluate_expression;
use super::statement::execute_body;
use super::types::{CompletionType, ValueResult};
use super::{STACK_RED_ZONE, STACK_SEGMENT};

enum CallTarget {
    BuiltIn(BuiltInFn),
    Script {
        data: Rc<FunctionData>,
        env: EnvironmentType,
        captured_this: Option<JsValue>,
    },
}

fn call_target(callee: &JsValue) -> Option<CallTarget> {
    let obj = callee.as_object()?;
    let obj_ref = obj.borrow();
    match &obj_ref.data {
        ObjectData::Function(f) => Some(match &f.kind {
            FunctionKind::BuiltIn(b) => CallTarget::BuiltIn(b.clone()),
            FunctionKind::Script(closure) => CallTarget::Script {
                data: closure.data.clone(),
                env: closure.env.clone(),
                captured_this: closure.this_value.clone(),
            },
        }),
        _ => None,
    }
}

/// Check if a value is callable.
pub fn is_callable(value: &JsValue) -> bool {
    value
        .as_object()
        .map(|o| o.borrow().is_callable())
        .unwrap_or(false)
}

/// Check if a value can be used with `new`: non-arrow script functions and
/// built-ins that carry a `prototype`.
pub fn is_constructor(value: &JsValue) -> bool {
    let obj = match value.as_object() {
        Some(o) => o,
        None => return false,
    };
    let obj_ref = obj.borrow();
    match &obj_ref.data {
        ObjectData::Function(f) => match &f.kind {
            FunctionKind::Script(closure) => !closure.data.is_arrow,
            FunctionKind::BuiltIn(_) => obj_ref.properties.contains_key("prototype"),
        },
        _ => false,
    }
}

/// Call `callee` with the given `this` and arguments.
pub fn call_function(
    ctx: &mut EvalContext,
    callee: &JsValue,
    this_value: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let target = match call_target(callee) {
        Some(t) => t,
        None => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                to_string(callee)
            )))
        }
    };
    ctx.enter_call()?;
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || match target {
        CallTarget::BuiltIn(f) => {
            let saved = ctx.new_target.take();
            let result = f.call(ctx, this_value, args);
            ctx.new_target = saved;
            result
        }
        CallTarget::Script {
            data,
            env,
            captured_this,
        } => {
            let this_value = captured_this.unwrap_or(this_value);
            call_script_function(ctx, &data, env, this_value, args, None)
        }
    });
    ctx.exit_call();
    result
}

/// `new callee(...args)`.
pub fn construct(ctx: &mut EvalContext, callee: &JsValue, args: Vec<JsValue>) -> ValueResult {
    if !is_constructor(callee) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a constructor",
            to_string(callee)
        )));
    }
    let proto = match callee.as_object().and_then(|c| c.borrow().get_own("prototype")) {
        Some(JsValue::Object(p)) => p,
        _ => ctx.realm.object_prototype.clone(),
    };
    let instance = JsValue::Object(JsObject::new(ObjectData::Ordinary, Some(proto)).into_shared());
    let target = match call_target(callee) {
        Some(t) => t,
        None => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a constructor",
                to_string(callee)
            )))
        }
    };

    ctx.enter_call()?;
    let result = match target {
        CallTarget::BuiltIn(f) => {
            let saved = mem::replace(&mut ctx.new_target, Some(callee.clone()));
            let result = f.call(ctx, instance.clone(), args);
            ctx.new_target = saved;
            result
        }
        CallTarget::Script { data, env, .. } => {
            call_script_function(ctx, &data, env, instance.clone(), args, Some(callee.clone()))
        }
    };
    ctx.exit_call();

    match result? {
        value @ JsValue::Object(_) => Ok(value),
        _ => Ok(instance),
    }
}

fn call_script_function(
    ctx: &mut EvalContext,
    data: &Rc<FunctionData>,
    closure_env: EnvironmentType,
    this_value: JsValue,
    args: Vec<JsValue>,
    new_target: Option<JsValue>,
) -> ValueResult {
    let scope = LexEnvironment::new_function_scope(Some(closure_env));
    if !data.is_arrow {
        let arguments = ctx.realm.new_array(args.clone());
        scope.borrow_mut().declare("arguments", arguments, true);
    }

    let saved_env = mem::replace(&mut ctx.lex_env, scope);
    let saved_this = mem::replace(&mut ctx.this_value, this_value);
    let saved_new_target = if data.is_arrow {
        ctx.new_target.clone()
    } else {
        mem::replace(&mut ctx.new_target, new_target)
    };

    let result = bind_parameters(ctx, &data.params, args).and_then(|_| run_body(ctx, &data.body));

    ctx.lex_env = saved_env;
    ctx.this_value = saved_this;
    ctx.new_target = saved_new_target;
    result
}

fn bind_parameters(ctx: &mut EvalContext, params: &[ParameterData], args: Vec<JsValue>) -> Result<(), JErrorType> {
    let mut args = args.into_iter();
    for param in params {
        match param {
            ParameterData::Simple { id, default } => {
                let mut value = args.next().unwrap_or(JsValue::Undefined);
                if let Some(default) = default.as_ref().filter(|_| matches!(value, JsValue::Undefined)) {
                    value = evaluate_expression(default, ctx)?;
                    name_anonymous_function(&value, &id.name);
                }
                ctx.declare_binding(&id.name, value, true);
            }
            ParameterData::Rest(id) => {
                let rest = ctx.realm.new_array(args.by_ref().collect());
                ctx.declare_binding(&id.name, rest, true);
            }
        }
    }
    Ok(())
}

fn run_body(ctx: &mut EvalContext, body: &FunctionBodyOrExpression) -> ValueResult {
    match body {
        FunctionBodyOrExpression::Expression(expr) => evaluate_expression(expr, ctx),
        FunctionBodyOrExpression::FunctionBody(statements) => {
            let completion = execute_body(statements, ctx)?;
            Ok(match completion.completion_type {
                CompletionType::Return => completion.get_value(),
                CompletionType::Normal => JsValue::Undefined,
            })
        }
    }
}

/// `const f = () => {}` names the function `f`.
pub fn name_anonymous_function(value: &JsValue, name: &str) {
    if let JsValue::Object(obj) = value {
        if let ObjectData::Function(f) = &mut obj.borrow_mut().data {
            if f.name.is_empty() {
                f.name = name.to_string();
            }
        }
    }
}
