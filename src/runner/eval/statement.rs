//! Statement execution.

use std::mem;

use crate::parser::ast::{ProgramData, StatementType, VariableDeclarationKind};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{nearest_function_scope, LexEnvironment};
use crate::runner::ds::operations::object::iterate_values;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::evaluate_expression;
use super::function::name_anonymous_function;
use super::types::{Completion, EvalResult, ValueResult};

/// Run a whole script in the current scope. The value is that of the last
/// expression statement, the way `eval` reports it.
pub fn execute_program(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    let completion = execute_body(&program.body, ctx)?;
    Ok(completion.get_value())
}

/// Run a function or script body: `var` names are hoisted to the nearest
/// function scope before anything runs.
pub fn execute_body(statements: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut var_names = vec![];
    for statement in statements {
        collect_var_names(statement, &mut var_names);
    }
    let scope = nearest_function_scope(&ctx.lex_env);
    for name in var_names {
        let declared = scope.borrow().has_own_binding(&name);
        if !declared {
            scope.borrow_mut().declare(&name, JsValue::Undefined, true);
        }
    }
    execute_statements(statements, ctx)
}

/// Execute a statement list in the current scope, with function
/// declarations hoisted.
pub fn execute_statements(statements: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    for statement in statements {
        if let StatementType::FunctionDeclaration(data) = statement {
            let function = ctx
                .realm
                .new_script_function(data.clone(), ctx.lex_env.clone(), None);
            ctx.declare_binding(data.name(), function, true);
        }
    }

    let mut last = Completion::normal();
    for statement in statements {
        let completion = execute_statement(statement, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if completion.value.is_some() {
            last = completion;
        }
    }
    Ok(last)
}

/// Execute a statement and return its completion.
pub fn execute_statement(statement: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match statement {
        StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement { body, .. } => {
            let scope = LexEnvironment::new(Some(ctx.lex_env.clone()));
            let saved = mem::replace(&mut ctx.lex_env, scope);
            let result = execute_statements(body, ctx);
            ctx.lex_env = saved;
            result
        }

        StatementType::VariableDeclaration {
            kind, declarations, ..
        } => {
            for declarator in declarations {
                let name = &declarator.id.name;
                match (&declarator.init, kind) {
                    // `var x;` leaves a hoisted value alone.
                    (None, VariableDeclarationKind::Var) => {}
                    (init, kind) => {
                        let value = match init {
                            Some(expr) => {
                                let value = evaluate_expression(expr, ctx)?;
                                name_anonymous_function(&value, name);
                                value
                            }
                            None => JsValue::Undefined,
                        };
                        declare(ctx, *kind, name, value);
                    }
                }
            }
            Ok(Completion::normal())
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                execute_statement(consequent, ctx)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)
            } else {
                Ok(Completion::normal())
            }
        }

        StatementType::ForOfStatement {
            kind,
            binding,
            iterable,
            body,
            ..
        } => {
            let items = iterate_values(&evaluate_expression(iterable, ctx)?)?;
            for item in items {
                let scope = LexEnvironment::new(Some(ctx.lex_env.clone()));
                let saved = mem::replace(&mut ctx.lex_env, scope);
                declare(ctx, *kind, &binding.name, item);
                let result = execute_statement(body, ctx);
                ctx.lex_env = saved;
                let completion = result?;
                if completion.is_abrupt() {
                    return Ok(completion);
                }
            }
            Ok(Completion::normal())
        }

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(expr) => evaluate_expression(expr, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }
    }
}

fn declare(ctx: &mut EvalContext, kind: VariableDeclarationKind, name: &str, value: JsValue) {
    match kind {
        VariableDeclarationKind::Var => {
            let scope = nearest_function_scope(&ctx.lex_env);
            scope.borrow_mut().declare(name, value, true);
        }
        VariableDeclarationKind::Let => ctx.declare_binding(name, value, true),
        VariableDeclarationKind::Const => ctx.declare_binding(name, value, false),
    }
}

fn collect_var_names(statement: &StatementType, names: &mut Vec<String>) {
    match statement {
        StatementType::VariableDeclaration {
            kind: VariableDeclarationKind::Var,
            declarations,
            ..
        } => names.extend(declarations.iter().map(|d| d.id.name.clone())),
        StatementType::BlockStatement { body, .. } => {
            for s in body {
                collect_var_names(s, names);
            }
        }
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, names);
            if let Some(alternate) = alternate {
                collect_var_names(alternate, names);
            }
        }
        StatementType::ForOfStatement {
            kind, binding, body, ..
        } => {
            if *kind == VariableDeclarationKind::Var {
                names.push(binding.name.clone());
            }
            collect_var_names(body, names);
        }
        _ => {}
    }
}
