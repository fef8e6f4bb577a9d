//! Expression evaluation.

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionOrSpreadElement, ExpressionType, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionType, NumberLiteralType, PropertyData,
    PropertyKeyType, TemplateLiteralData, UnaryOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::limits;
use crate::runner::ds::operations::object::{
    delete_property, get_property, has_property, instance_of, iterate_values, own_entries,
    set_property, to_js_number, to_js_string, to_primitive, PreferredType,
};
use crate::runner::ds::operations::test_and_comparison::{less_than, loose_equals, strict_equals};
use crate::runner::ds::operations::type_conversion::{
    to_boolean, to_int32, to_number, to_property_key, to_string, to_uint32, type_of,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{call_function, construct, is_callable, is_constructor, name_anonymous_function};
use super::types::{Reference, ValueResult};
use super::{STACK_RED_ZONE, STACK_SEGMENT};

/// Evaluate an expression to a value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || evaluate_node(expr, ctx))
}

fn evaluate_node(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(literal) => evaluate_literal(literal, ctx),

        ExpressionType::Identifier(id) => ctx.get_binding(&id.name),

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value.clone()),

        ExpressionType::ArrayExpression { elements, .. } => {
            let items = evaluate_list(elements, ctx)?;
            Ok(ctx.realm.new_array(items))
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_literal(properties, ctx)
        }

        ExpressionType::FunctionExpression(data) => {
            let name = data.id.as_ref().map(|id| id.name.clone());
            match name {
                // A named function expression can refer to itself.
                Some(name) => {
                    let scope = LexEnvironment::new(Some(ctx.lex_env.clone()));
                    let function = ctx.realm.new_script_function(data.clone(), scope.clone(), None);
                    scope.borrow_mut().declare(&name, function.clone(), false);
                    Ok(function)
                }
                None => Ok(ctx
                    .realm
                    .new_script_function(data.clone(), ctx.lex_env.clone(), None)),
            }
        }

        ExpressionType::ArrowFunctionExpression(data) => Ok(ctx.realm.new_script_function(
            data.clone(),
            ctx.lex_env.clone(),
            Some(ctx.this_value.clone()),
        )),

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary(*operator, argument, ctx),

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = evaluate_expression(left, ctx)?;
            let right = evaluate_expression(right, ctx)?;
            apply_binary_operator(*operator, left, right, ctx)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let left = evaluate_expression(left, ctx)?;
            if short_circuits(*operator, &left) {
                Ok(left)
            } else {
                evaluate_expression(right, ctx)
            }
        }

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment(*operator, left, right, ctx),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::CallExpression { .. } | ExpressionType::MemberExpression(_) => {
            Ok(evaluate_chain(expr, ctx)?
                .map(|(value, _)| value)
                .unwrap_or(JsValue::Undefined))
        }

        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let constructor = evaluate_expression(callee, ctx)?;
            let args = evaluate_list(arguments, ctx)?;
            if !is_constructor(&constructor) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    describe_callee(callee)
                )));
            }
            construct(ctx, &constructor, args)
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }

        ExpressionType::TemplateLiteral(template) => {
            evaluate_template(template, ctx).map(JsValue::String)
        }

        ExpressionType::TaggedTemplateExpression { tag, quasi, .. } => {
            let (function, this_value) =
                evaluate_chain(tag, ctx)?.unwrap_or((JsValue::Undefined, JsValue::Undefined));
            if !is_callable(&function) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    describe_callee(tag)
                )));
            }
            let cooked: Vec<JsValue> = quasi.quasis.iter().map(|q| JsValue::from(q.as_str())).collect();
            let strings = ctx.realm.new_array(cooked.clone());
            let raw = ctx.realm.new_array(cooked);
            set_property(ctx, &strings, "raw", raw)?;
            let mut args = vec![strings];
            for e in &quasi.expressions {
                args.push(evaluate_expression(e, ctx)?);
            }
            call_function(ctx, &function, this_value, args)
        }
    }
}

fn evaluate_literal(literal: &LiteralData, ctx: &mut EvalContext) -> ValueResult {
    Ok(match &literal.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::number(*i as f64),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::number(*f),
        LiteralType::RegExpLiteral { pattern, flags } => ctx.realm.new_regexp(pattern, flags)?,
    })
}

/// Arguments and array elements, with spread elements expanded.
fn evaluate_list(elements: &[ExpressionOrSpreadElement], ctx: &mut EvalContext) -> Result<Vec<JsValue>, JErrorType> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            ExpressionOrSpreadElement::Expression(e) => values.push(evaluate_expression(e, ctx)?),
            ExpressionOrSpreadElement::SpreadElement(e) => {
                let spread = evaluate_expression(e, ctx)?;
                values.extend(iterate_values(&spread)?);
            }
        }
    }
    Ok(values)
}

fn evaluate_object_literal(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let obj = ctx.realm.new_object();
    for property in properties {
        match property {
            PropertyData::Property { key, value } => {
                let key = match key {
                    PropertyKeyType::Static(name) => name.clone(),
                    PropertyKeyType::Computed(e) => {
                        let key = evaluate_expression(e, ctx)?;
                        property_key(&key, ctx)?
                    }
                };
                let value = evaluate_expression(value, ctx)?;
                name_anonymous_function(&value, &key);
                obj.borrow_mut().set_own(&key, value);
            }
            PropertyData::Spread(e) => {
                let source = evaluate_expression(e, ctx)?;
                for (key, value) in own_entries(&source) {
                    obj.borrow_mut().set_own(&key, value);
                }
            }
        }
    }
    Ok(JsValue::Object(obj))
}

fn evaluate_template(template: &TemplateLiteralData, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    let mut out = String::new();
    for (i, quasi) in template.quasis.iter().enumerate() {
        out = limits::concat(out, quasi)?;
        if let Some(e) = template.expressions.get(i) {
            let value = evaluate_expression(e, ctx)?;
            out = limits::concat(out, &to_js_string(ctx, &value)?)?;
        }
    }
    Ok(out)
}

fn property_key(key: &JsValue, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    match key {
        JsValue::Object(_) => to_js_string(ctx, key),
        other => Ok(to_property_key(other)),
    }
}

/// Evaluates a member/call chain. `None` means an optional link
/// (`?.`) met `null`/`undefined` and the rest of the chain was skipped.
/// The second value is the `this` a call through this expression gets.
fn evaluate_chain(expr: &ExpressionType, ctx: &mut EvalContext) -> Result<Option<(JsValue, JsValue)>, JErrorType> {
    match expr {
        ExpressionType::MemberExpression(member) => {
            let (object, optional) = match member {
                MemberExpressionType::SimpleMemberExpression { object, optional, .. }
                | MemberExpressionType::ComputedMemberExpression { object, optional, .. } => {
                    (object, *optional)
                }
            };
            let base = match evaluate_chain(object, ctx)? {
                Some((base, _)) => base,
                None => return Ok(None),
            };
            if optional && base.is_nullish() {
                return Ok(None);
            }
            let key = match member {
                MemberExpressionType::SimpleMemberExpression { property, .. } => property.name.clone(),
                MemberExpressionType::ComputedMemberExpression { property, .. } => {
                    let key = evaluate_expression(property, ctx)?;
                    property_key(&key, ctx)?
                }
            };
            let value = get_property(ctx, &base, &key)?;
            Ok(Some((value, base)))
        }
        ExpressionType::CallExpression {
            callee,
            arguments,
            optional,
            ..
        } => {
            let (function, this_value) = match evaluate_chain(callee, ctx)? {
                Some(pair) => pair,
                None => return Ok(None),
            };
            if *optional && function.is_nullish() {
                return Ok(None);
            }
            let args = evaluate_list(arguments, ctx)?;
            if !is_callable(&function) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    describe_callee(callee)
                )));
            }
            let result = call_function(ctx, &function, this_value, args)?;
            Ok(Some((result, JsValue::Undefined)))
        }
        other => Ok(Some((evaluate_expression(other, ctx)?, JsValue::Undefined))),
    }
}

/// Source-like rendering of a callee for error messages.
fn describe_callee(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.clone(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe_callee(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", describe_callee(object)),
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}

fn evaluate_unary(operator: UnaryOperator, argument: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            let value = match argument {
                ExpressionType::Identifier(id) => ctx.get_binding_tolerant(&id.name)?,
                other => evaluate_expression(other, ctx)?,
            };
            Ok(JsValue::from(type_of(&value)))
        }
        UnaryOperator::Delete => match to_reference(argument, ctx)? {
            Some(Reference::Property { base, key }) => Ok(JsValue::Boolean(delete_property(&base, &key)?)),
            _ => {
                evaluate_expression(argument, ctx)?;
                Ok(JsValue::Boolean(true))
            }
        },
        UnaryOperator::Void => {
            evaluate_expression(argument, ctx)?;
            Ok(JsValue::Undefined)
        }
        UnaryOperator::LogicalNot => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::Boolean(!to_boolean(&value)))
        }
        UnaryOperator::Minus => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(-to_js_number(ctx, &value)?))
        }
        UnaryOperator::Plus => {
            let value = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(to_js_number(ctx, &value)?))
        }
        UnaryOperator::BitwiseNot => {
            let value = evaluate_expression(argument, ctx)?;
            let n = to_js_number(ctx, &value)?;
            Ok(JsValue::number(!to_int32(&JsValue::number(n)) as f64))
        }
    }
}

fn short_circuits(operator: LogicalOperator, left: &JsValue) -> bool {
    match operator {
        LogicalOperator::And => !to_boolean(left),
        LogicalOperator::Or => to_boolean(left),
        LogicalOperator::NullishCoalescing => !left.is_nullish(),
    }
}

/// Apply a binary operator to two evaluated operands.
pub fn apply_binary_operator(
    operator: BinaryOperator,
    left: JsValue,
    right: JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    let numeric = |ctx: &mut EvalContext, f: fn(f64, f64) -> f64| -> ValueResult {
        let a = to_js_number(ctx, &left)?;
        let b = to_js_number(ctx, &right)?;
        Ok(JsValue::number(f(a, b)))
    };
    let int32 = |ctx: &mut EvalContext, f: fn(i32, i32) -> i32| -> ValueResult {
        let a = to_int32(&JsValue::number(to_js_number(ctx, &left)?));
        let b = to_int32(&JsValue::number(to_js_number(ctx, &right)?));
        Ok(JsValue::number(f(a, b) as f64))
    };

    match operator {
        BinaryOperator::Add => {
            let a = to_primitive(ctx, &left, PreferredType::Default)?;
            let b = to_primitive(ctx, &right, PreferredType::Default)?;
            if matches!(a, JsValue::String(_)) || matches!(b, JsValue::String(_)) {
                Ok(JsValue::String(limits::concat(to_string(&a), &to_string(&b))?))
            } else {
                Ok(JsValue::number(to_number(&a) + to_number(&b)))
            }
        }
        BinaryOperator::Subtract => numeric(ctx, |a, b| a - b),
        BinaryOperator::Multiply => numeric(ctx, |a, b| a * b),
        BinaryOperator::Divide => numeric(ctx, |a, b| a / b),
        BinaryOperator::Modulo => numeric(ctx, |a, b| a % b),
        BinaryOperator::Exponent => numeric(ctx, exponent),

        BinaryOperator::BitwiseAnd => int32(ctx, |a, b| a & b),
        BinaryOperator::BitwiseOr => int32(ctx, |a, b| a | b),
        BinaryOperator::BitwiseXor => int32(ctx, |a, b| a ^ b),
        BinaryOperator::BitwiseLeftShift => int32(ctx, |a, b| a.wrapping_shl(b as u32 & 31)),
        BinaryOperator::BitwiseRightShift => int32(ctx, |a, b| a.wrapping_shr(b as u32 & 31)),
        BinaryOperator::BitwiseUnsignedRightShift => {
            let a = to_uint32(&JsValue::number(to_js_number(ctx, &left)?));
            let b = to_uint32(&JsValue::number(to_js_number(ctx, &right)?));
            Ok(JsValue::number((a >> (b & 31)) as f64))
        }

        BinaryOperator::LooselyEqual => Ok(JsValue::Boolean(loose_equals(&left, &right))),
        BinaryOperator::LooselyUnequal => Ok(JsValue::Boolean(!loose_equals(&left, &right))),
        BinaryOperator::StrictlyEqual => Ok(JsValue::Boolean(strict_equals(&left, &right))),
        BinaryOperator::StrictlyUnequal => Ok(JsValue::Boolean(!strict_equals(&left, &right))),

        BinaryOperator::LessThan
        | BinaryOperator::LessThanEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanEqual => {
            let a = to_primitive(ctx, &left, PreferredType::Number)?;
            let b = to_primitive(ctx, &right, PreferredType::Number)?;
            let result = match operator {
                BinaryOperator::LessThan => less_than(&a, &b) == Some(true),
                BinaryOperator::GreaterThan => less_than(&b, &a) == Some(true),
                BinaryOperator::LessThanEqual => less_than(&b, &a) == Some(false),
                _ => less_than(&a, &b) == Some(false),
            };
            Ok(JsValue::Boolean(result))
        }

        BinaryOperator::In => {
            let key = property_key(&left, ctx)?;
            Ok(JsValue::Boolean(has_property(ctx, &right, &key)?))
        }
        BinaryOperator::InstanceOf => Ok(JsValue::Boolean(instance_of(ctx, &left, &right)?)),
    }
}

/// `**`, including the cases where IEEE `pow` and JavaScript disagree.
fn exponent(base: f64, exp: f64) -> f64 {
    if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exp)
    }
}

fn to_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> Result<Option<Reference>, JErrorType> {
    match expr {
        ExpressionType::Identifier(id) => Ok(Some(Reference::Binding(id.name.clone()))),
        ExpressionType::MemberExpression(member) => {
            let (base, key) = match member {
                MemberExpressionType::SimpleMemberExpression { object, property, .. } => {
                    (evaluate_expression(object, ctx)?, property.name.clone())
                }
                MemberExpressionType::ComputedMemberExpression { object, property, .. } => {
                    let base = evaluate_expression(object, ctx)?;
                    let key = evaluate_expression(property, ctx)?;
                    (base, property_key(&key, ctx)?)
                }
            };
            Ok(Some(Reference::Property { base, key }))
        }
        _ => Ok(None),
    }
}

fn get_value(reference: &Reference, ctx: &mut EvalContext) -> ValueResult {
    match reference {
        Reference::Binding(name) => ctx.get_binding(name),
        Reference::Property { base, key } => get_property(ctx, base, key),
    }
}

fn put_value(reference: &Reference, value: JsValue, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match reference {
        Reference::Binding(name) => ctx.set_binding(name, value),
        Reference::Property { base, key } => set_property(ctx, base, key, value),
    }
}

fn evaluate_assignment(
    operator: AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = match to_reference(left, ctx)? {
        Some(r) => r,
        None => {
            return Err(JErrorType::SyntaxError(
                "Invalid left-hand side in assignment".to_string(),
            ))
        }
    };

    let value = match operator {
        AssignmentOperator::Equals => {
            let value = evaluate_expression(right, ctx)?;
            if let Reference::Binding(name) = &reference {
                name_anonymous_function(&value, name);
            }
            value
        }
        AssignmentOperator::OrEquals | AssignmentOperator::AndEquals | AssignmentOperator::NullishEquals => {
            let current = get_value(&reference, ctx)?;
            let logical = match operator {
                AssignmentOperator::OrEquals => LogicalOperator::Or,
                AssignmentOperator::AndEquals => LogicalOperator::And,
                _ => LogicalOperator::NullishCoalescing,
            };
            if short_circuits(logical, &current) {
                return Ok(current);
            }
            evaluate_expression(right, ctx)?
        }
        compound => {
            let current = get_value(&reference, ctx)?;
            let operand = evaluate_expression(right, ctx)?;
            let binary = match compound {
                AssignmentOperator::AddEquals => BinaryOperator::Add,
                AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
                AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
                AssignmentOperator::DivideEquals => BinaryOperator::Divide,
                AssignmentOperator::ModuloEquals => BinaryOperator::Modulo,
                _ => BinaryOperator::Exponent,
            };
            apply_binary_operator(binary, current, operand, ctx)?
        }
    };

    put_value(&reference, value.clone(), ctx)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::api::eval_expression;

    fn eval(source: &str) -> JsValue {
        let mut ctx = EvalContext::new();
        eval_expression(source, &mut ctx).unwrap()
    }

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(eval("1 + 2 * 3"), JsValue::integer(7));
        assert_eq!(eval("'a' + 1 + 2"), JsValue::string("a12"));
        assert_eq!(eval("1 + 2 + 'a'"), JsValue::string("3a"));
        assert_eq!(eval("2 ** 3 ** 2"), JsValue::integer(512));
        assert_eq!(eval("7 % -3"), JsValue::integer(1));
        assert_eq!(eval("-1 >>> 28"), JsValue::integer(15));
    }

    #[test]
    fn optional_chains_short_circuit() {
        assert_eq!(eval("null?.a.b.c"), JsValue::Undefined);
        assert_eq!(eval("({a: null}).a?.()"), JsValue::Undefined);
        assert_eq!(eval("({a: {b: 2}})?.a['b']"), JsValue::integer(2));
    }

    #[test]
    fn calling_a_non_function_names_the_callee() {
        let mut ctx = EvalContext::new();
        let err = eval_expression("Math.nope(1)", &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Math.nope is not a function");
    }

    #[test]
    fn typeof_undeclared_does_not_throw() {
        assert_eq!(eval("typeof notDeclaredAnywhere"), JsValue::string("undefined"));
        assert_eq!(eval("typeof (() => 1)"), JsValue::string("function"));
    }

    #[test]
    fn logical_assignment() {
        assert_eq!(eval("((o) => (o.a ??= 5, o.a ||= 6, o.a))({})"), JsValue::integer(5));
    }

    #[test]
    fn template_literals_interpolate() {
        assert_eq!(eval("`a${1 + 1}b${[1, 2]}`"), JsValue::string("a2b1,2"));
    }
}
