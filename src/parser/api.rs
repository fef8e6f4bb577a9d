use std::rc::Rc;

use pest::error::{Error, ErrorVariant};
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Position, Span};
use pest_derive::Parser;

use super::ast::*;
use super::util::unescape_string;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

type BuildResult<T> = Result<T, Error<Rule>>;

impl JsParser {
    /// Parse a whole script (statement list), as used for module files.
    pub fn parse_to_ast_from_str(script: &str) -> BuildResult<ProgramData> {
        let mut pairs = JsParser::parse(Rule::script, script)?;
        let script_pair = pairs.next().ok_or_else(|| unexpected_end_of(script))?;
        let meta = meta_of(&script_pair);
        let span = script_pair.as_span();
        let mut inner = script_pair.into_inner();
        let statement_list = expect_next(&mut inner, span)?;
        Ok(ProgramData {
            meta,
            body: build_ast_from_statement_list(statement_list)?,
        })
    }

    /// Parse a single expression, as typed on the command line.
    pub fn parse_expression_from_str(source: &str) -> BuildResult<ExpressionType> {
        let mut pairs = JsParser::parse(Rule::expression_script, source)?;
        let script_pair = pairs.next().ok_or_else(|| unexpected_end_of(source))?;
        let span = script_pair.as_span();
        let mut inner = script_pair.into_inner();
        build_ast_from_expression(expect_next(&mut inner, span)?)
    }
}

fn unexpected_end_of(source: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: "Unexpected end of input".to_string(),
        },
        Position::from_start(source),
    )
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn custom_error(message: impl Into<String>, span: Span) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.into(),
        },
        span,
    )
}

fn expect_next<'i>(pairs: &mut Pairs<'i, Rule>, parent: Span<'i>) -> BuildResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| custom_error("Unexpected end of input", parent))
}

fn meta_of(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn get_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: meta_of(&pair),
        name: pair.as_str().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Statements

fn build_ast_from_statement_list(pair: Pair<Rule>) -> BuildResult<Vec<StatementType>> {
    pair.into_inner().map(build_ast_from_statement).collect()
}

fn get_declaration_kind(pair: &Pair<Rule>) -> BuildResult<VariableDeclarationKind> {
    Ok(match pair.as_str() {
        "var" => VariableDeclarationKind::Var,
        "let" => VariableDeclarationKind::Let,
        "const" => VariableDeclarationKind::Const,
        _ => return Err(get_unexpected_error(30, pair)),
    })
}

fn build_ast_from_statement(pair: Pair<Rule>) -> BuildResult<StatementType> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::block_statement => {
            let mut inner = pair.into_inner();
            StatementType::BlockStatement {
                meta,
                body: build_ast_from_statement_list(expect_next(&mut inner, span)?)?,
            }
        }
        Rule::variable_statement => {
            let mut inner = pair.into_inner();
            let kind = get_declaration_kind(&expect_next(&mut inner, span)?)?;
            let mut declarations = vec![];
            for declarator in inner {
                let declarator_span = declarator.as_span();
                let mut declarator_inner = declarator.into_inner();
                let id = get_identifier(expect_next(&mut declarator_inner, declarator_span)?);
                let init = match declarator_inner.next() {
                    Some(init_pair) => Some(build_ast_from_assignment_expression(init_pair)?),
                    None => None,
                };
                if init.is_none() && kind == VariableDeclarationKind::Const {
                    return Err(custom_error(
                        "Missing initializer in const declaration",
                        declarator_span,
                    ));
                }
                declarations.push(VariableDeclaratorData { id, init });
            }
            StatementType::VariableDeclaration {
                meta,
                kind,
                declarations,
            }
        }
        Rule::function_declaration => {
            StatementType::FunctionDeclaration(Rc::new(build_ast_from_function(pair)?))
        }
        Rule::if_statement => {
            let mut inner = pair.into_inner().filter(|p| {
                !matches!(p.as_rule(), Rule::kw_if | Rule::kw_else)
            });
            let test = build_ast_from_expression(inner.next().ok_or_else(|| custom_error("Expected condition", span))?)?;
            let consequent = build_ast_from_statement(inner.next().ok_or_else(|| custom_error("Expected statement", span))?)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test,
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::for_of_statement => {
            let mut inner = pair.into_inner().filter(|p| {
                !matches!(p.as_rule(), Rule::kw_for | Rule::kw_of)
            });
            let mut next = || inner.next().ok_or_else(|| custom_error("Incomplete for-of statement", span));
            let kind = get_declaration_kind(&next()?)?;
            let binding = get_identifier(next()?);
            let iterable = build_ast_from_assignment_expression(next()?)?;
            let body = build_ast_from_statement(next()?)?;
            StatementType::ForOfStatement {
                meta,
                kind,
                binding,
                iterable,
                body: Box::new(body),
            }
        }
        Rule::return_statement => {
            let argument = match pair.into_inner().find(|p| p.as_rule() == Rule::expression) {
                Some(p) => Some(build_ast_from_expression(p)?),
                None => None,
            };
            StatementType::ReturnStatement { meta, argument }
        }
        Rule::throw_statement => {
            let argument_pair = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::expression)
                .ok_or_else(|| custom_error("Expected expression after throw", span))?;
            StatementType::ThrowStatement {
                meta,
                argument: build_ast_from_expression(argument_pair)?,
            }
        }
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::expression_statement => {
            let mut inner = pair.into_inner();
            StatementType::ExpressionStatement {
                meta,
                expression: build_ast_from_expression(expect_next(&mut inner, span)?)?,
            }
        }
        _ => return Err(get_unexpected_error(22, &pair)),
    })
}

// ---------------------------------------------------------------------------
// Functions

/// Builds `function_declaration` and `function_expression` pairs.
fn build_ast_from_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut id = None;
    let mut params = None;
    let mut body = None;
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::kw_function => {}
            Rule::identifier => id = Some(get_identifier(inner_pair)),
            Rule::formal_parameters => params = Some(build_ast_from_formal_parameters(inner_pair)?),
            Rule::function_body => body = Some(build_ast_from_function_body(inner_pair)?),
            _ => return Err(get_unexpected_error(16, &inner_pair)),
        }
    }
    Ok(FunctionData {
        meta,
        id,
        params: params.unwrap_or_default(),
        body: FunctionBodyOrExpression::FunctionBody(
            body.ok_or_else(|| custom_error("Missing function body", span))?,
        ),
        is_arrow: false,
    })
}

fn build_ast_from_function_body(pair: Pair<Rule>) -> BuildResult<Vec<StatementType>> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    build_ast_from_statement_list(expect_next(&mut inner, span)?)
}

fn build_ast_from_formal_parameters(pair: Pair<Rule>) -> BuildResult<Vec<ParameterData>> {
    let list_span = pair.as_span();
    let mut params = vec![];
    for param in pair.into_inner() {
        let span = param.as_span();
        let mut inner = param.into_inner();
        let first = expect_next(&mut inner, span)?;
        params.push(match first.as_rule() {
            Rule::rest_parameter => {
                let rest_span = first.as_span();
                let mut rest_inner = first.into_inner();
                ParameterData::Rest(get_identifier(expect_next(&mut rest_inner, rest_span)?))
            }
            Rule::identifier => ParameterData::Simple {
                id: get_identifier(first),
                default: match inner.next() {
                    Some(default_pair) => Some(build_ast_from_assignment_expression(default_pair)?),
                    None => None,
                },
            },
            _ => return Err(get_unexpected_error(17, &first)),
        });
    }
    let rest_count = params
        .iter()
        .filter(|p| matches!(p, ParameterData::Rest(_)))
        .count();
    if rest_count > 1 || (rest_count == 1 && !matches!(params.last(), Some(ParameterData::Rest(_)))) {
        return Err(custom_error(
            "Rest parameter must be last formal parameter",
            list_span,
        ));
    }
    Ok(params)
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> BuildResult<FunctionData> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let params_pair = expect_next(&mut inner, span)?;
    let params_span = params_pair.as_span();
    let mut params_inner = params_pair.into_inner();
    let params = match params_inner.next() {
        Some(p) if p.as_rule() == Rule::identifier => vec![ParameterData::Simple {
            id: get_identifier(p),
            default: None,
        }],
        Some(p) if p.as_rule() == Rule::formal_parameters => build_ast_from_formal_parameters(p)?,
        Some(p) => return Err(get_unexpected_error(25, &p)),
        None => return Err(custom_error("Expected arrow parameters", params_span)),
    };
    let body_pair = expect_next(&mut inner, span)?;
    let body_span = body_pair.as_span();
    let mut body_inner = body_pair.into_inner();
    let body_content = expect_next(&mut body_inner, body_span)?;
    let body = match body_content.as_rule() {
        Rule::function_body => {
            FunctionBodyOrExpression::FunctionBody(build_ast_from_function_body(body_content)?)
        }
        Rule::assignment_expression => FunctionBodyOrExpression::Expression(Box::new(
            build_ast_from_assignment_expression(body_content)?,
        )),
        _ => return Err(get_unexpected_error(26, &body_content)),
    };
    Ok(FunctionData {
        meta,
        id: None,
        params,
        body,
        is_arrow: true,
    })
}

// ---------------------------------------------------------------------------
// Expressions

fn build_ast_from_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let mut expressions = pair
        .into_inner()
        .map(build_ast_from_assignment_expression)
        .collect::<BuildResult<Vec<_>>>()?;
    if expressions.len() == 1 {
        if let Some(only) = expressions.pop() {
            return Ok(only);
        }
    }
    Ok(ExpressionType::SequenceExpression { meta, expressions })
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner, span)?;
    match first.as_rule() {
        Rule::arrow_function => Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
            build_ast_from_arrow_function(first)?,
        ))),
        Rule::conditional_expression => {
            let left_span = first.as_span();
            let left = build_ast_from_operator_expression(first)?;
            match inner.next() {
                None => Ok(left),
                Some(op_pair) => {
                    if !left.is_assignment_target() {
                        return Err(custom_error(
                            "Invalid left-hand side in assignment",
                            left_span,
                        ));
                    }
                    let operator = match op_pair.as_str() {
                        "=" => AssignmentOperator::Equals,
                        "+=" => AssignmentOperator::AddEquals,
                        "-=" => AssignmentOperator::SubtractEquals,
                        "*=" => AssignmentOperator::MultiplyEquals,
                        "/=" => AssignmentOperator::DivideEquals,
                        "%=" => AssignmentOperator::ModuloEquals,
                        "**=" => AssignmentOperator::ExponentEquals,
                        "||=" => AssignmentOperator::OrEquals,
                        "&&=" => AssignmentOperator::AndEquals,
                        "??=" => AssignmentOperator::NullishEquals,
                        _ => return Err(get_unexpected_error(20, &op_pair)),
                    };
                    let right = build_ast_from_assignment_expression(expect_next(&mut inner, span)?)?;
                    Ok(ExpressionType::AssignmentExpression {
                        meta,
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                }
            }
        }
        _ => Err(get_unexpected_error(21, &first)),
    }
}

/// Builds everything from `conditional_expression` down to
/// `unary_expression`; each precedence level is its own rule.
fn build_ast_from_operator_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    match pair.as_rule() {
        Rule::conditional_expression => build_ast_from_conditional_expression(pair),
        Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::bitwise_or_expression
        | Rule::bitwise_xor_expression
        | Rule::bitwise_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::shift_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_ast_from_left_associative_expression(pair),
        Rule::exponentiation_expression => build_ast_from_exponentiation_expression(pair),
        Rule::unary_expression => build_ast_from_unary_expression(pair),
        _ => Err(get_unexpected_error(5, &pair)),
    }
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let test = build_ast_from_operator_expression(expect_next(&mut inner, span)?)?;
    match inner.next() {
        None => Ok(test),
        Some(consequent_pair) => {
            let consequent = build_ast_from_assignment_expression(consequent_pair)?;
            let alternate = build_ast_from_assignment_expression(expect_next(&mut inner, span)?)?;
            Ok(ExpressionType::ConditionalExpression {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        }
    }
}

fn build_ast_from_left_associative_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut left = build_ast_from_operator_expression(expect_next(&mut inner, span)?)?;
    while let Some(op_pair) = inner.next() {
        let right = build_ast_from_operator_expression(expect_next(&mut inner, span)?)?;
        let meta = Meta {
            start_index: left.get_meta().start_index,
            end_index: right.get_meta().end_index,
        };
        left = combine_binary(&op_pair, left, right, meta)?;
    }
    Ok(left)
}

fn combine_binary(
    op_pair: &Pair<Rule>,
    left: ExpressionType,
    right: ExpressionType,
    meta: Meta,
) -> BuildResult<ExpressionType> {
    let left = Box::new(left);
    let right = Box::new(right);
    let logical_operator = match op_pair.as_str() {
        "||" => Some(LogicalOperator::Or),
        "??" => Some(LogicalOperator::NullishCoalescing),
        "&&" => Some(LogicalOperator::And),
        _ => None,
    };
    if let Some(operator) = logical_operator {
        return Ok(ExpressionType::LogicalExpression {
            meta,
            operator,
            left,
            right,
        });
    }
    let operator = match op_pair.as_str() {
        "|" => BinaryOperator::BitwiseOr,
        "^" => BinaryOperator::BitwiseXor,
        "&" => BinaryOperator::BitwiseAnd,
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "instanceof" => BinaryOperator::InstanceOf,
        "in" => BinaryOperator::In,
        "<<" => BinaryOperator::BitwiseLeftShift,
        ">>" => BinaryOperator::BitwiseRightShift,
        ">>>" => BinaryOperator::BitwiseUnsignedRightShift,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        _ => return Err(get_unexpected_error(9, op_pair)),
    };
    Ok(ExpressionType::BinaryExpression {
        meta,
        operator,
        left,
        right,
    })
}

fn build_ast_from_exponentiation_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let base = build_ast_from_operator_expression(expect_next(&mut inner, span)?)?;
    match inner.next() {
        None => Ok(base),
        Some(exponent_pair) => Ok(ExpressionType::BinaryExpression {
            meta,
            operator: BinaryOperator::Exponent,
            left: Box::new(base),
            right: Box::new(build_ast_from_operator_expression(exponent_pair)?),
        }),
    }
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let mut inner_pairs: Vec<Pair<Rule>> = pair.into_inner().collect();
    let operand_pair = inner_pairs
        .pop()
        .ok_or_else(|| custom_error("Expected operand", span))?;
    let mut expression = build_ast_from_left_hand_side_expression(operand_pair)?;
    for op_pair in inner_pairs.into_iter().rev() {
        let operator = match op_pair.as_str() {
            "delete" => UnaryOperator::Delete,
            "void" => UnaryOperator::Void,
            "typeof" => UnaryOperator::TypeOf,
            "+" => UnaryOperator::Plus,
            "-" => UnaryOperator::Minus,
            "~" => UnaryOperator::BitwiseNot,
            "!" => UnaryOperator::LogicalNot,
            _ => return Err(get_unexpected_error(10, &op_pair)),
        };
        expression = ExpressionType::UnaryExpression {
            meta: Meta {
                start_index: op_pair.as_span().start(),
                end_index: expression.get_meta().end_index,
            },
            operator,
            argument: Box::new(expression),
        };
    }
    Ok(expression)
}

fn build_ast_from_left_hand_side_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let start_index = span.start();
    let mut inner = pair.into_inner();
    let first = expect_next(&mut inner, span)?;
    let mut obj = match first.as_rule() {
        Rule::new_expression => build_ast_from_new_expression(first)?,
        Rule::primary_expression => build_ast_from_primary_expression(first)?,
        _ => return Err(get_unexpected_error(4, &first)),
    };
    for tail in inner {
        let meta = Meta {
            start_index,
            end_index: tail.as_span().end(),
        };
        obj = apply_call_tail(obj, tail, meta)?;
    }
    Ok(obj)
}

fn apply_call_tail(obj: ExpressionType, tail: Pair<Rule>, meta: Meta) -> BuildResult<ExpressionType> {
    let span = tail.as_span();
    Ok(match tail.as_rule() {
        Rule::member | Rule::optional_member => {
            let optional = tail.as_rule() == Rule::optional_member;
            let mut inner = tail.into_inner();
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(obj),
                property: get_identifier(expect_next(&mut inner, span)?),
                optional,
            })
        }
        Rule::computed_member | Rule::optional_computed_member => {
            let optional = tail.as_rule() == Rule::optional_computed_member;
            let mut inner = tail.into_inner();
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(obj),
                property: Box::new(build_ast_from_expression(expect_next(&mut inner, span)?)?),
                optional,
            })
        }
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(obj),
            arguments: build_ast_from_arguments(tail)?,
            optional: false,
        },
        Rule::optional_call => {
            let mut inner = tail.into_inner();
            ExpressionType::CallExpression {
                meta,
                callee: Box::new(obj),
                arguments: build_ast_from_arguments(expect_next(&mut inner, span)?)?,
                optional: true,
            }
        }
        Rule::template_literal => ExpressionType::TaggedTemplateExpression {
            meta,
            tag: Box::new(obj),
            quasi: build_ast_from_template_literal(tail)?,
        },
        _ => return Err(get_unexpected_error(12, &tail)),
    })
}

fn build_ast_from_arguments(pair: Pair<Rule>) -> BuildResult<Vec<ExpressionOrSpreadElement>> {
    pair.into_inner().map(build_ast_from_argument).collect()
}

fn build_ast_from_argument(pair: Pair<Rule>) -> BuildResult<ExpressionOrSpreadElement> {
    Ok(match pair.as_rule() {
        Rule::spread_element => {
            let span = pair.as_span();
            let mut inner = pair.into_inner();
            ExpressionOrSpreadElement::SpreadElement(build_ast_from_assignment_expression(
                expect_next(&mut inner, span)?,
            )?)
        }
        Rule::assignment_expression => {
            ExpressionOrSpreadElement::Expression(build_ast_from_assignment_expression(pair)?)
        }
        _ => return Err(get_unexpected_error(14, &pair)),
    })
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut callee = None;
    let mut arguments = vec![];
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::kw_new => {}
            Rule::new_target => {
                let target_span = inner_pair.as_span();
                let mut target_inner = inner_pair.into_inner();
                let mut target =
                    build_ast_from_primary_expression(expect_next(&mut target_inner, target_span)?)?;
                for tail in target_inner {
                    let tail_meta = Meta {
                        start_index: target_span.start(),
                        end_index: tail.as_span().end(),
                    };
                    target = apply_call_tail(target, tail, tail_meta)?;
                }
                callee = Some(target);
            }
            Rule::arguments => arguments = build_ast_from_arguments(inner_pair)?,
            _ => return Err(get_unexpected_error(11, &inner_pair)),
        }
    }
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee.ok_or_else(|| custom_error("Expected constructor", span))?),
        arguments,
    })
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let inner_pair = expect_next(&mut inner, span)?;
    let meta = meta_of(&inner_pair);
    Ok(match inner_pair.as_rule() {
        Rule::kw_this => ExpressionType::ThisExpression { meta },
        Rule::literal => ExpressionType::Literal(build_ast_from_literal(inner_pair)?),
        Rule::array_literal => ExpressionType::ArrayExpression {
            meta,
            elements: inner_pair
                .into_inner()
                .map(build_ast_from_argument)
                .collect::<BuildResult<Vec<_>>>()?,
        },
        Rule::object_literal => build_ast_from_object_literal(inner_pair)?,
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(inner_pair)?))
        }
        Rule::template_literal => {
            ExpressionType::TemplateLiteral(build_ast_from_template_literal(inner_pair)?)
        }
        Rule::regular_expression_literal => {
            let regex_span = inner_pair.as_span();
            let mut regex_inner = inner_pair.into_inner();
            let pattern = expect_next(&mut regex_inner, regex_span)?.as_str().to_string();
            let flags = regex_inner
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            ExpressionType::Literal(LiteralData {
                meta,
                value: LiteralType::RegExpLiteral { pattern, flags },
            })
        }
        Rule::parenthesized_expression => {
            let paren_span = inner_pair.as_span();
            let mut paren_inner = inner_pair.into_inner();
            build_ast_from_expression(expect_next(&mut paren_inner, paren_span)?)?
        }
        Rule::identifier => ExpressionType::Identifier(get_identifier(inner_pair)),
        _ => return Err(get_unexpected_error(13, &inner_pair)),
    })
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> BuildResult<ExpressionType> {
    let meta = meta_of(&pair);
    let mut properties = vec![];
    for property_pair in pair.into_inner() {
        let span = property_pair.as_span();
        properties.push(match property_pair.as_rule() {
            Rule::spread_element => {
                let mut inner = property_pair.into_inner();
                PropertyData::Spread(build_ast_from_assignment_expression(expect_next(
                    &mut inner, span,
                )?)?)
            }
            Rule::property_assignment => {
                let mut inner = property_pair.into_inner();
                let key = build_ast_from_property_name(expect_next(&mut inner, span)?)?;
                let value = build_ast_from_assignment_expression(expect_next(&mut inner, span)?)?;
                PropertyData::Property { key, value }
            }
            Rule::method_definition => {
                let method_meta = meta_of(&property_pair);
                let mut inner = property_pair.into_inner();
                let key = build_ast_from_property_name(expect_next(&mut inner, span)?)?;
                let params = build_ast_from_formal_parameters(expect_next(&mut inner, span)?)?;
                let body = build_ast_from_function_body(expect_next(&mut inner, span)?)?;
                let id = match &key {
                    PropertyKeyType::Static(name) => Some(IdentifierData {
                        name: name.clone(),
                        meta: method_meta.clone(),
                    }),
                    PropertyKeyType::Computed(_) => None,
                };
                let function = FunctionData {
                    meta: method_meta,
                    id,
                    params,
                    body: FunctionBodyOrExpression::FunctionBody(body),
                    is_arrow: false,
                };
                PropertyData::Property {
                    key,
                    value: ExpressionType::FunctionExpression(Rc::new(function)),
                }
            }
            Rule::shorthand_property => {
                let mut inner = property_pair.into_inner();
                let id = get_identifier(expect_next(&mut inner, span)?);
                PropertyData::Property {
                    key: PropertyKeyType::Static(id.name.clone()),
                    value: ExpressionType::Identifier(id),
                }
            }
            _ => return Err(get_unexpected_error(15, &property_pair)),
        });
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}

fn build_ast_from_property_name(pair: Pair<Rule>) -> BuildResult<PropertyKeyType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let name_pair = expect_next(&mut inner, span)?;
    Ok(match name_pair.as_rule() {
        Rule::identifier_name => PropertyKeyType::Static(name_pair.as_str().to_string()),
        Rule::string_literal => PropertyKeyType::Static(build_ast_from_string_literal(name_pair)?),
        Rule::numeric_literal => {
            PropertyKeyType::Static(match build_ast_from_numeric_literal(name_pair)? {
                NumberLiteralType::IntegerLiteral(i) => i.to_string(),
                NumberLiteralType::FloatLiteral(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e21 => {
                    format!("{}", f as i64)
                }
                NumberLiteralType::FloatLiteral(f) => f.to_string(),
            })
        }
        Rule::computed_property_name => {
            let computed_span = name_pair.as_span();
            let mut computed_inner = name_pair.into_inner();
            PropertyKeyType::Computed(build_ast_from_assignment_expression(expect_next(
                &mut computed_inner,
                computed_span,
            )?)?)
        }
        _ => return Err(get_unexpected_error(23, &name_pair)),
    })
}

// ---------------------------------------------------------------------------
// Literals

fn build_ast_from_literal(pair: Pair<Rule>) -> BuildResult<LiteralData> {
    let meta = meta_of(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let inner_pair = expect_next(&mut inner, span)?;
    let value = match inner_pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(inner_pair.as_str() == "true"),
        Rule::numeric_literal => LiteralType::NumberLiteral(build_ast_from_numeric_literal(inner_pair)?),
        Rule::string_literal => LiteralType::StringLiteral(build_ast_from_string_literal(inner_pair)?),
        _ => return Err(get_unexpected_error(14, &inner_pair)),
    };
    Ok(LiteralData { meta, value })
}

fn build_ast_from_string_literal(pair: Pair<Rule>) -> BuildResult<String> {
    let span = pair.as_span();
    let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
    unescape_string(raw).map_err(|message| custom_error(message, span))
}

fn build_ast_from_template_literal(pair: Pair<Rule>) -> BuildResult<TemplateLiteralData> {
    let meta = meta_of(&pair);
    let mut quasis = vec![];
    let mut expressions = vec![];
    let mut current = String::new();
    for template_pair in pair.into_inner() {
        let span = template_pair.as_span();
        match template_pair.as_rule() {
            Rule::template_characters => {
                let cooked = unescape_string(template_pair.as_str())
                    .map_err(|message| custom_error(message, span))?;
                current.push_str(&cooked);
            }
            Rule::template_substitution => {
                quasis.push(std::mem::take(&mut current));
                let mut inner = template_pair.into_inner();
                expressions.push(build_ast_from_expression(expect_next(&mut inner, span)?)?);
            }
            _ => return Err(get_unexpected_error(3, &template_pair)),
        }
    }
    quasis.push(current);
    Ok(TemplateLiteralData {
        meta,
        quasis,
        expressions,
    })
}

fn build_ast_from_numeric_literal(pair: Pair<Rule>) -> BuildResult<NumberLiteralType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let inner_pair = expect_next(&mut inner, span)?;
    let text = inner_pair.as_str();
    let radix_literal = |digits: &str, radix: u32| match i64::from_str_radix(digits, radix) {
        Ok(i) => NumberLiteralType::IntegerLiteral(i),
        Err(_) => NumberLiteralType::FloatLiteral(digits.chars().fold(0_f64, |acc, c| {
            acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
        })),
    };
    Ok(match inner_pair.as_rule() {
        Rule::hex_integer_literal => radix_literal(&text[2..], 16),
        Rule::octal_integer_literal => radix_literal(&text[2..], 8),
        Rule::binary_integer_literal => radix_literal(&text[2..], 2),
        Rule::decimal_literal => {
            let is_float = text.contains(['.', 'e', 'E']);
            match (is_float, text.parse::<i64>()) {
                (false, Ok(i)) => NumberLiteralType::IntegerLiteral(i),
                _ => NumberLiteralType::FloatLiteral(
                    text.parse::<f64>()
                        .map_err(|e| custom_error(format!("Invalid number {}: {}", text, e), span))?,
                ),
            }
        }
        _ => return Err(get_unexpected_error(1, &inner_pair)),
    })
}
