use super::api::JsParser;
use super::api::Rule;
use super::ast::*;

use pest::consumes_to;
use pest::parses_to;
use std::time::Instant;

fn parse_expr(source: &str) -> ExpressionType {
    match JsParser::parse_expression_from_str(source) {
        Ok(e) => e,
        Err(e) => panic!("Failed to parse {:?}: {}", source, e),
    }
}

// ── Token level ──────────────────────────────────────────────

#[test]
fn test_decimal_number_with_no_dot() {
    parses_to! {
        parser: JsParser,
        input: "10",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 2, [
                decimal_literal(0, 2)
            ])
        ]
    };
}

#[test]
fn test_decimal_number_with_trailing_dot() {
    parses_to! {
        parser: JsParser,
        input: "4.",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 2, [
                decimal_literal(0, 2)
            ])
        ]
    };
}

#[test]
fn test_hex_number() {
    parses_to! {
        parser: JsParser,
        input: "0xFF",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 4, [
                hex_integer_literal(0, 4)
            ])
        ]
    };
}

#[test]
fn test_string_single_quoted() {
    parses_to! {
        parser: JsParser,
        input: r#"'it\'s'"#,
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 7, [
                single_string_characters(1, 6)
            ])
        ]
    };
}

#[test]
fn test_regex_with_flags() {
    parses_to! {
        parser: JsParser,
        input: "/a[/]+/gi",
        rule: Rule::regular_expression_literal,
        tokens: [
            regular_expression_literal(0, 9, [
                regular_expression_body(1, 6),
                regular_expression_flags(7, 9)
            ])
        ]
    };
}

// ── Expressions ──────────────────────────────────────────────

#[test]
fn test_number_literals() {
    match parse_expr("42") {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(42)),
            ..
        }) => {}
        other => panic!("unexpected {:?}", other),
    }
    match parse_expr("1.5e3") {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)),
            ..
        }) => assert_eq!(f, 1500.0),
        other => panic!("unexpected {:?}", other),
    }
    match parse_expr("0b101") {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(5)),
            ..
        }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_string_escapes_are_cooked() {
    match parse_expr(r#""a\tb""#) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) => assert_eq!(s, "a\tb"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_precedence_multiplication_binds_tighter() {
    match parse_expr("1 + 2 * 3") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    match parse_expr("10 - 4 - 3") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Subtract,
            left,
            ..
        } => assert!(matches!(
            *left,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Subtract,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    match parse_expr("2 ** 3 ** 2") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Exponent,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Exponent,
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_nullish_and_logical() {
    match parse_expr("a ?? b || c") {
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::NullishCoalescing,
            ..
        }
        | ExpressionType::LogicalExpression {
            operator: LogicalOperator::Or,
            ..
        } => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_arrow_with_expression_body() {
    match parse_expr("$it => $it.name") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert_eq!(f.params.len(), 1);
            assert!(matches!(f.body, FunctionBodyOrExpression::Expression(_)));
            assert!(f.is_arrow);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_arrow_with_block_body_and_rest() {
    match parse_expr("(a, b = 2, ...rest) => { return a + b; }") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert_eq!(f.params.len(), 3);
            assert!(matches!(f.params[2], ParameterData::Rest(_)));
            assert!(matches!(
                f.params[1],
                ParameterData::Simple {
                    default: Some(_),
                    ..
                }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_rest_parameter_must_be_last() {
    assert!(JsParser::parse_expression_from_str("(...a, b) => a").is_err());
}

#[test]
fn test_member_chain_and_call() {
    match parse_expr("a.b[0].c(1, ...xs)") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(arguments[1], ExpressionOrSpreadElement::SpreadElement(_)));
            assert!(matches!(
                *callee,
                ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression { .. })
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_optional_chaining() {
    match parse_expr("a?.b") {
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            optional,
            ..
        }) => assert!(optional),
        other => panic!("unexpected {:?}", other),
    }
    match parse_expr("f?.(1)") {
        ExpressionType::CallExpression { optional, .. } => assert!(optional),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_conditional_is_not_optional_chain() {
    assert!(matches!(
        parse_expr("a ? .5 : 1"),
        ExpressionType::ConditionalExpression { .. }
    ));
}

#[test]
fn test_object_literal_forms() {
    match parse_expr("({ a: 1, 'b c': 2, [k]: 3, d, m() { return 1 }, ...rest })") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 6);
            assert!(matches!(
                &properties[1],
                PropertyData::Property { key: PropertyKeyType::Static(k), .. } if k == "b c"
            ));
            assert!(matches!(
                &properties[2],
                PropertyData::Property {
                    key: PropertyKeyType::Computed(_),
                    ..
                }
            ));
            assert!(matches!(
                &properties[4],
                PropertyData::Property {
                    value: ExpressionType::FunctionExpression(_),
                    ..
                }
            ));
            assert!(matches!(&properties[5], PropertyData::Spread(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_template_literal_quasis() {
    match parse_expr("`a${1}b${2}`") {
        ExpressionType::TemplateLiteral(t) => {
            assert_eq!(t.quasis, vec!["a".to_string(), "b".to_string(), "".to_string()]);
            assert_eq!(t.expressions.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_tagged_template() {
    assert!(matches!(
        parse_expr("tag`x${y}`"),
        ExpressionType::TaggedTemplateExpression { .. }
    ));
}

#[test]
fn test_new_with_member_target() {
    match parse_expr("new a.B(1).c") {
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        }) => match *object {
            ExpressionType::NewExpression { arguments, .. } => assert_eq!(arguments.len(), 1),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_number_member_access() {
    assert!(matches!(
        parse_expr("4..constructor"),
        ExpressionType::MemberExpression(_)
    ));
}

#[test]
fn test_regex_vs_division() {
    assert!(matches!(
        parse_expr("a / b / c"),
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Divide,
            ..
        }
    ));
    assert!(matches!(
        parse_expr("/ab+c/i"),
        ExpressionType::Literal(LiteralData {
            value: LiteralType::RegExpLiteral { .. },
            ..
        })
    ));
}

#[test]
fn test_assignment_operators() {
    assert!(matches!(
        parse_expr("x ??= 4"),
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::NullishEquals,
            ..
        }
    ));
    assert!(JsParser::parse_expression_from_str("1 = 2").is_err());
}

#[test]
fn test_sequence_expression() {
    match parse_expr("a, b, c") {
        ExpressionType::SequenceExpression { expressions, .. } => assert_eq!(expressions.len(), 3),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_typeof_keyword_prefix_is_identifier() {
    match parse_expr("typeofFoo") {
        ExpressionType::Identifier(id) => assert_eq!(id.name, "typeofFoo"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_trailing_garbage_is_error() {
    assert!(JsParser::parse_expression_from_str("a b").is_err());
    assert!(JsParser::parse_expression_from_str("").is_err());
}

// ── Scripts ──────────────────────────────────────────────────

#[test]
fn test_script_statements() {
    let program = JsParser::parse_to_ast_from_str(
        r#"
        const path = require("path");
        function add(a, b) { return a + b }
        let total = 0;
        for (const n of [1, 2, 3]) { total += n; }
        if (total > 3) total = add(total, 1); else { throw new Error("small"); }
        module.exports = { add, total };
        "#,
    )
    .unwrap();
    assert_eq!(program.body.len(), 6);
    assert!(matches!(
        program.body[0],
        StatementType::VariableDeclaration {
            kind: VariableDeclarationKind::Const,
            ..
        }
    ));
    assert!(matches!(program.body[1], StatementType::FunctionDeclaration(_)));
    assert!(matches!(program.body[3], StatementType::ForOfStatement { .. }));
    assert!(matches!(
        program.body[4],
        StatementType::IfStatement {
            alternate: Some(_),
            ..
        }
    ));
    assert!(matches!(program.body[5], StatementType::ExpressionStatement { .. }));
}

#[test]
fn test_const_requires_initializer() {
    assert!(JsParser::parse_to_ast_from_str("const x;").is_err());
}

#[test]
fn test_comments_are_skipped() {
    let program = JsParser::parse_to_ast_from_str("// one\n/* two */ 1;").unwrap();
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_perf_nested_parens() {
    let start = Instant::now();
    let result = JsParser::parse_expression_from_str("((((((((((1))))))))))");
    let end = Instant::now();
    match result {
        Ok(_) => {
            assert!(
                end.saturating_duration_since(start).as_millis() < 800,
                "Expression taking too long to parse."
            );
        }
        Err(e) => {
            panic!("There was an error {}", e);
        }
    }
}
