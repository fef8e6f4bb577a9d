//! Source-to-value entry points.

use pest::error::Error;

use crate::parser::{JsParser, Rule};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::evaluate_expression;
use crate::runner::eval::statement::execute_program;
use crate::runner::plugin::types::EvalContext;

/// Parse failures surface as script-visible `SyntaxError`s carrying pest's
/// positioned message.
pub fn syntax_error(error: Error<Rule>) -> JErrorType {
    JErrorType::SyntaxError(error.to_string())
}

/// Evaluate a single expression in `ctx`.
pub fn eval_expression(source: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
    let expression = JsParser::parse_expression_from_str(source).map_err(syntax_error)?;
    evaluate_expression(&expression, ctx)
}

/// Run a script in `ctx`; yields the value of the last expression statement.
pub fn eval_script(source: &str, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
    let program = JsParser::parse_to_ast_from_str(source).map_err(syntax_error)?;
    execute_program(&program, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_hoist_functions_and_vars() {
        let mut ctx = EvalContext::new();
        let value = eval_script(
            "var before = typeof later;\nfunction later() { return 1 }\nbefore + ':' + later()",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(value, JsValue::string("function:1"));
    }

    #[test]
    fn syntax_errors_carry_positions() {
        let mut ctx = EvalContext::new();
        match eval_expression("1 +", &mut ctx) {
            Err(JErrorType::SyntaxError(message)) => assert!(message.contains("1:")),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn closures_capture_their_scope() {
        let mut ctx = EvalContext::new();
        let value = eval_script(
            "const counter = () => { let n = 0; return () => { n += 1; return n } };\n\
             const next = counter(); next(); next()",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(value, JsValue::integer(2));
    }

    #[test]
    fn throw_propagates_the_thrown_value() {
        let mut ctx = EvalContext::new();
        let err = eval_script("throw new TypeError('bad input')", &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: bad input");
    }
}
