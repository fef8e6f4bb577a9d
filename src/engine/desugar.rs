//! Shorthand expression syntax.
//!
//! Three shorthands expand into a one-parameter arrow function over the
//! implicit input `$it`:
//!
//! | written      | evaluated as             |
//! |--------------|--------------------------|
//! | `.[0].name`  | `$it => $it[0].name`     |
//! | `.trim()`    | `$it => $it.trim()`      |
//! | `$it * 2`    | `$it => $it * 2`         |
//!
//! Anything else is passed through untouched.

use regex::Regex;

/// Name of the implicit parameter.
pub const IMPLICIT_VARIABLE: &str = "$it";

lazy_static! {
    // ASCII word boundary: `$ité` still mentions `$it`.
    static ref IMPLICIT_VARIABLE_WORD: Regex = Regex::new(r"\$it(?-u:\b)").unwrap();
}

/// Rewrites shorthand syntax. Only the first matching rule applies, and
/// every rule looks at the string as the user wrote it.
pub fn desugar(expression: &str) -> String {
    let arrow = format!("{0} => {0}", IMPLICIT_VARIABLE);
    if let Some(rest) = expression.strip_prefix(".[") {
        format!("{}[{}", arrow, rest)
    } else if expression.starts_with('.') {
        format!("{}{}", arrow, expression)
    } else if IMPLICIT_VARIABLE_WORD.is_match(expression) {
        format!("{} => {}", IMPLICIT_VARIABLE, expression)
    } else {
        expression.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_dot_keeps_the_whole_expression() {
        assert_eq!(desugar(".trim()"), "$it => $it.trim()");
        assert_eq!(desugar(".a.b"), "$it => $it.a.b");
        assert_eq!(desugar("."), "$it => $it.");
    }

    #[test]
    fn dot_bracket_drops_only_the_dot() {
        assert_eq!(desugar(".[0].name"), "$it => $it[0].name");
        assert_eq!(desugar(".['a.b']"), "$it => $it['a.b']");
    }

    #[test]
    fn implicit_variable_must_be_a_whole_word() {
        assert_eq!(desugar("$it * 2"), "$it => $it * 2");
        assert_eq!(desugar("[$it, $it]"), "$it => [$it, $it]");
        assert_eq!(desugar("$item + 1"), "$item + 1");
        assert_eq!(desugar("$it_x"), "$it_x");
        assert_eq!(desugar("$it9"), "$it9");
    }

    #[test]
    fn word_boundaries_are_ascii_only() {
        assert_eq!(desugar("$ité"), "$it => $ité");
        assert_eq!(desugar("[$it, 'ü']"), "$it => [$it, 'ü']");
    }

    #[test]
    fn other_expressions_pass_through() {
        for expression in ["x => x + 1", "Math.max(1, 2)", "'.trim()'", "a.$itx"] {
            assert_eq!(desugar(expression), expression);
        }
    }

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(desugar(".concat($it)"), "$it => $it.concat($it)");
    }
}
