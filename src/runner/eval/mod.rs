//! Tree-walking evaluation of the JavaScript AST.
//!
//! Expressions evaluate to [`JsValue`](crate::runner::ds::value::JsValue)s,
//! statements to [`Completion`] records. A script `throw` travels as
//! `Err(JErrorType::Thrown(..))` all the way to the embedder; there is no
//! `try`/`catch`.

pub mod types;
pub mod expression;
pub mod statement;
pub mod function;

pub use types::{Completion, CompletionType, EvalResult, Reference, ValueResult};
pub use expression::evaluate_expression;
pub use function::{call_function, construct};
pub use statement::{execute_program, execute_statements};

/// Stack a call or nested expression needs left before evaluation moves
/// onto a fresh segment of `STACK_SEGMENT` bytes.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_SEGMENT: usize = 4 * 1024 * 1024;
