//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

/// Completion record type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    /// Execution continues with the next statement.
    Normal,
    /// A `return` unwinds to the enclosing function call.
    Return,
}

/// Every statement evaluation returns a completion record. A `throw`
/// travels as `Err(JErrorType::Thrown(..))` instead.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    /// Check if this is an abrupt completion.
    pub fn is_abrupt(&self) -> bool {
        self.completion_type != CompletionType::Normal
    }

    /// The completion value, `undefined` when there is none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }
}

/// What the left side of an assignment (or the operand of `delete`)
/// refers to.
#[derive(Debug, Clone)]
pub enum Reference {
    /// A bare identifier.
    Binding(String),
    /// `base[key]`, with the base already evaluated.
    Property { base: JsValue, key: String },
}

/// Result type for expression evaluation.
pub type ValueResult = Result<JsValue, JErrorType>;

/// Result type for statement evaluation.
pub type EvalResult = Result<Completion, JErrorType>;
