use thiserror::Error;

use crate::runner::ds::operations::type_conversion::describe_thrown;
use crate::runner::ds::value::JsValue;

/// Errors raised while evaluating script code.
///
/// The first four are engine-raised errors; they become real `Error`
/// objects only if script code needs to see them. `Thrown` carries whatever
/// value a script (or a helper) threw.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("ReferenceError: {0}")]
    ReferenceError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("{}", describe_thrown(.0))]
    Thrown(JsValue),
}

impl JErrorType {
    /// Name of the matching script-visible error constructor.
    pub fn constructor_name(&self) -> &str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::Thrown(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.clone(),
            JErrorType::Thrown(v) => describe_thrown(v),
        }
    }
}
