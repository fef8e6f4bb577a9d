use std::io;

use thiserror::Error;

use crate::engine::targeting::TargetError;
use crate::runner::ds::error::JErrorType;

/// Everything that can stop a pipeline command.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid expression string: {0:?}.")]
    InvalidExpression(String),
    #[error(transparent)]
    Evaluation(#[from] JErrorType),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("{0}")]
    Input(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
