use model::execution::expr::{ExprKind, UnknownExprKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Unsupported function: {0}")]
    UnsupportedFunction(String),

    #[error("Invalid usage of function '{function}': {message}")]
    InvalidFunctionUsage { function: String, message: String },

    #[error("Invalid operand for {kind} expression: {message}")]
    InvalidOperand { kind: ExprKind, message: String },

    #[error("Expression nesting exceeds the configured limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("Invalid filter settings: {0}")]
    Settings(String),

    #[error("Malformed filter: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<UnknownExprKind> for FilterError {
    fn from(err: UnknownExprKind) -> Self {
        FilterError::UnsupportedExpression(err.0)
    }
}

impl FilterError {
    pub(crate) fn invalid_operand(kind: ExprKind, message: impl Into<String>) -> Self {
        FilterError::InvalidOperand {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_usage(function: &str, message: impl Into<String>) -> Self {
        FilterError::InvalidFunctionUsage {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
