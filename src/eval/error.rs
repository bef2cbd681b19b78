use thiserror::Error;

use crate::library::DuplicateIdentifierError;
use crate::model::connection::StoreError;

pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that abort an evaluation run.
///
/// A primitive returning zero solutions is not an error; it only prunes that
/// branch. Everything here aborts the whole run and is reported to the sink.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Undefined operator: {identifier}")]
    UndefinedOperator { identifier: String },

    /// Stack underflow while popping a declared parameter.
    #[error("Arity error: {operator} expects {expected} stack items, found {found}")]
    Arity {
        operator: String,
        expected: usize,
        found: usize,
    },

    #[error("Coercion error: cannot interpret {value} as {target}")]
    Coercion {
        value: String,
        target: CoercionTarget,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    DuplicateIdentifier(#[from] DuplicateIdentifierError),

    /// Failure inside the graph store; the backend cause is kept as source.
    #[error("External store error: {0}")]
    ExternalStore(#[from] StoreError),

    #[error("Evaluation aborted")]
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CoercionTarget {
    #[strum(serialize = "number")]
    Number,
    #[strum(serialize = "boolean")]
    Boolean,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "operator")]
    Operator,
    #[strum(serialize = "resource")]
    Resource,
}

/// Stable classification of a failure, used when reporting errors to sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ErrorKind {
    UndefinedOperator,
    Arity,
    Coercion,
    UnsupportedOperation,
    DuplicateIdentifier,
    ExternalStore,
    Aborted,
    Syntax,
    Sink,
    Config,
    Io,
    Internal,
}

impl EvalError {
    pub fn coercion(value: &crate::model::Value, target: CoercionTarget) -> Self {
        EvalError::Coercion {
            value: value.to_string(),
            target,
        }
    }

    pub fn undefined(identifier: impl Into<String>) -> Self {
        EvalError::UndefinedOperator {
            identifier: identifier.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::UndefinedOperator { .. } => ErrorKind::UndefinedOperator,
            EvalError::Arity { .. } => ErrorKind::Arity,
            EvalError::Coercion { .. } => ErrorKind::Coercion,
            EvalError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            EvalError::DuplicateIdentifier(_) => ErrorKind::DuplicateIdentifier,
            EvalError::ExternalStore(_) => ErrorKind::ExternalStore,
            EvalError::Aborted => ErrorKind::Aborted,
        }
    }
}
