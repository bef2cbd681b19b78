use thiserror::Error;

use crate::cli::LexError;
use crate::config::ConfigError;
use crate::eval::{ErrorKind, EvalError};
use crate::library::DuplicateIdentifierError;
use crate::model::StoreError;
use crate::scheduler::SinkError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("Syntax error: {0}")]
    Syntax(#[from] LexError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RippleResult<T> = Result<T, Error>;

impl From<DuplicateIdentifierError> for Error {
    fn from(e: DuplicateIdentifierError) -> Self {
        Error::Eval(e.into())
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Eval(e.into())
    }
}

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Eval(e) => e.kind(),
            Error::Sink(_) => ErrorKind::Sink,
            Error::Syntax(_) => ErrorKind::Syntax,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Eval(EvalError::Aborted))
    }

    /// Messages of the source chain below this error, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut next = std::error::Error::source(self);
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }
        causes
    }
}
