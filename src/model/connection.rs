//! Boundary to the external graph store.
//!
//! The engine never owns storage. Everything it needs from the graph goes
//! through [`ModelConnection`], a session-scoped handle supplied by the caller
//! and carried unchanged inside every evaluation context.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::value::{ResourceId, Value};

pub type Connection = Arc<dyn ModelConnection>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by the graph backend. The backend's own error is kept as
/// the source so callers can walk the full cause chain.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Session handle to a graph store.
///
/// Implementations may block on I/O inside these calls; the engine treats each
/// call as a suspension point and checks for cancellation once it returns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelConnection: Send + Sync {
    /// All objects `o` of statements `(subject, predicate, o)`, in store order.
    async fn objects(&self, subject: &ResourceId, predicate: &ResourceId)
        -> StoreResult<Vec<Value>>;

    /// Adds the statement `(subject, predicate, object)`.
    async fn add(&self, subject: &ResourceId, predicate: &ResourceId, object: Value)
        -> StoreResult<()>;

    /// Best-effort cancellation of in-flight calls. Stores without
    /// cancellation support ignore it.
    fn cancel(&self) {}
}
