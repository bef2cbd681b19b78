use core::fmt;
use std::sync::Arc;

use crate::library::Library;
use crate::model::{Connection, StackList, Value};

/// Immutable evaluation state: the current stack plus the session handles.
///
/// The connection and library are shared by every context derived from the
/// same run; only the stack changes from one context to the next.
#[derive(Clone)]
pub struct StackContext {
    stack: StackList,
    connection: Connection,
    library: Arc<Library>,
}

impl StackContext {
    pub fn new(connection: Connection, library: Arc<Library>) -> Self {
        Self {
            stack: StackList::nil(),
            connection,
            library,
        }
    }

    pub fn stack(&self) -> &StackList {
        &self.stack
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    /// A new context with `stack`, sharing this context's connection.
    pub fn with(&self, stack: StackList) -> Self {
        Self {
            stack,
            connection: self.connection.clone(),
            library: self.library.clone(),
        }
    }

    pub fn push(&self, value: Value) -> Self {
        self.with(self.stack.push(value))
    }
}

impl fmt::Debug for StackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackContext")
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}
