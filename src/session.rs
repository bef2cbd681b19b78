//! Session state shared by the commands of one front-end.
//!
//! A session owns the graph connection, the operator library and the engine
//! configuration. The library is swapped atomically on every definition, so
//! a query keeps evaluating against the snapshot it started with.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::RippleResult;
use crate::eval::{EvalError, Operator, StackContext, Token};
use crate::library::{Library, RegistrationPolicy};
use crate::model::vocab::USER_NS;
use crate::model::Connection;
use crate::scheduler::{DefineCommand, Directive, DirectiveCommand, QueryCommand};

#[derive(Clone)]
pub struct Session {
    connection: Connection,
    library: Arc<RwLock<Arc<Library>>>,
    config: EngineConfig,
}

impl Session {
    pub fn new(connection: Connection, library: Library, config: EngineConfig) -> Self {
        Self {
            connection,
            library: Arc::new(RwLock::new(Arc::new(library))),
            config,
        }
    }

    /// A session over the standard library.
    pub fn standard(connection: Connection, config: EngineConfig) -> RippleResult<Self> {
        Ok(Self::new(connection, Library::standard()?, config))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current library snapshot.
    pub async fn library(&self) -> Arc<Library> {
        self.library.read().await.clone()
    }

    /// A fresh context with an empty stack over the current library.
    pub async fn context(&self) -> StackContext {
        StackContext::new(self.connection.clone(), self.library().await)
    }

    /// Binds `name` in the user namespace, replacing any earlier definition.
    #[tracing::instrument(skip(self, op), level = "debug")]
    pub async fn define(&self, name: &str, op: Operator) -> RippleResult<String> {
        let identifier = format!("{}{}", USER_NS, name);
        let mut current = self.library.write().await;
        let mut next = Library::clone(&current);
        next.register_as(
            vec![identifier.clone()],
            op,
            RegistrationPolicy::AllowOverride,
        )?;
        *current = Arc::new(next);
        info!("defined {}", identifier);
        Ok(identifier)
    }

    /// Removes a user definition. Built-in operators cannot be removed.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn undefine(&self, name: &str) -> RippleResult<String> {
        let mut current = self.library.write().await;
        let identifier = match current.identifier_of(name) {
            Some(identifier) if identifier.starts_with(USER_NS) => identifier.to_string(),
            Some(identifier) => {
                return Err(EvalError::UnsupportedOperation(format!(
                    "{} is built in and cannot be undefined",
                    identifier
                ))
                .into())
            }
            None => return Err(EvalError::undefined(name).into()),
        };
        let mut next = Library::clone(&current);
        next.unregister(&identifier);
        *current = Arc::new(next);
        info!("undefined {}", identifier);
        Ok(identifier)
    }

    pub fn query(&self, tokens: Vec<Token>) -> QueryCommand {
        QueryCommand::new(self.clone(), tokens)
    }

    pub fn define_command(&self, name: impl Into<String>, tokens: Vec<Token>) -> DefineCommand {
        DefineCommand::new(self.clone(), name, tokens)
    }

    pub fn directive(&self, directive: Directive) -> DirectiveCommand {
        DirectiveCommand::new(self.clone(), directive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{vocab, MemoryStore, Value};

    fn session() -> Session {
        Session::standard(MemoryStore::new().connection(), EngineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_define_replaces_snapshot() {
        let session = session();
        let before = session.library().await;

        let identifier = session
            .define("two", Operator::constant(Value::from(2)))
            .await
            .unwrap();
        assert_eq!(identifier, "urn:ripple:user#two");

        assert!(before.resolve("two").is_none());
        assert!(session.library().await.resolve("two").is_some());
    }

    #[tokio::test]
    async fn test_undefine_restores_shadowed_keyword() {
        let session = session();
        session
            .define("dup", Operator::constant(Value::from(0)))
            .await
            .unwrap();
        let shadowed = session.library().await;
        assert_eq!(shadowed.identifier_of("dup"), Some("urn:ripple:user#dup"));

        session.undefine("dup").await.unwrap();
        let library = session.library().await;
        assert_eq!(
            library.identifier_of("dup"),
            Some(vocab::canonical(vocab::STACK_NS, "dup").as_str())
        );
    }

    #[tokio::test]
    async fn test_undefine_builtin_is_rejected() {
        let err = session().undefine("swap").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Eval(EvalError::UnsupportedOperation(_))
        ));
    }
}
