//! # Ripple: a stack-based, multi-valued query language over linked data
//!
//! Programs are postfix sequences of values and operator references. Every
//! operator consumes values from the top of a stack and produces zero or more
//! result stacks, so a single query can fan out into many solutions or prune
//! a branch entirely.
//!
//! ## Pipeline
//!
//! ```text
//! line -> Lexer -> Statement -> Command -> CommandQueue -> Evaluator -> Sink
//! ```
//!
//! - Values, lists, the ordering over values and the graph store boundary live
//!   in [`model`].
//! - The evaluation engine and operator representation live in [`eval`].
//! - Built-in primitives are loaded into a [`library::Library`].
//! - Commands run one at a time on the [`scheduler`] and report through a
//!   [`scheduler::Sink`].
//! - A [`Session`] ties a connection, a library and the [`EngineConfig`]
//!   together for one front-end.
//! - The interactive front-end is in [`cli`].
//!
//! ## Example
//!
//! ```no_run
//! use ripple::eval::{solutions, Token};
//! use ripple::model::MemoryStore;
//! use ripple::{EngineConfig, Session};
//!
//! # async fn example() -> ripple::RippleResult<()> {
//! let session = Session::standard(MemoryStore::new().connection(), EngineConfig::default())?;
//! let context = session.context().await;
//! let tokens = vec![Token::literal(2), Token::literal(3), Token::op("add")];
//! let results = solutions::collect(ripple::eval::evaluate(&tokens, context)?).await?;
//! assert_eq!(results[0].stack().display_stack(), "5");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod library;
pub mod model;
pub mod scheduler;
pub mod session;

pub use config::EngineConfig;
pub use error::{Error, RippleResult};
pub use eval::{ErrorKind, EvalError};
pub use library::Library;
pub use model::{StackList, Value};
pub use session::Session;

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
