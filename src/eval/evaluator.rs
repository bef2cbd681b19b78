use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::context::StackContext;
use super::error::{EvalError, EvalResult};
use super::operator::{apply_steps, Operator};
use super::solutions::{self, Solutions};
use crate::model::Value;

/// One element of a query after the front-end has parsed it.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Literal(Value),
    /// Identifier or keyword naming an operator to apply.
    OperatorRef(String),
}

impl Token {
    pub fn literal(value: impl Into<Value>) -> Self {
        Token::Literal(value.into())
    }

    pub fn op(identifier: impl Into<String>) -> Self {
        Token::OperatorRef(identifier.into())
    }
}

/// Cooperative cancellation flag shared between a command and its evaluation.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> EvalResult<()> {
        if self.is_aborted() {
            return Err(EvalError::Aborted);
        }
        Ok(())
    }
}

/// Runs a token sequence against an initial context.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    abort: AbortSignal,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_abort(abort: AbortSignal) -> Self {
        Self { abort }
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    /// Builds the lazy solution stream for `tokens`.
    ///
    /// Every operator reference is resolved up front, so an unknown name fails
    /// here before anything runs. The returned stream does no work until it is
    /// polled; the abort signal is checked between every token step.
    #[tracing::instrument(skip_all, level = "debug", fields(tokens = tokens.len()))]
    pub fn evaluate(&self, tokens: &[Token], initial: StackContext) -> EvalResult<Solutions> {
        self.abort.check()?;
        let steps = tokens
            .iter()
            .map(|token| match token {
                Token::Literal(value) => Ok(Operator::constant(value.clone())),
                Token::OperatorRef(identifier) => initial
                    .library()
                    .resolve(identifier)
                    .cloned()
                    .ok_or_else(|| EvalError::undefined(identifier.as_str())),
            })
            .collect::<EvalResult<Vec<_>>>()?;
        debug!("resolved {} steps", steps.len());

        let live = solutions::guard(solutions::single(initial), self.abort.clone());
        Ok(apply_steps(live, &steps, Some(&self.abort)))
    }
}

/// Evaluates `tokens` without an external abort signal.
pub fn evaluate(tokens: &[Token], initial: StackContext) -> EvalResult<Solutions> {
    Evaluator::new().evaluate(tokens, initial)
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::library::Library;
    use crate::model::MemoryStore;

    fn context() -> StackContext {
        let library = Library::standard().unwrap();
        StackContext::new(MemoryStore::new().connection(), Arc::new(library))
    }

    #[tokio::test]
    async fn test_literals_only() {
        let tokens = vec![Token::literal(1), Token::literal("a")];
        let results = solutions::collect(evaluate(&tokens, context()).unwrap())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stack().display_stack(), "1 \"a\"");
    }

    #[tokio::test]
    async fn test_empty_query_yields_initial_context() {
        let results = solutions::collect(evaluate(&[], context()).unwrap())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].stack().is_empty());
    }

    #[test]
    fn test_undefined_operator_fails_before_running() {
        let tokens = vec![Token::literal(1), Token::op("no-such-operator")];
        match evaluate(&tokens, context()) {
            Err(EvalError::UndefinedOperator { identifier }) => {
                assert_eq!(identifier, "no-such-operator")
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_abort_stops_stream() {
        let signal = AbortSignal::new();
        let evaluator = Evaluator::with_abort(signal.clone());
        let tokens = vec![Token::literal(Value::list(vec![1.into(), 2.into()])), Token::op("each")];
        let mut live = evaluator.evaluate(&tokens, context()).unwrap();

        assert!(live.next().await.unwrap().is_ok());
        signal.abort();
        assert!(matches!(live.next().await, Some(Err(EvalError::Aborted))));
    }
}
