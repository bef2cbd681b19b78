#![allow(dead_code)]

use std::sync::Arc;

use ripple::eval::{evaluate, solutions, EvalResult, StackContext, Token};
use ripple::model::MemoryStore;
use ripple::Library;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn context_with(library: Library) -> StackContext {
    StackContext::new(MemoryStore::new().connection(), Arc::new(library))
}

pub fn context() -> StackContext {
    context_with(Library::standard().expect("standard library loads"))
}

/// Runs `tokens` against an empty stack and renders every solution.
pub async fn run(tokens: &[Token]) -> EvalResult<Vec<String>> {
    run_in(tokens, context()).await
}

pub async fn run_in(tokens: &[Token], context: StackContext) -> EvalResult<Vec<String>> {
    let results = solutions::collect(evaluate(tokens, context)?).await?;
    Ok(results
        .iter()
        .map(|ctx| ctx.stack().display_stack())
        .collect())
}
