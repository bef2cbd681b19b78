//! Lazy solution streams.
//!
//! Every operator application returns a [`Solutions`] stream. Nothing is
//! computed until the stream is polled, and polling one solution only forces
//! the upstream work needed for that solution.
//!
//! Long step sequences go through [`sequence`], which keeps its pending
//! streams on the heap, so a program of any length polls at a fixed depth.

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};

use super::context::StackContext;
use super::error::{EvalError, EvalResult};
use super::evaluator::AbortSignal;

pub type Solutions = BoxStream<'static, EvalResult<StackContext>>;

pub fn single(context: StackContext) -> Solutions {
    stream::once(future::ready(Ok(context))).boxed()
}

pub fn none() -> Solutions {
    stream::empty().boxed()
}

pub fn fail(error: EvalError) -> Solutions {
    stream::once(future::ready(Err(error))).boxed()
}

pub fn from_contexts(contexts: Vec<StackContext>) -> Solutions {
    stream::iter(contexts.into_iter().map(Ok)).boxed()
}

/// Drains `solutions`, stopping at the first error.
pub async fn collect(solutions: Solutions) -> EvalResult<Vec<StackContext>> {
    solutions.try_collect().await
}

/// Fails every item pulled after `abort` fires.
pub fn guard(live: Solutions, abort: AbortSignal) -> Solutions {
    live.map(move |item| match abort.check() {
        Ok(()) => item,
        Err(e) => Err(e),
    })
    .boxed()
}

/// Threads every context of `live` through `len` steps, depth first.
///
/// `step(i, context)` applies step `i` to one context. Results keep the
/// order nested flattening would give: every solution reachable from one
/// context comes before any from the next. Pending streams sit on an explicit
/// stack with one frame per step in progress, and a frame whose stream is
/// known to be spent is dropped before the next step is pushed.
pub fn sequence<F>(live: Solutions, len: usize, step: F) -> Solutions
where
    F: Fn(usize, StackContext) -> Solutions + Send + 'static,
{
    if len == 0 {
        return live;
    }
    // (steps already applied, stream of contexts at that point)
    let frames: Vec<(usize, Solutions)> = vec![(0, live)];
    stream::unfold((frames, step), move |(mut frames, step)| async move {
        loop {
            let (done, next) = {
                let (done, top) = frames.last_mut()?;
                (*done, top.next().await)
            };
            match next {
                None => {
                    frames.pop();
                }
                Some(Ok(context)) if done == len => {
                    return Some((Ok(context), (frames, step)));
                }
                Some(Ok(context)) => {
                    if frames
                        .last()
                        .is_some_and(|(_, top)| top.size_hint() == (0, Some(0)))
                    {
                        frames.pop();
                    }
                    frames.push((done + 1, step(done, context)));
                }
                Some(Err(e)) => return Some((Err(e), (frames, step))),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::library::Library;
    use crate::model::{MemoryStore, Value};

    fn context() -> StackContext {
        StackContext::new(MemoryStore::new().connection(), Arc::new(Library::new()))
    }

    fn tops(results: &[StackContext]) -> Vec<String> {
        results.iter().map(|c| c.stack().display_stack()).collect()
    }

    #[tokio::test]
    async fn test_sequence_is_depth_first() {
        // step i forks into pushing 10i and 10i + 1
        let live = sequence(single(context()), 2, |i, ctx| {
            from_contexts(vec![
                ctx.push(Value::from(i as i64 * 10)),
                ctx.push(Value::from(i as i64 * 10 + 1)),
            ])
        });
        let results = collect(live).await.unwrap();
        assert_eq!(tops(&results), vec!["0 10", "0 11", "1 10", "1 11"]);
    }

    #[tokio::test]
    async fn test_sequence_prunes_and_fails() {
        let live = sequence(from_contexts(vec![context(), context()]), 1, |_, _| none());
        assert!(collect(live).await.unwrap().is_empty());

        let live = sequence(single(context()), 3, |i, ctx| match i {
            1 => fail(EvalError::Aborted),
            _ => single(ctx),
        });
        assert!(matches!(collect(live).await, Err(EvalError::Aborted)));
    }

    #[tokio::test]
    async fn test_sequence_of_many_steps() {
        let live = sequence(single(context().push(Value::from(0))), 100_000, |_, ctx| {
            let n = match ctx.stack().first() {
                Some(Value::Number(n)) => n.as_f64() as i64,
                _ => 0,
            };
            single(ctx.with(ctx.stack().rest().cloned().unwrap_or_default()).push(Value::from(n + 1)))
        });
        let results = collect(live).await.unwrap();
        assert_eq!(tops(&results), vec!["100000"]);
    }
}
