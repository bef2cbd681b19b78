//! Stack shuffling and application primitives.

use futures::stream::{StreamExt, TryStreamExt};

use super::{DuplicateIdentifierError, Library};
use crate::eval::{solutions, Primitive};
use crate::model::coercion::{number_of, to_list, to_operator};
use crate::model::vocab::{identifiers, STACK_NS};
use crate::model::{Numeric, Value};

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(identifiers(STACK_NS, "dup"), "x => x x", |args, ctx| {
            let x = args[0].clone();
            Ok(solutions::single(ctx.push(x.clone()).push(x)))
        })
        .with_parameter("x", None, true),
    )?;

    library.register(
        Primitive::new(identifiers(STACK_NS, "pop"), "x =>", |_, ctx| {
            Ok(solutions::single(ctx))
        })
        .with_parameter("x", None, false),
    )?;

    library.register(
        Primitive::new(identifiers(STACK_NS, "swap"), "x y => y x", |args, ctx| {
            let [x, y] = take::<2>(args);
            Ok(solutions::single(ctx.push(y).push(x)))
        })
        .with_parameter("x", None, true)
        .with_parameter("y", None, true),
    )?;

    library.register(
        Primitive::new(identifiers(STACK_NS, "rotate"), "x y z => z y x", |args, ctx| {
            let [x, y, z] = take::<3>(args);
            Ok(solutions::single(ctx.push(z).push(y).push(x)))
        })
        .with_parameter("x", None, true)
        .with_parameter("y", None, true)
        .with_parameter("z", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(STACK_NS, "rotated"),
            "x y z w => z y x w",
            |args, ctx| {
                let [x, y, z, w] = take::<4>(args);
                Ok(solutions::single(ctx.push(z).push(y).push(x).push(w)))
            },
        )
        .with_parameter("x", None, true)
        .with_parameter("y", None, true)
        .with_parameter("z", None, true)
        .with_parameter("w", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(STACK_NS, "swons"),
            "l x => (x . l), pushing x onto the front of list l",
            |args, ctx| {
                let [l, x] = take::<2>(args);
                let connection = ctx.connection().clone();
                Ok(to_list(&l, &connection)
                    .map_ok(move |list| ctx.push(Value::List(list.push(x.clone()))))
                    .boxed())
            },
        )
        .with_parameter("l", Some("list"), true)
        .with_parameter("x", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(STACK_NS, "uncons"),
            "l => first rest; an empty list has no solutions",
            |args, ctx| {
                let connection = ctx.connection().clone();
                Ok(to_list(&args[0], &connection)
                    .try_filter_map(move |list| {
                        let context = list
                            .uncons()
                            .map(|(first, rest)| ctx.push(first).push(Value::List(rest)));
                        futures::future::ready(Ok(context))
                    })
                    .boxed())
            },
        )
        .with_parameter("l", Some("list"), true),
    )?;

    library.register(
        Primitive::new(
            identifiers(STACK_NS, "i"),
            "p => ... applies p to the rest of the stack",
            |args, ctx| {
                let rest = ctx.clone();
                Ok(to_operator(&args[0], &ctx)
                    .map_ok(move |op| op.apply(rest.clone()))
                    .try_flatten()
                    .boxed())
            },
        )
        .with_parameter("p", Some("operator"), true),
    )?;

    library.register(
        Primitive::new(
            identifiers(STACK_NS, "times"),
            "p n => ... applies p n times",
            |args, ctx| {
                let [p, n] = take::<2>(args);
                let n = number_of(&n)?;
                let count = match n {
                    Numeric::Integer(i) if i >= 0 => i as usize,
                    _ => return Ok(solutions::none()),
                };
                Ok(to_operator(&p, &ctx)
                    .map_ok(move |op| op.apply_repeated(ctx.clone(), count))
                    .try_flatten()
                    .boxed())
            },
        )
        .with_parameter("p", Some("operator"), true)
        .with_parameter("n", Some("integer"), true),
    )?;

    Ok(())
}

/// Moves exactly `N` arguments out of the popped vector.
///
/// The evaluator always pops exactly the declared arity, so the length
/// matches whenever `N` equals the number of declared parameters.
pub(crate) fn take<const N: usize>(args: Vec<Value>) -> [Value; N] {
    debug_assert_eq!(args.len(), N, "primitive declared a different arity");
    let mut iter = args.into_iter();
    std::array::from_fn(|_| iter.next().unwrap_or_else(|| Value::List(Default::default())))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::eval::{evaluate, StackContext, Token};
    use crate::library::Library;
    use crate::model::MemoryStore;
    use crate::model::Value;

    async fn run(tokens: Vec<Token>) -> Vec<String> {
        let context = StackContext::new(
            MemoryStore::new().connection(),
            Arc::new(Library::standard().unwrap()),
        );
        let live = evaluate(&tokens, context).unwrap();
        crate::eval::solutions::collect(live)
            .await
            .unwrap()
            .iter()
            .map(|c| c.stack().display_stack())
            .collect()
    }

    #[tokio::test]
    async fn test_shuffles() {
        let ints = |xs: &[i64]| xs.iter().map(|&x| Token::literal(x)).collect::<Vec<_>>();

        let mut tokens = ints(&[1, 2]);
        tokens.push(Token::op("swap"));
        assert_eq!(run(tokens).await, vec!["2 1"]);

        let mut tokens = ints(&[1, 2, 3]);
        tokens.push(Token::op("rotate"));
        assert_eq!(run(tokens).await, vec!["3 2 1"]);

        let mut tokens = ints(&[1, 2, 3, 4]);
        tokens.push(Token::op("rotated"));
        assert_eq!(run(tokens).await, vec!["3 2 1 4"]);

        let mut tokens = ints(&[1]);
        tokens.extend([Token::op("dup"), Token::op("pop")]);
        assert_eq!(run(tokens).await, vec!["1"]);
    }

    #[tokio::test]
    async fn test_swons_and_uncons() {
        let list = Value::list(vec![Value::from(2), Value::from(3)]);
        let tokens = vec![Token::literal(list.clone()), Token::literal(1), Token::op("swons")];
        assert_eq!(run(tokens).await, vec!["(1 2 3)"]);

        let tokens = vec![Token::literal(list), Token::op("uncons")];
        assert_eq!(run(tokens).await, vec!["2 (3)"]);

        let tokens = vec![Token::literal(Value::list(vec![])), Token::op("uncons")];
        assert!(run(tokens).await.is_empty());
    }

    #[tokio::test]
    async fn test_apply_program() {
        let program = Value::list(vec![Value::resource("dup")]);
        let tokens = vec![Token::literal(5), Token::literal(program.clone()), Token::op("i")];
        assert_eq!(run(tokens).await, vec!["5 5"]);

        let tokens = vec![
            Token::literal(5),
            Token::literal(program),
            Token::literal(2),
            Token::op("times"),
        ];
        assert_eq!(run(tokens).await, vec!["5 5 5"]);
    }

    #[tokio::test]
    async fn test_times_with_large_count() {
        let program = Value::list(vec![Value::resource("dup"), Value::resource("pop")]);
        let tokens = vec![
            Token::literal(1),
            Token::literal(program),
            Token::literal(20_000),
            Token::op("times"),
        ];
        assert_eq!(run(tokens).await, vec!["1"]);

        let tokens = vec![
            Token::literal(1),
            Token::literal(Value::list(vec![Value::resource("dup")])),
            Token::literal(0),
            Token::op("times"),
        ];
        assert_eq!(run(tokens).await, vec!["1"]);
    }

    #[tokio::test]
    async fn test_long_program() {
        let mut steps = Vec::new();
        for _ in 0..20_000 {
            steps.extend([Value::from(1), Value::resource("add")]);
        }
        let tokens = vec![
            Token::literal(0),
            Token::literal(Value::list(steps)),
            Token::op("i"),
        ];
        assert_eq!(run(tokens).await, vec!["20000"]);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "primitive declared a different arity")]
    fn test_take_checks_length() {
        let _ = super::take::<2>(vec![Value::from(1)]);
    }
}
