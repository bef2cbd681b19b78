//! Comparison and conversion primitives.

use std::cmp::Ordering;

use super::stack::take;
use super::{DuplicateIdentifierError, Library};
use crate::eval::{solutions, CoercionTarget, EvalError, EvalResult, Primitive};
use crate::model::coercion::number_of;
use crate::model::vocab::{identifiers, DATA_NS};
use crate::model::{compare, equal, Numeric, Value};

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(identifiers(DATA_NS, "equal"), "x y => b", |args, ctx| {
            let [x, y] = take::<2>(args);
            Ok(solutions::single(ctx.push(Value::Boolean(equal(&x, &y)))))
        })
        .with_parameter("x", None, true)
        .with_parameter("y", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(DATA_NS, "compare"),
            "x y => -1, 0 or 1",
            |args, ctx| {
                let [x, y] = take::<2>(args);
                let sign = match compare(&x, &y) {
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                    Ordering::Greater => 1,
                };
                Ok(solutions::single(ctx.push(Value::from(sign))))
            },
        )
        .with_parameter("x", None, true)
        .with_parameter("y", None, true),
    )?;

    library.register(
        Primitive::new(identifiers(DATA_NS, "gt"), "x y => x > y", |args, ctx| {
            let [x, y] = take::<2>(args);
            let gt = compare(&x, &y) == Ordering::Greater;
            Ok(solutions::single(ctx.push(Value::Boolean(gt))))
        })
        .with_parameter("x", None, true)
        .with_parameter("y", None, true),
    )?;

    library.register(
        Primitive::new(identifiers(DATA_NS, "lt"), "x y => x < y", |args, ctx| {
            let [x, y] = take::<2>(args);
            let lt = compare(&x, &y) == Ordering::Less;
            Ok(solutions::single(ctx.push(Value::Boolean(lt))))
        })
        .with_parameter("x", None, true)
        .with_parameter("y", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(DATA_NS, "to-integer"),
            "x => x as an integer; unparseable text has no solutions",
            |args, ctx| {
                Ok(match to_integer(&args[0])? {
                    Some(i) => solutions::single(ctx.push(Value::from(i))),
                    None => solutions::none(),
                })
            },
        )
        .with_parameter("x", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(DATA_NS, "to-double"),
            "x => x as a double; unparseable text has no solutions",
            |args, ctx| {
                Ok(match to_double(&args[0])? {
                    Some(d) => solutions::single(ctx.push(Value::from(d))),
                    None => solutions::none(),
                })
            },
        )
        .with_parameter("x", None, true),
    )?;

    library.register(
        Primitive::new(
            identifiers(DATA_NS, "to-string"),
            "x => the text form of x",
            |args, ctx| Ok(solutions::single(ctx.push(Value::text(text_of(&args[0]))))),
        )
        .with_parameter("x", None, true),
    )?;

    Ok(())
}

fn to_integer(value: &Value) -> EvalResult<Option<i64>> {
    match value {
        Value::Text(s) => Ok(s.trim().parse::<i64>().ok()),
        _ => match number_of(value)? {
            Numeric::Integer(i) => Ok(Some(i)),
            Numeric::Decimal(d) if d.is_finite() => Ok(Some(d.trunc() as i64)),
            Numeric::Decimal(_) => Ok(None),
        },
    }
}

fn to_double(value: &Value) -> EvalResult<Option<f64>> {
    match value {
        Value::Text(s) => Ok(s.trim().parse::<f64>().ok()),
        Value::Number(n) => Ok(Some(n.as_f64())),
        Value::Literal(_) => Ok(Some(number_of(value)?.as_f64())),
        other => Err(EvalError::coercion(other, CoercionTarget::Number)),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Text(s) => s.to_string(),
        Value::Literal(l) => l.lexical.to_string(),
        Value::Resource(id) => id.as_str().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::eval::{evaluate, solutions, EvalError, StackContext, Token};
    use crate::library::Library;
    use crate::model::vocab::XSD_INTEGER;
    use crate::model::{Literal, MemoryStore, Value};

    async fn run(tokens: Vec<Token>) -> Result<Vec<String>, EvalError> {
        let context = StackContext::new(
            MemoryStore::new().connection(),
            Arc::new(Library::standard().unwrap()),
        );
        let results = solutions::collect(evaluate(&tokens, context)?).await?;
        Ok(results
            .iter()
            .map(|c| c.stack().display_stack())
            .collect())
    }

    #[tokio::test]
    async fn test_equal_uses_logical_value() {
        let literal = Token::literal(Value::Literal(Literal::typed("2", XSD_INTEGER)));
        let tokens = vec![literal, Token::literal(2), Token::op("equal")];
        assert_eq!(run(tokens).await.unwrap(), vec!["true"]);
    }

    #[tokio::test]
    async fn test_compare_sign() {
        let tokens = vec![Token::literal(1), Token::literal(2.5), Token::op("compare")];
        assert_eq!(run(tokens).await.unwrap(), vec!["-1"]);
        let tokens = vec![Token::literal("b"), Token::literal("a"), Token::op("gt")];
        assert_eq!(run(tokens).await.unwrap(), vec!["true"]);
    }

    #[tokio::test]
    async fn test_conversions() {
        let tokens = vec![Token::literal("42"), Token::op("to-integer")];
        assert_eq!(run(tokens).await.unwrap(), vec!["42"]);

        let tokens = vec![Token::literal("forty-two"), Token::op("to-integer")];
        assert!(run(tokens).await.unwrap().is_empty());

        let tokens = vec![Token::literal(3), Token::op("to-double")];
        assert_eq!(run(tokens).await.unwrap(), vec!["3.0"]);

        let tokens = vec![Token::literal(3), Token::op("to-string")];
        assert_eq!(run(tokens).await.unwrap(), vec!["\"3\""]);

        let tokens = vec![Token::literal(true), Token::op("to-integer")];
        assert!(matches!(
            run(tokens).await,
            Err(EvalError::Coercion { .. })
        ));
    }
}
