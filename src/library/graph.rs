use futures::stream::{self, StreamExt, TryStreamExt};

use super::stack::take;
use super::{DuplicateIdentifierError, Library};
use crate::eval::{solutions, EvalError, Primitive};
use crate::model::vocab::{identifiers, GRAPH_NS};
use crate::model::Value;

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(
            identifiers(GRAPH_NS, "links"),
            "s p => o, once for every stored statement (s p o)",
            |args, ctx| {
                let [s, p] = take::<2>(args);
                let (Value::Resource(subject), Value::Resource(predicate)) = (s, p) else {
                    return Ok(solutions::none());
                };
                let connection = ctx.connection().clone();
                let fetch = async move {
                    connection
                        .objects(&subject, &predicate)
                        .await
                        .map_err(EvalError::from)
                };
                Ok(stream::once(fetch)
                    .map_ok(move |objects| {
                        let ctx = ctx.clone();
                        stream::iter(objects).map(move |o| Ok(ctx.push(o)))
                    })
                    .try_flatten()
                    .boxed())
            },
        )
        .with_parameter("s", Some("resource"), true)
        .with_parameter("p", Some("resource"), true),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::eval::{evaluate, solutions, EvalError, StackContext, Token};
    use crate::library::Library;
    use crate::model::connection::{MockModelConnection, StoreError};
    use crate::model::{Connection, MemoryStore, ModelConnection, ResourceId, Value};

    #[tokio::test]
    async fn test_links_branches_per_object() {
        let store = MemoryStore::new();
        let s = ResourceId::new("urn:s");
        let p = ResourceId::new("urn:p");
        store.add(&s, &p, Value::from(1)).await.unwrap();
        store.add(&s, &p, Value::from(2)).await.unwrap();
        let context = StackContext::new(store.connection(), Arc::new(Library::standard().unwrap()));

        let tokens = vec![
            Token::literal(Value::Resource(s)),
            Token::literal(Value::Resource(p)),
            Token::op("links"),
        ];
        let results = solutions::collect(evaluate(&tokens, context).unwrap())
            .await
            .unwrap();
        let tops: Vec<String> = results.iter().map(|c| c.stack().display_stack()).collect();
        assert_eq!(tops, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_store_error_keeps_cause() {
        let mut mock = MockModelConnection::new();
        mock.expect_objects().returning(|_, _| {
            Err(StoreError::with_source(
                "query failed",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"),
            ))
        });
        let connection: Connection = Arc::new(mock);
        let context = StackContext::new(connection, Arc::new(Library::standard().unwrap()));

        let tokens = vec![
            Token::literal(Value::resource("urn:s")),
            Token::literal(Value::resource("urn:p")),
            Token::op("links"),
        ];
        let err = solutions::collect(evaluate(&tokens, context).unwrap())
            .await
            .unwrap_err();
        match err {
            EvalError::ExternalStore(store) => {
                let cause = std::error::Error::source(&store).unwrap();
                assert_eq!(cause.to_string(), "timed out");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
