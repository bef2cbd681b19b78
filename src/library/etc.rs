use futures::future;
use futures::stream::{StreamExt, TryStreamExt};

use super::{DuplicateIdentifierError, Library};
use crate::eval::Primitive;
use crate::model::coercion::to_operator;
use crate::model::vocab::{identifiers, ETC_NS};
use crate::model::Value;

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(
            identifiers(ETC_NS, "invert"),
            "p => the inverse of p; fails if p has no declared inverse",
            |args, ctx| {
                let library = ctx.library().clone();
                let rest = ctx.clone();
                Ok(to_operator(&args[0], &ctx)
                    .and_then(move |op| {
                        let pushed = op
                            .inverse(&library)
                            .map(|inverse| rest.push(Value::Operator(inverse)));
                        future::ready(pushed)
                    })
                    .boxed())
            },
        )
        .with_parameter("p", Some("operator"), true),
    )
}
