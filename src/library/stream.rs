//! Stream primitives: forking on list members and deduplicating solutions.

use std::collections::BTreeSet;

use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};

use super::{DuplicateIdentifierError, Library};
use crate::eval::Primitive;
use crate::model::coercion::to_list;
use crate::model::vocab::{identifiers, STREAM_NS};
use crate::model::StackList;

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(
            identifiers(STREAM_NS, "each"),
            "l => x, once for every member x of l",
            |args, ctx| {
                let connection = ctx.connection().clone();
                Ok(to_list(&args[0], &connection)
                    .map_ok(move |list| {
                        let ctx = ctx.clone();
                        stream::iter(list).map(move |member| Ok(ctx.push(member)))
                    })
                    .try_flatten()
                    .boxed())
            },
        )
        .with_parameter("l", Some("list"), true),
    )?;

    // Sees the whole live stream so duplicates from different branches meet.
    library.register(
        Primitive::streaming(
            identifiers(STREAM_NS, "unique"),
            "x => x, dropping every solution whose stack was already produced",
            |live| {
                let mut seen: BTreeSet<StackList> = BTreeSet::new();
                live.try_filter(move |ctx| future::ready(seen.insert(ctx.stack().clone())))
                    .boxed()
            },
        )
        .with_parameter("x", None, true),
    )?;

    Ok(())
}
