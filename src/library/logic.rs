//! Boolean primitives.
//!
//! `and`, `or` and `not` compare their arguments against the canonical true
//! value; anything that is not equal to it counts as false.
//!
//! `true` and `false` are positional selectors, not boolean tests: `true`
//! keeps the top of the two items and `false` keeps the one beneath it.

use super::stack::take;
use super::{DuplicateIdentifierError, Library};
use crate::eval::{solutions, Primitive};
use crate::model::vocab::{identifiers, LOGIC_NS};
use crate::model::{equal, Value};

fn is_true(value: &Value) -> bool {
    equal(value, &Value::Boolean(true))
}

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(
        Primitive::new(identifiers(LOGIC_NS, "and"), "x y => x AND y", |args, ctx| {
            let both = args.iter().all(is_true);
            Ok(solutions::single(ctx.push(Value::Boolean(both))))
        })
        .with_parameter("x", Some("boolean"), true)
        .with_parameter("y", Some("boolean"), true),
    )?;

    library.register(
        Primitive::new(identifiers(LOGIC_NS, "or"), "x y => x OR y", |args, ctx| {
            let either = args.iter().any(is_true);
            Ok(solutions::single(ctx.push(Value::Boolean(either))))
        })
        .with_parameter("x", Some("boolean"), true)
        .with_parameter("y", Some("boolean"), true),
    )?;

    library.register(
        Primitive::new(identifiers(LOGIC_NS, "not"), "x => NOT x", |args, ctx| {
            Ok(solutions::single(ctx.push(Value::Boolean(!is_true(&args[0])))))
        })
        .with_parameter("x", Some("boolean"), true),
    )?;

    // Named after truth values but selects by position only.
    library.register(
        Primitive::new(
            identifiers(LOGIC_NS, "true"),
            "y x => x, keeping the top item",
            |args, ctx| {
                let [_, x] = take::<2>(args);
                Ok(solutions::single(ctx.push(x)))
            },
        )
        .with_parameter("y", None, false)
        .with_parameter("x", None, false),
    )?;

    library.register(
        Primitive::new(
            identifiers(LOGIC_NS, "false"),
            "y x => y, keeping the item beneath the top",
            |args, ctx| {
                let [y, _] = take::<2>(args);
                Ok(solutions::single(ctx.push(y)))
            },
        )
        .with_parameter("y", None, false)
        .with_parameter("x", None, false),
    )?;

    Ok(())
}
