//! Arithmetic and trigonometric primitives.
//!
//! Integer arithmetic stays exact while it fits in an `i64` and falls back to
//! floating point otherwise. Functions with a restricted domain return no
//! solutions outside of it.

use super::stack::take;
use super::{DuplicateIdentifierError, Library};
use crate::eval::{solutions, EvalResult, Primitive, Solutions, StackContext};
use crate::model::coercion::number_of;
use crate::model::vocab::{canonical, identifiers, MATH_NS};
use crate::model::{Numeric, Value};

fn binary<F, G>(local: &str, comment: &str, exact: F, approx: G) -> Primitive
where
    F: Fn(i64, i64) -> Option<i64> + Send + Sync + 'static,
    G: Fn(f64, f64) -> f64 + Send + Sync + 'static,
{
    Primitive::new(identifiers(MATH_NS, local), comment, move |args, ctx| {
        let [x, y] = take::<2>(args);
        let result = match (number_of(&x)?, number_of(&y)?) {
            (Numeric::Integer(a), Numeric::Integer(b)) => match exact(a, b) {
                Some(n) => Numeric::Integer(n),
                None => Numeric::Decimal(approx(a as f64, b as f64)),
            },
            (a, b) => Numeric::Decimal(approx(a.as_f64(), b.as_f64())),
        };
        Ok(solutions::single(ctx.push(Value::Number(result))))
    })
    .with_parameter("x", Some("number"), true)
    .with_parameter("y", Some("number"), true)
}

/// A one-argument real function, undefined where `f` returns `None`.
fn unary<F>(local: &str, comment: &str, f: F) -> Primitive
where
    F: Fn(f64) -> Option<f64> + Send + Sync + 'static,
{
    Primitive::new(identifiers(MATH_NS, local), comment, move |args, ctx| {
        let x = number_of(&args[0])?.as_f64();
        Ok(push_number(ctx, f(x)))
    })
    .with_parameter("x", Some("number"), true)
}

fn push_number(ctx: StackContext, result: Option<f64>) -> Solutions {
    match result {
        Some(d) if !d.is_nan() => solutions::single(ctx.push(Value::from(d))),
        _ => solutions::none(),
    }
}

fn in_unit_range(x: f64) -> bool {
    (-1.0..=1.0).contains(&x)
}

fn divide(args: Vec<Value>, ctx: StackContext) -> EvalResult<Solutions> {
    let [x, y] = take::<2>(args);
    let result = match (number_of(&x)?, number_of(&y)?) {
        (Numeric::Integer(a), Numeric::Integer(b)) if a.checked_rem(b) == Some(0) => {
            a.checked_div(b).map(Numeric::Integer)
        }
        (_, b) if b.as_f64() == 0.0 => return Ok(solutions::none()),
        (a, b) => Some(Numeric::Decimal(a.as_f64() / b.as_f64())),
    };
    Ok(match result {
        Some(n) => solutions::single(ctx.push(Value::Number(n))),
        None => solutions::none(),
    })
}

pub fn register(library: &mut Library) -> Result<(), DuplicateIdentifierError> {
    library.register(binary("add", "x y => x + y", i64::checked_add, |a, b| a + b))?;
    library.register(binary("sub", "x y => x - y", i64::checked_sub, |a, b| a - b))?;
    library.register(binary("mul", "x y => x * y", i64::checked_mul, |a, b| a * b))?;

    library.register(
        Primitive::new(identifiers(MATH_NS, "div"), "x y => x / y", divide)
            .with_parameter("x", Some("number"), true)
            .with_parameter("y", Some("number"), true),
    )?;

    library.register(
        Primitive::new(identifiers(MATH_NS, "neg"), "x => -x", |args, ctx| {
            let negated = match number_of(&args[0])? {
                Numeric::Integer(i) => i
                    .checked_neg()
                    .map(Numeric::Integer)
                    .unwrap_or(Numeric::Decimal(-(i as f64))),
                Numeric::Decimal(d) => Numeric::Decimal(-d),
            };
            Ok(solutions::single(ctx.push(Value::Number(negated))))
        })
        .with_parameter("x", Some("number"), true)
        .with_inverse(canonical(MATH_NS, "neg")),
    )?;

    library.register(
        Primitive::new(
            identifiers(MATH_NS, "sqrt"),
            "x => both square roots of x; negative x has none",
            |args, ctx| {
                let x = number_of(&args[0])?.as_f64();
                let roots = if x > 0.0 {
                    let r = x.sqrt();
                    vec![ctx.push(Value::from(r)), ctx.push(Value::from(-r))]
                } else if x == 0.0 {
                    vec![ctx.push(Value::from(0.0))]
                } else {
                    Vec::new()
                };
                Ok(solutions::from_contexts(roots))
            },
        )
        .with_parameter("x", Some("number"), true),
    )?;

    library.register(
        unary("sin", "x => sin(x)", |x| Some(x.sin())).with_inverse(canonical(MATH_NS, "asin")),
    )?;
    library.register(
        unary("asin", "x => asin(x), for -1 <= x <= 1", |x| {
            in_unit_range(x).then(|| x.asin())
        })
        .with_inverse(canonical(MATH_NS, "sin")),
    )?;
    library.register(
        unary("cos", "x => cos(x)", |x| Some(x.cos())).with_inverse(canonical(MATH_NS, "acos")),
    )?;
    library.register(
        unary("acos", "x => acos(x), for -1 <= x <= 1", |x| {
            in_unit_range(x).then(|| x.acos())
        })
        .with_inverse(canonical(MATH_NS, "cos")),
    )?;
    library.register(unary("cosh", "x => cosh(x)", |x| Some(x.cosh())))?;
    library.register(unary("tanh", "x => tanh(x)", |x| Some(x.tanh())))?;

    Ok(())
}
