use core::fmt;
use std::sync::Arc;

use futures::future;
use futures::stream::{StreamExt, TryStreamExt};

use super::context::StackContext;
use super::error::{EvalError, EvalResult};
use super::evaluator::AbortSignal;
use super::solutions::{self, Solutions};
use crate::library::Library;
use crate::model::vocab;
use crate::model::{StackList, Value};

/// Body of a primitive that maps one context (with its arguments already
/// popped) to a stream of result contexts.
pub type ContextBody =
    Arc<dyn Fn(Vec<Value>, StackContext) -> EvalResult<Solutions> + Send + Sync>;

/// Body of a primitive that transforms the whole live solution stream, for
/// operators such as `unique` that need to see every solution.
pub type StreamBody = Arc<dyn Fn(Solutions) -> Solutions + Send + Sync>;

#[derive(Clone)]
enum Body {
    Context(ContextBody),
    Stream(StreamBody),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<String>,
    /// Whether the argument is expected to be evaluated before it is passed.
    pub evaluated: bool,
}

/// A built-in operator with its metadata.
pub struct Primitive {
    identifiers: Vec<String>,
    parameters: Vec<Parameter>,
    comment: String,
    inverse: Option<String>,
    body: Body,
}

impl Primitive {
    pub fn new<F>(identifiers: Vec<String>, comment: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>, StackContext) -> EvalResult<Solutions> + Send + Sync + 'static,
    {
        Self {
            identifiers,
            parameters: Vec::new(),
            comment: comment.into(),
            inverse: None,
            body: Body::Context(Arc::new(body)),
        }
    }

    pub fn streaming<F>(identifiers: Vec<String>, comment: impl Into<String>, body: F) -> Self
    where
        F: Fn(Solutions) -> Solutions + Send + Sync + 'static,
    {
        Self {
            identifiers,
            parameters: Vec::new(),
            comment: comment.into(),
            inverse: None,
            body: Body::Stream(Arc::new(body)),
        }
    }

    /// Declares the next parameter. Parameters are declared deepest first, so
    /// the last one declared is the top of the stack.
    pub fn with_parameter(mut self, name: &str, type_hint: Option<&str>, evaluated: bool) -> Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            type_hint: type_hint.map(str::to_string),
            evaluated,
        });
        self
    }

    pub fn with_inverse(mut self, identifier: impl Into<String>) -> Self {
        self.inverse = Some(identifier.into());
        self
    }

    /// Canonical identifier (the first one registered).
    pub fn identifier(&self) -> &str {
        self.identifiers.first().map(String::as_str).unwrap_or_default()
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn declared_inverse(&self) -> Option<&str> {
        self.inverse.as_deref()
    }

    pub fn name(&self) -> &str {
        vocab::local_name(self.identifier())
    }

    fn arity_error(&self, found: usize) -> EvalError {
        EvalError::Arity {
            operator: self.name().to_string(),
            expected: self.arity(),
            found,
        }
    }

    fn check_depth(&self, context: StackContext) -> EvalResult<StackContext> {
        let found = context.stack().len();
        if found < self.arity() {
            return Err(self.arity_error(found));
        }
        Ok(context)
    }

    /// Pops `arity` values; the returned arguments are deepest first.
    fn pop_arguments(&self, context: &StackContext) -> EvalResult<(Vec<Value>, StackContext)> {
        let arity = self.arity();
        let mut arguments = Vec::with_capacity(arity);
        let mut stack = context.stack().clone();
        while arguments.len() < arity {
            match stack.uncons() {
                Some((value, rest)) => {
                    arguments.push(value);
                    stack = rest;
                }
                None => return Err(self.arity_error(arguments.len())),
            }
        }
        arguments.reverse();
        Ok((arguments, context.with(stack)))
    }

    fn apply(&self, context: StackContext) -> Solutions {
        match &self.body {
            Body::Context(body) => match self.pop_arguments(&context) {
                Ok((arguments, rest)) => body(arguments, rest).unwrap_or_else(solutions::fail),
                Err(e) => solutions::fail(e),
            },
            Body::Stream(body) => match self.check_depth(context) {
                Ok(context) => body(solutions::single(context)),
                Err(e) => solutions::fail(e),
            },
        }
    }
}

pub enum OperatorKind {
    Primitive(Primitive),
    /// Sequential application of `steps`. `source` is the program list the
    /// composition was built from, if any.
    Composed {
        steps: Vec<Operator>,
        source: Option<StackList>,
    },
    /// Wraps the inverse of `original`; inverting again yields `original`.
    Inverted {
        original: Operator,
        inverse: Operator,
    },
    /// Pushes a fixed value.
    Constant(Value),
}

/// A transformation from one stack context to a stream of stack contexts.
///
/// Cloning is cheap; operators are shared between the library and every
/// value that refers to them.
#[derive(Clone)]
pub struct Operator(Arc<OperatorKind>);

impl Operator {
    pub fn new(kind: OperatorKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.0
    }

    pub fn constant(value: Value) -> Self {
        Self::new(OperatorKind::Constant(value))
    }

    pub fn compose(steps: Vec<Operator>) -> Self {
        Self::new(OperatorKind::Composed {
            steps,
            source: None,
        })
    }

    /// Interprets a list as a program: operators and resources naming loaded
    /// operators are applied, anything else is pushed as data.
    pub fn program(list: StackList, library: &Library) -> Self {
        let steps = list
            .iter()
            .map(|item| match item {
                Value::Operator(op) => op.clone(),
                Value::Resource(id) => library
                    .resolve(id.as_str())
                    .cloned()
                    .unwrap_or_else(|| Operator::constant(item.clone())),
                other => Operator::constant(other.clone()),
            })
            .collect();
        Self::new(OperatorKind::Composed {
            steps,
            source: Some(list),
        })
    }

    pub fn ptr_eq(&self, other: &Operator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self.kind() {
            OperatorKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Identifiers of a primitive; composite operators have none of their own.
    pub fn identifiers(&self) -> &[String] {
        self.as_primitive().map(Primitive::identifiers).unwrap_or_default()
    }

    pub fn parameters(&self) -> &[Parameter] {
        self.as_primitive().map(Primitive::parameters).unwrap_or_default()
    }

    pub fn comment(&self) -> &str {
        self.as_primitive().map(Primitive::comment).unwrap_or_default()
    }

    /// Applies the operator to a single context.
    pub fn apply(&self, context: StackContext) -> Solutions {
        match self.kind() {
            OperatorKind::Primitive(p) => p.apply(context),
            OperatorKind::Composed { steps, .. } => {
                apply_steps(solutions::single(context), steps, None)
            }
            OperatorKind::Inverted { inverse, .. } => inverse.apply(context),
            OperatorKind::Constant(value) => solutions::single(context.push(value.clone())),
        }
    }

    /// Applies the operator to every context of `live`, preserving order:
    /// all results of the first input come before any result of the second.
    pub fn apply_all(&self, live: Solutions) -> Solutions {
        match self.kind() {
            OperatorKind::Primitive(p) => match &p.body {
                Body::Stream(body) => {
                    let op = self.clone();
                    let checked = live
                        .and_then(move |context| future::ready(op.check_depth(context)))
                        .boxed();
                    body(checked)
                }
                Body::Context(_) => {
                    let op = self.clone();
                    live.map_ok(move |context| op.apply(context))
                        .try_flatten()
                        .boxed()
                }
            },
            OperatorKind::Composed { steps, .. } => apply_steps(live, steps, None),
            OperatorKind::Inverted { inverse, .. } => inverse.apply_all(live),
            OperatorKind::Constant(value) => {
                let value = value.clone();
                live.map_ok(move |context| context.push(value.clone())).boxed()
            }
        }
    }

    /// Applies the operator `count` times in a row.
    pub fn apply_repeated(&self, context: StackContext, count: usize) -> Solutions {
        let live = solutions::single(context);
        if self.sees_stream() {
            // each repetition has to see the whole stream of the previous one
            return (0..count).fold(live, |live, _| self.apply_all(live));
        }
        let op = self.clone();
        solutions::sequence(live, count, move |_, context| op.apply(context))
    }

    /// Whether applying this operator needs the whole live stream rather
    /// than one context at a time.
    fn sees_stream(&self) -> bool {
        match self.kind() {
            OperatorKind::Primitive(p) => matches!(p.body, Body::Stream(_)),
            OperatorKind::Composed { steps, .. } => steps.iter().any(Operator::sees_stream),
            OperatorKind::Inverted { inverse, .. } => inverse.sees_stream(),
            OperatorKind::Constant(_) => false,
        }
    }

    fn check_depth(&self, context: StackContext) -> EvalResult<StackContext> {
        match self.kind() {
            OperatorKind::Primitive(p) => p.check_depth(context),
            _ => Ok(context),
        }
    }

    /// Builds the inverse of this operator.
    ///
    /// Primitives need a declared inverse that is loaded in `library`.
    /// A composition inverts step by step in reverse order.
    pub fn inverse(&self, library: &Library) -> EvalResult<Operator> {
        match self.kind() {
            OperatorKind::Primitive(p) => {
                let identifier = p.declared_inverse().ok_or_else(|| {
                    EvalError::UnsupportedOperation(format!("{} has no inverse", self))
                })?;
                let inverse = library.resolve(identifier).cloned().ok_or_else(|| {
                    EvalError::UnsupportedOperation(format!(
                        "inverse {} of {} is not loaded",
                        identifier, self
                    ))
                })?;
                Ok(Self::inverted(self.clone(), inverse))
            }
            OperatorKind::Inverted { original, .. } => Ok(original.clone()),
            OperatorKind::Composed { steps, .. } => {
                let inverses = steps
                    .iter()
                    .rev()
                    .map(|step| step.inverse(library))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Self::inverted(self.clone(), Operator::compose(inverses)))
            }
            OperatorKind::Constant(value) => Err(EvalError::UnsupportedOperation(format!(
                "constant {} has no inverse",
                value
            ))),
        }
    }

    fn inverted(original: Operator, inverse: Operator) -> Self {
        Self::new(OperatorKind::Inverted { original, inverse })
    }
}

/// Threads `live` through `steps` in order.
///
/// Runs of per-context steps are driven by [`solutions::sequence`]; a step
/// that sees the whole stream, such as `unique`, wraps everything before it.
/// With `abort`, every intermediate stream is guarded by the signal.
pub(crate) fn apply_steps(
    live: Solutions,
    steps: &[Operator],
    abort: Option<&AbortSignal>,
) -> Solutions {
    let mut live = live;
    let mut start = 0;
    for (i, step) in steps.iter().enumerate() {
        if step.sees_stream() {
            live = sequence_steps(live, &steps[start..i], abort);
            live = step.apply_all(live);
            if let Some(abort) = abort {
                live = solutions::guard(live, abort.clone());
            }
            start = i + 1;
        }
    }
    sequence_steps(live, &steps[start..], abort)
}

fn sequence_steps(live: Solutions, steps: &[Operator], abort: Option<&AbortSignal>) -> Solutions {
    let steps = steps.to_vec();
    let abort = abort.cloned();
    solutions::sequence(live, steps.len(), move |i, context| {
        let out = steps[i].apply(context);
        match &abort {
            Some(abort) => solutions::guard(out, abort.clone()),
            None => out,
        }
    })
}

impl From<Primitive> for Operator {
    fn from(primitive: Primitive) -> Self {
        Self::new(OperatorKind::Primitive(primitive))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            OperatorKind::Primitive(p) => write!(f, "{}", p.name()),
            OperatorKind::Composed {
                source: Some(list), ..
            } => write!(f, "{}", list),
            OperatorKind::Composed { steps, .. } => {
                write!(f, "(")?;
                for (i, step) in steps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", step)?;
                }
                write!(f, ")")
            }
            OperatorKind::Inverted { original, .. } => write!(f, "~{}", original),
            OperatorKind::Constant(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operator({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryStore;

    fn context() -> StackContext {
        StackContext::new(MemoryStore::new().connection(), Arc::new(Library::new()))
    }

    fn dup() -> Operator {
        Primitive::new(vec!["urn:test#dup".to_string()], "x => x x", |args, ctx| {
            let x = args[0].clone();
            Ok(solutions::single(ctx.push(x.clone()).push(x)))
        })
        .with_parameter("x", None, false)
        .into()
    }

    #[tokio::test]
    async fn test_pop_arguments_deepest_first() {
        let seen = Primitive::new(vec!["urn:test#pair".to_string()], "", |args, ctx| {
            Ok(solutions::single(ctx.push(Value::list(args))))
        })
        .with_parameter("x", None, false)
        .with_parameter("y", None, false);
        let op = Operator::from(seen);

        let ctx = context().push(Value::from(1)).push(Value::from(2));
        let results = solutions::collect(op.apply(ctx)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stack().display_stack(), "(1 2)");
    }

    #[tokio::test]
    async fn test_underflow_is_arity_error() {
        let err = solutions::collect(dup().apply(context())).await.unwrap_err();
        match err {
            EvalError::Arity {
                operator,
                expected,
                found,
            } => {
                assert_eq!(operator, "dup");
                assert_eq!(expected, 1);
                assert_eq!(found, 0);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_composition_and_constants() {
        let program = Operator::compose(vec![Operator::constant(Value::from(3)), dup()]);
        let results = solutions::collect(program.apply(context())).await.unwrap();
        assert_eq!(results[0].stack().display_stack(), "3 3");
        assert_eq!(program.to_string(), "(3 dup)");
    }

    #[test]
    fn test_inverse_without_declaration() {
        let err = dup().inverse(&Library::new()).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedOperation(_)));
        assert!(Operator::constant(Value::from(1))
            .inverse(&Library::new())
            .is_err());
    }
}
