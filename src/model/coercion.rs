//! Interpreting values as numbers, booleans, lists and operators.
//!
//! List and operator coercion can read the graph, and a node with several
//! `rdf:first`/`rdf:rest` objects denotes several lists, so those coercions
//! return streams. Number and boolean coercion are pure.

use std::collections::HashSet;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

use super::connection::Connection;
use super::list::StackList;
use super::value::{Numeric, ResourceId, Value};
use super::vocab::{RDF_FIRST, RDF_REST};
use crate::eval::{CoercionTarget, EvalError, EvalResult, Operator, StackContext};

pub type Coerced<T> = BoxStream<'static, EvalResult<T>>;

fn ready<T: Send + 'static>(result: EvalResult<T>) -> Coerced<T> {
    stream::once(future::ready(result)).boxed()
}

pub fn number_of(value: &Value) -> EvalResult<Numeric> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Literal(literal) => match literal.normalize() {
            Some(Value::Number(n)) => Ok(n),
            _ => Err(EvalError::coercion(value, CoercionTarget::Number)),
        },
        other => Err(EvalError::coercion(other, CoercionTarget::Number)),
    }
}

pub fn boolean_of(value: &Value) -> EvalResult<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Literal(literal) => match literal.normalize() {
            Some(Value::Boolean(b)) => Ok(b),
            _ => Err(EvalError::coercion(value, CoercionTarget::Boolean)),
        },
        other => Err(EvalError::coercion(other, CoercionTarget::Boolean)),
    }
}

pub fn resource_of(value: &Value) -> EvalResult<ResourceId> {
    match value {
        Value::Resource(id) => Ok(id.clone()),
        other => Err(EvalError::coercion(other, CoercionTarget::Resource)),
    }
}

pub fn to_number(value: &Value) -> Coerced<Numeric> {
    ready(number_of(value))
}

pub fn to_boolean(value: &Value) -> Coerced<bool> {
    ready(boolean_of(value))
}

/// Every list `value` denotes.
///
/// A resource is read as an `rdf:first`/`rdf:rest` chain; `rdf:nil` is the
/// empty list. A node that is not a list node is a coercion error.
pub fn to_list(value: &Value, connection: &Connection) -> Coerced<StackList> {
    match value {
        Value::List(list) => ready(Ok(list.clone())),
        Value::Resource(id) if id.is_nil() => ready(Ok(StackList::nil())),
        Value::Resource(id) => graph_list(id.clone(), connection.clone()),
        other => ready(Err(EvalError::coercion(other, CoercionTarget::List))),
    }
}

/// One partially read list: the members seen so far (newest first), the
/// value that should denote the rest, and the nodes already walked.
struct Branch {
    members: StackList,
    rest: Value,
    visited: HashSet<ResourceId>,
}

impl Branch {
    fn finish(self, tail: StackList) -> StackList {
        self.members.iter().fold(tail, |list, member| list.push(member.clone()))
    }
}

/// Walks `rdf:first`/`rdf:rest` chains from `head` without recursion.
///
/// Branches wait on an explicit stack, so arbitrarily long lists are read at
/// a fixed depth. A chain that comes back to a node it already walked is a
/// coercion error for that branch.
fn graph_list(head: ResourceId, connection: Connection) -> Coerced<StackList> {
    let start = Branch {
        members: StackList::nil(),
        rest: Value::Resource(head),
        visited: HashSet::new(),
    };
    stream::unfold(vec![start], move |mut pending| {
        let connection = connection.clone();
        async move {
            loop {
                let mut branch = pending.pop()?;
                let rest = std::mem::replace(&mut branch.rest, Value::List(StackList::nil()));
                let node = match rest {
                    Value::List(tail) => return Some((Ok(branch.finish(tail)), pending)),
                    Value::Resource(id) if id.is_nil() => {
                        return Some((Ok(branch.finish(StackList::nil())), pending))
                    }
                    Value::Resource(id) => id,
                    other => {
                        let error = EvalError::coercion(&other, CoercionTarget::List);
                        return Some((Err(error), pending));
                    }
                };
                if !branch.visited.insert(node.clone()) {
                    debug!("list cycle at {}", node);
                    let error = EvalError::coercion(&Value::Resource(node), CoercionTarget::List);
                    return Some((Err(error), pending));
                }
                let cells = match list_cells(&node, &connection).await {
                    Ok(cells) => cells,
                    Err(error) => return Some((Err(error), pending)),
                };
                // Pushed in reverse so the first cell is walked first.
                let mut cells = cells.into_iter().rev().peekable();
                while let Some((first, rest)) = cells.next() {
                    let visited = if cells.peek().is_some() {
                        branch.visited.clone()
                    } else {
                        std::mem::take(&mut branch.visited)
                    };
                    pending.push(Branch {
                        members: branch.members.push(first),
                        rest,
                        visited,
                    });
                }
            }
        }
    })
    .boxed()
}

/// Every (first, rest) pair stated for a list node.
async fn list_cells(
    node: &ResourceId,
    connection: &Connection,
) -> EvalResult<Vec<(Value, Value)>> {
    let firsts = connection
        .objects(node, &ResourceId::new(RDF_FIRST))
        .await?;
    let rests = connection.objects(node, &ResourceId::new(RDF_REST)).await?;
    if firsts.is_empty() || rests.is_empty() {
        return Err(EvalError::coercion(
            &Value::Resource(node.clone()),
            CoercionTarget::List,
        ));
    }
    Ok(firsts
        .iter()
        .flat_map(|first| rests.iter().map(move |rest| (first.clone(), rest.clone())))
        .collect())
}

/// Every operator `value` denotes.
///
/// Resources naming a loaded operator resolve through the library; other
/// resources and lists are read as programs.
pub fn to_operator(value: &Value, context: &StackContext) -> Coerced<Operator> {
    match value {
        Value::Operator(op) => ready(Ok(op.clone())),
        Value::List(program) => ready(Ok(Operator::program(
            program.clone(),
            context.library(),
        ))),
        Value::Resource(id) => {
            if let Some(op) = context.library().resolve(id.as_str()) {
                return ready(Ok(op.clone()));
            }
            let library = context.library().clone();
            to_list(value, context.connection())
                .map_ok(move |program| Operator::program(program, &library))
                .map_err(|e| match e {
                    EvalError::Coercion { value, .. } => EvalError::Coercion {
                        value,
                        target: CoercionTarget::Operator,
                    },
                    other => other,
                })
                .boxed()
        }
        other => ready(Err(EvalError::coercion(other, CoercionTarget::Operator))),
    }
}
