//! Evaluation engine.
//!
//! A query is a sequence of [`Token`]s. The [`Evaluator`] resolves operator
//! references against the context's library and threads a lazy stream of
//! [`StackContext`]s through each token in turn.
//!
//! # Components
//!
//! ## Stack Context
//! The immutable evaluation state: the stack, the graph connection and the
//! operator library snapshot the run was started with.
//!
//! ## Operators
//! Primitives, compositions built from program lists, inverted operators and
//! constants. See [`operator`].
//!
//! ## Solutions
//! Every application produces a stream of result contexts. Zero results prune
//! a branch; several results fork the computation. Results come out depth
//! first in the order the operators produce them.

pub mod context;
pub mod error;
pub mod evaluator;
pub mod operator;
pub mod solutions;

pub use context::StackContext;
pub use error::{CoercionTarget, ErrorKind, EvalError, EvalResult};
pub use evaluator::{evaluate, AbortSignal, Evaluator, Token};
pub use operator::{Operator, OperatorKind, Parameter, Primitive};
pub use solutions::Solutions;
