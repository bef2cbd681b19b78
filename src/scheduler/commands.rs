//! Built-in commands: queries, definitions and directives.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::StreamExt;
use tracing::debug;

use super::command::{Command, CommandId};
use super::sink::{OutputEvent, Sink};
use crate::error::RippleResult;
use crate::eval::{AbortSignal, EvalError, Evaluator, Operator, OperatorKind, Token};
use crate::model::{StackList, Value};
use crate::session::Session;

/// Evaluates a token sequence and delivers each solution to the sink.
pub struct QueryCommand {
    session: Session,
    tokens: Vec<Token>,
    abort: AbortSignal,
}

impl QueryCommand {
    pub fn new(session: Session, tokens: Vec<Token>) -> Self {
        Self {
            session,
            tokens,
            abort: AbortSignal::new(),
        }
    }
}

#[async_trait]
impl Command for QueryCommand {
    fn name(&self) -> String {
        "query".to_string()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(command = %id))]
    async fn run(&self, id: CommandId, sink: Arc<dyn Sink>) -> RippleResult<()> {
        let context = self.session.context().await;
        let evaluator = Evaluator::with_abort(self.abort.clone());
        let limit = self.session.config().solution_limit.unwrap_or(usize::MAX);
        let mut solutions = evaluator.evaluate(&self.tokens, context)?.take(limit);

        let mut index = 0;
        while let Some(solution) = solutions.next().await {
            self.abort.check()?;
            let solution = solution?;
            sink.put(OutputEvent::Solution {
                command: id,
                index,
                stack: solution.stack().clone(),
            })
            .await?;
            index += 1;
        }
        debug!("query delivered {} solutions", index);
        Ok(())
    }

    fn abort(&self) {
        self.abort.abort();
        self.session.connection().cancel();
    }
}

/// Binds a keyword to the composition of a token sequence.
pub struct DefineCommand {
    session: Session,
    name: String,
    tokens: Vec<Token>,
}

impl DefineCommand {
    pub fn new(session: Session, name: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            session,
            name: name.into(),
            tokens,
        }
    }
}

#[async_trait]
impl Command for DefineCommand {
    fn name(&self) -> String {
        format!("define {}", self.name)
    }

    async fn run(&self, id: CommandId, sink: Arc<dyn Sink>) -> RippleResult<()> {
        let library = self.session.library().await;
        let mut steps = Vec::with_capacity(self.tokens.len());
        let mut source = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Literal(value) => {
                    steps.push(Operator::constant(value.clone()));
                    source.push(value.clone());
                }
                Token::OperatorRef(identifier) => {
                    let op = library
                        .resolve(identifier)
                        .cloned()
                        .ok_or_else(|| EvalError::undefined(identifier.as_str()))?;
                    source.push(Value::Operator(op.clone()));
                    steps.push(op);
                }
            }
        }
        let op = Operator::new(OperatorKind::Composed {
            steps,
            source: Some(StackList::from_values(source)),
        });
        let text = format!("{} := {}", self.name, op);
        let identifier = self.session.define(&self.name, op).await?;
        debug!("bound {}", identifier);
        sink.put(OutputEvent::Message { command: id, text }).await?;
        Ok(())
    }

    fn abort(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Lists every keyword.
    List,
    /// Shows the parameters and summary of one operator.
    Help(String),
    Undefine(String),
}

pub struct DirectiveCommand {
    session: Session,
    directive: Directive,
}

impl DirectiveCommand {
    pub fn new(session: Session, directive: Directive) -> Self {
        Self { session, directive }
    }
}

#[async_trait]
impl Command for DirectiveCommand {
    fn name(&self) -> String {
        match &self.directive {
            Directive::List => "list".to_string(),
            Directive::Help(name) => format!("help {}", name),
            Directive::Undefine(name) => format!("undefine {}", name),
        }
    }

    async fn run(&self, id: CommandId, sink: Arc<dyn Sink>) -> RippleResult<()> {
        let text = match &self.directive {
            Directive::List => {
                let library = self.session.library().await;
                let keywords: Vec<&str> = library.keywords().map(|(keyword, _)| keyword).collect();
                keywords.join(" ")
            }
            Directive::Help(name) => {
                let library = self.session.library().await;
                let op = library
                    .resolve(name)
                    .ok_or_else(|| EvalError::undefined(name.as_str()))?;
                describe(name, op)
            }
            Directive::Undefine(name) => {
                let identifier = self.session.undefine(name).await?;
                format!("undefined {}", identifier)
            }
        };
        sink.put(OutputEvent::Message { command: id, text }).await?;
        Ok(())
    }

    fn abort(&self) {}
}

fn describe(name: &str, op: &Operator) -> String {
    let parameters: Vec<String> = op
        .parameters()
        .iter()
        .map(|p| match &p.type_hint {
            Some(hint) => format!("{}:{}", p.name, hint),
            None => p.name.clone(),
        })
        .collect();
    match op.kind() {
        OperatorKind::Primitive(primitive) => format!(
            "{} [{}] {}",
            name,
            parameters.join(" "),
            primitive.comment()
        ),
        _ => format!("{} := {}", name, op),
    }
}
