use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::lexer::{Lexer, Statement};
use crate::error::Error;
use crate::scheduler::{Command, CommandQueue, ErrorReport, OutputEvent, Sink};
use crate::session::Session;

/// Input observed by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C.
    Interrupt,
    EndOfInput,
}

/// What the read loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    /// A statement was queued or reported.
    Continue,
    /// Blank line; nothing to do.
    Newline,
    /// Running and queued commands were stopped.
    Escape,
    Quit,
}

/// Turns input events into queued commands.
pub struct Repl {
    session: Session,
    queue: CommandQueue,
    sink: Arc<dyn Sink>,
    lexer: Lexer,
}

impl Repl {
    pub fn new(session: Session, queue: CommandQueue, sink: Arc<dyn Sink>) -> Self {
        Self {
            session,
            queue,
            sink,
            lexer: Lexer::new(),
        }
    }

    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn handle_event(&self, event: InputEvent) -> InputSignal {
        match event {
            InputEvent::Line(line) => self.handle_line(&line).await,
            InputEvent::Interrupt => {
                self.queue.stop().await;
                InputSignal::Escape
            }
            InputEvent::EndOfInput => InputSignal::Quit,
        }
    }

    async fn handle_line(&self, line: &str) -> InputSignal {
        let command: Arc<dyn Command> = match self.lexer.parse_line(line) {
            Ok(Statement::Empty) => return InputSignal::Newline,
            Ok(Statement::Quit) => return InputSignal::Quit,
            Ok(Statement::Query(tokens)) => Arc::new(self.session.query(tokens)),
            Ok(Statement::Define { name, tokens }) => {
                Arc::new(self.session.define_command(name, tokens))
            }
            Ok(Statement::Directive(directive)) => Arc::new(self.session.directive(directive)),
            Err(e) => {
                let report = ErrorReport::new(Uuid::nil(), "parse", &Error::from(e));
                if let Err(e) = self.sink.put(OutputEvent::Error(report)).await {
                    warn!("failed to report parse error: {}", e);
                }
                return InputSignal::Continue;
            }
        };
        let id = self.queue.add(command).await;
        debug!("queued {}", id);
        InputSignal::Continue
    }
}
