use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::sink::Sink;
use crate::error::RippleResult;

pub type CommandId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CommandStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl CommandStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            CommandStatus::Completed | CommandStatus::Failed | CommandStatus::Aborted
        )
    }
}

/// Lifecycle record kept by the queue for every command it has seen.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub id: CommandId,
    pub name: String,
    pub status: CommandStatus,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CommandRecord {
    pub fn queued(id: CommandId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: CommandStatus::Queued,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn transition(&mut self, status: CommandStatus) {
        match status {
            CommandStatus::Running => self.started_at = Some(Utc::now()),
            s if s.is_finished() => self.finished_at = Some(Utc::now()),
            _ => {}
        }
        self.status = status;
    }
}

/// A unit of work run by the scheduler's worker.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> String;

    /// Runs to completion, writing output to `sink`.
    async fn run(&self, id: CommandId, sink: Arc<dyn Sink>) -> RippleResult<()>;

    /// Requests cancellation of a running `run`. May be called from another
    /// task at any time, including before or after `run`.
    fn abort(&self);
}
