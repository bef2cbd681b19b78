use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::command::{Command, CommandId, CommandRecord, CommandStatus};
use super::sink::{ErrorReport, OutputEvent, Sink};
use crate::error::{Error, RippleResult};

struct Queued {
    id: CommandId,
    command: Arc<dyn Command>,
}

struct Running {
    id: CommandId,
    command: Arc<dyn Command>,
    abort_requested: bool,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Queued>,
    running: Option<Running>,
    first_failure: Option<Error>,
}

struct Inner {
    state: Mutex<QueueState>,
    records: DashMap<CommandId, CommandRecord>,
    work: Notify,
    idle: watch::Sender<bool>,
    sink: Arc<dyn Sink>,
}

/// FIFO of commands drained by a single worker.
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct CommandQueue {
    inner: Arc<Inner>,
}

impl CommandQueue {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        let (idle, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                records: DashMap::new(),
                work: Notify::new(),
                idle,
                sink,
            }),
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(name = %command.name()))]
    pub async fn add(&self, command: Arc<dyn Command>) -> CommandId {
        let id = Uuid::new_v4();
        self.inner
            .records
            .insert(id, CommandRecord::queued(id, command.name()));
        let mut state = self.inner.state.lock().await;
        state.pending.push_back(Queued { id, command });
        // Published under the lock so the worker cannot mark the queue idle
        // in between.
        self.inner.idle.send_replace(false);
        drop(state);
        self.inner.work.notify_one();
        debug!("queued command {}", id);
        id
    }

    pub fn status(&self, id: &CommandId) -> Option<CommandStatus> {
        self.inner.records.get(id).map(|record| record.status)
    }

    pub fn record(&self, id: &CommandId) -> Option<CommandRecord> {
        self.inner.records.get(id).map(|record| record.clone())
    }

    pub async fn pending(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Aborts every queued command and asks the running one to stop.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        for queued in state.pending.drain(..) {
            self.transition(&queued.id, CommandStatus::Aborted);
        }
        match state.running.as_mut() {
            Some(running) => {
                info!("aborting running command {}", running.id);
                running.abort_requested = true;
                running.command.abort();
            }
            None => {
                self.inner.idle.send_replace(true);
            }
        }
    }

    /// Waits until nothing is queued or running, then returns the first
    /// failure since the last wait, if any.
    pub async fn wait_until_finished(&self) -> RippleResult<()> {
        let mut idle = self.inner.idle.subscribe();
        idle.wait_for(|idle| *idle)
            .await
            .map_err(|_| Error::internal("command queue closed"))?;
        match self.inner.state.lock().await.first_failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub(crate) async fn notified(&self) {
        self.inner.work.notified().await
    }

    /// Runs the next queued command, if any. Returns false when the queue was empty.
    pub(crate) async fn execute_next(&self) -> bool {
        let Some(queued) = self.take_next().await else {
            return false;
        };
        let Queued { id, command } = queued;
        let name = command.name();
        self.transition(&id, CommandStatus::Running);
        debug!("running command {} ({})", id, name);

        let result = command.run(id, self.inner.sink.clone()).await;

        let abort_requested = self
            .inner
            .state
            .lock()
            .await
            .running
            .as_ref()
            .is_some_and(|running| running.abort_requested);
        let status = match &result {
            Ok(()) if abort_requested => CommandStatus::Aborted,
            Ok(()) => CommandStatus::Completed,
            Err(e) if e.is_aborted() => CommandStatus::Aborted,
            Err(_) => CommandStatus::Failed,
        };
        let failure = match result {
            Ok(()) => None,
            Err(error) => {
                let report = ErrorReport::new(id, &name, &error);
                if let Err(e) = self.inner.sink.put(OutputEvent::Error(report)).await {
                    warn!("failed to report error of command {}: {}", id, e);
                }
                if status == CommandStatus::Failed {
                    warn!("command {} failed: {}", id, error);
                    Some(error)
                } else {
                    None
                }
            }
        };
        self.transition(&id, status);
        debug!("command {} {}", id, status);

        let mut state = self.inner.state.lock().await;
        state.running = None;
        if let Some(error) = failure {
            if state.first_failure.is_none() {
                state.first_failure = Some(error);
            }
        }
        if state.pending.is_empty() {
            self.inner.idle.send_replace(true);
        }
        true
    }

    async fn take_next(&self) -> Option<Queued> {
        let mut state = self.inner.state.lock().await;
        match state.pending.pop_front() {
            Some(queued) => {
                state.running = Some(Running {
                    id: queued.id,
                    command: queued.command.clone(),
                    abort_requested: false,
                });
                Some(queued)
            }
            None => {
                if state.running.is_none() {
                    self.inner.idle.send_replace(true);
                }
                None
            }
        }
    }

    fn transition(&self, id: &CommandId, status: CommandStatus) {
        if let Some(mut record) = self.inner.records.get_mut(id) {
            record.transition(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::EngineConfig;
    use crate::scheduler::{Collector, Scheduler};
    use async_trait::async_trait;

    struct Fails;

    #[async_trait]
    impl Command for Fails {
        fn name(&self) -> String {
            "fails".to_string()
        }

        async fn run(&self, _id: CommandId, _sink: Arc<dyn Sink>) -> RippleResult<()> {
            Err(Error::internal("broken"))
        }

        fn abort(&self) {}
    }

    #[tokio::test]
    async fn test_execute_in_order_and_record_failure() {
        let sink = Arc::new(Collector::new());
        let queue = CommandQueue::new(sink.clone());
        let first = queue.add(Arc::new(Fails)).await;
        let second = queue.add(Arc::new(Fails)).await;
        assert_eq!(queue.status(&first), Some(CommandStatus::Queued));

        assert!(queue.execute_next().await);
        assert_eq!(queue.status(&first), Some(CommandStatus::Failed));
        assert_eq!(queue.status(&second), Some(CommandStatus::Queued));
        assert!(queue.execute_next().await);
        assert!(!queue.execute_next().await);

        assert!(queue.wait_until_finished().await.is_err());
        // the failure is reported once
        assert!(queue.wait_until_finished().await.is_ok());
        assert_eq!(sink.errors().await.len(), 2);
    }

    struct Noop;

    #[async_trait]
    impl Command for Noop {
        fn name(&self) -> String {
            "noop".to_string()
        }

        async fn run(&self, _id: CommandId, _sink: Arc<dyn Sink>) -> RippleResult<()> {
            Ok(())
        }

        fn abort(&self) {}
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_returns_while_worker_races_add() {
        let scheduler = Scheduler::start(Arc::new(Collector::new()), &EngineConfig::default());
        let queue = scheduler.queue();

        for _ in 0..500 {
            let id = queue.add(Arc::new(Noop)).await;
            let waited = tokio::time::timeout(Duration::from_secs(5), queue.wait_until_finished()).await;
            assert!(matches!(waited, Ok(Ok(()))), "wait hung after {}", id);
            assert_eq!(queue.status(&id), Some(CommandStatus::Completed));
        }

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_aborts_pending() {
        let queue = CommandQueue::new(Arc::new(Collector::new()));
        let id = queue.add(Arc::new(Fails)).await;
        queue.stop().await;

        assert_eq!(queue.status(&id), Some(CommandStatus::Aborted));
        assert!(!queue.execute_next().await);
        assert!(queue.wait_until_finished().await.is_ok());
        let record = queue.record(&id).unwrap();
        assert!(record.finished_at.is_some());
        assert!(record.started_at.is_none());
    }
}
