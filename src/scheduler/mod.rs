//! Command scheduling.
//!
//! Commands are queued on a [`CommandQueue`] and run one at a time, in FIFO
//! order, by a single worker task started with [`Scheduler::start`]. Output
//! goes to a [`Sink`]; the queue only tracks command lifecycles.
//!
//! ```text
//! queued -> running -> completed | failed | aborted
//! queued -> aborted            (stopped before it ran)
//! ```

pub mod command;
pub mod commands;
pub mod queue;
pub mod sink;

pub use command::{Command, CommandId, CommandRecord, CommandStatus};
pub use commands::{DefineCommand, Directive, DirectiveCommand, QueryCommand};
pub use queue::CommandQueue;
pub use sink::{
    BroadcastSink, Collector, ErrorReceiver, ErrorReport, OutputEvent, OutputReceiver, Sink,
    SinkError, Tee,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{Error, RippleResult};

pub struct Scheduler {
    queue: CommandQueue,
    shutdown_tx: broadcast::Sender<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl Scheduler {
    /// Spawns the worker task. Must be called from within a tokio runtime.
    pub fn start(sink: Arc<dyn Sink>, config: &EngineConfig) -> Self {
        let queue = CommandQueue::new(sink);
        let (shutdown_tx, _) = broadcast::channel(1);
        let worker = tokio::spawn(Self::run(queue.clone(), shutdown_tx.subscribe()));
        Self {
            queue,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn run(queue: CommandQueue, mut shutdown_rx: broadcast::Receiver<()>) {
        loop {
            // Shutdown is only observed between commands; a running command
            // is stopped through its abort hook.
            while queue.execute_next().await {
                if shutdown_rx.try_recv().is_ok() {
                    info!("Scheduler received shutdown signal");
                    return;
                }
            }
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Scheduler received shutdown signal");
                    return;
                }
                _ = queue.notified() => {}
            }
        }
    }

    /// Stops the queue and waits for the worker to exit.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn shutdown(&self) -> RippleResult<()> {
        self.queue.stop().await;
        // No receiver means the worker has already exited.
        let _ = self.shutdown_tx.send(());

        let Some(worker) = self.worker.lock().await.take() else {
            return Ok(());
        };
        match timeout(self.shutdown_timeout, worker).await {
            Ok(Ok(())) => {
                info!("Scheduler shutdown completed");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::internal(format!("scheduler worker failed: {}", e))),
            Err(_) => {
                warn!("Scheduler shutdown timed out");
                Err(Error::internal(format!(
                    "scheduler shutdown timed out after {:?}",
                    self.shutdown_timeout
                )))
            }
        }
    }
}
