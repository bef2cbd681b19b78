use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use super::command::CommandId;
use crate::error::Error;
use crate::eval::ErrorKind;
use crate::model::StackList;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Receive failed: {message}")]
    ReceiveFailed { message: String },
    #[error("Receiver lagged behind by {count} events")]
    Lagged { count: u64 },
}

/// Something a command produced.
#[derive(Debug, Clone)]
pub enum OutputEvent {
    Solution {
        command: CommandId,
        index: usize,
        stack: StackList,
    },
    Message {
        command: CommandId,
        text: String,
    },
    Error(ErrorReport),
}

/// A failed command, rendered so it can be cloned and broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub command: CommandId,
    pub command_name: String,
    pub kind: ErrorKind,
    pub message: String,
    pub causes: Vec<String>,
}

impl ErrorReport {
    pub fn new(command: CommandId, command_name: impl Into<String>, error: &Error) -> Self {
        Self {
            command,
            command_name: command_name.into(),
            kind: error.kind(),
            message: error.to_string(),
            causes: error.causes(),
        }
    }
}

/// Destination for command output, decoupled from the queue.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn put(&self, event: OutputEvent) -> Result<(), SinkError>;
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct Collector {
    events: Mutex<Vec<OutputEvent>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().await.clone()
    }

    pub async fn solutions(&self) -> Vec<StackList> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Solution { stack, .. } => Some(stack.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn errors(&self) -> Vec<ErrorReport> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Error(report) => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Message { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl Sink for Collector {
    async fn put(&self, event: OutputEvent) -> Result<(), SinkError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Forwards every event to two sinks.
pub struct Tee {
    first: Arc<dyn Sink>,
    second: Arc<dyn Sink>,
}

impl Tee {
    pub fn new(first: Arc<dyn Sink>, second: Arc<dyn Sink>) -> Self {
        Self { first, second }
    }
}

#[async_trait]
impl Sink for Tee {
    async fn put(&self, event: OutputEvent) -> Result<(), SinkError> {
        let first = self.first.put(event.clone()).await;
        let second = self.second.put(event).await;
        first.and(second)
    }
}

/// Publishes output on a broadcast channel and errors on a second one.
pub struct BroadcastSink {
    output_sender: broadcast::Sender<OutputEvent>,
    error_sender: broadcast::Sender<ErrorReport>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (output_sender, _) = broadcast::channel(capacity);
        let (error_sender, _) = broadcast::channel(capacity);
        Self {
            output_sender,
            error_sender,
        }
    }

    pub fn subscribe(&self) -> (OutputReceiver, ErrorReceiver) {
        (
            OutputReceiver::new(self.output_sender.subscribe()),
            ErrorReceiver::new(self.error_sender.subscribe()),
        )
    }

    /// Raw receivers, for callers that want to wrap them in streams.
    pub fn receivers(
        &self,
    ) -> (
        broadcast::Receiver<OutputEvent>,
        broadcast::Receiver<ErrorReport>,
    ) {
        (self.output_sender.subscribe(), self.error_sender.subscribe())
    }
}

#[async_trait]
impl Sink for BroadcastSink {
    async fn put(&self, event: OutputEvent) -> Result<(), SinkError> {
        // A send only fails when nobody is subscribed; the event is dropped.
        let delivered = match event {
            OutputEvent::Error(report) => self.error_sender.send(report).is_ok(),
            other => self.output_sender.send(other).is_ok(),
        };
        if !delivered {
            debug!("no subscribers; output dropped");
        }
        Ok(())
    }
}

pub struct OutputReceiver {
    receiver: broadcast::Receiver<OutputEvent>,
}

impl OutputReceiver {
    fn new(receiver: broadcast::Receiver<OutputEvent>) -> Self {
        Self { receiver }
    }

    /// Receives the next event. On lag the receiver resubscribes and reports
    /// how many events were skipped.
    pub async fn recv(&mut self) -> Result<OutputEvent, SinkError> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                self.receiver = self.receiver.resubscribe();
                Err(SinkError::Lagged { count: n })
            }
            Err(e) => Err(SinkError::ReceiveFailed {
                message: e.to_string(),
            }),
        }
    }
}

pub struct ErrorReceiver {
    receiver: broadcast::Receiver<ErrorReport>,
}

impl ErrorReceiver {
    fn new(receiver: broadcast::Receiver<ErrorReport>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Result<ErrorReport, SinkError> {
        self.receiver
            .recv()
            .await
            .map_err(|e| SinkError::ReceiveFailed {
                message: e.to_string(),
            })
    }
}
