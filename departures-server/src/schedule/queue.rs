//! Delayed message queues.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::error::ScheduleError;

/// A message to deliver after a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub id: String,
    pub delay: Duration,
    pub body: String,
}

/// A message the queue refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMessage {
    pub id: String,
    pub reason: String,
}

/// Per-message result of sending one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedMessage>,
}

/// A queue that accepts batches of delayed messages.
pub trait EventQueue: Send + Sync {
    fn send_batch(
        &self,
        messages: Vec<QueuedMessage>,
    ) -> impl Future<Output = Result<BatchOutcome, ScheduleError>> + Send;
}

/// A message released by a [`LocalQueue`] once its delay has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub body: String,
}

/// An in-process delay queue.
///
/// Each accepted message is held by a timer task and sent down the channel
/// when its delay elapses.
#[derive(Debug, Clone)]
pub struct LocalQueue {
    sender: mpsc::UnboundedSender<Delivery>,
}

impl LocalQueue {
    /// Create a queue and the receiver its deliveries arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventQueue for LocalQueue {
    async fn send_batch(&self, messages: Vec<QueuedMessage>) -> Result<BatchOutcome, ScheduleError> {
        if self.sender.is_closed() {
            return Err(ScheduleError::Queue {
                message: "receiver dropped".to_string(),
            });
        }

        let mut outcome = BatchOutcome::default();
        for message in messages {
            let sender = self.sender.clone();
            let id = message.id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(message.delay).await;
                let delivery = Delivery {
                    id: message.id,
                    body: message.body,
                };
                if let Err(e) = sender.send(delivery) {
                    warn!(id = %e.0.id, "dropped delivery, receiver closed");
                }
            });
            debug!(id = %id, "queued message");
            outcome.accepted.push(id);
        }

        Ok(outcome)
    }
}
