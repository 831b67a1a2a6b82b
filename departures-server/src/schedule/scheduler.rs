//! Turns load events into delayed queue messages.

use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, error};

use crate::domain::{Clock, Event};
use crate::error::ErrorList;

use super::error::ScheduleError;
use super::queue::{EventQueue, QueuedMessage};

/// Most messages sent to the queue in one batch.
pub const MAX_BATCH_SIZE: usize = 10;

/// Longest delay the queue accepts, in seconds.
pub const MAX_DELAY_SECS: i64 = 900;

/// Sends events to a queue, delayed until their start time.
pub struct EventScheduler<Q> {
    queue: Q,
    id_prefix: String,
    clock: Clock,
}

impl<Q: EventQueue> EventScheduler<Q> {
    pub fn new(queue: Q, id_prefix: impl Into<String>, clock: Clock) -> Self {
        Self {
            queue,
            id_prefix: id_prefix.into(),
            clock,
        }
    }

    /// Enqueue every event, in batches.
    ///
    /// Failures are collected across all batches; an event that cannot be
    /// converted does not stop the rest of its batch being sent.
    pub async fn schedule(&self, events: &[Event]) -> Result<(), ScheduleError> {
        let mut errors = ErrorList::new();

        for batch in events.chunks(MAX_BATCH_SIZE) {
            let mut messages = Vec::with_capacity(batch.len());
            for event in batch {
                match self.message_for(event) {
                    Ok(message) => messages.push(message),
                    Err(e) => errors.push(e),
                }
            }

            if messages.is_empty() {
                continue;
            }

            let outcome = match self.queue.send_batch(messages).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            for id in &outcome.accepted {
                debug!(id = %id, "enqueued load event");
            }
            for rejected in &outcome.rejected {
                error!(id = %rejected.id, reason = %rejected.reason, "failed to enqueue load event");
            }
            if !outcome.rejected.is_empty() {
                errors.push(ScheduleError::Enqueue {
                    count: outcome.rejected.len(),
                });
            }
        }

        errors.into_result(ScheduleError::Multiple)
    }

    fn message_for(&self, event: &Event) -> Result<QueuedMessage, ScheduleError> {
        let delay_secs = (event.start_time - (self.clock)()).num_seconds().max(0);

        if delay_secs > MAX_DELAY_SECS {
            return Err(ScheduleError::TooFarInFuture {
                start_time: event.start_time,
                delay_secs,
                max_delay_secs: MAX_DELAY_SECS,
            });
        }

        Ok(QueuedMessage {
            id: format!(
                "{}_{}",
                self.id_prefix,
                event.start_time.format("%Y-%m-%dT%H_%M_%S")
            ),
            delay: Duration::from_secs(delay_secs.unsigned_abs()),
            body: event.payload.clone(),
        })
    }
}

/// Produces evenly spaced load events over a horizon.
pub struct LoadScheduler<Q> {
    scheduler: EventScheduler<Q>,
    horizon: TimeDelta,
    frequency: TimeDelta,
    payload: String,
    clock: Clock,
}

impl<Q: EventQueue> LoadScheduler<Q> {
    /// Fails unless `frequency` is positive.
    pub fn new(
        scheduler: EventScheduler<Q>,
        horizon: TimeDelta,
        frequency: TimeDelta,
        payload: impl Into<String>,
        clock: Clock,
    ) -> Result<Self, ScheduleError> {
        if frequency <= TimeDelta::zero() {
            return Err(ScheduleError::NonPositiveFrequency);
        }

        Ok(Self {
            scheduler,
            horizon,
            frequency,
            payload: payload.into(),
            clock,
        })
    }

    /// Events at `now`, `now + frequency`, ... while the offset is within the
    /// horizon.
    pub fn create_events(&self) -> Vec<Event> {
        let now = (self.clock)();
        let mut events = Vec::new();

        let mut offset = TimeDelta::zero();
        while offset < self.horizon {
            events.push(Event::new(now + offset, self.payload.clone()));
            offset += self.frequency;
        }

        events
    }

    /// Create and enqueue one horizon's worth of events.
    pub async fn schedule(&self) -> Result<(), ScheduleError> {
        let events = self.create_events();
        debug!(events = events.len(), "scheduling load events");
        self.scheduler.schedule(&events).await
    }
}
