//! Load-event scheduling.
//!
//! Feed loads are triggered by delayed queue messages rather than a fixed
//! timer: each scheduling run enqueues one message per load over the coming
//! horizon, each delayed until its start time.

mod error;
mod queue;
mod scheduler;

pub use error::ScheduleError;
pub use queue::{BatchOutcome, Delivery, EventQueue, LocalQueue, QueuedMessage, RejectedMessage};
pub use scheduler::{EventScheduler, LoadScheduler, MAX_BATCH_SIZE, MAX_DELAY_SECS};
