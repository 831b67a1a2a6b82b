//! Pipelined batch writes.
//!
//! A batch is written in two phases on one connection. The send phase queues
//! a `SET` for every value that encoded successfully and flushes once. The
//! receive phase then reads exactly as many replies as commands were queued;
//! values that failed to encode or queue never reach the wire, so they must
//! not be waited for.

use tracing::debug;

use super::connection::{Command, Connection, Reply};
use super::error::StoreError;
use crate::error::ErrorList;

/// What the send phase hands to the receive phase.
#[derive(Debug, Default)]
pub(crate) struct SendOutcome {
    /// Commands actually queued on the connection.
    pub enqueued: usize,
    /// Encode, queue and flush failures.
    pub errors: ErrorList<StoreError>,
}

/// Queue every successfully encoded command, then flush once.
pub(crate) async fn send_phase<C, I>(connection: &mut C, commands: I) -> SendOutcome
where
    C: Connection,
    I: IntoIterator<Item = Result<Command, StoreError>>,
{
    let mut outcome = SendOutcome::default();

    for command in commands {
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                outcome.errors.push(e);
                continue;
            }
        };

        let key = command.key().to_string();
        match connection.send(command) {
            Ok(()) => outcome.enqueued += 1,
            Err(e) => outcome.errors.push(StoreError::Send {
                key,
                message: e.to_string(),
            }),
        }
    }

    if let Err(e) = connection.flush().await {
        outcome.errors.push(StoreError::Flush {
            message: e.to_string(),
        });
    }

    outcome
}

/// Read `expected` replies, collecting every failure.
pub(crate) async fn receive_phase<C: Connection>(
    connection: &mut C,
    expected: usize,
) -> ErrorList<StoreError> {
    let mut errors = ErrorList::new();

    for _ in 0..expected {
        match connection.receive().await {
            Ok(Reply::Ok) => {}
            Ok(other) => errors.push(StoreError::UnexpectedReply {
                key: "SET".to_string(),
                reply: other.to_string(),
            }),
            Err(e) => errors.push(e),
        }
    }

    errors
}

/// Run both phases and combine their failures.
///
/// Receive-phase failures are reported as `ReceivePhase`, send-phase failures
/// as `SendPhase`; when both occur they are returned together as `Multiple`.
pub(crate) async fn write_batch<C, I>(connection: &mut C, commands: I) -> Result<(), StoreError>
where
    C: Connection,
    I: IntoIterator<Item = Result<Command, StoreError>>,
{
    let sent = send_phase(connection, commands).await;
    debug!(
        enqueued = sent.enqueued,
        failed = sent.errors.len(),
        "pipelined batch sent"
    );

    let receive_errors = receive_phase(connection, sent.enqueued).await;

    let mut phases = ErrorList::new();
    if !receive_errors.is_empty() {
        phases.push(StoreError::ReceivePhase(receive_errors));
    }
    if !sent.errors.is_empty() {
        phases.push(StoreError::SendPhase(sent.errors));
    }

    match phases.len() {
        0 => Ok(()),
        1 => Err(phases.into_vec().remove(0)),
        _ => Err(StoreError::Multiple(phases)),
    }
}
