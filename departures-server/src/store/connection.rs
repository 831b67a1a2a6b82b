//! The cache wire contract.
//!
//! The store understands two commands: a point `GET` and a `SET` with an
//! optional expiry in milliseconds. Commands can be pipelined: `send` queues
//! a command without waiting, `flush` writes everything queued, and each
//! `receive` reads the reply to the oldest unanswered command.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::error;

use super::error::StoreError;

/// A command understood by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get {
        key: String,
    },
    Set {
        key: String,
        value: Vec<u8>,
        /// `PX` expiry; `None` keeps the value until overwritten.
        expiry: Option<Duration>,
    },
}

impl Command {
    /// The key the command addresses.
    pub fn key(&self) -> &str {
        match self {
            Command::Get { key } | Command::Set { key, .. } => key,
        }
    }

    /// The expiry in whole milliseconds, as sent on the wire.
    pub fn expiry_millis(&self) -> Option<u128> {
        match self {
            Command::Set {
                expiry: Some(ttl), ..
            } => Some(ttl.as_millis()),
            _ => None,
        }
    }
}

/// A reply from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement of a `SET`.
    Ok,
    /// `GET` of a missing key.
    Nil,
    /// `GET` of a present key.
    Value(Vec<u8>),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Nil => f.write_str("(nil)"),
            Reply::Value(bytes) => write!(f, "({} bytes)", bytes.len()),
        }
    }
}

/// One exclusively held connection to the store.
pub trait Connection: Send {
    /// Queue a command without waiting for its reply.
    fn send(&mut self, command: Command) -> Result<(), StoreError>;

    /// Write every queued command to the store.
    fn flush(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read the reply to the oldest command not yet answered.
    fn receive(&mut self) -> impl Future<Output = Result<Reply, StoreError>> + Send;

    /// Send one command and wait for its reply.
    fn execute(
        &mut self,
        command: Command,
    ) -> impl Future<Output = Result<Reply, StoreError>> + Send {
        async move {
            self.send(command)?;
            self.flush().await?;
            self.receive().await
        }
    }
}

/// A pool that lends out connections.
pub trait Pool: Send + Sync {
    type Connection: Connection;

    /// Borrow a connection, waiting while all are in use.
    fn get(&self) -> impl Future<Output = Result<Self::Connection, StoreError>> + Send;

    /// Hand a connection back.
    fn release(&self, connection: Self::Connection) -> Result<(), StoreError>;
}

/// Return a connection to its pool, logging rather than surfacing failure.
pub(crate) fn release_logged<P: Pool>(pool: &P, connection: P::Connection) {
    if let Err(e) = pool.release(connection) {
        error!(error = %e, "error returning store connection to pool");
    }
}

/// Read a `GET` reply, mapping a nil reply to `NotFound`.
pub(crate) async fn get_bytes<C: Connection>(
    connection: &mut C,
    key: &str,
) -> Result<Vec<u8>, StoreError> {
    let reply = connection
        .execute(Command::Get {
            key: key.to_string(),
        })
        .await?;

    match reply {
        Reply::Value(bytes) => Ok(bytes),
        Reply::Nil => Err(StoreError::NotFound {
            key: key.to_string(),
        }),
        other => Err(StoreError::UnexpectedReply {
            key: key.to_string(),
            reply: other.to_string(),
        }),
    }
}
