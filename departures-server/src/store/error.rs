//! Cache store error types.

use crate::error::ErrorList;

/// Errors from the cache store and the repositories built on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key (never set, or expired).
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// No connection could be borrowed from the pool.
    #[error("connection pool error: {message}")]
    Pool { message: String },

    /// The connection is unusable or out of step with its replies.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// The store answered a command with an error reply.
    #[error("store error reply: {message}")]
    Server { message: String },

    /// The store answered with a reply of the wrong kind.
    #[error("unexpected reply for {key}: {reply}")]
    UnexpectedReply { key: String, reply: String },

    /// A value could not be encoded for storage.
    #[error("error encoding value for {key}: {message}")]
    Encode { key: String, message: String },

    /// A stored value could not be decoded.
    #[error("error decoding value for {key}: {message}")]
    Decode { key: String, message: String },

    /// A command could not be queued on the connection.
    #[error("error sending command for {key}: {message}")]
    Send { key: String, message: String },

    /// Queued commands could not be written out.
    #[error("error flushing connection: {message}")]
    Flush { message: String },

    /// Failures while encoding, queueing or flushing a pipelined batch.
    #[error("error sending/flushing pipelined batch: {0}")]
    SendPhase(ErrorList<StoreError>),

    /// Failures while reading the replies to a pipelined batch.
    #[error("error receiving pipelined replies: {0}")]
    ReceivePhase(ErrorList<StoreError>),

    /// Several independent failures.
    #[error("{0}")]
    Multiple(ErrorList<StoreError>),
}

impl StoreError {
    /// True for the expected "nothing stored here" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
