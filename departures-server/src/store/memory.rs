//! In-process store backend.
//!
//! Implements the wire contract over a `moka` cache with per-entry expiry.
//! Commands queued with `send` are only applied on `flush`, and replies are
//! read back in order with `receive`, so pipelining behaves as it would
//! against a networked store.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache as MokaCache;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use super::connection::{Command, Connection, Pool, Reply};
use super::error::StoreError;

/// Configuration for the in-process store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of stored keys.
    pub max_capacity: u64,

    /// Maximum number of connections lent out at once.
    pub max_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_connections: 16,
        }
    }
}

/// A stored value and the expiry it was set with.
#[derive(Clone)]
struct Entry {
    value: Arc<Vec<u8>>,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL given in its `SET`.
struct SetExpiry;

impl Expiry<String, Entry> for SetExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Shared key-value storage behind every connection of a pool.
#[derive(Clone)]
pub struct MemoryStore {
    entries: MokaCache<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(config: &StoreConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(SetExpiry)
            .build();

        Self { entries }
    }

    async fn apply(&self, command: Command) -> Reply {
        match command {
            Command::Get { key } => match self.entries.get(&key).await {
                Some(entry) => Reply::Value(entry.value.as_ref().clone()),
                None => Reply::Nil,
            },
            Command::Set { key, value, expiry } => {
                let entry = Entry {
                    value: Arc::new(value),
                    ttl: expiry,
                };
                self.entries.insert(key, entry).await;
                Reply::Ok
            }
        }
    }

    /// Number of live entries (approximate, as reported by the cache).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

/// A pool of connections to a `MemoryStore`.
#[derive(Clone)]
pub struct MemoryPool {
    store: MemoryStore,
    permits: Arc<Semaphore>,
}

impl MemoryPool {
    /// Create a pool over a fresh store.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_store(MemoryStore::new(config), config.max_connections)
    }

    /// Create a pool over an existing store.
    pub fn with_store(store: MemoryStore, max_connections: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_connections)),
        }
    }

    /// The store behind this pool.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Connections currently available to borrow.
    pub fn idle_count(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Pool for MemoryPool {
    type Connection = MemoryConnection;

    async fn get(&self) -> Result<MemoryConnection, StoreError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| StoreError::Pool {
                message: "pool closed".to_string(),
            })?;

        Ok(MemoryConnection {
            store: self.store.clone(),
            queued: Vec::new(),
            replies: VecDeque::new(),
            _permit: permit,
        })
    }

    fn release(&self, connection: MemoryConnection) -> Result<(), StoreError> {
        let unread = connection.replies.len();
        let unflushed = connection.queued.len();

        // Dropping the connection returns its permit either way.
        drop(connection);

        if unread > 0 || unflushed > 0 {
            return Err(StoreError::Connection {
                message: format!(
                    "connection returned with {unread} unread replies and {unflushed} unflushed commands"
                ),
            });
        }

        Ok(())
    }
}

/// A connection borrowed from a `MemoryPool`.
pub struct MemoryConnection {
    store: MemoryStore,
    queued: Vec<Command>,
    replies: VecDeque<Reply>,
    _permit: OwnedSemaphorePermit,
}

impl Connection for MemoryConnection {
    fn send(&mut self, command: Command) -> Result<(), StoreError> {
        self.queued.push(command);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), StoreError> {
        trace!(commands = self.queued.len(), "flushing store connection");
        for command in std::mem::take(&mut self.queued) {
            let reply = self.store.apply(command).await;
            self.replies.push_back(reply);
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply, StoreError> {
        self.replies.pop_front().ok_or_else(|| StoreError::Connection {
            message: "receive called with no reply pending".to_string(),
        })
    }
}
