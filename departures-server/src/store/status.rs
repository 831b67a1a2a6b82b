//! Last-updated time of the departures feed as a whole.

use chrono::{DateTime, SecondsFormat, Utc};

use super::SystemStatusStore;
use super::connection::{Command, Connection, Pool, Reply, get_bytes, release_logged};
use super::error::StoreError;

/// Stores the feed's last-updated time as RFC 3339 text under a single key.
///
/// The value has no expiry: a stale value is exactly what the API needs to
/// notice that the feed has stopped updating.
pub struct SystemStatusRepository<P> {
    pool: P,
    key: String,
}

impl<P: Pool> SystemStatusRepository<P> {
    pub fn new(pool: P, key: impl Into<String>) -> Self {
        Self {
            pool,
            key: key.into(),
        }
    }
}

impl<P: Pool> SystemStatusStore for SystemStatusRepository<P> {
    async fn get_last_updated(&self) -> Result<DateTime<Utc>, StoreError> {
        let mut connection = self.pool.get().await?;
        let bytes = get_bytes(&mut connection, &self.key).await;
        release_logged(&self.pool, connection);

        let decode_error = |message: String| StoreError::Decode {
            key: self.key.clone(),
            message,
        };
        let text = String::from_utf8(bytes?).map_err(|e| decode_error(e.to_string()))?;
        let parsed = DateTime::parse_from_rfc3339(&text).map_err(|e| decode_error(e.to_string()))?;

        Ok(parsed.with_timezone(&Utc))
    }

    async fn set_last_updated(&self, last_updated: DateTime<Utc>) -> Result<(), StoreError> {
        let value = last_updated
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .into_bytes();

        let mut connection = self.pool.get().await?;
        let reply = connection
            .execute(Command::Set {
                key: self.key.clone(),
                value,
                expiry: None,
            })
            .await;
        release_logged(&self.pool, connection);

        match reply? {
            Reply::Ok => Ok(()),
            other => Err(StoreError::UnexpectedReply {
                key: self.key.clone(),
                reply: other.to_string(),
            }),
        }
    }
}
