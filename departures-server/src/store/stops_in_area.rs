//! Member stops of each stop area.

use std::collections::HashMap;
use std::time::Duration;

use super::StopsInAreaStore;
use super::codec::{Codec, JsonCodec};
use super::connection::{Command, Pool, get_bytes, release_logged};
use super::error::StoreError;
use super::pipeline::write_batch;

/// Stores each area's stop codes under `{prefix}_{area_code}`.
pub struct StopsInAreaRepository<P> {
    pool: P,
    key_prefix: String,
    ttl: Duration,
}

impl<P: Pool> StopsInAreaRepository<P> {
    pub fn new(pool: P, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    fn key(&self, area_code: &str) -> String {
        format!("{}_{}", self.key_prefix, area_code)
    }
}

impl<P: Pool> StopsInAreaStore for StopsInAreaRepository<P> {
    async fn get(&self, area_code: &str) -> Result<Vec<String>, StoreError> {
        let key = self.key(area_code);

        let mut connection = self.pool.get().await?;
        let bytes = get_bytes(&mut connection, &key).await;
        release_logged(&self.pool, connection);

        JsonCodec
            .decode(&bytes?)
            .map_err(|message| StoreError::Decode { key, message })
    }

    async fn store(&self, areas: HashMap<String, Vec<String>>) -> Result<(), StoreError> {
        let commands: Vec<_> = areas
            .iter()
            .map(|(area_code, stops)| {
                let key = self.key(area_code);
                let value = Codec::<Vec<String>>::encode(&JsonCodec, stops).map_err(|message| {
                    StoreError::Encode {
                        key: key.clone(),
                        message,
                    }
                })?;
                Ok(Command::Set {
                    key,
                    value,
                    expiry: Some(self.ttl),
                })
            })
            .collect();

        let mut connection = self.pool.get().await?;
        let result = write_batch(&mut connection, commands).await;
        release_logged(&self.pool, connection);

        result
    }
}
