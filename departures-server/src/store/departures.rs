//! Cached departure groups, one per stop.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use super::DepartureStore;
use super::codec::{Codec, JsonCodec};
use super::connection::{Command, Pool, get_bytes, release_logged};
use super::error::StoreError;
use super::pipeline::write_batch;
use crate::domain::Departure;

/// Stores each stop's departures as one blob under `{prefix}_{atco_code}`,
/// expiring after `ttl`.
pub struct DepartureRepository<P, C = JsonCodec> {
    pool: P,
    key_prefix: String,
    ttl: Duration,
    codec: C,
}

impl<P: Pool> DepartureRepository<P> {
    /// Create a repository using JSON encoding.
    pub fn new(pool: P, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self::with_codec(pool, key_prefix, ttl, JsonCodec)
    }
}

impl<P: Pool, C: Codec<Vec<Departure>>> DepartureRepository<P, C> {
    /// Create a repository with a custom codec.
    pub fn with_codec(pool: P, key_prefix: impl Into<String>, ttl: Duration, codec: C) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
            ttl,
            codec,
        }
    }

    fn key(&self, atco_code: &str) -> String {
        format!("{}_{}", self.key_prefix, atco_code)
    }

    fn set_command(&self, atco_code: &str, group: &Vec<Departure>) -> Result<Command, StoreError> {
        let key = self.key(atco_code);
        let value = self.codec.encode(group).map_err(|message| StoreError::Encode {
            key: key.clone(),
            message,
        })?;

        Ok(Command::Set {
            key,
            value,
            expiry: Some(self.ttl),
        })
    }
}

/// Group departures by stop, keeping feed order within each stop.
fn group_by_stop(departures: Vec<Departure>) -> BTreeMap<String, Vec<Departure>> {
    let mut groups: BTreeMap<String, Vec<Departure>> = BTreeMap::new();
    for departure in departures {
        groups
            .entry(departure.atco_code.clone())
            .or_default()
            .push(departure);
    }
    groups
}

impl<P, C> DepartureStore for DepartureRepository<P, C>
where
    P: Pool,
    C: Codec<Vec<Departure>>,
{
    async fn get(&self, atco_code: &str) -> Result<Vec<Departure>, StoreError> {
        let key = self.key(atco_code);

        let mut connection = self.pool.get().await?;
        let bytes = get_bytes(&mut connection, &key).await;
        release_logged(&self.pool, connection);

        self.codec
            .decode(&bytes?)
            .map_err(|message| StoreError::Decode { key, message })
    }

    async fn store(&self, departures: Vec<Departure>) -> Result<(), StoreError> {
        let groups = group_by_stop(departures);
        debug!(stops = groups.len(), "storing departure groups");

        let commands: Vec<_> = groups
            .iter()
            .map(|(atco_code, group)| self.set_command(atco_code, group))
            .collect();

        let mut connection = self.pool.get().await?;
        let result = write_batch(&mut connection, commands).await;
        release_logged(&self.pool, connection);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Wait;
    use crate::store::connection::{Connection, Reply};
    use crate::store::memory::{MemoryPool, StoreConfig};
    use crate::store::pipeline::testing::{Script, ScriptedPool};

    fn departure(atco_code: &str, order: u8, destination: &str) -> Departure {
        Departure {
            atco_code: atco_code.to_string(),
            order,
            destination: destination.to_string(),
            carriages: "Single".to_string(),
            status: "Due".to_string(),
            wait: Wait::from_minutes(i64::from(order) * 3),
            platform: None,
            last_updated: "2021-01-02T10:00:00Z".parse().unwrap(),
        }
    }

    fn memory_repo() -> DepartureRepository<MemoryPool> {
        let pool = MemoryPool::new(&StoreConfig::default());
        DepartureRepository::new(pool, "metrolink_departures", Duration::from_secs(15))
    }

    /// Fails to encode any group belonging to one stop.
    struct FailingCodec {
        atco_code: &'static str,
    }

    impl Codec<Vec<Departure>> for FailingCodec {
        fn encode(&self, value: &Vec<Departure>) -> Result<Vec<u8>, String> {
            if value.iter().any(|d| d.atco_code == self.atco_code) {
                return Err("cannot encode".to_string());
            }
            Codec::<Vec<Departure>>::encode(&JsonCodec, value)
        }

        fn decode(&self, bytes: &[u8]) -> Result<Vec<Departure>, String> {
            JsonCodec.decode(bytes)
        }
    }

    #[test]
    fn groups_preserve_feed_order() {
        let groups = group_by_stop(vec![
            departure("B", 0, "Bury"),
            departure("A", 0, "Altrincham"),
            departure("B", 1, "Piccadilly"),
        ]);
        assert_eq!(groups.len(), 2);
        let b: Vec<_> = groups["B"].iter().map(|d| d.destination.as_str()).collect();
        assert_eq!(b, ["Bury", "Piccadilly"]);
    }

    #[tokio::test]
    async fn store_then_get() {
        let repo = memory_repo();
        repo.store(vec![
            departure("9400ZZMASTP1", 0, "Bury"),
            departure("9400ZZMASTP1", 1, "Altrincham"),
            departure("9400ZZMASTP2", 0, "Eccles"),
        ])
        .await
        .unwrap();

        let stp1 = repo.get("9400ZZMASTP1").await.unwrap();
        assert_eq!(stp1.len(), 2);
        assert_eq!(stp1[0].destination, "Bury");

        let stp2 = repo.get("9400ZZMASTP2").await.unwrap();
        assert_eq!(stp2.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_stop_is_not_found() {
        let repo = memory_repo();
        let err = repo.get("9400ZZMAXXX1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn store_overwrites_previous_group() {
        let repo = memory_repo();
        repo.store(vec![departure("9400ZZMASTP1", 0, "Bury")])
            .await
            .unwrap();
        repo.store(vec![departure("9400ZZMASTP1", 0, "Eccles")])
            .await
            .unwrap();

        let stp1 = repo.get("9400ZZMASTP1").await.unwrap();
        assert_eq!(stp1.len(), 1);
        assert_eq!(stp1[0].destination, "Eccles");
    }

    #[tokio::test]
    async fn undecodable_value_is_decode_error() {
        let pool = MemoryPool::new(&StoreConfig::default());
        let mut conn = pool.get().await.unwrap();
        conn.execute(Command::Set {
            key: "metrolink_departures_9400ZZMASTP1".into(),
            value: b"garbage".to_vec(),
            expiry: None,
        })
        .await
        .unwrap();
        pool.release(conn).unwrap();

        let repo = DepartureRepository::new(pool, "metrolink_departures", Duration::from_secs(15));
        let err = repo.get("9400ZZMASTP1").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn one_group_failing_to_encode_still_writes_the_others() {
        let pool = ScriptedPool::default();
        let repo = DepartureRepository::with_codec(
            pool.clone(),
            "metrolink_departures",
            Duration::from_secs(15),
            FailingCodec {
                atco_code: "9400ZZMABAD1",
            },
        );

        let err = repo
            .store(vec![
                departure("9400ZZMASTP1", 0, "Bury"),
                departure("9400ZZMABAD1", 0, "Eccles"),
                departure("9400ZZMASTP2", 0, "Altrincham"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SendPhase(_)));
        assert!(err.to_string().contains("9400ZZMABAD1"));

        let rec = pool.recording.lock().unwrap();
        let keys: Vec<_> = rec.sent.iter().map(|c| c.key().to_string()).collect();
        assert_eq!(
            keys,
            [
                "metrolink_departures_9400ZZMASTP1",
                "metrolink_departures_9400ZZMASTP2"
            ]
        );
        assert_eq!(rec.flushes, 1);
        assert_eq!(rec.receives, 2);
        assert_eq!(rec.releases, 1);
    }

    #[tokio::test]
    async fn set_commands_carry_ttl() {
        let pool = ScriptedPool::default();
        let repo =
            DepartureRepository::new(pool.clone(), "metrolink_departures", Duration::from_secs(15));

        repo.store(vec![departure("9400ZZMASTP1", 0, "Bury")])
            .await
            .unwrap();

        let rec = pool.recording.lock().unwrap();
        assert_eq!(rec.sent[0].expiry_millis(), Some(15_000));
    }

    #[tokio::test]
    async fn release_failure_is_not_surfaced() {
        let pool = ScriptedPool::new(Script {
            fail_release: true,
            replies: vec![Ok(Reply::Ok)].into(),
            ..Script::default()
        });
        let repo =
            DepartureRepository::new(pool.clone(), "metrolink_departures", Duration::from_secs(15));

        let result = repo.store(vec![departure("9400ZZMASTP1", 0, "Bury")]).await;
        assert!(result.is_ok());
        assert_eq!(pool.recording.lock().unwrap().releases, 1);
    }
}
