use super::{HistoryStore, QueryOutput, sort_key};
use crate::collector::CombinedReading;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

/// History store on an embedded fjall keyspace. One named partition
/// holds every record; composite keys keep a pair's records contiguous
/// and date-ordered, so a window query is a single range scan.
///
/// The engine has no TTL of its own, so `expire_at` is enforced on read
/// and expired entries are left for compaction.
pub struct FjallHistoryStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl FjallHistoryStore {
    /// Opens (or creates) the keyspace at `path` with the given
    /// partition name.
    pub fn open(path: &Path, partition_name: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let keyspace = fjall::Config::new(path).open()?;
        let partition =
            keyspace.open_partition(partition_name, PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl HistoryStore for FjallHistoryStore {
    async fn put(&self, record: &CombinedReading) -> Result<(), StoreError> {
        let key = sort_key(&record.pair, &record.date);
        debug!("Store PUT {}", key);

        self.partition.insert(&key, serde_json::to_vec(record)?)?;
        self.keyspace.persist(PersistMode::Buffer)?;
        Ok(())
    }

    async fn query(
        &self,
        pair: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<QueryOutput, StoreError> {
        let lo = sort_key(pair, &start);
        let hi = sort_key(pair, &end);
        let now = Utc::now().timestamp();
        debug!("Store RANGE {} ..= {}", lo, hi);

        let mut records = Vec::new();
        let mut read_units = 0;
        for entry in self.partition.range(lo..=hi) {
            let (_key, value) = entry?;
            read_units += 1;

            let record: CombinedReading = serde_json::from_slice(&value)?;
            if record.expire_at <= now {
                continue;
            }
            records.push(record);
        }

        Ok(QueryOutput {
            records,
            read_units,
        })
    }
}
