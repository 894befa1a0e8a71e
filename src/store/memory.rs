use super::{HistoryStore, QueryOutput, sort_key};
use crate::collector::CombinedReading;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-memory history store backed by a BTreeMap over the same composite
/// keys as the persistent one. Used by tests and anywhere a throwaway
/// store is enough.
pub struct MemoryHistoryStore {
    inner: Mutex<BTreeMap<String, CombinedReading>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn put(&self, record: &CombinedReading) -> Result<(), StoreError> {
        let key = sort_key(&record.pair, &record.date);
        self.inner.lock().await.insert(key, record.clone());
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

        let map = self.inner.lock().await;
        let mut records = Vec::new();
        let mut read_units = 0;
        for (_key, record) in map.range(lo..=hi) {
            read_units += 1;
            if record.expire_at <= now {
                continue;
            }
            records.push(record.clone());
        }

        Ok(QueryOutput {
            records,
            read_units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Reading;
    use chrono::TimeZone;

    fn record(pair: &str, date: DateTime<Utc>, rate: f64) -> CombinedReading {
        CombinedReading {
            pair: pair.to_string(),
            date,
            rates: vec![Reading {
                name: "ziraat".to_string(),
                rate: Some(rate),
                sell_rate: None,
            }],
            expire_at: (Utc::now() + chrono::Duration::days(365)).timestamp(),
        }
    }

    #[tokio::test]
    async fn test_query_empty_store_returns_empty() {
        let store = MemoryHistoryStore::new();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();

        let output = store.query("USD_TRY", start, end).await.unwrap();

        assert!(output.records.is_empty());
        assert_eq!(output.read_units, 0);
    }

    #[tokio::test]
    async fn test_query_is_bounded_and_ascending() {
        let store = MemoryHistoryStore::new();
        let d1 = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 10, 2, 9, 0, 0).unwrap();
        let d3 = Utc.with_ymd_and_hms(2024, 10, 3, 9, 0, 0).unwrap();

        store.put(&record("USD_TRY", d2, 34.2)).await.unwrap();
        store.put(&record("USD_TRY", d3, 34.3)).await.unwrap();
        store.put(&record("USD_TRY", d1, 34.1)).await.unwrap();

        let output = store.query("USD_TRY", d1, d2).await.unwrap();

        let rates: Vec<_> = output
            .records
            .iter()
            .map(|r| r.rates[0].rate.unwrap())
            .collect();
        assert_eq!(rates, vec![34.1, 34.2]);
    }

    #[tokio::test]
    async fn test_query_does_not_cross_pairs() {
        let store = MemoryHistoryStore::new();
        let date = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();

        store.put(&record("USD_TRY", date, 34.1)).await.unwrap();
        store.put(&record("EUR_TRY", date, 36.9)).await.unwrap();

        let output = store
            .query(
                "USD_TRY",
                date - chrono::Duration::days(1),
                date + chrono::Duration::days(1),
            )
            .await
            .unwrap();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].pair, "USD_TRY");
    }

    #[tokio::test]
    async fn test_put_same_key_overwrites() {
        let store = MemoryHistoryStore::new();
        let date = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();

        store.put(&record("USD_TRY", date, 34.1)).await.unwrap();
        store.put(&record("USD_TRY", date, 34.9)).await.unwrap();

        let output = store.query("USD_TRY", date, date).await.unwrap();

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].rates[0].rate, Some(34.9));
    }

    #[tokio::test]
    async fn test_expired_records_are_skipped() {
        let store = MemoryHistoryStore::new();
        let date = Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap();

        let mut expired = record("USD_TRY", date, 34.1);
        expired.expire_at = (Utc::now() - chrono::Duration::days(1)).timestamp();
        store.put(&expired).await.unwrap();

        let output = store.query("USD_TRY", date, date).await.unwrap();

        assert!(output.records.is_empty());
        // The entry was still examined.
        assert_eq!(output.read_units, 1);
    }
}
