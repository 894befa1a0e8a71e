use crate::error::StoreError;
use crate::rate_source::RateSource;
use crate::store::HistoryStore;
use chrono::{DateTime, Months, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// One source's contribution to a collection cycle. A failed source is
/// recorded with a null rate rather than dropped, so the slot order
/// always mirrors the configured source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_rate: Option<f64>,
}

/// The record persisted per collection cycle, keyed by `(pair, date)`.
/// Never mutated after creation; the store's expiry mechanism removes it
/// once `expire_at` passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReading {
    pub pair: String,
    pub date: DateTime<Utc>,
    pub rates: Vec<Reading>,
    /// Epoch seconds after which the record may be dropped.
    pub expire_at: i64,
}

/// Collection and persistence are separate phases: the cycle succeeds as
/// soon as the reading is assembled, and the write result rides along so
/// callers can observe it instead of it being discarded.
#[derive(Debug)]
pub struct CollectOutcome {
    pub reading: CombinedReading,
    pub persisted: Result<(), StoreError>,
}

pub struct RateCollector {
    pair: String,
    sources: Vec<Arc<dyn RateSource>>,
    store: Arc<dyn HistoryStore>,
    retention: Months,
}

impl RateCollector {
    pub fn new(
        pair: &str,
        sources: Vec<Arc<dyn RateSource>>,
        store: Arc<dyn HistoryStore>,
        retention_months: u32,
    ) -> Self {
        Self {
            pair: pair.to_string(),
            sources,
            store,
            retention: Months::new(retention_months),
        }
    }

    /// Fetches every source concurrently, assembles the combined reading
    /// in configured source order, and writes it best-effort.
    pub async fn collect(&self) -> CollectOutcome {
        let collected_at = Utc::now();
        debug!(pair = %self.pair, "Collecting rates from {} sources", self.sources.len());

        let fetches = self.sources.iter().map(|source| source.fetch_rate());
        let results = future::join_all(fetches).await;

        let rates = self
            .sources
            .iter()
            .zip(results)
            .map(|(source, result)| match result {
                Ok(quote) => Reading {
                    name: source.name().to_string(),
                    rate: Some(quote.buy),
                    sell_rate: quote.sell,
                },
                Err(error) => {
                    warn!(source = source.name(), %error, "Rate fetch failed");
                    Reading {
                        name: source.name().to_string(),
                        rate: None,
                        sell_rate: None,
                    }
                }
            })
            .collect();

        let expire_at = collected_at
            .checked_add_months(self.retention)
            .unwrap_or(collected_at)
            .timestamp();

        let reading = CombinedReading {
            pair: self.pair.clone(),
            date: collected_at,
            rates,
            expire_at,
        };

        let persisted = self.store.put(&reading).await;
        if let Err(error) = &persisted {
            warn!(%error, "Combined reading was not persisted");
        }

        CollectOutcome { reading, persisted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::rate_source::RateQuote;
    use crate::store::QueryOutput;
    use crate::store::memory::MemoryHistoryStore;
    use async_trait::async_trait;
    use chrono::Duration;

    struct FixedSource {
        name: &'static str,
        quote: Option<RateQuote>,
    }

    #[async_trait]
    impl RateSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
            self.quote
                .ok_or_else(|| SourceError::Format("nothing to quote".to_string()))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl HistoryStore for FailingStore {
        async fn put(&self, _record: &CombinedReading) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn query(
            &self,
            _pair: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<QueryOutput, StoreError> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
    }

    fn sources(
        ziraat: Option<RateQuote>,
        isbank: Option<RateQuote>,
    ) -> Vec<Arc<dyn RateSource>> {
        vec![
            Arc::new(FixedSource {
                name: "ziraat",
                quote: ziraat,
            }),
            Arc::new(FixedSource {
                name: "isbank",
                quote: isbank,
            }),
        ]
    }

    #[tokio::test]
    async fn test_collect_tags_readings_with_source_names() {
        let store = Arc::new(MemoryHistoryStore::new());
        let collector = RateCollector::new(
            "USD_TRY",
            sources(
                Some(RateQuote {
                    buy: 34.10,
                    sell: None,
                }),
                Some(RateQuote {
                    buy: 34.12,
                    sell: Some(34.76),
                }),
            ),
            store,
            60,
        );

        let outcome = collector.collect().await;
        let rates = &outcome.reading.rates;

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].name, "ziraat");
        assert_eq!(rates[0].rate, Some(34.10));
        assert_eq!(rates[1].name, "isbank");
        assert_eq!(rates[1].rate, Some(34.12));
        assert_eq!(rates[1].sell_rate, Some(34.76));
        assert!(outcome.persisted.is_ok());
    }

    #[tokio::test]
    async fn test_failed_source_degrades_to_null_rate() {
        let store = Arc::new(MemoryHistoryStore::new());
        let collector = RateCollector::new(
            "USD_TRY",
            sources(
                Some(RateQuote {
                    buy: 34.10,
                    sell: None,
                }),
                None,
            ),
            store,
            60,
        );

        let outcome = collector.collect().await;
        let rates = &outcome.reading.rates;

        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].rate, Some(34.10));
        assert_eq!(rates[1].name, "isbank");
        assert_eq!(rates[1].rate, None);
        assert!(outcome.persisted.is_ok());
    }

    #[tokio::test]
    async fn test_all_sources_failing_still_yields_full_slot_list() {
        let store = Arc::new(MemoryHistoryStore::new());
        let collector = RateCollector::new("USD_TRY", sources(None, None), store, 60);

        let outcome = collector.collect().await;

        assert_eq!(outcome.reading.rates.len(), 2);
        assert!(outcome.reading.rates.iter().all(|r| r.rate.is_none()));
        assert!(outcome.persisted.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_fail_collection() {
        let collector = RateCollector::new(
            "USD_TRY",
            sources(
                Some(RateQuote {
                    buy: 34.10,
                    sell: None,
                }),
                None,
            ),
            Arc::new(FailingStore),
            60,
        );

        let outcome = collector.collect().await;

        assert_eq!(outcome.reading.rates.len(), 2);
        assert!(outcome.persisted.is_err());
    }

    #[tokio::test]
    async fn test_expiry_is_retention_months_out() {
        let store = Arc::new(MemoryHistoryStore::new());
        let collector = RateCollector::new("USD_TRY", sources(None, None), store, 60);

        let outcome = collector.collect().await;
        let reading = &outcome.reading;

        let five_years = reading.date + Duration::days(5 * 365);
        let slack = Duration::days(5);
        assert!(reading.expire_at >= (five_years - slack).timestamp());
        assert!(reading.expire_at <= (five_years + slack).timestamp());
    }

    #[tokio::test]
    async fn test_collected_reading_is_persisted() {
        let store = Arc::new(MemoryHistoryStore::new());
        let collector = RateCollector::new(
            "USD_TRY",
            sources(
                Some(RateQuote {
                    buy: 34.10,
                    sell: None,
                }),
                None,
            ),
            Arc::clone(&store) as Arc<dyn HistoryStore>,
            60,
        );

        let outcome = collector.collect().await;
        assert!(outcome.persisted.is_ok());

        let window_start = outcome.reading.date - Duration::minutes(1);
        let window_end = outcome.reading.date + Duration::minutes(1);
        let output = store
            .query("USD_TRY", window_start, window_end)
            .await
            .unwrap();

        assert_eq!(output.records, vec![outcome.reading]);
    }
}
