pub mod disk;
pub mod memory;

use crate::collector::CombinedReading;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

/// Result of a range query. `read_units` counts the entries the store
/// had to examine, exposed so the HTTP layer can surface consumption for
/// cost monitoring.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub records: Vec<CombinedReading>,
    pub read_units: u64,
}

/// Gateway to the rate history table: partition key `pair`, sort key
/// `date`.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Writes one record keyed by `(pair, date)`. Reusing a key
    /// overwrites silently.
    async fn put(&self, record: &CombinedReading) -> Result<(), StoreError>;

    /// Returns records for `pair` with `date` in `[start, end]`
    /// inclusive, oldest first. An empty range is an empty result, not
    /// an error.
    async fn query(
        &self,
        pair: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<QueryOutput, StoreError>;
}

/// Composite key for a record. RFC3339 at millisecond precision is fixed
/// width, so byte order within a pair equals chronological order.
pub(crate) fn sort_key(pair: &str, date: &DateTime<Utc>) -> String {
    format!(
        "{pair}#{}",
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
