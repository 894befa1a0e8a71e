use crate::error::SourceError;
use async_trait::async_trait;

/// A buy rate quoted by a bank, with the sell rate where the source
/// exposes one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub buy: f64,
    pub sell: Option<f64>,
}

/// A single remote source of exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Stable identifier used to tag readings, e.g. "ziraat".
    fn name(&self) -> &str;

    /// Fetches the current quote for the configured currency pair.
    /// Exactly one outbound call; no retries.
    async fn fetch_rate(&self) -> Result<RateQuote, SourceError>;
}
