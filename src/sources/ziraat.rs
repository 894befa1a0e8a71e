use crate::error::SourceError;
use crate::rate_source::{RateQuote, RateSource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::USER_AGENT;

const CONVERTER_PATH: &str = "/en/_layouts/15/Ziraat/HesaplamaAraclari/Ajax.aspx/DovizCevirici";
const REFERER_PATH: &str = "/en/calculation-tools/foreign-exchange-converter";

// Static digest captured from a browser session. The endpoint keeps
// accepting it long after issue; once it finally expires the source
// degrades to a null reading until the digest is refreshed by hand.
const REQUEST_DIGEST: &str = "0x657E5DC32763E7674130DCFB45A67B070B84491447FD7822A620D9BBEEB362D0F48CF9433461A962B916178AB22370E58321E224665633A54021BC3F950645F4,11 Oct 2024 11:50:05 -0000";

/// Ziraat Bank's currency converter endpoint. A POST with the right
/// header set returns a JSON envelope whose `d.Data` field is the amount
/// of quote currency one unit of base currency buys.
pub struct ZiraatSource {
    base_url: String,
    base: String,
    quote: String,
}

impl ZiraatSource {
    pub fn new(base_url: &str, base: &str, quote: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConverterEnvelope {
    d: ConverterPayload,
}

#[derive(Debug, Deserialize)]
struct ConverterPayload {
    #[serde(rename = "Data")]
    data: serde_json::Value,
}

#[async_trait]
impl RateSource for ZiraatSource {
    fn name(&self) -> &str {
        "ziraat"
    }

    async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
        let url = format!("{}{}", self.base_url, CONVERTER_PATH);
        debug!("Requesting converter rate from {}", url);

        let body = json!({
            "alisDovizKodu": self.base,
            "satisDovizKodu": self.quote,
            "alisTutari": 1,
        });

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client
            .post(&url)
            .header("accept", "text/plain, */*; q=0.01")
            .header("content-type", "core/json")
            .header("x-requestdigest", REQUEST_DIGEST)
            .header("x-requested-with", "JQuery PageEvents")
            .header("referer", format!("{}{}", self.base_url, REFERER_PATH))
            .body(body.to_string())
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let envelope: ConverterEnvelope = serde_json::from_str(&text).map_err(|e| {
            SourceError::Format(format!("converter envelope did not parse: {e}. Body: '{text}'"))
        })?;

        let buy = envelope.d.data.as_f64().ok_or_else(|| {
            SourceError::Format(format!("d.Data is not numeric: {}", envelope.d.data))
        })?;

        // The converter quotes one direction only; no sell rate here.
        Ok(RateQuote { buy, sell: None })
    }
}
