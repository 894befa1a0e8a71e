use crate::error::SourceError;
use crate::rate_source::{RateQuote, RateSource};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use super::USER_AGENT;

const RATES_PATH: &str = "/en/foreign-exchange-rates";

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));

static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static pattern"));

/// Isbank publishes its rates as an HTML table with no stable classes or
/// ids to anchor on. The row for a currency is found by its code in the
/// row text, and the first two numbers in that row are the buy and sell
/// rates, in that order. Positional extraction is what the page
/// supports; the numbers sit interleaved with codes and labels.
pub struct IsbankSource {
    base_url: String,
    marker: String,
}

impl IsbankSource {
    /// `marker` is the currency code the row must contain, e.g. "USD".
    pub fn new(base_url: &str, marker: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            marker: marker.to_string(),
        }
    }
}

/// Extracts the quote from the rates page. Commas become periods before
/// token matching; the site writes decimals the Turkish way.
fn parse_quote(html: &str, marker: &str) -> Result<RateQuote, SourceError> {
    let document = Html::parse_document(html);

    let row_text = document
        .select(&ROW_SELECTOR)
        .map(|row| row.text().collect::<String>())
        .find(|text| text.contains(marker))
        .ok_or_else(|| SourceError::Format(format!("no table row mentioning {marker}")))?;

    let normalized = row_text.replace(',', ".");
    let mut numbers = NUMERIC_TOKEN
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok());

    let buy = numbers
        .next()
        .ok_or_else(|| SourceError::Format(format!("no numeric token in {marker} row")))?;
    let sell = numbers.next();

    Ok(RateQuote { buy, sell })
}

#[async_trait]
impl RateSource for IsbankSource {
    fn name(&self) -> &str {
        "isbank"
    }

    async fn fetch_rate(&self) -> Result<RateQuote, SourceError> {
        let url = format!("{}{}", self.base_url, RATES_PATH);
        debug!("Requesting rates page from {}", url);

        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = client.get(&url).send().await?.error_for_status()?;
        let html = response.text().await?;

        parse_quote(&html, &self.marker)
    }
}
