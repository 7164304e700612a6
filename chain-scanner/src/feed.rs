//! Upstream market-data feed.
//!
//! [`QuoteFeed`] is the seam between the scan pipeline and the network: the
//! pipeline only ever asks for one batch of quotes at a time. [`HttpFeed`] is
//! the production implementation over `reqwest`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ScannerConfig;
use crate::errors::{Result, ScannerError};
use crate::models::quote::QuoteRecord;

/// Quotes keyed by feed token.
pub type QuoteMap = HashMap<String, QuoteRecord>;

const CANDLE_TIMEOUT: Duration = Duration::from_secs(20);

// ============================================================================
// Feed trait
// ============================================================================

/// Source of live quotes, one batch of feed tokens per call.
#[async_trait]
pub trait QuoteFeed: Send + Sync {
    async fn fetch_batch(&self, symbols: &[String]) -> Result<QuoteMap>;
}

/// Turn a decoded response body into quotes.
///
/// A body that is not a JSON object contributes nothing. Entries that fail to
/// decode are skipped individually so one bad record cannot void its batch.
pub fn parse_quote_map(body: Value) -> QuoteMap {
    let Value::Object(entries) = body else {
        tracing::warn!("quote response is not an object, ignoring batch");
        return QuoteMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(symbol, raw)| {
            if !raw.is_object() {
                tracing::warn!(%symbol, "skipping non-object quote entry");
                return None;
            }
            match serde_json::from_value::<QuoteRecord>(raw) {
                Ok(quote) => Some((symbol, quote)),
                Err(e) => {
                    tracing::warn!(%symbol, "skipping undecodable quote: {e}");
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// `reqwest`-backed client for the live-price and charting endpoints.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
    exchange: String,
    segment: String,
    referer: String,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    candles: Vec<Value>,
}

impl HttpFeed {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-app-id", HeaderValue::from_static("growwWeb"));
        headers.insert("x-device-type", HeaderValue::from_static("desktop"));
        headers.insert("x-platform", HeaderValue::from_static("web"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.feed_url.trim_end_matches('/').to_string(),
            exchange: config.exchange.clone(),
            segment: config.segment.clone(),
            referer: format!("https://groww.in/options/{}", config.index.to_lowercase()),
        })
    }

    fn batch_url(&self) -> String {
        format!(
            "{}/tr_live_prices/exchange/{}/segment/{}/latest_prices_batch",
            self.base_url, self.exchange, self.segment
        )
    }

    fn chart_url(&self, exchange: &str, symbol: &str) -> String {
        format!(
            "{}/charting_service/delayed/chart/exchange/{}/segment/{}/{}",
            self.base_url, exchange, self.segment, symbol
        )
    }

    /// Fetch one window of historical candles.
    ///
    /// `Ok(None)` means upstream answered with a non-success status; the window
    /// is skipped. Transport failures are returned as errors.
    pub async fn fetch_candles(
        &self,
        exchange: &str,
        symbol: &str,
        start_ms: i64,
        end_ms: i64,
        interval_minutes: u32,
    ) -> Result<Option<Vec<Value>>> {
        let url = self.chart_url(exchange, symbol);
        tracing::debug!(%url, start_ms, end_ms, "requesting candles");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("endTimeInMillis", end_ms.to_string()),
                ("intervalInMinutes", interval_minutes.to_string()),
                ("startTimeInMillis", start_ms.to_string()),
            ])
            .timeout(CANDLE_TIMEOUT)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            tracing::warn!(%url, status = response.status().as_u16(), "candle window skipped");
            return Ok(None);
        }

        let body: CandleResponse = response.json().await.map_err(map_transport)?;
        Ok(Some(body.candles))
    }
}

#[async_trait]
impl QuoteFeed for HttpFeed {
    async fn fetch_batch(&self, symbols: &[String]) -> Result<QuoteMap> {
        let url = self.batch_url();
        tracing::debug!(%url, count = symbols.len(), "requesting quote batch");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::REFERER, &self.referer)
            .json(symbols)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: Value = response.json().await.map_err(map_transport)?;
        Ok(parse_quote_map(body))
    }
}

fn map_transport(e: reqwest::Error) -> ScannerError {
    if e.is_timeout() {
        ScannerError::Timeout(e.to_string())
    } else if e.is_decode() {
        ScannerError::Decode(e.to_string())
    } else {
        ScannerError::Http(e)
    }
}
