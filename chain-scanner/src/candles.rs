//! Historical candle download for a single option contract.
//!
//! The charting endpoint serves at most about a week per request, so a date
//! range is split into 7-day windows covering the 09:00-16:00 IST session.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ScannerError};
use crate::expiry::exchange_offset;
use crate::feed::HttpFeed;

const WINDOW_DAYS: u64 = 7;
const DATE_FORMAT: &str = "%d-%m-%Y";

/// Exchange listing the options of a supported index.
pub fn exchange_for_index(index: &str) -> Option<&'static str> {
    match index.to_uppercase().as_str() {
        "NIFTY" | "BANKNIFTY" | "FINNIFTY" => Some("NSE"),
        "SENSEX" => Some("BSE"),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ScannerError::InvalidDate(raw.to_string()))
}

fn session_millis(date: NaiveDate, hour: u32) -> Result<i64> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| ScannerError::InvalidDate(format!("{date} {hour}:00")))?;
    exchange_offset()
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| ScannerError::InvalidDate(date.to_string()))
}

/// Split `start..=end` (both `DD-MM-YYYY`) into `(start_ms, end_ms)` windows of
/// at most seven calendar days. Each window opens at 09:00 IST on its first day
/// and closes at 16:00 IST on its last. A start after the end yields no windows.
pub fn candle_windows(start: &str, end: &str) -> Result<Vec<(i64, i64)>> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    let mut windows = Vec::new();
    let mut current = start;
    while current <= end {
        let window_end = current
            .checked_add_days(Days::new(WINDOW_DAYS - 1))
            .map_or(end, |d| d.min(end));
        windows.push((session_millis(current, 9)?, session_millis(window_end, 16)?));
        current = match window_end.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(windows)
}

/// Drop exact duplicates (first occurrence wins) and order by the leading
/// timestamp column.
pub fn merge_candles(candles: Vec<Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Value> = candles
        .into_iter()
        .filter(|candle| seen.insert(candle.to_string()))
        .collect();
    unique.sort_by(|a, b| candle_time(a).total_cmp(&candle_time(b)));
    unique
}

fn candle_time(candle: &Value) -> f64 {
    candle
        .get(0)
        .and_then(Value::as_f64)
        .unwrap_or(f64::NEG_INFINITY)
}

// ============================================================================
// Request / Response
// ============================================================================

/// Query for one contract's candles. `year` and `month` are passed through
/// verbatim into the symbol, so callers supply them in feed notation.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleRequest {
    pub index_name: String,
    pub year: String,
    pub month: String,
    pub strike: String,
    pub option_type: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl CandleRequest {
    pub fn symbol(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index_name.to_uppercase(),
            self.year,
            self.month,
            self.strike,
            self.option_type
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub exchange: String,
    pub interval: u32,
    pub total_candles: usize,
    pub candles: Vec<Value>,
}

/// Download every window sequentially, pausing `pause` after each request.
///
/// Windows the upstream rejects are skipped; a transport failure aborts the
/// whole download.
pub async fn download_candles(feed: &HttpFeed, request: &CandleRequest, pause: Duration) -> Result<CandleSeries> {
    let exchange = exchange_for_index(&request.index_name)
        .ok_or_else(|| ScannerError::UnsupportedIndex(request.index_name.clone()))?;
    let symbol = request.symbol();
    let windows = candle_windows(&request.start_date, &request.end_date)?;

    let mut collected = Vec::new();
    for (start_ms, end_ms) in windows {
        if let Some(candles) = feed
            .fetch_candles(exchange, &symbol, start_ms, end_ms, request.interval)
            .await?
        {
            collected.extend(candles);
        }
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    let candles = merge_candles(collected);
    tracing::info!(%symbol, exchange, total = candles.len(), "candles downloaded");

    Ok(CandleSeries {
        symbol,
        exchange: exchange.to_string(),
        interval: request.interval,
        total_candles: candles.len(),
        candles,
    })
}
