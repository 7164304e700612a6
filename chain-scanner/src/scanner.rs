//! Scan pipeline and result envelope.
//!
//! One call to [`ChainScanner::scan`] resolves the expiry, generates the
//! universe, fetches quotes batch by batch, then filters, scores, explains and
//! sorts the active contracts. Nothing survives between scans: the expiry is
//! recomputed each time and every scan owns its quote accumulator.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::ScannerConfig;
use crate::context::{build_conclusion, build_context};
use crate::errors::{Result, ScannerError};
use crate::expiry::{exchange_now, resolve_expiry, Expiry};
use crate::feed::{QuoteFeed, QuoteMap};
use crate::fetcher::BatchFetcher;
use crate::models::entry::{QuoteSummary, RankedEntry};
use crate::models::enums::ScanStatus;
use crate::ranking::{is_active, rank_score, sort_by_rank, volume_available, volume_signal};
use crate::universe::ScanUniverse;

const EMPTY_MESSAGE: &str = "No active options found";

// ============================================================================
// Result envelope
// ============================================================================

/// Outcome of one scan, serialized as the dashboard envelope:
/// `{status, message?, timestamp, expiry?, count, data}` where `data` maps
/// feed token to entry in rank order.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub status: ScanStatus,
    pub message: Option<String>,
    pub timestamp: String,
    pub expiry: Option<String>,
    pub entries: Vec<RankedEntry>,
}

impl ScanResult {
    /// Wrap ranked entries, choosing `success` or `empty` by count.
    pub fn assemble(entries: Vec<RankedEntry>, expiry: &Expiry, at: DateTime<FixedOffset>) -> Self {
        let (status, message) = if entries.is_empty() {
            (ScanStatus::Empty, Some(EMPTY_MESSAGE.to_string()))
        } else {
            (ScanStatus::Success, None)
        };
        Self {
            status,
            message,
            timestamp: at.to_rfc3339(),
            expiry: Some(expiry.label()),
            entries,
        }
    }

    pub fn error(message: impl Into<String>, at: DateTime<FixedOffset>) -> Self {
        Self {
            status: ScanStatus::Error,
            message: Some(message.into()),
            timestamp: at.to_rfc3339(),
            expiry: None,
            entries: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

struct RankedMap<'a>(&'a [RankedEntry]);

impl Serialize for RankedMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.symbol, entry)?;
        }
        map.end()
    }
}

impl Serialize for ScanResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", &self.status)?;
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        map.serialize_entry("timestamp", &self.timestamp)?;
        if let Some(expiry) = &self.expiry {
            map.serialize_entry("expiry", expiry)?;
        }
        map.serialize_entry("count", &self.count())?;
        map.serialize_entry("data", &RankedMap(&self.entries))?;
        map.end()
    }
}

// ============================================================================
// Ranking stage
// ============================================================================

/// Filter, score, explain and sort the quotes of one scan.
///
/// Entries are built in universe order before the stable sort, so ties keep
/// ascending-strike, CE-before-PE order. Quotes for tokens outside the universe
/// count toward volume detection but are never ranked.
pub fn rank_universe(universe: &ScanUniverse, quotes: &QuoteMap, config: &ScannerConfig) -> Vec<RankedEntry> {
    let has_volume = volume_available(quotes.values());

    let mut entries: Vec<RankedEntry> = universe
        .contracts()
        .iter()
        .filter_map(|contract| {
            let symbol = contract.token();
            let quote = quotes.get(&symbol)?;
            if !is_active(quote, &config.activity) {
                return None;
            }
            let signal = volume_signal(quote);
            Some(RankedEntry {
                quote: QuoteSummary::from(quote),
                volume_signal: signal,
                rank_score: rank_score(quote, has_volume, &config.weights),
                context: build_context(quote, has_volume, signal),
                conclusion: build_conclusion(quote),
                symbol,
            })
        })
        .collect();

    sort_by_rank(&mut entries);
    entries
}

// ============================================================================
// Scanner
// ============================================================================

/// Options chain scanner bound to one feed and configuration.
#[derive(Clone)]
pub struct ChainScanner {
    config: ScannerConfig,
    feed: Arc<dyn QuoteFeed>,
}

impl ChainScanner {
    pub fn new(config: ScannerConfig, feed: Arc<dyn QuoteFeed>) -> Self {
        Self { config, feed }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Run one scan against the exchange clock.
    pub async fn scan(&self) -> ScanResult {
        self.scan_at(exchange_now()).await
    }

    /// Run one scan as of `now`. Pipeline errors become an `error` envelope.
    pub async fn scan_at(&self, now: DateTime<FixedOffset>) -> ScanResult {
        match self.run(now).await {
            Ok((expiry, entries)) => ScanResult::assemble(entries, &expiry, now),
            Err(e) => {
                tracing::error!("scan failed: {e}");
                ScanResult::error(e.to_string(), now)
            }
        }
    }

    /// Run one scan on its own task so that even a panic inside the pipeline
    /// comes back as an `error` envelope.
    pub async fn scan_isolated(self: Arc<Self>) -> ScanResult {
        let now = exchange_now();
        match tokio::spawn(async move { self.scan_at(now).await }).await {
            Ok(result) => result,
            Err(e) => {
                let err = ScannerError::Task(e.to_string());
                tracing::error!("{err}");
                ScanResult::error(err.to_string(), now)
            }
        }
    }

    async fn run(&self, now: DateTime<FixedOffset>) -> Result<(Expiry, Vec<RankedEntry>)> {
        let config = &self.config;
        config.validate()?;

        let expiry = resolve_expiry(now.naive_local(), &config.expiry);
        if expiry.degraded {
            tracing::warn!("using degraded expiry {}", expiry.label());
        }

        let universe = ScanUniverse::generate(
            &config.index,
            config.strike_start,
            config.strike_end,
            config.strike_step,
            expiry.date,
        );
        let batches = universe.batches(config.batch_size);

        let fetcher = BatchFetcher::new(self.feed.as_ref(), config.max_concurrency, config.pacing());
        let summary = fetcher.fetch_merged(batches).await;

        let entries = rank_universe(&universe, &summary.quotes, config);

        tracing::info!(
            expiry = %expiry.label(),
            contracts = universe.len(),
            batches = summary.batches,
            failed_batches = summary.failed_batches,
            quotes = summary.quotes.len(),
            active = entries.len(),
            "scan complete"
        );

        Ok((expiry, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quote::QuoteRecord;
    use chrono::{NaiveDate, TimeZone};

    fn universe() -> ScanUniverse {
        ScanUniverse::generate("NIFTY", 24000, 24100, 50, NaiveDate::from_ymd_opt(2025, 10, 14).unwrap())
    }

    fn active(volume: i64, oi: i64) -> QuoteRecord {
        QuoteRecord {
            last_traded_price: 50.0,
            open_interest: oi,
            volume,
            total_buy_qty: 10_000,
            total_sell_qty: 10_000,
            ..QuoteRecord::default()
        }
    }

    #[test]
    fn volume_mode_ranks_by_raw_volume() {
        let mut quotes = QuoteMap::new();
        quotes.insert("NIFTY25101424000CE".into(), active(100, 5000));
        quotes.insert("NIFTY25101424000PE".into(), active(900, 5000));
        quotes.insert("NIFTY25101424050CE".into(), active(0, 50_000));

        let entries = rank_universe(&universe(), &quotes, &ScannerConfig::default());
        let order: Vec<&str> = entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(
            order,
            vec!["NIFTY25101424000PE", "NIFTY25101424000CE", "NIFTY25101424050CE"]
        );
        assert!(entries.iter().all(|e| e.rank_score.value() == e.quote.volume as f64));
    }

    #[test]
    fn ties_keep_emission_order() {
        let mut quotes = QuoteMap::new();
        for symbol in [
            "NIFTY25101424050PE",
            "NIFTY25101424000PE",
            "NIFTY25101424050CE",
            "NIFTY25101424000CE",
        ] {
            quotes.insert(symbol.into(), active(0, 5000));
        }
        let entries = rank_universe(&universe(), &quotes, &ScannerConfig::default());
        let order: Vec<&str> = entries.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "NIFTY25101424000CE",
                "NIFTY25101424000PE",
                "NIFTY25101424050CE",
                "NIFTY25101424050PE",
            ]
        );
    }

    #[test]
    fn envelope_shape() {
        let at = crate::expiry::exchange_offset()
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2025, 10, 8)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
            )
            .unwrap();
        let expiry = Expiry {
            date: NaiveDate::from_ymd_opt(2025, 10, 14).unwrap(),
            degraded: false,
        };

        let empty = serde_json::to_value(ScanResult::assemble(Vec::new(), &expiry, at)).unwrap();
        assert_eq!(empty["status"], "empty");
        assert_eq!(empty["count"], 0);
        assert_eq!(empty["expiry"], "14-10-2025");
        assert_eq!(empty["message"], EMPTY_MESSAGE);
        assert_eq!(empty["data"], serde_json::json!({}));
        assert_eq!(empty["timestamp"], "2025-10-08T10:00:00+05:30");

        let failed = serde_json::to_value(ScanResult::error("boom", at)).unwrap();
        assert_eq!(failed["status"], "error");
        assert_eq!(failed["message"], "boom");
        assert!(failed.get("expiry").is_none());
    }
}
