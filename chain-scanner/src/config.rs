//! Scanner configuration.
//!
//! `Default` carries the reference constants for the NIFTY weekly chain. Every
//! field can be overridden from a JSON file (missing keys keep their default)
//! and, in the server binary, from the command line.

use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ScannerError};

/// Base URL of the upstream F&O data service.
pub const DEFAULT_FEED_URL: &str = "https://groww.in/v1/api/stocks_fo_data/v1";

// ============================================================================
// Scanner Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Index root symbol, e.g. `NIFTY`.
    pub index: String,
    /// First strike of the universe (inclusive).
    pub strike_start: u32,
    /// Last strike of the universe (exclusive).
    pub strike_end: u32,
    pub strike_step: u32,
    /// Identifiers per upstream request.
    pub batch_size: usize,
    pub exchange: String,
    pub segment: String,
    pub feed_url: String,
    /// Per-batch network timeout.
    pub request_timeout_ms: u64,
    /// Minimum spacing between the starts of two batch requests.
    pub pacing_ms: u64,
    /// Upper bound on batch requests in flight.
    pub max_concurrency: usize,
    pub activity: ActivityThresholds,
    pub weights: RankingWeights,
    pub expiry: ExpirySchedule,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            index: "NIFTY".to_string(),
            strike_start: 24000,
            strike_end: 27000,
            strike_step: 50,
            batch_size: 50,
            exchange: "NSE".to_string(),
            segment: "FNO".to_string(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            request_timeout_ms: 10_000,
            pacing_ms: 0,
            max_concurrency: 1,
            activity: ActivityThresholds::default(),
            weights: RankingWeights::default(),
            expiry: ExpirySchedule::default(),
        }
    }
}

impl ScannerConfig {
    /// Load a config from a JSON file; keys absent from the file keep their defaults.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScannerError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ScannerError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.is_empty() {
            return Err(ScannerError::Config("index must not be empty".into()));
        }
        if self.strike_step == 0 {
            return Err(ScannerError::Config("strike_step must be positive".into()));
        }
        if self.strike_start > self.strike_end {
            return Err(ScannerError::Config(format!(
                "strike_start {} is above strike_end {}",
                self.strike_start, self.strike_end
            )));
        }
        if self.batch_size == 0 {
            return Err(ScannerError::Config("batch_size must be positive".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ScannerError::Config("max_concurrency must be positive".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

// ============================================================================
// Filter / Ranking parameters
// ============================================================================

/// Minimum activity a quote must show to be ranked at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityThresholds {
    pub min_open_interest: i64,
    /// Minimum of `totalBuyQty + totalSellQty`.
    pub min_total_qty: i64,
    /// LTP must be strictly above this.
    pub min_ltp: f64,
}

impl Default for ActivityThresholds {
    fn default() -> Self {
        Self {
            min_open_interest: 3000,
            min_total_qty: 15000,
            min_ltp: 1.0,
        }
    }
}

/// Weights of the liquidity proxy used when no volume is reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub open_interest: f64,
    pub order_book_qty: f64,
    pub last_trade_qty: f64,
    pub day_range: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            open_interest: 0.4,
            order_book_qty: 0.3,
            last_trade_qty: 0.2,
            day_range: 0.1,
        }
    }
}

/// Weekly expiry day and the time after which the current week is rolled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpirySchedule {
    pub weekday: Weekday,
    pub cutoff: NaiveTime,
}

impl Default for ExpirySchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Tue,
            cutoff: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.expiry.weekday, Weekday::Tue);
        assert_eq!(config.expiry.cutoff, NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ScannerConfig = serde_json::from_str(
            r#"{"index": "BANKNIFTY", "strike_step": 100, "activity": {"min_ltp": 2.5}}"#,
        )
        .unwrap();
        assert_eq!(config.index, "BANKNIFTY");
        assert_eq!(config.strike_step, 100);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.activity.min_ltp, 2.5);
        assert_eq!(config.activity.min_open_interest, 3000);
        assert_eq!(config.weights.open_interest, 0.4);
    }

    #[test]
    fn rejects_degenerate_values() {
        let zero_step = ScannerConfig {
            strike_step: 0,
            ..ScannerConfig::default()
        };
        assert!(matches!(zero_step.validate(), Err(ScannerError::Config(_))));

        let inverted = ScannerConfig {
            strike_start: 27000,
            strike_end: 24000,
            ..ScannerConfig::default()
        };
        assert!(inverted.validate().is_err());

        let no_batch = ScannerConfig {
            batch_size: 0,
            ..ScannerConfig::default()
        };
        assert!(no_batch.validate().is_err());
    }
}
