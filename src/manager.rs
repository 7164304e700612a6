//! Scanner Manager -- ties the scan engine, candle downloader and alert relay
//! together behind one shared handle for the web layer.
//!
//! Every operation is independent, so the manager is shared as a plain `Arc`
//! without a lock.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use chain_scanner::{
    download_candles, exchange_now, CandleRequest, CandleSeries, ChainScanner, HttpFeed, QuoteFeed,
    ScanResult, ScannerConfig,
};

use crate::models::RelayStatus;
use crate::notifier::{format_alert, TelegramNotifier};

/// Pause between consecutive candle window requests.
const CANDLE_PAUSE: Duration = Duration::from_secs(1);

pub type SharedManager = Arc<ScannerManager>;

pub struct ScannerManager {
    scanner: Arc<ChainScanner>,
    history: HttpFeed,
    notifier: TelegramNotifier,
    candle_pause: Duration,
}

impl ScannerManager {
    /// Build a manager around the live HTTP feed described by `config`.
    pub fn new(config: ScannerConfig, notifier: TelegramNotifier) -> chain_scanner::Result<Self> {
        let history = HttpFeed::new(&config)?;
        let feed: Arc<dyn QuoteFeed> = Arc::new(history.clone());
        Ok(Self::with_feed(config, feed, history, notifier))
    }

    /// Build a manager with an explicit quote feed. Candles always come from
    /// `history`.
    pub fn with_feed(
        config: ScannerConfig,
        feed: Arc<dyn QuoteFeed>,
        history: HttpFeed,
        notifier: TelegramNotifier,
    ) -> Self {
        Self {
            scanner: Arc::new(ChainScanner::new(config, feed)),
            history,
            notifier,
            candle_pause: CANDLE_PAUSE,
        }
    }

    #[cfg(test)]
    pub fn with_candle_pause(mut self, pause: Duration) -> Self {
        self.candle_pause = pause;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        self.scanner.config()
    }

    pub fn telegram_configured(&self) -> bool {
        self.notifier.is_configured()
    }

    // ========================================================================
    // Scan
    // ========================================================================

    /// Run one full scan. Never fails: any error, including a panic inside
    /// the pipeline, comes back as an error envelope.
    pub async fn scan(&self) -> ScanResult {
        Arc::clone(&self.scanner).scan_isolated().await
    }

    // ========================================================================
    // Candles
    // ========================================================================

    pub async fn download_candles(&self, request: &CandleRequest) -> chain_scanner::Result<CandleSeries> {
        download_candles(&self.history, request, self.candle_pause).await
    }

    // ========================================================================
    // Alerts
    // ========================================================================

    /// Format `fields` as a Telegram alert and send it.
    pub async fn relay_alert(&self, fields: &Map<String, Value>) -> RelayStatus {
        let received_at = exchange_now().format("%Y-%m-%d %H:%M:%S").to_string();
        let message = format_alert(fields, &received_at);

        match self.notifier.send(&message).await {
            Ok(()) => RelayStatus::Success,
            Err(e) => {
                tracing::warn!("Alert relay failed: {e}");
                RelayStatus::TelegramFailed
            }
        }
    }
}
