//! chain-scanner -- index options chain scanner and ranking engine.
//!
//! Resolves the active weekly expiry, enumerates the strike universe, pulls
//! live quotes from the upstream feed in paced batches, and turns the active
//! contracts into a ranked, explained shortlist for the dashboard.
//!
//! ## Modules
//!
//! - [`config`] -- Scanner configuration and its reference defaults
//! - [`errors`] -- Error types for the library
//! - [`models`] -- Contract identifiers, quotes, ranked entries and enums
//! - [`expiry`] -- Weekly expiry resolution on the exchange clock
//! - [`universe`] -- Strike universe generation and batching
//! - [`feed`] -- `QuoteFeed` trait and the `reqwest` HTTP feed
//! - [`fetcher`] -- Paced, failure-tolerant batch retrieval
//! - [`ranking`] -- Activity filter, volume detection, scoring and sorting
//! - [`context`] -- Qualitative reasons and the conclusion rule table
//! - [`scanner`] -- The scan pipeline and its result envelope
//! - [`candles`] -- Historical candle download in weekly windows

pub mod candles;
pub mod config;
pub mod context;
pub mod errors;
pub mod expiry;
pub mod feed;
pub mod fetcher;
pub mod models;
pub mod ranking;
pub mod scanner;
pub mod universe;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use errors::{Result, ScannerError};

pub use config::{ActivityThresholds, ExpirySchedule, RankingWeights, ScannerConfig};

pub use models::contract::ContractId;
pub use models::entry::{Conclusion, QuoteSummary, RankScore, RankedEntry};
pub use models::enums::{Bias, Confidence, OptionType, ScanStatus, VolumeSignal};
pub use models::quote::QuoteRecord;

pub use candles::{download_candles, CandleRequest, CandleSeries};
pub use expiry::{exchange_now, resolve_expiry, Expiry};
pub use feed::{HttpFeed, QuoteFeed, QuoteMap};
pub use fetcher::{BatchFetcher, BatchOutcome};
pub use scanner::{ChainScanner, ScanResult};
pub use universe::ScanUniverse;
