//! Activity filter, volume detection and scoring.

use crate::config::{ActivityThresholds, RankingWeights};
use crate::models::entry::{RankScore, RankedEntry};
use crate::models::enums::VolumeSignal;
use crate::models::quote::QuoteRecord;

const VERY_HIGH_VOLUME: i64 = 50_000;
const VERY_HIGH_VOLUME_OI: i64 = 20_000;
const HIGH_VOLUME: i64 = 20_000;
const MEDIUM_VOLUME: i64 = 5_000;

/// Whether a quote shows enough activity to be ranked at all.
pub fn is_active(quote: &QuoteRecord, thresholds: &ActivityThresholds) -> bool {
    quote.open_interest >= thresholds.min_open_interest
        && quote.total_qty() >= thresholds.min_total_qty
        && quote.last_traded_price > thresholds.min_ltp
}

/// Scan-wide switch: volume is usable if any fetched quote reports some.
pub fn volume_available<'a>(quotes: impl IntoIterator<Item = &'a QuoteRecord>) -> bool {
    quotes.into_iter().any(QuoteRecord::has_volume)
}

/// Weighted liquidity proxy used when the feed carries no volume.
/// Non-finite intermediate results score zero.
pub fn liquidity_score(quote: &QuoteRecord, weights: &RankingWeights) -> f64 {
    let score = weights.open_interest * quote.open_interest as f64
        + weights.order_book_qty * quote.total_qty() as f64
        + weights.last_trade_qty * quote.last_trade_qty as f64
        + weights.day_range * (quote.high - quote.low).abs();

    if score.is_finite() {
        score
    } else {
        0.0
    }
}

pub fn rank_score(quote: &QuoteRecord, volume_available: bool, weights: &RankingWeights) -> RankScore {
    if volume_available {
        RankScore::Volume(quote.volume)
    } else {
        RankScore::Liquidity(liquidity_score(quote, weights))
    }
}

pub fn volume_signal(quote: &QuoteRecord) -> VolumeSignal {
    let volume = quote.volume;
    if volume >= VERY_HIGH_VOLUME && quote.open_interest >= VERY_HIGH_VOLUME_OI {
        VolumeSignal::VeryHigh
    } else if volume >= HIGH_VOLUME {
        VolumeSignal::High
    } else if volume >= MEDIUM_VOLUME {
        VolumeSignal::Medium
    } else if volume > 0 {
        VolumeSignal::Low
    } else {
        VolumeSignal::Unavailable
    }
}

/// Order by score, highest first. `sort_by` is stable, so equal scores keep
/// the order the entries were built in.
pub fn sort_by_rank(entries: &mut [RankedEntry]) {
    entries.sort_by(|a, b| b.rank_score.value().total_cmp(&a.rank_score.value()));
}
