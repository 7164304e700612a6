//! Ranked output records.

use serde::{Deserialize, Serialize};

use crate::models::enums::{Bias, Confidence, VolumeSignal};
use crate::models::quote::QuoteRecord;

/// Comparable score of an active contract.
///
/// Serializes untagged so the dashboard sees a plain integer when ranking by
/// volume and a float when ranking by the liquidity proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RankScore {
    Volume(i64),
    Liquidity(f64),
}

impl RankScore {
    pub fn value(&self) -> f64 {
        match self {
            Self::Volume(v) => *v as f64,
            Self::Liquidity(v) => *v,
        }
    }
}

/// Quote fields echoed back to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub ltp: f64,
    pub open_interest: i64,
    pub volume: i64,
    pub total_buy_qty: i64,
    pub total_sell_qty: i64,
    pub last_trade_qty: i64,
}

impl From<&QuoteRecord> for QuoteSummary {
    fn from(q: &QuoteRecord) -> Self {
        Self {
            ltp: q.last_traded_price,
            open_interest: q.open_interest,
            volume: q.volume,
            total_buy_qty: q.total_buy_qty,
            total_sell_qty: q.total_sell_qty,
            last_trade_qty: q.last_trade_qty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    pub bias: Bias,
    pub confidence: Confidence,
    pub reason: String,
}

/// One contract that passed the activity filter, scored and explained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// Feed token; serialized as the key of the envelope's `data` map.
    #[serde(skip)]
    pub symbol: String,
    #[serde(flatten)]
    pub quote: QuoteSummary,
    pub volume_signal: VolumeSignal,
    pub rank_score: RankScore,
    pub context: Vec<String>,
    pub conclusion: Conclusion,
}
