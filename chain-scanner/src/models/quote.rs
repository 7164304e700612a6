//! Live quote snapshot as returned by the upstream batch endpoint.

use serde::{Deserialize, Deserializer, Serialize};

/// Per-contract quote snapshot.
///
/// Every numeric field falls back to zero when the feed omits it or sends
/// `null`. Quantities arrive as either integer or float JSON numbers and are
/// truncated to whole contracts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    #[serde(rename = "ltp", default, deserialize_with = "zero_if_null")]
    pub last_traded_price: f64,
    #[serde(default, deserialize_with = "qty_or_zero")]
    pub open_interest: i64,
    #[serde(default, deserialize_with = "volume_or_zero")]
    pub volume: i64,
    #[serde(default, deserialize_with = "qty_or_zero")]
    pub total_buy_qty: i64,
    #[serde(default, deserialize_with = "qty_or_zero")]
    pub total_sell_qty: i64,
    #[serde(default, deserialize_with = "qty_or_zero")]
    pub last_trade_qty: i64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub high: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub low: f64,
}

impl QuoteRecord {
    /// Resting quantity on both sides of the book.
    pub fn total_qty(&self) -> i64 {
        self.total_buy_qty.saturating_add(self.total_sell_qty)
    }

    pub fn has_volume(&self) -> bool {
        self.volume > 0
    }
}

fn zero_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

fn qty_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = zero_if_null(deserializer)?;
    Ok(value as i64)
}

/// Like `qty_or_zero`, but rounds up so any positive traded volume stays
/// positive.
fn volume_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = zero_if_null(deserializer)?;
    Ok(value.max(0.0).ceil() as i64)
}
