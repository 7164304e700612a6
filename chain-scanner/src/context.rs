//! Qualitative reasons and directional conclusion for a ranked contract.
//!
//! The conclusion is an ordered rule table: rules are evaluated top to bottom
//! and the first matching predicate decides. Anything unmatched is neutral.

use crate::models::entry::Conclusion;
use crate::models::enums::{Bias, Confidence, VolumeSignal};
use crate::models::quote::QuoteRecord;

const STRONG_OI: i64 = 30_000;
const MODERATE_OI: i64 = 10_000;
const LOW_PREMIUM: f64 = 30.0;
const HIGH_PREMIUM: f64 = 150.0;

// ============================================================================
// Context
// ============================================================================

/// Display reasons in fixed priority order.
pub fn build_context(quote: &QuoteRecord, volume_available: bool, signal: VolumeSignal) -> Vec<String> {
    let mut reasons = Vec::with_capacity(5);

    if volume_available && quote.has_volume() {
        reasons.push("High traded volume".to_string());
    } else {
        reasons.push("Volume unavailable, ranked using liquidity metrics".to_string());
    }

    if quote.open_interest >= STRONG_OI {
        reasons.push("Strong open interest (institutional positioning)".to_string());
    } else if quote.open_interest >= MODERATE_OI {
        reasons.push("Moderate open interest".to_string());
    }

    if buy_dominates(quote) {
        reasons.push("Strong buying interest (buy qty >> sell qty)".to_string());
    } else if sell_dominates(quote) {
        reasons.push("Strong selling pressure (sell qty >> buy qty)".to_string());
    }

    let ltp = quote.last_traded_price;
    if ltp < LOW_PREMIUM {
        reasons.push("Low premium option, high gamma move potential".to_string());
    } else if ltp > HIGH_PREMIUM {
        reasons.push("High premium option, likely ATM/ITM and actively traded".to_string());
    }

    if signal != VolumeSignal::Unavailable {
        reasons.push(format!("{} volume participation", signal.phrase()));
    }

    reasons
}

fn buy_dominates(quote: &QuoteRecord) -> bool {
    quote.total_buy_qty > quote.total_sell_qty.saturating_mul(2)
}

fn sell_dominates(quote: &QuoteRecord) -> bool {
    quote.total_sell_qty > quote.total_buy_qty.saturating_mul(2)
}

// ============================================================================
// Conclusion rules
// ============================================================================

/// One row of the conclusion table.
#[derive(Clone, Copy)]
pub struct ConclusionRule {
    pub name: &'static str,
    pub applies: fn(&QuoteRecord) -> bool,
    pub outcome: fn(&QuoteRecord) -> Conclusion,
}

/// Conclusion rules in priority order.
pub const CONCLUSION_RULES: &[ConclusionRule] = &[
    ConclusionRule {
        name: "buy-flow",
        applies: |q| buy_dominates(q) && q.open_interest >= 5_000,
        outcome: |q| Conclusion {
            bias: Bias::Buy,
            confidence: if q.last_traded_price < LOW_PREMIUM {
                Confidence::High
            } else {
                Confidence::Medium
            },
            reason: "Strong buying interest with favorable risk-reward".to_string(),
        },
    },
    ConclusionRule {
        name: "sell-flow",
        applies: |q| sell_dominates(q) && q.open_interest >= 10_000 && q.last_traded_price >= 80.0,
        outcome: |_| Conclusion {
            bias: Bias::Sell,
            confidence: Confidence::Medium,
            reason: "Heavy selling pressure with high open interest".to_string(),
        },
    },
];

fn neutral() -> Conclusion {
    Conclusion {
        bias: Bias::Neutral,
        confidence: Confidence::Low,
        reason: "No strong directional edge".to_string(),
    }
}

/// Evaluate `rules` in order; the first applicable rule wins.
pub fn conclude_with(quote: &QuoteRecord, rules: &[ConclusionRule]) -> Conclusion {
    rules
        .iter()
        .find(|rule| (rule.applies)(quote))
        .map(|rule| {
            tracing::trace!(rule = rule.name, "conclusion rule matched");
            (rule.outcome)(quote)
        })
        .unwrap_or_else(neutral)
}

pub fn build_conclusion(quote: &QuoteRecord) -> Conclusion {
    conclude_with(quote, CONCLUSION_RULES)
}
