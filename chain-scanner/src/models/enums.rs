//! Strongly-typed enums for contract sides, signals and scan outcomes.
//!
//! Serde `rename` attributes match the strings the dashboard consumes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Contract Enums
// ============================================================================

/// Option side, in exchange notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    #[serde(rename = "CE")]
    Call,
    #[serde(rename = "PE")]
    Put,
}

impl OptionType {
    /// Emission order within a strike: calls first.
    pub const BOTH: [OptionType; 2] = [OptionType::Call, OptionType::Put];
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "CE"),
            Self::Put => write!(f, "PE"),
        }
    }
}

impl FromStr for OptionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CE" | "CALL" | "C" => Ok(Self::Call),
            "PE" | "PUT" | "P" => Ok(Self::Put),
            _ => Err(format!("unknown option type: {s}")),
        }
    }
}

// ============================================================================
// Signal Enums
// ============================================================================

/// Traded-volume tier of a single contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeSignal {
    VeryHigh,
    High,
    Medium,
    Low,
    Unavailable,
}

impl VolumeSignal {
    /// Human-readable tier name, e.g. `VERY HIGH`.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::VeryHigh => "VERY HIGH",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for VolumeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryHigh => write!(f, "VERY_HIGH"),
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
        }
    }
}

/// Inferred directional lean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

// ============================================================================
// Scan Outcome
// ============================================================================

/// Top-level status of a scan envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
    Empty,
    Error,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Empty => write!(f, "empty"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_display_and_parse() {
        assert_eq!(OptionType::Call.to_string(), "CE");
        assert_eq!(OptionType::Put.to_string(), "PE");
        assert_eq!(OptionType::from_str("pe").unwrap(), OptionType::Put);
        assert_eq!(OptionType::from_str("CALL").unwrap(), OptionType::Call);
        assert!(OptionType::from_str("XX").is_err());
    }

    #[test]
    fn serde_names_match_display() {
        assert_eq!(
            serde_json::to_string(&VolumeSignal::VeryHigh).unwrap(),
            "\"VERY_HIGH\""
        );
        assert_eq!(serde_json::to_string(&Bias::Neutral).unwrap(), "\"NEUTRAL\"");
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(serde_json::to_string(&ScanStatus::Empty).unwrap(), "\"empty\"");
        assert_eq!(serde_json::to_string(&OptionType::Put).unwrap(), "\"PE\"");
    }

    #[test]
    fn volume_signal_phrase_drops_underscore() {
        assert_eq!(VolumeSignal::VeryHigh.phrase(), "VERY HIGH");
        assert_eq!(VolumeSignal::Low.phrase(), "LOW");
    }
}
