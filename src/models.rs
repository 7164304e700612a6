//! API models for the scanner server.
//!
//! The scan envelope itself lives in `chain_scanner::ScanResult`; these are the
//! request/response shapes specific to the HTTP surface.

use serde::{Deserialize, Serialize};

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub server: String,
    pub version: String,
    pub index: String,
    pub strike_range: String,
    pub telegram_configured: bool,
}

// ============================================================================
// Webhook
// ============================================================================

/// Outcome of relaying one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayStatus {
    Success,
    TelegramFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookReply {
    pub status: RelayStatus,
    pub received_keys: Vec<String>,
}

// ============================================================================
// API Response Wrappers
// ============================================================================

/// JSON body returned for rejected or failed requests.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl ApiResponse {
    pub fn error(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            message: message.into(),
            error_code: Some(code),
        }
    }
}
