//! Scanner Web Server -- REST API built with axum.
//!
//! Serves the ranked options chain to the dashboard, proxies historical
//! candle downloads, and relays trading alerts to Telegram.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use chain_scanner::{CandleRequest, ScannerError};

use crate::manager::SharedManager;
use crate::models::*;

// ============================================================================
// Router
// ============================================================================

pub fn create_router(manager: SharedManager) -> Router {
    Router::new()
        // Health
        .route("/health", get(handle_health))
        // Options chain
        .route("/api/options/scan", get(handle_scan))
        .route("/api/download", get(handle_download))
        // Alerts
        .route("/webhook", post(handle_webhook))
        .layer(CorsLayer::permissive())
        .with_state(manager)
}

// ============================================================================
// Helpers
// ============================================================================

fn err_json(msg: &str, code: u16) -> (StatusCode, Json<ApiResponse>) {
    let status = match code {
        404 => StatusCode::NOT_FOUND,
        500 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ApiResponse::error(msg, code)))
}

/// Client mistakes are 400, everything else is an upstream failure.
fn status_for(error: &ScannerError) -> u16 {
    match error {
        ScannerError::UnsupportedIndex(_) | ScannerError::InvalidDate(_) => 400,
        _ => 500,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn handle_health(State(mgr): State<SharedManager>) -> impl IntoResponse {
    let config = mgr.config();
    Json(HealthStatus {
        status: "healthy".into(),
        server: "NIFTY Options Scanner API".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        index: config.index.clone(),
        strike_range: format!("{}-{}", config.strike_start, config.strike_end),
        telegram_configured: mgr.telegram_configured(),
    })
}

/// Always answers 200; failures are reported inside the envelope.
async fn handle_scan(State(mgr): State<SharedManager>) -> impl IntoResponse {
    Json(mgr.scan().await)
}

async fn handle_download(
    State(mgr): State<SharedManager>,
    Query(q): Query<CandleRequest>,
) -> impl IntoResponse {
    match mgr.download_candles(&q).await {
        Ok(series) => Json(series).into_response(),
        Err(e) => {
            tracing::error!(symbol = %q.symbol(), "Candle download failed: {e}");
            err_json(&e.to_string(), status_for(&e)).into_response()
        }
    }
}

async fn handle_webhook(State(mgr): State<SharedManager>, body: Bytes) -> impl IntoResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return err_json("Invalid JSON payload", 400).into_response(),
    };

    let fields = match payload {
        Value::Object(map) if !map.is_empty() => map,
        _ => return err_json("Empty or invalid webhook data", 400).into_response(),
    };

    let logged = Value::Object(fields.clone());
    tracing::info!(payload = %logged, "Webhook alert received");

    let status = mgr.relay_alert(&fields).await;
    Json(WebhookReply {
        status,
        received_keys: fields.keys().cloned().collect(),
    })
    .into_response()
}
