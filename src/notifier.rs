//! Telegram relay for incoming trading alerts.
//!
//! Alerts are rendered as MarkdownV2 and posted to the Bot API `sendMessage`
//! method, retrying a fixed number of times before giving up.

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Characters MarkdownV2 requires to be backslash-escaped.
const MARKDOWN_SPECIALS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram credentials missing")]
    MissingCredentials,

    #[error("Telegram rejected message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Formatting
// ============================================================================

/// Escape every MarkdownV2 special character in a single pass.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIALS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render an alert payload: a header, the receive time, then one line per field.
pub fn format_alert(fields: &Map<String, Value>, received_at: &str) -> String {
    let mut lines = Vec::with_capacity(fields.len() + 3);
    lines.push("📩 *TradingView Alert*".to_string());
    lines.push(format!("🕒 *Time:* `{}`", escape_markdown(received_at)));
    lines.push(String::new());

    for (key, value) in fields {
        lines.push(format!(
            "*{}:* `{}`",
            escape_markdown(key),
            escape_markdown(&display_value(value))
        ));
    }

    lines.join("\n")
}

// ============================================================================
// Sender
// ============================================================================

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
    attempts: u32,
    retry_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.filter(|t| !t.is_empty()),
            chat_id: chat_id.filter(|c| !c.is_empty()),
            attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    /// Send `message`, retrying on any failure. Returns the last error once
    /// every attempt has failed.
    pub async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            tracing::error!("Telegram credentials missing");
            return Err(NotifyError::MissingCredentials);
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "MarkdownV2",
        });

        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.post(&url, &payload).await {
                Ok(()) => {
                    tracing::info!("Telegram message sent");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Telegram send failed (attempt {attempt}/{}): {e}", self.attempts);
                    last_error = Some(e);
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        tracing::error!("Telegram message failed after {} attempts", self.attempts);
        Err(last_error.unwrap_or(NotifyError::MissingCredentials))
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

    #[test]
    fn escapes_each_special_once() {
        assert_eq!(escape_markdown("a_b"), "a\\_b");
        assert_eq!(escape_markdown("1.5-2"), "1\\.5\\-2");
        assert_eq!(escape_markdown("x\\y"), "x\\\\y");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }

    #[test]
    fn alert_lines_follow_payload_order() {
        let fields: Map<String, Value> =
            serde_json::from_str(r#"{"ticker": "NIFTY", "action": "buy", "price": 24500.5}"#).unwrap();
        let message = format_alert(&fields, "2025-10-08 10:00:00");
        let lines: Vec<&str> = message.lines().collect();

        assert_eq!(
            lines,
            vec![
                "📩 *TradingView Alert*",
                "🕒 *Time:* `2025\\-10\\-08 10:00:00`",
                "",
                "*ticker:* `NIFTY`",
                "*action:* `buy`",
                "*price:* `24500\\.5`",
            ]
        );
    }

    #[tokio::test]
    async fn missing_credentials_never_sends() {
        let notifier = TelegramNotifier::new(DEFAULT_TELEGRAM_API, None, Some("42".into()));
        assert!(!notifier.is_configured());
        assert!(matches!(
            notifier.send("hi").await,
            Err(NotifyError::MissingCredentials)
        ));
    }

    async fn flaky_bot(State(calls): State<Arc<AtomicU32>>, Json(body): Json<Value>) -> StatusCode {
        assert_eq!(body["parse_mode"], "MarkdownV2");
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::OK
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let app = Router::new()
            .route("/botTOKEN/sendMessage", post(flaky_bot))
            .with_state(Arc::clone(&calls));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let notifier = TelegramNotifier::new(
            &format!("http://{addr}"),
            Some("TOKEN".into()),
            Some("42".into()),
        )
        .with_retry(3, Duration::ZERO);

        notifier.send("hello").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_all_attempts() {
        let app = Router::new().route(
            "/botTOKEN/sendMessage",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad token") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let notifier = TelegramNotifier::new(
            &format!("http://{addr}"),
            Some("TOKEN".into()),
            Some("42".into()),
        )
        .with_retry(2, Duration::ZERO);

        match notifier.send("hello").await {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
