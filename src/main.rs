//! NIFTY Options Scanner API Server
//!
//! A REST API server that scans the weekly index options chain on demand,
//! ranks the active contracts for the trading dashboard, downloads
//! historical candles, and relays TradingView alerts to Telegram.

mod manager;
mod models;
mod notifier;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use chain_scanner::ScannerConfig;

/// NIFTY Options Scanner API Server.
#[derive(Parser, Debug)]
#[command(name = "nifty-scanner", version = "1.0.0")]
struct Args {
    /// Web server port
    #[arg(long = "web-port", default_value_t = 8000)]
    web_port: u16,

    /// JSON scanner config; keys it omits keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Index root symbol
    #[arg(long)]
    index: Option<String>,

    /// First strike (inclusive)
    #[arg(long = "strike-start")]
    strike_start: Option<u32>,

    /// Last strike (exclusive)
    #[arg(long = "strike-end")]
    strike_end: Option<u32>,

    #[arg(long = "strike-step")]
    strike_step: Option<u32>,

    /// Symbols per upstream request
    #[arg(long = "batch-size")]
    batch_size: Option<usize>,

    /// Batch requests in flight at once
    #[arg(long = "max-concurrency")]
    max_concurrency: Option<usize>,

    /// Minimum spacing between batch request starts
    #[arg(long = "pacing-ms")]
    pacing_ms: Option<u64>,

    /// Upstream F&O data service base URL
    #[arg(long = "feed-url")]
    feed_url: Option<String>,

    #[arg(long = "telegram-bot-token", env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    #[arg(long = "telegram-chat-id", env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long = "telegram-api-url", default_value = notifier::DEFAULT_TELEGRAM_API)]
    telegram_api_url: String,
}

impl Args {
    /// Defaults, then the config file, then command-line overrides.
    fn scanner_config(&self) -> chain_scanner::Result<ScannerConfig> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::from_json_file(path)?,
            None => ScannerConfig::default(),
        };

        if let Some(index) = &self.index {
            config.index = index.to_uppercase();
        }
        if let Some(v) = self.strike_start {
            config.strike_start = v;
        }
        if let Some(v) = self.strike_end {
            config.strike_end = v;
        }
        if let Some(v) = self.strike_step {
            config.strike_step = v;
        }
        if let Some(v) = self.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = self.max_concurrency {
            config.max_concurrency = v;
        }
        if let Some(v) = self.pacing_ms {
            config.pacing_ms = v;
        }
        if let Some(url) = &self.feed_url {
            config.feed_url = url.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_banner() {
    println!("========================================");
    println!("   NIFTY Options Scanner API Server");
    println!("   Weekly Chain Ranking & Alerts");
    println!("   Version 1.0.0");
    println!("========================================");
    println!();
}

fn print_endpoints(port: u16) {
    println!();
    println!("========================================");
    println!("   Scanner Server is READY!");
    println!("========================================");
    println!();
    println!("API Endpoints:");
    println!("  Health Check:     GET  http://localhost:{port}/health");
    println!();
    println!("  Options:");
    println!("    Scan Chain:     GET  http://localhost:{port}/api/options/scan");
    println!("    Candles:        GET  http://localhost:{port}/api/download?index_name=NIFTY&year=25&month=O&strike=25000&option_type=CE&start_date=01-10-2025&end_date=07-10-2025");
    println!();
    println!("  Alerts:");
    println!("    Webhook:        POST http://localhost:{port}/webhook");
    println!();
    println!("Press Ctrl+C to stop the server...");
    println!();
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    print_banner();

    let config = match args.scanner_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load scanner configuration!");
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Scanning {} strikes {}..{} step {} (batch size {}, concurrency {})",
        config.index,
        config.strike_start,
        config.strike_end,
        config.strike_step,
        config.batch_size,
        config.max_concurrency
    );

    let notifier = notifier::TelegramNotifier::new(
        &args.telegram_api_url,
        args.telegram_bot_token.clone(),
        args.telegram_chat_id.clone(),
    );
    if !notifier.is_configured() {
        println!("Telegram credentials not set; webhook alerts will not be relayed.");
    }

    let manager = match manager::ScannerManager::new(config, notifier) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Failed to create upstream client: {e}");
            std::process::exit(1);
        }
    };
    let shared_manager = Arc::new(manager);

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown_tx = Arc::new(std::sync::Mutex::new(Some(shutdown_tx)));

    if let Err(e) = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, shutting down gracefully...");
        if let Some(tx) = shutdown_tx.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = tx.send(());
        }
    }) {
        eprintln!("Failed to set Ctrl+C handler: {e}");
        std::process::exit(1);
    }

    // Build router
    let app = web::create_router(shared_manager);

    print_endpoints(args.web_port);

    // Start server
    let addr = format!("0.0.0.0:{}", args.web_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await;

    if let Err(e) = served {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    println!("Shutdown complete. Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let args = Args::parse_from([
            "nifty-scanner",
            "--index",
            "banknifty",
            "--strike-start",
            "50000",
            "--strike-end",
            "52000",
            "--strike-step",
            "100",
            "--max-concurrency",
            "4",
        ]);
        let config = args.scanner_config().unwrap();
        assert_eq!(config.index, "BANKNIFTY");
        assert_eq!(config.strike_start, 50000);
        assert_eq!(config.strike_step, 100);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.batch_size, 50);
        assert_eq!(args.web_port, 8000);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args::parse_from(["nifty-scanner", "--strike-step", "0"]);
        assert!(args.scanner_config().is_err());
    }
}
