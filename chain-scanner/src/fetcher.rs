//! Batched quote retrieval with per-batch failure isolation.
//!
//! Batches run through a bounded pool (`max_concurrency` in flight). Batch `i`
//! may not start before `scan start + i * pacing`, which caps the aggregate
//! request rate at one per pacing interval whatever the pool size. Outcomes are
//! collected in batch order, so merging is deterministic.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::errors::ScannerError;
use crate::feed::{QuoteFeed, QuoteMap};

/// Result of one upstream call. A failed batch carries an empty map and its error.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub requested: usize,
    pub quotes: QuoteMap,
    pub error: Option<ScannerError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Quotes accumulated over one scan.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub quotes: QuoteMap,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Paced, bounded-concurrency batch fetch.
pub struct BatchFetcher<'a> {
    feed: &'a dyn QuoteFeed,
    max_concurrency: usize,
    pacing: Duration,
}

impl<'a> BatchFetcher<'a> {
    pub fn new(feed: &'a dyn QuoteFeed, max_concurrency: usize, pacing: Duration) -> Self {
        Self {
            feed,
            max_concurrency: max_concurrency.max(1),
            pacing,
        }
    }

    /// Fetch every batch and return one outcome per batch, in batch order.
    pub async fn fetch_all(&self, batches: Vec<Vec<String>>) -> Vec<BatchOutcome> {
        let start = Instant::now();
        let pacing = self.pacing;
        let feed = self.feed;

        stream::iter(batches.into_iter().enumerate())
            .map(|(index, symbols)| async move {
                if !pacing.is_zero() {
                    let offset = pacing.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX));
                    // A schedule past the clock's range starts immediately.
                    if let Some(deadline) = start.checked_add(offset) {
                        tokio::time::sleep_until(deadline).await;
                    }
                }
                fetch_one(feed, index, symbols).await
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Fetch every batch and merge the successes into one scan-local map.
    pub async fn fetch_merged(&self, batches: Vec<Vec<String>>) -> FetchSummary {
        let outcomes = self.fetch_all(batches).await;
        merge_outcomes(outcomes)
    }
}

async fn fetch_one(feed: &dyn QuoteFeed, index: usize, symbols: Vec<String>) -> BatchOutcome {
    let requested = symbols.len();
    match feed.fetch_batch(&symbols).await {
        Ok(quotes) => {
            tracing::debug!(batch = index, requested, received = quotes.len(), "batch fetched");
            BatchOutcome {
                index,
                requested,
                quotes,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(batch = index, requested, "batch failed, continuing without it: {e}");
            BatchOutcome {
                index,
                requested,
                quotes: QuoteMap::new(),
                error: Some(e),
            }
        }
    }
}

/// Fold batch outcomes into a single accumulator. Keys are disjoint across
/// batches, so a later batch never overwrites an earlier one's quotes.
pub fn merge_outcomes(outcomes: Vec<BatchOutcome>) -> FetchSummary {
    let mut summary = FetchSummary::default();
    for outcome in outcomes {
        summary.batches += 1;
        if !outcome.is_ok() {
            summary.failed_batches += 1;
        }
        summary.quotes.extend(outcome.quotes);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::models::quote::QuoteRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes each requested symbol back with its position as LTP, failing any
    /// batch whose first symbol is listed in `fail_on`.
    struct EchoFeed {
        fail_on: Vec<String>,
        seen: Mutex<Vec<(Instant, String)>>,
        delay: Duration,
    }

    impl EchoFeed {
        fn new(fail_on: &[&str]) -> Self {
            Self {
                fail_on: fail_on.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl QuoteFeed for EchoFeed {
        async fn fetch_batch(&self, symbols: &[String]) -> Result<QuoteMap> {
            self.seen
                .lock()
                .unwrap()
                .push((Instant::now(), symbols[0].clone()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on.contains(&symbols[0]) {
                return Err(ScannerError::Timeout(format!("batch {}", symbols[0])));
            }
            Ok(symbols
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    (
                        s.clone(),
                        QuoteRecord {
                            last_traded_price: i as f64,
                            ..QuoteRecord::default()
                        },
                    )
                })
                .collect())
        }
    }

    fn batches() -> Vec<Vec<String>> {
        vec![
            vec!["A1".into(), "A2".into()],
            vec!["B1".into(), "B2".into()],
            vec!["C1".into()],
        ]
    }

    #[tokio::test]
    async fn failed_batch_does_not_abort_the_rest() {
        let feed = EchoFeed::new(&["B1"]);
        let fetcher = BatchFetcher::new(&feed, 1, Duration::ZERO);
        let outcomes = fetcher.fetch_all(batches()).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].error, Some(ScannerError::Timeout(_))));
        assert!(outcomes[1].quotes.is_empty());
        assert!(outcomes[2].is_ok());

        let summary = merge_outcomes(outcomes);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.failed_batches, 1);
        let mut keys: Vec<_> = summary.quotes.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["A1", "A2", "C1"]);
    }

    #[tokio::test]
    async fn all_batches_failing_yields_empty_map() {
        let feed = EchoFeed::new(&["A1", "B1", "C1"]);
        let summary = BatchFetcher::new(&feed, 2, Duration::ZERO)
            .fetch_merged(batches())
            .await;
        assert!(summary.quotes.is_empty());
        assert_eq!(summary.failed_batches, 3);
    }

    #[tokio::test]
    async fn outcomes_keep_batch_order_under_concurrency() {
        let mut feed = EchoFeed::new(&[]);
        feed.delay = Duration::from_millis(5);
        let outcomes = BatchFetcher::new(&feed, 3, Duration::ZERO)
            .fetch_all(batches())
            .await;
        let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_request_starts() {
        let feed = EchoFeed::new(&[]);
        let pacing = Duration::from_millis(500);
        BatchFetcher::new(&feed, 3, pacing).fetch_all(batches()).await;

        let mut seen = feed.seen.lock().unwrap().clone();
        seen.sort_by_key(|(at, _)| *at);
        assert_eq!(seen.len(), 3);
        for pair in seen.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= pacing);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_pacing_does_not_overflow_the_schedule() {
        let feed = EchoFeed::new(&[]);
        let summary = BatchFetcher::new(&feed, 1, Duration::MAX)
            .fetch_merged(batches())
            .await;
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.failed_batches, 0);
        assert_eq!(feed.seen.lock().unwrap().len(), 3);
    }
}
