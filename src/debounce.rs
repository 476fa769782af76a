use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::widget::{SEARCH_DELAY, SearchAdapter, SearchOutcome};

/// Debounced front of a [`SearchAdapter`]: keystrokes go in, at most one
/// search fires per quiet period, outcomes come out in order. A keystroke
/// arriving while an earlier one is still waiting out its delay supersedes it;
/// a request already in flight is awaited to completion.
pub struct DebouncedSearch {
    term_tx: mpsc::UnboundedSender<String>,
    outcome_rx: Mutex<mpsc::UnboundedReceiver<SearchOutcome>>,
    cancel: CancellationToken,
}

impl DebouncedSearch {
    pub fn spawn(adapter: SearchAdapter, delay: Duration) -> DebouncedSearch {
        let (term_tx, mut term_rx) = mpsc::unbounded_channel::<String>();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        tokio::spawn(async move {
            loop {
                let mut term = tokio::select! {
                    _ = worker_cancel.cancelled() => break,
                    received = term_rx.recv() => match received {
                        Some(term) => term,
                        None => break,
                    },
                };

                // Quiet period: newer keystrokes keep replacing the pending
                // term until the delay passes with no input.
                loop {
                    tokio::select! {
                        _ = worker_cancel.cancelled() => return,
                        received = timeout(delay, term_rx.recv()) => match received {
                            Ok(Some(newer)) => term = newer,
                            Ok(None) => return,
                            Err(_) => break,
                        },
                    }
                }

                debug!(term = %term, "quiet period elapsed, searching");
                let outcome = adapter.search(&term).await;
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        DebouncedSearch {
            term_tx,
            outcome_rx: Mutex::new(outcome_rx),
            cancel,
        }
    }

    /// Debounce with the widget's standard 350 ms quiet period.
    pub fn with_default_delay(adapter: SearchAdapter) -> DebouncedSearch {
        DebouncedSearch::spawn(adapter, SEARCH_DELAY)
    }

    /// Feed one keystroke's worth of input.
    pub fn input(&self, term: &str) {
        let _ = self.term_tx.send(term.to_string());
    }

    /// Next completed search, in dispatch order. `None` once shut down.
    pub async fn next_outcome(&self) -> Option<SearchOutcome> {
        let mut rx = self.outcome_rx.lock().await;
        rx.recv().await
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    #[tokio::test]
    async fn burst_collapses_into_one_search() {
        // Endpoint nobody listens on: the outcome is the error-boundary empty
        // outcome, which is all this test needs.
        let adapter = SearchAdapter::new("2.7", Url::parse("http://127.0.0.1:9/search").unwrap());
        let search = DebouncedSearch::spawn(adapter, Duration::from_millis(30));

        search.input("ge");
        search.input("gen");
        search.input("gener");

        let outcome = search.next_outcome().await.unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.message.is_some());

        // The burst produced exactly one outcome; the channel is idle now.
        let extra = timeout(Duration::from_millis(120), search.next_outcome()).await;
        assert!(extra.is_err());

        search.shutdown();
    }

    #[tokio::test]
    async fn short_terms_are_suppressed_silently() {
        let adapter = SearchAdapter::new("2.7", Url::parse("http://127.0.0.1:9/search").unwrap());
        let search = DebouncedSearch::spawn(adapter, Duration::from_millis(10));

        search.input("g");
        let outcome = search.next_outcome().await.unwrap();
        assert_eq!(outcome, SearchOutcome::empty());

        search.shutdown();
    }
}
