//! Crawl controller split into focused submodules.
//!
//! - [`registry`] - Identifiers ever considered for admission
//! - [`slots`] - Concurrency cap on pending fetches
//! - [`lifecycle`] - Per-fetch state machine and timeout sweep
//! - [`dispatch`] - Classification and routing of engine events
//! - [`crawl_loop`] - Tick driver and shutdown sequence
//!
//! A [`Crawler`] owns all controller state and the engine. [`Crawler::spawn`] moves it
//! onto a tokio task; the returned [`CrawlerHandle`] is the only way to talk to it
//! afterwards (stop signal, event subscription, stats snapshots).

mod crawl_loop;
mod dispatch;
mod lifecycle;
mod registry;
mod slots;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, CrawlConfig};
use crate::engine::SwarmEngine;
use crate::error::{Error, Result};
use crate::types::{CrawlEvent, CrawlStats};

use lifecycle::ActiveSet;
use registry::Registry;
use slots::SlotManager;

/// Running totals that are not derivable from the registry or slot manager
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub(crate) admitted: u64,
    pub(crate) rejected: u64,
    pub(crate) completed: u64,
    pub(crate) failed: u64,
    pub(crate) timed_out: u64,
    pub(crate) malformed: u64,
}

/// Crawl controller
///
/// Turns the engine's discovery stream into a bounded, deduplicated set of
/// metadata fetches and reports each one that resolves.
pub struct Crawler {
    pub(crate) config: CrawlConfig,
    pub(crate) engine: Box<dyn SwarmEngine>,
    pub(crate) registry: Registry,
    pub(crate) slots: SlotManager,
    pub(crate) active: ActiveSet,
    pub(crate) counters: Counters,
    pub(crate) event_tx: broadcast::Sender<CrawlEvent>,
    pub(crate) stats_tx: watch::Sender<CrawlStats>,
}

impl Crawler {
    /// Create a crawler driving `engine`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration fails validation.
    pub fn new(config: Config, engine: Box<dyn SwarmEngine>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(config.crawl.event_buffer);
        let (stats_tx, _stats_rx) = watch::channel(CrawlStats::default());

        tracing::info!(
            engine = engine.name(),
            max_active_fetches = config.crawl.max_active_fetches,
            fetch_timeout_secs = config.crawl.fetch_timeout.as_secs(),
            "Crawler initialized"
        );

        Ok(Self {
            slots: SlotManager::new(config.crawl.max_active_fetches),
            config: config.crawl,
            engine,
            registry: Registry::default(),
            active: ActiveSet::default(),
            counters: Counters::default(),
            event_tx,
            stats_tx,
        })
    }

    /// Subscribe to crawl events
    ///
    /// Slow subscribers lag rather than block the crawl loop.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.event_tx.subscribe()
    }

    /// Current counters
    pub fn stats(&self) -> CrawlStats {
        CrawlStats {
            registered: self.registry.len(),
            active: self.active.len(),
            admitted: self.counters.admitted,
            rejected: self.counters.rejected,
            completed: self.counters.completed,
            failed: self.counters.failed,
            timed_out: self.counters.timed_out,
            malformed: self.counters.malformed,
            slots_reserved: self.slots.reserved(),
            slots_released: self.slots.released(),
        }
    }

    /// Move the crawler onto its own task
    pub fn spawn(self) -> CrawlerHandle {
        let cancel = CancellationToken::new();
        let event_tx = self.event_tx.clone();
        let stats_rx = self.stats_tx.subscribe();
        let task = tokio::spawn(self.run(cancel.clone()));

        CrawlerHandle {
            cancel,
            event_tx,
            stats_rx,
            task,
        }
    }

    pub(crate) fn emit(&self, event: CrawlEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn publish_stats(&self) {
        self.stats_tx.send_replace(self.stats());
    }
}

/// Handle to a spawned crawler
///
/// Dropping the handle stops the crawl loop; the loop still cancels its fetches and
/// shuts the engine down, but nobody waits for it. Use [`CrawlerHandle::shutdown`]
/// to wait for the final counters.
pub struct CrawlerHandle {
    cancel: CancellationToken,
    event_tx: broadcast::Sender<CrawlEvent>,
    stats_rx: watch::Receiver<CrawlStats>,
    task: tokio::task::JoinHandle<CrawlStats>,
}

impl CrawlerHandle {
    /// Ask the crawl loop to stop at the start of its next tick
    ///
    /// Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Token that stops the crawl loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to crawl events
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.event_tx.subscribe()
    }

    /// Counters as of the last completed tick
    pub fn stats(&self) -> CrawlStats {
        *self.stats_rx.borrow()
    }

    /// Whether the crawl loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the crawl loop and wait for it to exit
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskFailed`] if the crawl task panicked or was aborted.
    pub async fn shutdown(mut self) -> Result<CrawlStats> {
        self.stop();
        (&mut self.task)
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))
    }
}

impl Drop for CrawlerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
