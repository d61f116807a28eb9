//! Crawl loop: one dispatch pass and one timeout sweep per tick.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::Crawler;
use crate::types::{CrawlEvent, CrawlStats};

impl Crawler {
    /// Run until `cancel` fires, then shut the engine down
    ///
    /// Each tick:
    /// 1. Exits if cancellation was requested
    /// 2. Pops and dispatches the queued engine events
    /// 3. Sweeps timed out fetches
    /// 4. Sleeps for the tick interval
    /// 5. Asks the engine for fresh status if any fetch is active
    ///
    /// The sleep is not interrupted, so shutdown takes at most one tick interval.
    pub async fn run(mut self, cancel: CancellationToken) -> CrawlStats {
        tracing::info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "Crawl loop started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.tick().await;
            tokio::time::sleep(self.config.tick_interval).await;

            if !self.active.is_empty() && !cancel.is_cancelled() {
                self.engine.request_status_flush().await;
            }
        }

        self.shutdown().await
    }

    /// One dispatch pass plus one timeout sweep
    pub(crate) async fn tick(&mut self) {
        let events = self.engine.pop_events().await;
        let batch = events.len();
        self.dispatch(events).await;
        self.sweep(Instant::now()).await;
        self.publish_stats();

        if batch > 0 {
            tracing::debug!(
                batch,
                active = self.active.len(),
                pending = self.active.pending(),
                registered = self.registry.len(),
                "Tick processed"
            );
        }
    }

    /// Cancel what is still in flight, stop the engine and report final counters
    async fn shutdown(&mut self) -> CrawlStats {
        tracing::info!(active = self.active.len(), "Crawl loop stopping");

        for entry in self.active.drain() {
            if let Err(e) = self.engine.cancel_fetch(entry.handle).await {
                tracing::debug!(
                    info_hash = %entry.info_hash,
                    handle = %entry.handle,
                    error = %e,
                    "Failed to cancel fetch during shutdown"
                );
            }
            self.slots.release(entry.slot);
        }

        self.engine.shutdown().await;

        let stats = self.stats();
        self.publish_stats();
        self.emit(CrawlEvent::Shutdown { stats });
        tracing::info!(
            admitted = stats.admitted,
            completed = stats.completed,
            failed = stats.failed,
            timed_out = stats.timed_out,
            registered = stats.registered,
            "Crawl loop stopped"
        );
        stats
    }
}
