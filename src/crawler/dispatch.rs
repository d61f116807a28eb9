//! Event dispatcher: routes engine events to admission or the lifecycle.

use tokio::time::Instant;

use super::Crawler;
use super::lifecycle::{CrawlEntry, EntryState, Teardown, TeardownCause};
use crate::engine::FetchMode;
use crate::error::Error;
use crate::magnet;
use crate::types::{CrawlEvent, EngineEvent, FetchStatus, InfoHash, RejectReason, RemovalReason};

impl Crawler {
    /// Handle one batch of engine events in delivery order
    pub(crate) async fn dispatch(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            match event {
                EngineEvent::Discovery { info_hash } => self.on_discovery(info_hash).await,
                EngineEvent::Status { statuses } => self.on_status(&statuses).await,
                EngineEvent::Unrecognized { kind } => {
                    tracing::trace!(kind = %kind, "Ignoring unrecognized engine event");
                }
            }
        }
    }

    /// Admission: registry first, then a slot, then the engine
    ///
    /// A capacity rejection still records the identifier, so it is never tried again.
    pub(crate) async fn on_discovery(&mut self, info_hash: InfoHash) {
        if !self.registry.admit(info_hash) {
            tracing::trace!(info_hash = %info_hash, "Discovery of already seen identifier");
            self.reject(info_hash, RejectReason::Duplicate);
            return;
        }

        let Some(slot) = self.slots.try_reserve() else {
            tracing::debug!(
                info_hash = %info_hash,
                capacity = self.slots.capacity(),
                "All fetch slots in use, dropping discovery"
            );
            self.reject(info_hash, RejectReason::CapacityExhausted);
            return;
        };

        match self
            .engine
            .submit_fetch(info_hash, FetchMode::MetadataOnly)
            .await
        {
            Ok(handle) => {
                self.active
                    .insert(CrawlEntry::new(info_hash, handle, slot, Instant::now()));
                self.counters.admitted += 1;
                tracing::debug!(
                    info_hash = %info_hash,
                    handle = %handle,
                    active = self.slots.active(),
                    "Admitted metadata fetch"
                );
                self.emit(CrawlEvent::Admitted { info_hash, handle });
            }
            Err(e) => {
                self.slots.release(slot);
                tracing::warn!(
                    info_hash = %info_hash,
                    error = %e,
                    "Engine refused metadata fetch"
                );
                self.reject(info_hash, RejectReason::SubmitFailed);
            }
        }
    }

    /// Route every status in a batch independently
    pub(crate) async fn on_status(&mut self, statuses: &[FetchStatus]) {
        for status in statuses {
            if let Some(teardown) = self.active.apply_status(status) {
                self.teardown(teardown).await;
            }
        }
    }

    /// Remove expired pending entries
    pub(crate) async fn sweep(&mut self, now: Instant) {
        let expired = self.active.sweep_timeouts(now, self.config.fetch_timeout);
        for teardown in expired {
            self.teardown(teardown).await;
        }
    }

    /// Release the handle and slot of a removed entry and report the outcome
    pub(crate) async fn teardown(&mut self, teardown: Teardown) {
        let Teardown { mut entry, cause } = teardown;
        let info_hash = entry.info_hash;
        let handle = entry.handle;

        if let Err(e) = self.engine.cancel_fetch(handle).await {
            tracing::warn!(
                info_hash = %info_hash,
                handle = %handle,
                error = %e,
                "Failed to cancel fetch, releasing slot anyway"
            );
        }
        entry.state = EntryState::Done;
        tracing::trace!(handle = %handle, state = ?entry.state, "Releasing fetch slot");
        self.slots.release(entry.slot);

        match cause {
            TeardownCause::Completed(Ok(report)) => {
                self.counters.completed += 1;
                tracing::info!(
                    info_hash = %info_hash,
                    name = %report.name,
                    total_size = report.total_size,
                    file_count = report.file_count,
                    locators = %report.locators.join(" "),
                    "Metadata resolved"
                );
                self.emit(CrawlEvent::Completed { report });
            }
            TeardownCause::Completed(Err(e)) => {
                self.counters.malformed += 1;
                let missing = match &e {
                    Error::MalformedDescriptor { missing, .. } => missing.clone(),
                    other => other.to_string(),
                };
                tracing::warn!(
                    info_hash = %info_hash,
                    handle = %handle,
                    error = %e,
                    "Resolved fetch has a malformed descriptor"
                );
                self.emit(CrawlEvent::Removed {
                    info_hash,
                    handle,
                    reason: RemovalReason::MalformedDescriptor { missing },
                });
            }
            TeardownCause::Failed(error) => {
                self.counters.failed += 1;
                tracing::warn!(
                    info_hash = %info_hash,
                    handle = %handle,
                    error = %error,
                    locator = %magnet::v1(&info_hash),
                    "Removed fetch after engine error"
                );
                self.emit(CrawlEvent::Removed {
                    info_hash,
                    handle,
                    reason: RemovalReason::Error { error },
                });
            }
            TeardownCause::TimedOut(elapsed) => {
                self.counters.timed_out += 1;
                tracing::warn!(
                    info_hash = %info_hash,
                    handle = %handle,
                    elapsed_secs = elapsed.as_secs(),
                    locator = %magnet::v1(&info_hash),
                    "Removed fetch after metadata timeout"
                );
                self.emit(CrawlEvent::Removed {
                    info_hash,
                    handle,
                    reason: RemovalReason::Timeout {
                        elapsed_secs: elapsed.as_secs(),
                    },
                });
            }
        }
    }

    fn reject(&mut self, info_hash: InfoHash, reason: RejectReason) {
        self.counters.rejected += 1;
        self.emit(CrawlEvent::Rejected { info_hash, reason });
    }
}
