//! Per-fetch lifecycle: admission through completion, error or timeout.
//!
//! The [`ActiveSet`] decides *when* an entry is finished and hands the removed entry
//! back as a [`Teardown`]. The crawler then performs the side effects (cancel the
//! engine handle, release the slot, report). Because an entry is removed from the set
//! before it is handed out, a second event for the same fetch finds nothing and is a
//! no-op.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::slots::Slot;
use crate::report::Report;
use crate::types::{EngineError, FetchHandle, FetchPhase, FetchStatus, InfoHash};

/// Lifecycle state of a crawl entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntryState {
    /// Slot reserved and fetch submitted, no status seen yet
    Admitted,
    /// Engine reported the fetch is still resolving metadata
    AwaitingMetadata,
    /// Engine reported a phase past metadata resolution; the entry is being reported
    Settling,
    /// Reported or removed; slot and handle released
    Done,
}

impl EntryState {
    /// Admitted and AwaitingMetadata both count as pending for capacity and timeouts
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, EntryState::Admitted | EntryState::AwaitingMetadata)
    }
}

/// One admitted fetch attempt
#[derive(Debug)]
pub(crate) struct CrawlEntry {
    pub(crate) info_hash: InfoHash,
    pub(crate) handle: FetchHandle,
    pub(crate) admitted_at: Instant,
    pub(crate) state: EntryState,
    pub(crate) slot: Slot,
}

impl CrawlEntry {
    pub(crate) fn new(info_hash: InfoHash, handle: FetchHandle, slot: Slot, now: Instant) -> Self {
        Self {
            info_hash,
            handle,
            admitted_at: now,
            state: EntryState::Admitted,
            slot,
        }
    }
}

/// Why an entry left the active set
#[derive(Debug)]
pub(crate) enum TeardownCause {
    /// Past metadata resolution; the report may still be malformed
    Completed(crate::Result<Report>),
    /// Engine reported an error
    Failed(EngineError),
    /// Still resolving after the timeout
    TimedOut(Duration),
}

/// An entry removed from the active set, awaiting its side effects
#[derive(Debug)]
pub(crate) struct Teardown {
    pub(crate) entry: CrawlEntry,
    pub(crate) cause: TeardownCause,
}

/// Entries that are not Done, keyed by engine handle
///
/// Status reports are routed by handle. The identifier an engine reports for a
/// fetch may differ from the one that was discovered (a hybrid torrent can be
/// reported under its truncated v2 hash), so it is informational only.
#[derive(Debug, Default)]
pub(crate) struct ActiveSet {
    entries: HashMap<FetchHandle, CrawlEntry>,
}

impl ActiveSet {
    pub(crate) fn insert(&mut self, entry: CrawlEntry) {
        self.entries.insert(entry.handle, entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, info_hash: &InfoHash) -> Option<&CrawlEntry> {
        self.entries
            .values()
            .find(|entry| entry.info_hash == *info_hash)
    }

    /// Entries counted against capacity
    pub(crate) fn pending(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.is_pending())
            .count()
    }

    /// Apply one engine status report
    ///
    /// Returns the removed entry when the report finishes it. Reports for handles that
    /// are no longer tracked change nothing.
    pub(crate) fn apply_status(&mut self, status: &FetchStatus) -> Option<Teardown> {
        let Some(entry) = self.entries.get_mut(&status.handle) else {
            tracing::trace!(
                info_hash = %status.info_hash,
                handle = %status.handle,
                "Ignoring status for untracked handle"
            );
            return None;
        };
        if entry.info_hash != status.info_hash {
            tracing::trace!(
                handle = %status.handle,
                admitted = %entry.info_hash,
                reported = %status.info_hash,
                "Engine reports fetch under a different identifier"
            );
        }

        if let Some(error) = &status.error {
            let entry = self.entries.remove(&status.handle)?;
            return Some(Teardown {
                entry,
                cause: TeardownCause::Failed(error.clone()),
            });
        }

        match status.phase {
            FetchPhase::Resolving => {
                if entry.state == EntryState::Admitted {
                    entry.state = EntryState::AwaitingMetadata;
                }
                None
            }
            FetchPhase::PastMetadata => {
                entry.state = EntryState::Settling;
                let entry = self.entries.remove(&status.handle)?;
                let report = Report::build(entry.info_hash, status.descriptor.as_ref());
                Some(Teardown {
                    entry,
                    cause: TeardownCause::Completed(report),
                })
            }
            FetchPhase::Other => None,
        }
    }

    /// Remove every pending entry admitted more than `timeout` before `now`
    ///
    /// Entries already past metadata resolution are exempt. The result is ordered by
    /// admission time.
    pub(crate) fn sweep_timeouts(&mut self, now: Instant, timeout: Duration) -> Vec<Teardown> {
        let expired: Vec<FetchHandle> = self
            .entries
            .values()
            .filter(|entry| {
                entry.state.is_pending() && now.saturating_duration_since(entry.admitted_at) > timeout
            })
            .map(|entry| entry.handle)
            .collect();

        let mut teardowns: Vec<Teardown> = expired
            .into_iter()
            .filter_map(|handle| self.entries.remove(&handle))
            .map(|entry| {
                let elapsed = now.saturating_duration_since(entry.admitted_at);
                Teardown {
                    entry,
                    cause: TeardownCause::TimedOut(elapsed),
                }
            })
            .collect();
        teardowns.sort_by_key(|teardown| teardown.entry.admitted_at);
        teardowns
    }

    /// Remove every entry, used at shutdown
    pub(crate) fn drain(&mut self) -> Vec<CrawlEntry> {
        let mut entries: Vec<CrawlEntry> = self.entries.drain().map(|(_, entry)| entry).collect();
        entries.sort_by_key(|entry| entry.admitted_at);
        entries
    }
}
