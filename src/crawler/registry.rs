//! Identifier registry: every infohash ever considered for admission.

use std::collections::HashSet;

use crate::types::InfoHash;

/// Set of identifiers that have been admitted or rejected for capacity
///
/// Membership is permanent for the lifetime of the crawler, so a capacity
/// rejection is never retried for the same identifier.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    seen: HashSet<InfoHash>,
}

impl Registry {
    /// Record `info_hash`, returning `false` if it was already recorded
    pub(crate) fn admit(&mut self, info_hash: InfoHash) -> bool {
        self.seen.insert(info_hash)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, info_hash: &InfoHash) -> bool {
        self.seen.contains(info_hash)
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }
}
