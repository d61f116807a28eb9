//! Core types for dhtx

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;
use crate::report::Report;

/// 20-byte content identifier (BitTorrent v1 infohash, or a truncated v2 hash as seen in the DHT)
///
/// Formats as lowercase hex by default; `{:X}` gives uppercase.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Size of the identifier in bytes
    pub const LEN: usize = 20;

    /// Wrap raw identifier bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::LowerHex for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::UpperHex for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self)
    }
}

impl std::str::FromStr for InfoHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidInfoHash(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for InfoHash {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for InfoHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Full 32-byte SHA-256 infohash of a BitTorrent v2 torrent
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct InfoHashV2([u8; 32]);

impl InfoHashV2 {
    /// Wrap raw hash bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The first 20 bytes, which is how a v2 torrent is addressed in the DHT
    pub fn truncated(&self) -> InfoHash {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[..20]);
        InfoHash(out)
    }
}

impl fmt::Display for InfoHashV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for InfoHashV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHashV2({})", self)
    }
}

impl std::str::FromStr for InfoHashV2 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidInfoHash(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl From<InfoHashV2> for String {
    fn from(hash: InfoHashV2) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for InfoHashV2 {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Opaque reference to an in-flight fetch owned by the swarm engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FetchHandle(pub u64);

impl fmt::Display for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Phase of a fetch as reported by the swarm engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    /// Still downloading the info dictionary from peers
    Resolving,
    /// Metadata is known; the engine would now move on to content, which is never fetched
    PastMetadata,
    /// Any other engine-side phase (resume-data or file checking); carries no transition
    Other,
}

/// Error condition reported by the engine for one fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    /// Engine-specific error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Descriptive metadata of a resolved torrent
///
/// Every field is optional on the wire; the reporter decides what counts as malformed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Torrent name from the info dictionary
    pub name: Option<String>,
    /// Sum of all file lengths in bytes
    pub total_size: Option<u64>,
    /// Number of files in the torrent
    pub file_count: Option<u64>,
    /// One canonical locator per protocol variant the torrent supports
    pub locators: Vec<String>,
}

impl Descriptor {
    /// Descriptor with all scalar fields present and no locators yet
    pub fn new(name: impl Into<String>, total_size: u64, file_count: u64) -> Self {
        Self {
            name: Some(name.into()),
            total_size: Some(total_size),
            file_count: Some(file_count),
            locators: Vec::new(),
        }
    }

    /// Append a locator
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locators.push(locator.into());
        self
    }
}

/// Status of one tracked fetch inside a status batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStatus {
    /// Engine handle of the fetch
    pub handle: FetchHandle,
    /// Identifier the fetch was started for
    pub info_hash: InfoHash,
    /// Current phase
    pub phase: FetchPhase,
    /// Error condition, if the engine flagged one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
    /// Resolved metadata, present once the phase is past metadata resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Descriptor>,
}

impl FetchStatus {
    /// Status without error or descriptor
    pub fn new(handle: FetchHandle, info_hash: InfoHash, phase: FetchPhase) -> Self {
        Self {
            handle,
            info_hash,
            phase,
            error: None,
            descriptor: None,
        }
    }

    /// Attach an engine error
    #[must_use]
    pub fn with_error(mut self, code: i32, message: impl Into<String>) -> Self {
        self.error = Some(EngineError {
            code,
            message: message.into(),
        });
        self
    }

    /// Attach resolved metadata
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }
}

/// Event popped from the swarm engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A peer asked the DHT about this identifier
    Discovery {
        /// Candidate identifier
        info_hash: InfoHash,
    },

    /// Fresh status of tracked fetches, usually in reply to a status flush
    Status {
        /// One entry per reported handle
        statuses: Vec<FetchStatus>,
    },

    /// Any event kind the controller does not understand
    Unrecognized {
        /// Engine-side name of the event kind
        kind: String,
    },
}

/// Why a discovered identifier was not admitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The identifier was seen before (admitted or rejected)
    Duplicate,
    /// All fetch slots were in use
    CapacityExhausted,
    /// The engine refused to start the fetch
    SubmitFailed,
}

/// Why an admitted fetch was removed without a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemovalReason {
    /// The engine reported an error for the fetch
    Error {
        /// Error reported by the engine
        error: EngineError,
    },
    /// Metadata was not resolved within the configured timeout
    Timeout {
        /// Seconds since admission when the sweep removed the fetch
        elapsed_secs: u64,
    },
    /// The fetch got past metadata resolution but its descriptor could not be reported
    MalformedDescriptor {
        /// Comma separated names of the missing fields
        missing: String,
    },
}

/// Snapshot of crawler counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Identifiers ever recorded in the registry
    pub registered: usize,
    /// Entries currently in the active set
    pub active: usize,
    /// Fetches started
    pub admitted: u64,
    /// Discoveries not admitted (duplicates, capacity, submit failures)
    pub rejected: u64,
    /// Fetches that produced a report
    pub completed: u64,
    /// Fetches removed because the engine reported an error
    pub failed: u64,
    /// Fetches removed by the timeout sweep
    pub timed_out: u64,
    /// Fetches past metadata resolution whose descriptor could not be reported
    pub malformed: u64,
    /// Slots ever reserved
    pub slots_reserved: u64,
    /// Slots ever released
    pub slots_released: u64,
}

/// Event emitted by the crawler to subscribers
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A metadata fetch was started
    Admitted {
        /// Identifier being fetched
        info_hash: InfoHash,
        /// Engine handle of the fetch
        handle: FetchHandle,
    },

    /// A discovery was dropped
    Rejected {
        /// Identifier that was dropped
        info_hash: InfoHash,
        /// Why it was dropped
        reason: RejectReason,
    },

    /// Metadata was resolved and reported
    Completed {
        /// Formatted report
        report: Report,
    },

    /// A fetch was torn down without a report
    Removed {
        /// Identifier of the fetch
        info_hash: InfoHash,
        /// Engine handle of the fetch
        handle: FetchHandle,
        /// Why it was removed
        reason: RemovalReason,
    },

    /// The crawl loop exited
    Shutdown {
        /// Final counters
        stats: CrawlStats,
    },
}
