//! Canonical locators (magnet links)
//!
//! v1 torrents are addressed as `urn:btih:<40 hex>`, v2 torrents as a multihash
//! `urn:btmh:1220<64 hex>` (0x12 = sha2-256, 0x20 = 32 bytes).

use crate::types::{InfoHash, InfoHashV2};

const MAGNET_PREFIX: &str = "magnet:?xt=";

/// Magnet link for a v1 infohash
pub fn v1(info_hash: &InfoHash) -> String {
    format!("{}urn:btih:{}", MAGNET_PREFIX, info_hash)
}

/// Magnet link for a v2 infohash
pub fn v2(info_hash: &InfoHashV2) -> String {
    format!("{}urn:btmh:1220{}", MAGNET_PREFIX, info_hash)
}

/// Append a URL-encoded display name (`dn`) to a magnet link
pub fn with_display_name(locator: &str, name: &str) -> String {
    format!("{}&dn={}", locator, urlencoding::encode(name))
}

/// Protocol variant a locator refers to, judged from its exact-topic URN
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// `urn:btih:`
    V1,
    /// `urn:btmh:`
    V2,
}

impl Variant {
    /// Short label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Variant::V1 => "V1",
            Variant::V2 => "V2",
        }
    }
}

/// Classify a locator, `None` if it is not a BitTorrent magnet link
pub fn variant_of(locator: &str) -> Option<Variant> {
    let topic = locator.strip_prefix(MAGNET_PREFIX)?;
    if topic.starts_with("urn:btih:") {
        Some(Variant::V1)
    } else if topic.starts_with("urn:btmh:") {
        Some(Variant::V2)
    } else {
        None
    }
}
