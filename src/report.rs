//! Completion reports for resolved fetches
//!
//! A [`Report`] is built from the descriptor an engine attaches to a fetch that got past
//! metadata resolution. Building is pure; the crawler decides where the report goes
//! (logs and the event channel).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};
use crate::magnet;
use crate::types::{Descriptor, InfoHash};

const RULE: &str =
    "------------------------------------------------------------------------------------";

/// Human-readable summary of one resolved torrent
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Identifier the fetch was started for
    pub info_hash: InfoHash,
    /// Torrent name
    pub name: String,
    /// Total payload size in bytes
    pub total_size: u64,
    /// Number of files
    pub file_count: u64,
    /// One locator per supported protocol variant
    pub locators: Vec<String>,
    /// When the report was produced
    pub completed_at: DateTime<Utc>,
}

impl Report {
    /// Build a report from an engine descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDescriptor`] when the descriptor is absent or lacks
    /// the name, total size or file count. A descriptor without locators is not
    /// malformed: the v1 magnet link of `info_hash`, named after the descriptor, is
    /// used instead.
    pub fn build(info_hash: InfoHash, descriptor: Option<&Descriptor>) -> Result<Self> {
        let Some(descriptor) = descriptor else {
            return Err(Error::MalformedDescriptor {
                info_hash,
                missing: "descriptor".to_string(),
            });
        };

        let mut missing = Vec::new();
        if descriptor.name.is_none() {
            missing.push("name");
        }
        if descriptor.total_size.is_none() {
            missing.push("total_size");
        }
        if descriptor.file_count.is_none() {
            missing.push("file_count");
        }

        match (
            &descriptor.name,
            descriptor.total_size,
            descriptor.file_count,
        ) {
            (Some(name), Some(total_size), Some(file_count)) => {
                let locators = if descriptor.locators.is_empty() {
                    vec![magnet::with_display_name(&magnet::v1(&info_hash), name)]
                } else {
                    descriptor.locators.clone()
                };
                Ok(Self {
                    info_hash,
                    name: name.clone(),
                    total_size,
                    file_count,
                    locators,
                    completed_at: Utc::now(),
                })
            }
            _ => Err(Error::MalformedDescriptor {
                info_hash,
                missing: missing.join(", "),
            }),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Total size: {} B", self.total_size)?;
        writeln!(f, "File count: {}", self.file_count)?;
        for locator in &self.locators {
            match magnet::variant_of(locator) {
                Some(variant) => writeln!(f, "Magnet [{}]: {}", variant.label(), locator)?,
                None => writeln!(f, "Locator: {}", locator)?,
            }
        }
        write!(f, "{}", RULE)
    }
}
