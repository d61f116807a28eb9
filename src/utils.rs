//! Startup and teardown helpers for engine adapters

use crate::error::{Error, Result};
use rand::Rng;
use std::path::Path;

/// Remove `dir` and everything below it, returning whether anything was removed
///
/// A missing directory is not an error.
pub async fn clean_dir(dir: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to remove directory '{}': {}", dir.display(), e),
        ))),
    }
}

/// Recreate `dir` empty
pub async fn reset_dir(dir: &Path) -> Result<()> {
    clean_dir(dir).await?;
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create directory '{}': {}", dir.display(), e),
        ))
    })
}

/// Pick a listen port uniformly from the inclusive range `(low, high)`
///
/// An inverted range is treated as its reverse.
pub fn random_port((low, high): (u16, u16)) -> u16 {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    rand::thread_rng().gen_range(low..=high)
}
