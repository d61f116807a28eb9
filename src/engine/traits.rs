//! Trait and types for swarm engine adapters

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EngineEvent, FetchHandle, InfoHash};

/// How a fetch should be performed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchMode {
    /// Resolve the info dictionary only; never request, write or upload payload pieces
    #[default]
    MetadataOnly,
}

/// Interface the crawl controller uses to drive a swarm engine
///
/// The engine is owned by the crawl loop for its whole lifetime, so methods take
/// `&mut self`. Implementations must not block: `pop_events` returns whatever is queued
/// right now, commands are fire-and-forget from the controller's point of view.
#[async_trait]
pub trait SwarmEngine: Send {
    /// Retrieve the queued events without waiting for new ones
    async fn pop_events(&mut self) -> Vec<EngineEvent>;

    /// Start resolving metadata for `info_hash`
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot start the fetch. No handle exists in
    /// that case and nothing needs to be cancelled.
    async fn submit_fetch(&mut self, info_hash: InfoHash, mode: FetchMode)
    -> Result<FetchHandle>;

    /// Release engine-side resources of a fetch
    ///
    /// The controller calls this at most once per handle.
    async fn cancel_fetch(&mut self, handle: FetchHandle) -> Result<()>;

    /// Ask the engine to emit a fresh status batch for all tracked fetches
    async fn request_status_flush(&mut self);

    /// Orderly teardown, called once when the crawl loop exits
    async fn shutdown(&mut self);

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
