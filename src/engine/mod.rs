//! Swarm engine seam
//!
//! The crawl controller never speaks the DHT or peer-wire protocols itself. It drives an
//! engine through the [`SwarmEngine`] trait: events are pulled in batches, commands are
//! pushed back (start a metadata fetch, cancel it, ask for fresh status, shut down).
//!
//! ## Implementations
//!
//! - [`ChannelEngine`]: adapter for an engine running in its own task. The engine side
//!   holds an [`EngineBridge`], pushes [`EngineEvent`](crate::types::EngineEvent)s and
//!   receives [`EngineCommand`]s.
//!
//! ## Usage
//!
//! ```no_run
//! use dhtx::engine::{self, EngineCommand};
//! use dhtx::{Config, Crawler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (engine, mut bridge) = engine::channel(1024);
//!     let crawler = Crawler::new(Config::default(), Box::new(engine))?;
//!     let handle = crawler.spawn();
//!
//!     while let Some(command) = bridge.next_command().await {
//!         if matches!(command, EngineCommand::Shutdown) {
//!             break;
//!         }
//!         // hand the command to the real engine here
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod channel;
mod traits;

pub use channel::{ChannelEngine, EngineBridge, EngineCommand, channel};
pub use traits::{FetchMode, SwarmEngine};
