//! # dhtx
//!
//! Passive DHT crawler: watches the infohashes peers ask the DHT about, resolves just
//! enough metadata for each one to describe it (name, size, file count) and reports a
//! magnet link, without ever downloading content.
//!
//! ## Design
//!
//! - **Engine-agnostic** - the DHT and peer-wire protocols live behind the
//!   [`SwarmEngine`] trait; the crate contains the crawl controller only
//! - **Bounded** - at most `max_active_fetches` metadata fetches are pending at once,
//!   every identifier is tried at most once per process
//! - **Timeout-safe** - fetches stuck in metadata resolution are dropped after
//!   `fetch_timeout`, and every fetch releases its slot and engine handle exactly once
//! - **Event-driven** - consumers subscribe to [`CrawlEvent`]s
//!
//! ## Quick Start
//!
//! ```no_run
//! use dhtx::{Config, Crawler, CrawlEvent, engine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (engine, _bridge) = engine::channel(1024);
//!     let crawler = Crawler::new(Config::default(), Box::new(engine))?;
//!
//!     let mut events = crawler.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let CrawlEvent::Completed { report } = event {
//!                 println!("{}", report);
//!             }
//!         }
//!     });
//!
//!     let handle = crawler.spawn();
//!     dhtx::run_until_stop(handle, tokio::io::stdin()).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Crawl controller
pub mod crawler;
/// Swarm engine seam
pub mod engine;
/// Error types
pub mod error;
/// Magnet link construction
pub mod magnet;
/// Completion reports
pub mod report;
/// Core types and events
pub mod types;
/// Startup and teardown helpers
pub mod utils;

// Re-export commonly used types
pub use config::{Config, CrawlConfig, EngineConfig};
pub use crawler::{Crawler, CrawlerHandle};
pub use engine::{ChannelEngine, EngineBridge, EngineCommand, FetchMode, SwarmEngine};
pub use error::{Error, Result};
pub use report::Report;
pub use types::{
    CrawlEvent, CrawlStats, Descriptor, EngineError, EngineEvent, FetchHandle, FetchPhase,
    FetchStatus, InfoHash, InfoHashV2, RejectReason, RemovalReason,
};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Character that stops the crawler when read from the input
pub const STOP_COMMAND: char = 's';

/// Run a spawned crawler until a stop command or a termination signal arrives
///
/// The stop command is the character [`STOP_COMMAND`] anywhere in a line of `input`;
/// everything else is ignored. If `input` reaches end of file, only a signal can stop
/// the crawler.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use dhtx::{Config, Crawler, engine};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (engine, _bridge) = engine::channel(1024);
///     let handle = Crawler::new(Config::default(), Box::new(engine))?.spawn();
///
///     let stats = dhtx::run_until_stop(handle, tokio::io::stdin()).await?;
///     println!("resolved {} torrents", stats.completed);
///     Ok(())
/// }
/// ```
pub async fn run_until_stop<R>(handle: CrawlerHandle, input: R) -> Result<CrawlStats>
where
    R: AsyncRead + Unpin,
{
    tokio::select! {
        _ = wait_for_stop_command(input) => {
            tracing::info!("Stop command received");
        }
        _ = wait_for_signal() => {}
    }
    handle.shutdown().await
}

fn is_stop_command(line: &str) -> bool {
    line.chars().any(|c| c == STOP_COMMAND)
}

async fn wait_for_stop_command<R>(input: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if is_stop_command(&line) => return,
            Ok(Some(_)) => continue,
            Ok(None) => {
                tracing::debug!("Input closed, waiting for a termination signal");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stop command input");
                break;
            }
        }
    }
    std::future::pending::<()>().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
