//! Configuration types for dhtx

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Public DHT routers used to join the swarm when no routing table exists yet
pub const DEFAULT_BOOTSTRAP_NODES: [&str; 8] = [
    "dht.libtorrent.org:25401",
    "dht.transmissionbt.com:6881",
    "router.utorrent.com:6881",
    "router.silotis.us:6881",
    "dht.aelitis.com:6881",
    "dht.choking.chicken:6881",
    "router.bitcomet.com:6881",
    "dht.mopf.ru:6881",
];

/// Crawl controller behavior (capacity, timeouts, pacing)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of concurrently pending metadata fetches (default: 10)
    #[serde(default = "default_max_active_fetches")]
    pub max_active_fetches: usize,

    /// How long a fetch may stay in metadata resolution before it is dropped (default: 60 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,

    /// Delay between two crawl loop ticks (default: 1 second)
    ///
    /// This is also the upper bound on shutdown latency.
    #[serde(default = "default_tick_interval", with = "duration_serde")]
    pub tick_interval: Duration,

    /// Capacity of the [`CrawlEvent`](crate::types::CrawlEvent) broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_active_fetches: default_max_active_fetches(),
            fetch_timeout: default_fetch_timeout(),
            tick_interval: default_tick_interval(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Settings handed to swarm engine adapters
///
/// The crawl controller never interprets these; they describe how an engine should
/// join the DHT and where it may keep scratch state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// DHT bootstrap nodes as `host:port` strings
    #[serde(default = "default_bootstrap_nodes")]
    pub bootstrap_nodes: Vec<String>,

    /// Scratch directory for the engine's storage layer (default: "./temp")
    ///
    /// Reset at startup and removed at shutdown.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Inclusive range a random listen port is drawn from (default: 11000..=19000)
    #[serde(default = "default_listen_port_range")]
    pub listen_port_range: (u16, u16),

    /// User agent announced to peers (default: "dhtx/<version>")
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bootstrap_nodes: default_bootstrap_nodes(),
            scratch_dir: default_scratch_dir(),
            listen_port_range: default_listen_port_range(),
            user_agent: default_user_agent(),
        }
    }
}

impl EngineConfig {
    /// Bootstrap nodes joined into the comma separated form most engines accept
    pub fn bootstrap_list(&self) -> String {
        self.bootstrap_nodes.join(",")
    }
}

/// Main configuration for a [`Crawler`](crate::Crawler)
///
/// - [`crawl`](CrawlConfig): capacity, timeout and tick pacing
/// - [`engine`](EngineConfig): settings for the swarm engine adapter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Crawl controller settings
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Swarm engine adapter settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Parse a JSON document and validate the result
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a runnable crawler
    pub fn validate(&self) -> Result<()> {
        if self.crawl.max_active_fetches == 0 {
            return Err(Error::config(
                "max_active_fetches",
                "max_active_fetches must be at least 1",
            ));
        }
        if self.crawl.fetch_timeout.is_zero() {
            return Err(Error::config(
                "fetch_timeout",
                "fetch_timeout must be greater than zero",
            ));
        }
        if self.crawl.tick_interval.is_zero() {
            return Err(Error::config(
                "tick_interval",
                "tick_interval must be greater than zero",
            ));
        }
        if self.crawl.event_buffer == 0 {
            return Err(Error::config(
                "event_buffer",
                "event_buffer must be at least 1",
            ));
        }
        let (low, high) = self.engine.listen_port_range;
        if low > high {
            return Err(Error::config(
                "listen_port_range",
                format!("listen_port_range is inverted: {} > {}", low, high),
            ));
        }
        Ok(())
    }
}

fn default_max_active_fetches() -> usize {
    10
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_event_buffer() -> usize {
    1000
}

fn default_bootstrap_nodes() -> Vec<String> {
    DEFAULT_BOOTSTRAP_NODES
        .iter()
        .map(|node| node.to_string())
        .collect()
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_listen_port_range() -> (u16, u16) {
    (11000, 19000)
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
