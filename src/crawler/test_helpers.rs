//! Shared test helpers: a scriptable fake engine and crawler constructors.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::crawler::Crawler;
use crate::engine::{FetchMode, SwarmEngine};
use crate::error::{Error, Result};
use crate::types::{
    Descriptor, EngineEvent, FetchHandle, FetchPhase, FetchStatus, InfoHash,
};

/// Everything the fake engine was asked to do, plus the batches it will hand out
#[derive(Debug, Default)]
pub(crate) struct FakeEngineState {
    pub(crate) batches: VecDeque<Vec<EngineEvent>>,
    pub(crate) submitted: Vec<(InfoHash, FetchHandle)>,
    pub(crate) cancelled: Vec<FetchHandle>,
    pub(crate) flushes: usize,
    pub(crate) shutdowns: usize,
    pub(crate) pops: usize,
    pub(crate) fail_submits: bool,
    pub(crate) fail_cancels: bool,
    next_handle: u64,
}

/// Engine double; the probe shares its state with the test
pub(crate) struct FakeEngine {
    state: Arc<Mutex<FakeEngineState>>,
}

/// Test-side view of a [`FakeEngine`]
#[derive(Clone)]
pub(crate) struct FakeEngineProbe {
    state: Arc<Mutex<FakeEngineState>>,
}

impl FakeEngine {
    pub(crate) fn new() -> (Self, FakeEngineProbe) {
        let state = Arc::new(Mutex::new(FakeEngineState {
            next_handle: 100,
            ..Default::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            FakeEngineProbe { state },
        )
    }
}

impl FakeEngineProbe {
    /// Queue a batch returned by a later `pop_events`
    pub(crate) fn push_batch(&self, batch: Vec<EngineEvent>) {
        self.state.lock().unwrap().batches.push_back(batch);
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut FakeEngineState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub(crate) fn submitted(&self) -> Vec<(InfoHash, FetchHandle)> {
        self.with(|s| s.submitted.clone())
    }

    pub(crate) fn cancelled(&self) -> Vec<FetchHandle> {
        self.with(|s| s.cancelled.clone())
    }

    pub(crate) fn handle_of(&self, info_hash: InfoHash) -> FetchHandle {
        self.with(|s| {
            s.submitted
                .iter()
                .find(|(hash, _)| *hash == info_hash)
                .map(|(_, handle)| *handle)
                .expect("identifier was never submitted")
        })
    }
}

#[async_trait]
impl SwarmEngine for FakeEngine {
    async fn pop_events(&mut self) -> Vec<EngineEvent> {
        let mut state = self.state.lock().unwrap();
        state.pops += 1;
        state.batches.pop_front().unwrap_or_default()
    }

    async fn submit_fetch(&mut self, info_hash: InfoHash, mode: FetchMode) -> Result<FetchHandle> {
        assert_eq!(mode, FetchMode::MetadataOnly);
        let mut state = self.state.lock().unwrap();
        if state.fail_submits {
            return Err(Error::Engine("submit refused".into()));
        }
        let handle = FetchHandle(state.next_handle);
        state.next_handle += 1;
        state.submitted.push((info_hash, handle));
        Ok(handle)
    }

    async fn cancel_fetch(&mut self, handle: FetchHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.cancelled.push(handle);
        if state.fail_cancels {
            return Err(Error::Engine("cancel refused".into()));
        }
        Ok(())
    }

    async fn request_status_flush(&mut self) {
        self.state.lock().unwrap().flushes += 1;
    }

    async fn shutdown(&mut self) {
        self.state.lock().unwrap().shutdowns += 1;
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Identifier whose bytes are all `byte`
pub(crate) fn hash(byte: u8) -> InfoHash {
    InfoHash::new([byte; 20])
}

pub(crate) fn discovery(byte: u8) -> EngineEvent {
    EngineEvent::Discovery {
        info_hash: hash(byte),
    }
}

pub(crate) fn status_batch(statuses: Vec<FetchStatus>) -> EngineEvent {
    EngineEvent::Status { statuses }
}

pub(crate) fn resolving(info_hash: InfoHash, handle: FetchHandle) -> FetchStatus {
    FetchStatus::new(handle, info_hash, FetchPhase::Resolving)
}

pub(crate) fn resolved(info_hash: InfoHash, handle: FetchHandle) -> FetchStatus {
    FetchStatus::new(handle, info_hash, FetchPhase::PastMetadata).with_descriptor(
        Descriptor::new("X", 1024, 3).with_locator(crate::magnet::v1(&info_hash)),
    )
}

pub(crate) fn failed(info_hash: InfoHash, handle: FetchHandle) -> FetchStatus {
    FetchStatus::new(handle, info_hash, FetchPhase::Resolving).with_error(2, "no peers")
}

/// Config with a small capacity, the default 60 s timeout and a 1 s tick
pub(crate) fn test_config(capacity: usize) -> Config {
    let mut config = Config::default();
    config.crawl.max_active_fetches = capacity;
    config.crawl.fetch_timeout = Duration::from_secs(60);
    config.crawl.tick_interval = Duration::from_secs(1);
    config
}

/// Crawler over a fake engine
pub(crate) fn create_test_crawler(capacity: usize) -> (Crawler, FakeEngineProbe) {
    let (engine, probe) = FakeEngine::new();
    let crawler = Crawler::new(test_config(capacity), Box::new(engine)).unwrap();
    (crawler, probe)
}
