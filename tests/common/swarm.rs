//! Simulated swarm engine driven through the channel adapter

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dhtx::engine::{self, EngineBridge, EngineCommand};
use dhtx::{
    ChannelEngine, Descriptor, EngineEvent, FetchHandle, FetchPhase, FetchStatus, InfoHash,
    magnet,
};
use tokio::task::JoinHandle;

/// How the simulated swarm answers a fetch for one identifier
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Report `Resolving` for this many flushes, then the descriptor
    Resolve {
        after_flushes: usize,
        descriptor: Descriptor,
    },
    /// Report an engine error on the first flush
    Fail,
    /// Report `Resolving` forever
    Stall,
}

/// Commands the simulated swarm received, in order
#[derive(Clone, Debug, Default)]
pub struct SwarmLog {
    pub submits: Vec<(FetchHandle, InfoHash)>,
    pub cancels: Vec<FetchHandle>,
    pub flushes: usize,
    pub shutdowns: usize,
}

impl SwarmLog {
    pub fn cancel_count(&self, handle: FetchHandle) -> usize {
        self.cancels.iter().filter(|h| **h == handle).count()
    }
}

/// Engine-side task answering controller commands according to per-identifier outcomes
pub struct SimulatedSwarm {
    pub log: Arc<Mutex<SwarmLog>>,
    pub events: tokio::sync::mpsc::Sender<EngineEvent>,
    pub task: JoinHandle<()>,
}

struct Tracked {
    info_hash: InfoHash,
    flushes_seen: usize,
}

impl SimulatedSwarm {
    /// Start the swarm task and return the controller-side engine
    pub fn start(outcomes: HashMap<InfoHash, Outcome>) -> (ChannelEngine, SimulatedSwarm) {
        let (engine, bridge) = engine::channel(1024);
        let log = Arc::new(Mutex::new(SwarmLog::default()));
        let events = bridge.event_sender();
        let task = tokio::spawn(run_swarm(bridge, outcomes, log.clone()));
        (engine, SimulatedSwarm { log, events, task })
    }

    /// Announce identifiers as if peers had asked the DHT about them
    pub async fn discover(&self, hashes: &[InfoHash]) {
        for info_hash in hashes {
            self.events
                .send(EngineEvent::Discovery {
                    info_hash: *info_hash,
                })
                .await
                .expect("controller dropped the event channel");
        }
    }

    pub fn log(&self) -> SwarmLog {
        self.log.lock().expect("swarm log poisoned").clone()
    }
}

async fn run_swarm(
    mut bridge: EngineBridge,
    outcomes: HashMap<InfoHash, Outcome>,
    log: Arc<Mutex<SwarmLog>>,
) {
    let mut tracked: HashMap<FetchHandle, Tracked> = HashMap::new();

    while let Some(command) = bridge.next_command().await {
        match command {
            EngineCommand::Submit {
                handle, info_hash, ..
            } => {
                log.lock().expect("swarm log poisoned").submits.push((handle, info_hash));
                tracked.insert(
                    handle,
                    Tracked {
                        info_hash,
                        flushes_seen: 0,
                    },
                );
            }
            EngineCommand::Cancel { handle } => {
                log.lock().expect("swarm log poisoned").cancels.push(handle);
                tracked.remove(&handle);
            }
            EngineCommand::FlushStatus => {
                log.lock().expect("swarm log poisoned").flushes += 1;
                let mut statuses = Vec::new();
                for (handle, fetch) in tracked.iter_mut() {
                    fetch.flushes_seen += 1;
                    let outcome = outcomes.get(&fetch.info_hash).cloned().unwrap_or(Outcome::Stall);
                    let status = match outcome {
                        Outcome::Resolve {
                            after_flushes,
                            descriptor,
                        } if fetch.flushes_seen > after_flushes => {
                            FetchStatus::new(*handle, fetch.info_hash, FetchPhase::PastMetadata)
                                .with_descriptor(descriptor)
                        }
                        Outcome::Fail => {
                            FetchStatus::new(*handle, fetch.info_hash, FetchPhase::Resolving)
                                .with_error(-1, "metadata exchange failed")
                        }
                        _ => FetchStatus::new(*handle, fetch.info_hash, FetchPhase::Resolving),
                    };
                    statuses.push(status);
                }
                if !statuses.is_empty()
                    && bridge
                        .send_event(EngineEvent::Status { statuses })
                        .await
                        .is_err()
                {
                    break;
                }
            }
            EngineCommand::Shutdown => {
                log.lock().expect("swarm log poisoned").shutdowns += 1;
                break;
            }
        }
    }
}

/// Identifier whose bytes are all `byte`
pub fn hash(byte: u8) -> InfoHash {
    InfoHash::new([byte; 20])
}

/// Descriptor with a single v1 locator for `info_hash`
pub fn descriptor_for(info_hash: InfoHash, name: &str, total_size: u64, file_count: u64) -> Descriptor {
    Descriptor::new(name, total_size, file_count).with_locator(magnet::v1(&info_hash))
}
