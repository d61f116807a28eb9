//! Channel-backed engine adapter
//!
//! The controller side ([`ChannelEngine`]) and the engine side ([`EngineBridge`]) are
//! connected by two tokio channels. Events flow through a bounded channel so a busy
//! engine feels backpressure; commands flow through an unbounded one so the crawl loop
//! never waits on the engine.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::traits::{FetchMode, SwarmEngine};
use crate::error::{Error, Result};
use crate::types::{EngineEvent, FetchHandle, InfoHash};

/// Maximum number of events returned by one `pop_events` call
const MAX_EVENTS_PER_POP: usize = 4096;

/// Command sent from the controller to the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    /// Start a metadata fetch; `handle` was allocated by the adapter
    Submit {
        /// Handle the engine must use in status reports for this fetch
        handle: FetchHandle,
        /// Identifier to resolve
        info_hash: InfoHash,
        /// Fetch mode
        mode: FetchMode,
    },
    /// Drop a fetch and its resources
    Cancel {
        /// Handle of the fetch
        handle: FetchHandle,
    },
    /// Emit a fresh status batch
    FlushStatus,
    /// Tear the engine down
    Shutdown,
}

/// Create a connected controller/engine pair
///
/// `event_capacity` bounds the number of events buffered before
/// [`EngineBridge::send_event`] waits.
pub fn channel(event_capacity: usize) -> (ChannelEngine, EngineBridge) {
    let (event_tx, event_rx) = mpsc::channel(event_capacity.max(1));
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let engine = ChannelEngine {
        event_rx,
        command_tx,
        next_handle: 1,
    };
    let bridge = EngineBridge {
        event_tx,
        command_rx,
    };
    (engine, bridge)
}

/// Controller side of a channel-backed engine
pub struct ChannelEngine {
    event_rx: mpsc::Receiver<EngineEvent>,
    command_tx: mpsc::UnboundedSender<EngineCommand>,
    next_handle: u64,
}

impl ChannelEngine {
    fn send(&self, command: EngineCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Engine("engine bridge has been dropped".to_string()))
    }
}

#[async_trait]
impl SwarmEngine for ChannelEngine {
    async fn pop_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while events.len() < MAX_EVENTS_PER_POP {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }

    async fn submit_fetch(
        &mut self,
        info_hash: InfoHash,
        mode: FetchMode,
    ) -> Result<FetchHandle> {
        let handle = FetchHandle(self.next_handle);
        self.send(EngineCommand::Submit {
            handle,
            info_hash,
            mode,
        })?;
        self.next_handle += 1;
        Ok(handle)
    }

    async fn cancel_fetch(&mut self, handle: FetchHandle) -> Result<()> {
        self.send(EngineCommand::Cancel { handle })
    }

    async fn request_status_flush(&mut self) {
        if self.send(EngineCommand::FlushStatus).is_err() {
            tracing::trace!("status flush requested after engine bridge was dropped");
        }
    }

    async fn shutdown(&mut self) {
        if self.send(EngineCommand::Shutdown).is_err() {
            tracing::debug!("engine bridge already dropped at shutdown");
        }
        self.event_rx.close();
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Engine side of a channel-backed engine
pub struct EngineBridge {
    event_tx: mpsc::Sender<EngineEvent>,
    command_rx: mpsc::UnboundedReceiver<EngineCommand>,
}

impl EngineBridge {
    /// Queue an event for the controller, waiting while the buffer is full
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] once the controller has shut the engine down.
    pub async fn send_event(&self, event: EngineEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| Error::ShuttingDown)
    }

    /// Queue an event without waiting; returns `false` if it was dropped
    pub fn try_send_event(&self, event: EngineEvent) -> bool {
        self.event_tx.try_send(event).is_ok()
    }

    /// Cloneable sender for producers running in other tasks
    pub fn event_sender(&self) -> mpsc::Sender<EngineEvent> {
        self.event_tx.clone()
    }

    /// Wait for the next controller command, `None` once the controller is gone
    pub async fn next_command(&mut self) -> Option<EngineCommand> {
        self.command_rx.recv().await
    }

    /// Take the next controller command if one is queued
    pub fn try_next_command(&mut self) -> Option<EngineCommand> {
        self.command_rx.try_recv().ok()
    }
}
