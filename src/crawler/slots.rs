//! Slot manager: hard cap on concurrently pending fetches.
//!
//! A reservation is a [`Slot`] owning a semaphore permit. [`SlotManager::release`]
//! consumes the slot, so releasing twice does not type-check.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// One unit of fetch capacity, held by a crawl entry until it is torn down
#[must_use = "a reserved slot must be released through SlotManager::release"]
#[derive(Debug)]
pub(crate) struct Slot {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
pub(crate) struct SlotManager {
    permits: Arc<Semaphore>,
    capacity: usize,
    reserved: u64,
    released: u64,
}

impl SlotManager {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            reserved: 0,
            released: 0,
        }
    }

    /// Take a slot if fewer than `capacity` are in use
    pub(crate) fn try_reserve(&mut self) -> Option<Slot> {
        let permit = self.permits.clone().try_acquire_owned().ok()?;
        self.reserved += 1;
        Some(Slot { _permit: permit })
    }

    /// Give a slot back
    pub(crate) fn release(&mut self, slot: Slot) {
        drop(slot);
        self.released += 1;
    }

    /// Slots currently in use
    pub(crate) fn active(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn reserved(&self) -> u64 {
        self.reserved
    }

    pub(crate) fn released(&self) -> u64 {
        self.released
    }
}
