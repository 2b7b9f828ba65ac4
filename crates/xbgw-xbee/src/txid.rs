//! Transmission ID allocation
//!
//! Every outbound frame that expects a status frame carries a transmission
//! id in `1..=max_id`. The table maps each outstanding id to whatever the
//! caller needs to finish the command when the status arrives. Id 0 is
//! reserved for "no status requested" and is never issued.
//!
//! Ids are handed out round-robin starting after the last issued id, so a
//! just-released id is not immediately reused.

use parking_lot::Mutex;
use thiserror::Error;

pub const DEFAULT_MAX_TRANSMISSION_ID: u8 = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxIdError {
    #[error("All {0} transmission ids are in use")]
    CapacityExhausted(u8),

    #[error("Transmission id {id} is outside 1..={max}")]
    InvalidId { id: u8, max: u8 },
}

struct Slots<H> {
    slots: Vec<Option<H>>,
    cursor: usize,
}

/// Fixed-size table of outstanding transmissions
pub struct TransmissionSlotTable<H> {
    max_id: u8,
    inner: Mutex<Slots<H>>,
}

impl<H> TransmissionSlotTable<H> {
    /// A table issuing ids `1..=max_id`. A `max_id` of 0 is raised to 1.
    pub fn new(max_id: u8) -> Self {
        let max_id = max_id.max(1);
        let mut slots = Vec::with_capacity(max_id as usize + 1);
        slots.resize_with(max_id as usize + 1, || None);
        Self {
            max_id,
            inner: Mutex::new(Slots { slots, cursor: 1 }),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MAX_TRANSMISSION_ID)
    }

    pub fn max_id(&self) -> u8 {
        self.max_id
    }

    /// Store `handler` in the next free slot and return its id
    pub fn allocate(&self, handler: H) -> Result<u8, TxIdError> {
        let max = self.max_id as usize;
        let mut inner = self.inner.lock();

        let start = inner.cursor;
        let free = (0..max)
            .map(|offset| (start - 1 + offset) % max + 1)
            .find(|&id| inner.slots[id].is_none());

        match free {
            Some(id) => {
                inner.slots[id] = Some(handler);
                inner.cursor = id % max + 1;
                Ok(id as u8)
            }
            None => Err(TxIdError::CapacityExhausted(self.max_id)),
        }
    }

    /// Free a slot without running its handler
    pub fn release(&self, id: u8) -> Result<(), TxIdError> {
        self.take(id).map(|_| ())
    }

    /// Whether `id` currently holds a handler
    pub fn peek(&self, id: u8) -> Result<bool, TxIdError> {
        self.check(id)?;
        Ok(self.inner.lock().slots[id as usize].is_some())
    }

    /// Remove and return the handler for `id`, if any
    pub fn take(&self, id: u8) -> Result<Option<H>, TxIdError> {
        self.check(id)?;
        Ok(self.inner.lock().slots[id as usize].take())
    }

    /// Drop every handler for which `abandoned` returns true.
    /// Returns the number of slots freed.
    pub fn reclaim<F>(&self, mut abandoned: F) -> usize
    where
        F: FnMut(&H) -> bool,
    {
        let mut inner = self.inner.lock();
        let mut freed = 0;
        for slot in inner.slots.iter_mut().skip(1) {
            if slot.as_ref().is_some_and(&mut abandoned) {
                *slot = None;
                freed += 1;
            }
        }
        freed
    }

    /// Number of occupied slots
    pub fn outstanding(&self) -> usize {
        self.inner.lock().slots.iter().filter(|s| s.is_some()).count()
    }

    fn check(&self, id: u8) -> Result<(), TxIdError> {
        if id == 0 || id > self.max_id {
            return Err(TxIdError::InvalidId {
                id,
                max: self.max_id,
            });
        }
        Ok(())
    }
}

impl<H> Default for TransmissionSlotTable<H> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
