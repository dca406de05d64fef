use codec::Packet;

use crate::error::WindowError;

/// A capacity-bounded store of in-flight packets.
///
/// `Buffer` has no notion of sequence-number ordering or wraparound; that
/// lives in [`crate::window::Window`], which is the only caller of this
/// type. `Buffer` just answers "is a packet matching X present" and
/// "which buffered packet has the smallest key" queries.
pub struct Buffer {
    capacity: usize,
    slots: Vec<Packet>,
}

impl Buffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn insert(&mut self, pkt: Packet) -> Result<(), WindowError> {
        if self.is_full() {
            return Err(WindowError::Full);
        }

        self.slots.push(pkt);
        Ok(())
    }

    pub fn find_by_seqnum(&self, seqnum: u8) -> Option<&Packet> {
        self.slots.iter().find(|p| p.seqnum() == seqnum)
    }

    pub fn find_by_seqnum_mut(&mut self, seqnum: u8) -> Option<&mut Packet> {
        self.slots.iter_mut().find(|p| p.seqnum() == seqnum)
    }

    pub fn find_by_timestamp(&self, timestamp: u32) -> Option<&Packet> {
        self.slots.iter().find(|p| p.timestamp() == timestamp)
    }

    pub fn find_by_timestamp_mut(&mut self, timestamp: u32) -> Option<&mut Packet> {
        self.slots.iter_mut().find(|p| p.timestamp() == timestamp)
    }

    /// The buffered packet for which `key` is smallest, if any.
    pub fn find_min_by_key<F: Fn(&Packet) -> u32>(&self, key: F) -> Option<&Packet> {
        self.slots.iter().min_by_key(|p| key(p))
    }

    pub fn remove_by_seqnum(&mut self, seqnum: u8) -> Option<Packet> {
        let idx = self.slots.iter().position(|p| p.seqnum() == seqnum)?;
        Some(self.slots.remove(idx))
    }

    pub fn remove_by_timestamp(&mut self, timestamp: u32) -> Option<Packet> {
        let idx = self.slots.iter().position(|p| p.timestamp() == timestamp)?;
        Some(self.slots.remove(idx))
    }

    /// Removes and returns the buffered packet for which `key` is smallest.
    pub fn remove_min_by_key<F: Fn(&Packet) -> u32>(&mut self, key: F) -> Option<Packet> {
        let idx = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| key(p))
            .map(|(idx, _)| idx)?;
        Some(self.slots.remove(idx))
    }
}
