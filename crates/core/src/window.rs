use codec::Packet;

use crate::buffer::Buffer;
use crate::error::WindowError;

/// A sliding window of outstanding packets, indexed both by sequence
/// number (for membership and cumulative-ACK bookkeeping) and by
/// retransmission timestamp.
///
/// Sequence numbers live in `0..=max_seq` and wrap modulo `max_seq + 1`.
/// All "which sequence number is smaller" comparisons are done relative
/// to `start`, not by raw numeric value, so that wraparound near
/// `max_seq` never misclassifies a packet as outside the window.
pub struct Window {
    capacity: u32,
    size: u32,
    start: u32,
    max_seq: u32,
    buffer: Buffer,
}

impl Window {
    pub fn new(capacity: u32, size: u32, max_seq: u32) -> Self {
        Self::with_start(capacity, size, 0, max_seq)
    }

    pub fn with_start(capacity: u32, size: u32, start: u32, max_seq: u32) -> Self {
        Self {
            capacity,
            size: size.min(capacity),
            start,
            max_seq,
            buffer: Buffer::new(capacity as usize),
        }
    }

    fn modulus(&self) -> u32 {
        self.max_seq + 1
    }

    /// Distance `seq` is ahead of `start`, modulo the sequence space.
    fn distance(&self, seq: u32) -> u32 {
        (seq + self.modulus() - self.start) % self.modulus()
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        if self.size == 0 {
            self.start
        } else {
            (self.start + self.size - 1) % self.modulus()
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether `seq` falls within `[start, start + size)` modulo the
    /// sequence space. Always false once `size` is 0.
    pub fn has(&self, seq: u32) -> bool {
        self.size != 0 && self.distance(seq) < self.size
    }

    pub fn slide(&mut self) {
        self.start = (self.start + 1) % self.modulus();
    }

    pub fn slide_to(&mut self, pos: u32) {
        self.start = pos % self.modulus();
    }

    pub fn resize(&mut self, n: u32) -> Result<(), WindowError> {
        if n > self.capacity {
            return Err(WindowError::CapacityExceeded);
        }

        self.size = n;
        Ok(())
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn full(&self) -> bool {
        self.buffer.len() as u32 >= self.size
    }

    /// Slots still free to fill, bounded by both advertised size and
    /// physical capacity.
    pub fn available(&self) -> u32 {
        let cap = (self.capacity as usize).saturating_sub(self.buffer.len()) as u32;
        self.size.saturating_sub(self.buffer.len() as u32).min(cap)
    }

    pub fn push(&mut self, pkt: Packet) -> Result<(), WindowError> {
        if self.full() {
            return Err(WindowError::Full);
        }

        self.buffer.insert(pkt)
    }

    pub fn find_seqnum(&self, seqnum: u8) -> Option<&Packet> {
        self.buffer.find_by_seqnum(seqnum)
    }

    pub fn find_seqnum_mut(&mut self, seqnum: u8) -> Option<&mut Packet> {
        self.buffer.find_by_seqnum_mut(seqnum)
    }

    pub fn find_timestamp(&self, timestamp: u32) -> Option<&Packet> {
        self.buffer.find_by_timestamp(timestamp)
    }

    pub fn find_min_timestamp(&self) -> Option<&Packet> {
        self.buffer.find_min_by_key(|p| p.timestamp())
    }

    /// The buffered packet whose sequence number is closest behind
    /// `start`, accounting for wraparound. Used by the sender to find
    /// the next unacknowledged packet.
    pub fn find_min_seqnum(&self) -> Option<&Packet> {
        let start = self.start;
        let modulus = self.modulus();
        self.buffer
            .find_min_by_key(move |p| (p.seqnum() as u32 + modulus - start) % modulus)
    }

    pub fn pop_seqnum(&mut self, seqnum: u8) -> Option<Packet> {
        self.buffer.remove_by_seqnum(seqnum)
    }

    pub fn pop_timestamp(&mut self, timestamp: u32) -> Option<Packet> {
        self.buffer.remove_by_timestamp(timestamp)
    }

    pub fn pop_min_seqnum(&mut self) -> Option<Packet> {
        let start = self.start;
        let modulus = self.modulus();
        self.buffer
            .remove_min_by_key(move |p| (p.seqnum() as u32 + modulus - start) % modulus)
    }

    pub fn pop_min_timestamp(&mut self) -> Option<Packet> {
        self.buffer.remove_min_by_key(|p| p.timestamp())
    }

    pub fn update_timestamp(&mut self, old: u32, new: u32) -> Result<(), WindowError> {
        match self.buffer.find_by_timestamp_mut(old) {
            Some(pkt) => {
                pkt.set_timestamp(new);
                Ok(())
            }
            None => Err(WindowError::NoMatch),
        }
    }

    /// Whether `seq` sits strictly before `relative_to` in the sequence
    /// space, measured as distance ahead of `start`. Used by the sender
    /// to decide which buffered packets a cumulative ACK clears.
    pub fn seq_is_before(&self, seq: u8, relative_to: u8) -> bool {
        self.distance(seq as u32) < self.distance(relative_to as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound_membership_matches_spec_example() {
        // capacity=4, size=2, start=0, max_seq=3 (sequence space 0..=3)
        let w = Window::new(4, 2, 3);
        assert!(w.has(0));
        assert!(w.has(1));
        assert!(!w.has(2));
        assert!(!w.has(3));
    }

    #[test]
    fn wraparound_membership_after_sliding_past_the_top() {
        let mut w = Window::new(4, 2, 3);
        w.slide_to(3);
        // window now covers {3, 0} modulo 4
        assert!(w.has(3));
        assert!(w.has(0));
        assert!(!w.has(1));
        assert!(!w.has(2));
    }

    #[test]
    fn empty_window_has_nothing() {
        let mut w = Window::new(4, 2, 3);
        w.resize(0).unwrap();
        assert!(!w.has(0));
    }

    #[test]
    fn resize_rejects_values_above_capacity() {
        let mut w = Window::new(4, 2, 255);
        assert_eq!(w.resize(5), Err(WindowError::CapacityExceeded));
        assert!(w.resize(4).is_ok());
    }

    #[test]
    fn resize_below_buffered_count_still_reports_full() {
        // Matches the spec's own worked example: push while size=1, then
        // resize(0); the buffered packet survives and full() stays true.
        let mut w = Window::new(31, 1, 255);
        w.push(Packet::data(0, 0, 0, Vec::new()).unwrap()).unwrap();

        w.resize(0).unwrap();

        assert_eq!(w.buffer_size(), 1);
        assert!(w.full());
        assert_eq!(w.available(), 0);
    }

    #[test]
    fn find_min_seqnum_accounts_for_wraparound_from_start() {
        let mut w = Window::new(8, 8, 255);
        w.slide_to(250);
        for seq in [252u8, 250, 1, 251] {
            w.push(Packet::data(seq, 0, seq as u32, Vec::new()).unwrap()).unwrap();
        }
        // distances from start=250: 252->2, 250->0, 1->7, 251->1
        assert_eq!(w.find_min_seqnum().unwrap().seqnum(), 250);
    }

    #[test]
    fn pop_min_seqnum_removes_the_closest_to_start() {
        let mut w = Window::new(4, 4, 255);
        w.push(Packet::data(5, 0, 0, Vec::new()).unwrap()).unwrap();
        w.push(Packet::data(3, 0, 1, Vec::new()).unwrap()).unwrap();
        w.slide_to(3);
        let popped = w.pop_min_seqnum().unwrap();
        assert_eq!(popped.seqnum(), 3);
        assert_eq!(w.buffer_size(), 1);
    }

    #[test]
    fn pop_min_timestamp_removes_the_earliest_deadline() {
        let mut w = Window::new(4, 4, 255);
        w.push(Packet::data(0, 0, 50, Vec::new()).unwrap()).unwrap();
        w.push(Packet::data(1, 0, 20, Vec::new()).unwrap()).unwrap();
        w.push(Packet::data(2, 0, 80, Vec::new()).unwrap()).unwrap();

        let popped = w.pop_min_timestamp().unwrap();
        assert_eq!(popped.timestamp(), 20);
        assert_eq!(w.buffer_size(), 2);
    }

    #[test]
    fn seq_is_before_respects_start_relative_ordering() {
        let mut w: Window = Window::new(8, 8, 255);
        w.slide_to(254);
        assert!(w.seq_is_before(254, 1));
        assert!(!w.seq_is_before(1, 254));
    }
}
