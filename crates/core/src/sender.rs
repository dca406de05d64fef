use std::time::Duration;

use codec::{Clock, Packet, PacketType, MAX_PAYLOAD_SIZE};
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;

use crate::window::Window;

/// Retransmission timeout, in microseconds.
pub const DEFAULT_TIMER_MICROS: u32 = 4_500_000;

const MAX_SEQ: u32 = 255;
const INITIAL_WINDOW_SIZE: u32 = 1;

/// How long the sender's main loop should wait before it has anything
/// new to do.
enum Wait {
    Forever,
    For(Duration),
}

/// Sender-side protocol state: the outstanding-packet window plus the
/// bookkeeping needed to decide what to send or retransmit next.
///
/// This holds no socket or file handle, so its ACK/NACK/retransmission
/// logic can be exercised without any I/O.
pub struct SenderState {
    window: Window,
    clock: Clock,
    next_seqnum: u8,
    sent_eof: bool,
    timer: u32,
}

impl SenderState {
    pub fn new(capacity: u32, timer_micros: u32) -> Self {
        Self {
            window: Window::new(capacity, INITIAL_WINDOW_SIZE.min(capacity), MAX_SEQ),
            clock: Clock::default(),
            next_seqnum: 0,
            sent_eof: false,
            timer: timer_micros,
        }
    }

    pub fn is_done(&self) -> bool {
        self.sent_eof && self.window.empty()
    }

    pub fn can_send_new(&self) -> bool {
        !self.window.full() && !self.sent_eof
    }

    /// Builds the next DATA packet to send, from `payload`. `is_eof`
    /// marks this as the terminating empty packet.
    fn prepare(&mut self, payload: Vec<u8>, is_eof: bool) -> Packet {
        let now = self.clock.now();
        let deadline = now.wrapping_add(self.timer);
        let seqnum = self.next_seqnum;
        self.next_seqnum = self.next_seqnum.wrapping_add(1);
        if is_eof {
            self.sent_eof = true;
            log::info!("eof observed on input, sending terminating empty packet");
        }

        Packet::data(seqnum, 0, deadline, payload).expect("payload bounded by caller's read size")
    }

    /// Reads one chunk from `input`, builds and buffers the resulting
    /// DATA packet, and returns its wire encoding to send. Returns
    /// `None` only if the caller should not have invoked this (checked
    /// via [`SenderState::can_send_new`] beforehand).
    pub async fn read_and_buffer_next<R>(&mut self, input: &mut R) -> anyhow::Result<Vec<u8>>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; MAX_PAYLOAD_SIZE];
        let n = input.read(&mut chunk).await?;
        chunk.truncate(n);
        let pkt = self.prepare(chunk, n == 0);

        let mut buf = [0u8; 600];
        let written = pkt.encode(&mut buf).expect("buffer large enough for any packet");
        self.window.push(pkt).expect("caller checked can_send_new");

        Ok(buf[..written].to_vec())
    }

    /// Applies a cumulative ACK: every buffered packet strictly before
    /// `seqnum` (relative to the window start) is cleared, then the
    /// window slides up to `seqnum`. If none of the cleared packets carried
    /// the ACK's echoed timestamp, it is a selective ack for an
    /// out-of-sequence packet the receiver buffered but hasn't delivered
    /// yet; that packet is located and cleared by timestamp instead.
    pub fn handle_ack(&mut self, seqnum: u8, timestamp: u32) {
        let mut matched = false;
        while let Some(candidate) = self.window.find_min_seqnum().map(Packet::seqnum) {
            if !self.window.seq_is_before(candidate, seqnum) {
                break;
            }
            if let Some(pkt) = self.window.pop_min_seqnum() {
                matched |= pkt.timestamp() == timestamp;
            }
        }

        self.window.slide_to(seqnum as u32);

        if !matched {
            self.window.pop_timestamp(timestamp);
        }
    }

    /// Forces an immediate retransmission of `seqnum` by moving its
    /// deadline to now. A NACK for a sequence number no longer in the
    /// window (already acknowledged) is ignored.
    pub fn handle_nack(&mut self, seqnum: u8) {
        if !self.window.has(seqnum as u32) {
            return;
        }

        let now = self.clock.now();
        if let Some(pkt) = self.window.find_seqnum_mut(seqnum) {
            pkt.set_timestamp(now);
        }
    }

    /// Shrinks the advertised window to the peer's flow-control limit.
    pub fn apply_peer_window(&mut self, peer_window: u8) {
        let capacity = self.window.capacity();
        self.window
            .resize(capacity.min(peer_window as u32))
            .expect("resizing to at most capacity cannot fail");
    }

    /// Sweeps the window for packets past their retransmission
    /// deadline, rescheduling each and returning its wire encoding.
    pub fn due_retransmissions(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();

        loop {
            let now = self.clock.now();
            let due = match self.window.find_min_timestamp() {
                Some(pkt) if pkt.timestamp() <= now => pkt.timestamp(),
                _ => break,
            };

            let deadline = now.wrapping_add(self.timer);
            self.window
                .update_timestamp(due, deadline)
                .expect("timestamp was just observed on a buffered packet");

            let pkt = self
                .window
                .find_timestamp(deadline)
                .expect("packet was just rescheduled to this timestamp");

            let mut buf = [0u8; 600];
            let n = pkt.encode(&mut buf).expect("buffer large enough for any packet");
            frames.push(buf[..n].to_vec());
        }

        frames
    }

    fn wait(&mut self) -> Wait {
        if self.window.empty() {
            // sent_eof && empty is is_done(), so run()'s loop guard means
            // this arm is never actually reached; kept for callers outside
            // that loop.
            return if self.sent_eof { Wait::For(Duration::ZERO) } else { Wait::Forever };
        }

        if self.can_send_new() {
            return Wait::For(Duration::ZERO);
        }

        match self.window.find_min_timestamp() {
            Some(pkt) => {
                let now = self.clock.now();
                let remaining = pkt.timestamp().saturating_sub(now);
                Wait::For(Duration::from_micros(remaining as u64))
            }
            None => Wait::Forever,
        }
    }
}

/// Drives the sender's control loop until the file has been fully
/// transferred and acknowledged. `socket` must already be connected to
/// the receiver.
pub async fn run<R>(socket: &UdpSocket, mut input: R, capacity: u32, timer_micros: u32) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut state = SenderState::new(capacity, timer_micros);
    let mut recv_buf = vec![0u8; 600];

    while !state.is_done() {
        match state.wait() {
            Wait::Forever => {
                socket.readable().await?;
            }
            Wait::For(d) if !d.is_zero() => {
                tokio::select! {
                    _ = socket.readable() => {}
                    _ = tokio::time::sleep(d) => {}
                }
            }
            Wait::For(_) => {}
        }

        match socket.try_recv(&mut recv_buf) {
            Ok(n) => {
                log::trace!("udp socket receive: size={n}");
                match Packet::decode(&recv_buf[..n]) {
                    Ok(pkt) => match pkt.packet_type() {
                        PacketType::Data => {
                            log::warn!("sender received an unexpected DATA packet, ignoring");
                        }
                        PacketType::Ack => {
                            log::trace!("ack seqnum={} timestamp={}", pkt.seqnum(), pkt.timestamp());
                            state.handle_ack(pkt.seqnum(), pkt.timestamp());
                            state.apply_peer_window(pkt.window());
                        }
                        PacketType::Nack => {
                            log::trace!("nack seqnum={}", pkt.seqnum());
                            state.handle_nack(pkt.seqnum());
                            state.apply_peer_window(pkt.window());
                        }
                    },
                    Err(e) => log::warn!("sender failed to decode datagram: {e}"),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }

        for frame in state.due_retransmissions() {
            log::trace!("retransmit: size={}", frame.len());
            socket.send(&frame).await?;
        }

        if state.can_send_new() {
            let frame = state.read_and_buffer_next(&mut input).await?;
            log::trace!("udp socket send: size={}", frame.len());
            socket.send(&frame).await?;
        }
    }

    Ok(())
}
