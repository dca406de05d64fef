use codec::Packet;
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;

use crate::window::Window;

const MAX_SEQ: u32 = 255;

/// Result of handing one received packet to [`ReceiverState::handle`].
struct Delivery {
    bytes: Vec<u8>,
    response: Option<Packet>,
    flush: bool,
}

impl Delivery {
    fn discard() -> Self {
        Self {
            bytes: Vec::new(),
            response: None,
            flush: false,
        }
    }
}

/// Receiver-side protocol state: the reassembly window plus the logic
/// to decide what to deliver and what to acknowledge.
pub struct ReceiverState {
    window: Window,
    eof_delivered: bool,
}

impl ReceiverState {
    pub fn new(capacity: u32) -> Self {
        Self {
            window: Window::new(capacity, capacity, MAX_SEQ),
            eof_delivered: false,
        }
    }

    /// Whether the terminating empty DATA packet has been delivered and
    /// every buffered packet has been drained.
    pub fn is_done(&self) -> bool {
        self.eof_delivered && self.window.empty()
    }

    /// Processes one decoded packet, returning any newly in-order bytes
    /// to deliver and any response packet to send back.
    fn handle(&mut self, pkt: Packet) -> Delivery {
        let seqnum = pkt.seqnum();
        let timestamp = pkt.timestamp();

        if !self.window.has(seqnum as u32) {
            return Delivery::discard();
        }

        if pkt.tr() {
            let response = Packet::nack(seqnum, self.window.available() as u8, timestamp)
                .expect("advertised window always fits in 5 bits");
            return Delivery {
                bytes: Vec::new(),
                response: Some(response),
                flush: false,
            };
        }

        if self.window.find_seqnum(seqnum).is_some() {
            // Duplicate of a packet already buffered awaiting its turn;
            // do not insert again, but still fall through to re-ack.
        } else if self.window.push(pkt).is_err() {
            // Defensive: since `size` always equals `capacity` here and
            // `has()` already gated on window membership, every in-window,
            // non-duplicate seqnum corresponds to a still-open buffer slot,
            // so this branch should not be reachable in practice.
            log::warn!("receive window full, dropping seqnum {seqnum}");
            return Delivery::discard();
        }

        let mut bytes = Vec::new();
        while let Some(next) = self.window.find_seqnum(self.window.start() as u8) {
            let is_eof = next.length() == 0;
            let delivered = self
                .window
                .pop_seqnum(self.window.start() as u8)
                .expect("just matched by find_seqnum");
            bytes.extend_from_slice(delivered.payload().unwrap_or(&[]));

            if is_eof {
                self.eof_delivered = true;
                break;
            }
            self.window.slide();
        }

        let response = Packet::ack(self.window.start() as u8, self.window.available() as u8, timestamp)
            .expect("advertised window always fits in 5 bits");

        Delivery {
            bytes,
            response: Some(response),
            flush: true,
        }
    }
}

/// Waits for the first datagram from any sender on `socket` (which must
/// be unconnected) and connects it to that peer, completing the
/// implicit handshake. Returns the peer's address.
pub async fn accept(socket: &UdpSocket) -> anyhow::Result<std::net::SocketAddr> {
    let mut probe = [0u8; 1];
    let (_, peer) = socket.peek_from(&mut probe).await?;
    socket.connect(peer).await?;
    log::info!("handshake complete with {peer}");
    Ok(peer)
}

/// Drives the receiver's control loop, writing delivered bytes to
/// `output` until the terminating empty DATA packet has been received
/// and acknowledged. `socket` must already be connected to the sender.
pub async fn run<W>(socket: &UdpSocket, mut output: W, capacity: u32) -> anyhow::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut state = ReceiverState::new(capacity);
    let mut buf = vec![0u8; 600];

    loop {
        let n = socket.recv(&mut buf).await?;
        log::trace!("udp socket receive: size={n}");

        let pkt = match Packet::decode(&buf[..n]) {
            Ok(pkt) => pkt,
            Err(e) => {
                log::warn!("receiver failed to decode datagram: {e}");
                continue;
            }
        };

        log::trace!("seqnum={} tr={} length={}", pkt.seqnum(), pkt.tr(), pkt.length());
        let delivery = state.handle(pkt);

        if delivery.flush {
            if !delivery.bytes.is_empty() {
                output.write_all(&delivery.bytes).await?;
            }
            output.flush().await?;
        }

        if let Some(response) = delivery.response {
            let mut out_buf = [0u8; 600];
            let written = response.encode(&mut out_buf).expect("buffer large enough for any packet");
            log::trace!("udp socket send: size={written}");
            socket.send(&out_buf[..written]).await?;
        }

        if state.is_done() {
            log::info!("eof delivered, closing output");
            return Ok(());
        }
    }
}
