//! ## Wire codec for the reliable file-transfer protocol
//!
//! A datagram is exactly one packet: a fixed 12-byte header, an optional
//! payload of at most 512 bytes, and an optional trailing CRC32 over that
//! payload. The header itself is protected by its own CRC32, computed with
//! the truncation bit forced to zero so that a transport flipping that bit
//! to signal a dropped payload does not also invalidate the header.
//!
//! This crate only knows about bytes on the wire; it has no notion of
//! sockets, windows or retransmission. See the `engine` crate for those.

mod clock;
mod error;
mod packet;

pub use clock::Clock;
pub use error::Error;
pub use packet::{Packet, PacketType, MAX_PAYLOAD_SIZE, MAX_SEQ, MAX_WINDOW_SIZE};
