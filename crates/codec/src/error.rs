use std::fmt;

/// Failure modes of [`crate::Packet::decode`] and [`crate::Packet::encode`].
///
/// All of these are local to a single packet: a decoder failure means the
/// offending datagram is dropped by the caller, never that the process
/// should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Fewer than 12 bytes were given to `decode`.
    NoHeader,
    /// The `type` field is zero or not one of DATA/ACK/NACK.
    BadType,
    /// `tr = 1` was set on a non-DATA packet.
    BadTr,
    /// The declared payload length exceeds `MAX_PAYLOAD_SIZE`.
    BadLength,
    /// The declared window exceeds `MAX_WINDOW_SIZE`.
    BadWindow,
    /// `crc1` or `crc2` did not match the recomputed value.
    BadCrc,
    /// The slice length does not match the size implied by the header.
    Inconsistent,
    /// The destination buffer passed to `encode` is too small.
    NoMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoHeader => "packet shorter than the fixed header",
            Self::BadType => "unknown or zero packet type",
            Self::BadTr => "tr bit set on a non-DATA packet",
            Self::BadLength => "payload length exceeds the maximum",
            Self::BadWindow => "window value exceeds the maximum",
            Self::BadCrc => "crc mismatch",
            Self::Inconsistent => "declared length disagrees with the datagram size",
            Self::NoMemory => "destination buffer too small",
        };

        f.write_str(msg)
    }
}

impl std::error::Error for Error {}
