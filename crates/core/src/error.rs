use std::fmt;

/// Failure modes of window/buffer operations.
///
/// These never terminate a loop; every call site either logs and moves on
/// or treats the error as "nothing to do".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowError {
    /// `push` was attempted while the buffer is already at capacity.
    Full,
    /// `resize` was asked for a size larger than the window's capacity.
    CapacityExceeded,
    /// `update_timestamp` found no buffered packet with the given timestamp.
    NoMatch,
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Full => "window buffer is full",
            Self::CapacityExceeded => "requested size exceeds window capacity",
            Self::NoMatch => "no buffered packet matches the given timestamp",
        };

        f.write_str(msg)
    }
}

impl std::error::Error for WindowError {}
