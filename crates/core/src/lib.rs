//! ## Control loops for the reliable file-transfer protocol
//!
//! This crate turns the wire-level [`codec`] into the two halves of the
//! protocol: a sender that streams a file as a sequence of windowed,
//! retransmitted DATA packets, and a receiver that reassembles them in
//! order and acknowledges what it has. Neither half knows anything about
//! command-line arguments or process setup; see the `rft` binaries for
//! that.

mod buffer;
mod error;
mod receiver;
mod sender;
mod window;

pub use error::WindowError;
pub use receiver::{accept, run as run_receiver, ReceiverState};
pub use sender::{run as run_sender, SenderState, DEFAULT_TIMER_MICROS};
pub use window::Window;
