//! Deliver whole protocol frames over a reliable, ordered connection.
//!
//! The harness never frames bytes itself: a [Sender] accepts one encoded frame at a time and the
//! matching [Receiver] yields exactly that frame. [memory] provides an in-process implementation.

use bytes::Bytes;
use std::{error::Error as StdError, fmt::Debug, future::Future};

pub mod memory;

/// Sends frames to the remote end of a connection.
pub trait Sender: Clone + Debug + Send + 'static {
    /// Error that can occur when sending a frame.
    type Error: Debug + StdError + Send + Sync;

    /// Send a single frame.
    fn send(&mut self, frame: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Receives frames from the remote end of a connection.
pub trait Receiver: Debug + Send + 'static {
    /// Error that can occur when receiving a frame.
    type Error: Debug + StdError + Send + Sync;

    /// Receive the next frame, failing once the remote end has gone away.
    fn recv(&mut self) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}
