//! In-memory duplex connection backed by bounded channels.

use bytes::Bytes;
use futures::{channel::mpsc, SinkExt, StreamExt};
use thiserror::Error;

/// Errors that can occur on an in-memory connection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("connection closed")]
    Closed,
}

/// Sending half of one direction of a connection.
#[derive(Clone, Debug)]
pub struct Sender {
    inner: mpsc::Sender<Bytes>,
}

impl super::Sender for Sender {
    type Error = Error;

    async fn send(&mut self, frame: Bytes) -> Result<(), Error> {
        self.inner.send(frame).await.map_err(|_| Error::Closed)
    }
}

/// Receiving half of one direction of a connection.
#[derive(Debug)]
pub struct Receiver {
    inner: mpsc::Receiver<Bytes>,
}

impl super::Receiver for Receiver {
    type Error = Error;

    async fn recv(&mut self) -> Result<Bytes, Error> {
        self.inner.next().await.ok_or(Error::Closed)
    }
}

/// One end of a duplex connection.
pub type Endpoint = (Sender, Receiver);

/// Creates a connected pair of endpoints, each direction buffering up to `capacity` frames.
pub fn channel(capacity: usize) -> (Endpoint, Endpoint) {
    let (a_sender, b_receiver) = mpsc::channel(capacity);
    let (b_sender, a_receiver) = mpsc::channel(capacity);
    (
        (
            Sender { inner: a_sender },
            Receiver { inner: a_receiver },
        ),
        (
            Sender { inner: b_sender },
            Receiver { inner: b_receiver },
        ),
    )
}
