//! Speak the poll/vote protocol over a single connection.
//!
//! A [Client] owns the sending half of a connection. [Client::connect] spawns a receive loop on the
//! other half which records every response in a [Correlator], answers pings, and forwards
//! handshake and pong frames back to the client. The client itself is driven sequentially: send a
//! poll, then wait for the response that answers it.

use crate::{
    correlator::{Correlator, Observed},
    transport::{Receiver, Sender},
    types::Hash,
    wire::{Message, Poll, MAX_INVENTORY},
    Error,
};
use avalanche_codec::{Decode, Encode, RangeCfg};
use futures::{channel::mpsc, StreamExt};
use std::time::Duration;
use tokio::{task::JoinHandle, time};
use tracing::{debug, warn};

/// Configuration for a [Client].
#[derive(Clone, Debug)]
pub struct Config {
    /// Protocol version advertised in the handshake.
    pub protocol_version: u32,

    /// Maximum time to wait for the peer to acknowledge the handshake.
    pub handshake_timeout: Duration,

    /// Maximum time to wait for a pong.
    pub ping_timeout: Duration,

    /// Maximum number of items in a poll (and votes accepted in a response).
    pub max_inventory: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol_version: 1,
            handshake_timeout: Duration::from_secs(10),
            ping_timeout: Duration::from_secs(10),
            max_inventory: MAX_INVENTORY,
        }
    }
}

/// Connection state of a [Client].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Handshaking,
    Ready,
}

/// Frames the receive loop hands back to the client.
#[derive(Debug)]
enum Control {
    Verack,
    Pong(u64),
}

/// A fake peer connected to the node under test.
pub struct Client<S: Sender> {
    cfg: Config,
    sender: S,
    state: State,
    correlator: Correlator,
    control: Option<mpsc::UnboundedReceiver<Control>>,
    handle: Option<JoinHandle<()>>,

    next_round: u64,
    next_nonce: u64,
    outstanding: Option<Poll>,
    consumed: Option<Observed>,
}

impl<S: Sender> Client<S> {
    pub fn new(cfg: Config, sender: S) -> Self {
        Self {
            cfg,
            sender,
            state: State::Disconnected,
            correlator: Correlator::new(),
            control: None,
            handle: None,
            next_round: 1,
            next_nonce: 1,
            outstanding: None,
            consumed: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Starts receiving on `receiver` and performs the handshake.
    pub async fn connect<R: Receiver>(&mut self, receiver: R) -> Result<(), Error> {
        if self.state != State::Disconnected {
            return Err(Error::NotReady(self.state));
        }
        self.state = State::Handshaking;
        let (control_tx, control_rx) = mpsc::unbounded();
        self.control = Some(control_rx);
        self.handle = Some(tokio::spawn(receive(
            self.sender.clone(),
            receiver,
            (..=self.cfg.max_inventory).into(),
            self.correlator.clone(),
            control_tx,
        )));

        let nonce = rand::random();
        self.send(Message::Version {
            protocol: self.cfg.protocol_version,
            nonce,
        })
        .await?;
        let timeout = self.cfg.handshake_timeout;
        self.recv_control(timeout, |control| matches!(control, Control::Verack))
            .await?;
        self.state = State::Ready;
        debug!(protocol = self.cfg.protocol_version, "handshake complete");
        Ok(())
    }

    /// Sends a poll for `ids` (in order) and remembers it as the outstanding poll.
    pub async fn send_poll(&mut self, ids: &[Hash]) -> Result<Poll, Error> {
        if self.state != State::Ready {
            return Err(Error::NotReady(self.state));
        }
        if ids.is_empty() {
            return Err(Error::EmptyPoll);
        }
        if ids.len() > self.cfg.max_inventory {
            return Err(Error::ProtocolViolation(format!(
                "poll of {} items exceeds limit of {}",
                ids.len(),
                self.cfg.max_inventory
            )));
        }
        let poll = Poll::new(self.next_round, ids);
        self.next_round += 1;
        self.outstanding = Some(poll.clone());
        self.send(Message::Poll(poll.clone())).await?;
        debug!(round = poll.round(), count = ids.len(), "sent poll");
        Ok(poll)
    }

    /// Returns the most recently delivered response, if any.
    pub fn latest_response(&self) -> Option<Observed> {
        self.correlator.latest()
    }

    /// Round-trips a ping, so every frame the peer sent before the pong has been processed.
    pub async fn sync_with_ping(&mut self) -> Result<(), Error> {
        if self.state != State::Ready {
            return Err(Error::NotReady(self.state));
        }
        let nonce = self.next_nonce;
        self.next_nonce += 1;
        self.send(Message::Ping(nonce)).await?;
        let timeout = self.cfg.ping_timeout;
        self.recv_control(timeout, |control| matches!(control, Control::Pong(n) if *n == nonce))
            .await
    }

    /// Waits for a response newer than the last one returned and checks that it answers the
    /// outstanding poll.
    pub async fn wait_for_response(&mut self, timeout: Duration) -> Result<Observed, Error> {
        self.sync_with_ping().await?;
        let observed = self
            .correlator
            .await_new(self.consumed.as_ref(), timeout)
            .await?;
        self.consumed = Some(observed.clone());
        let poll = self.outstanding.take().ok_or_else(|| {
            Error::ProtocolViolation(format!(
                "unsolicited response for round {}",
                observed.response.round()
            ))
        })?;
        poll.check(&observed.response)?;
        debug!(
            round = poll.round(),
            sequence = observed.sequence(),
            "received response"
        );
        Ok(observed)
    }

    async fn send(&mut self, message: Message) -> Result<(), Error> {
        if let Err(err) = self.sender.send(message.encode().freeze()).await {
            debug!(?err, "failed to send");
            self.state = State::Disconnected;
            return Err(Error::Closed);
        }
        Ok(())
    }

    async fn recv_control(
        &mut self,
        timeout: Duration,
        expected: impl Fn(&Control) -> bool,
    ) -> Result<(), Error> {
        let Some(control) = self.control.as_mut() else {
            return Err(Error::NotReady(self.state));
        };
        let wait = async {
            while let Some(next) = control.next().await {
                if expected(&next) {
                    return Ok(());
                }
                debug!(?next, "skipping control frame");
            }
            Err(Error::Closed)
        };
        let result = time::timeout(timeout, wait)
            .await
            .map_err(|_| Error::Timeout(timeout))
            .and_then(|result| result);
        if matches!(result, Err(Error::Closed)) {
            self.state = State::Disconnected;
        }
        result
    }
}

impl<S: Sender> Drop for Client<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Processes inbound frames until the connection closes or the peer misbehaves.
async fn receive<S: Sender, R: Receiver>(
    mut sender: S,
    mut receiver: R,
    range: RangeCfg,
    correlator: Correlator,
    control: mpsc::UnboundedSender<Control>,
) {
    loop {
        let frame = match receiver.recv().await {
            Ok(frame) => frame,
            Err(err) => {
                debug!(?err, "connection closed");
                return;
            }
        };
        let message = match Message::decode_cfg(frame, &range) {
            Ok(message) => message,
            Err(err) => {
                warn!(?err, "received malformed frame");
                return;
            }
        };
        let forwarded = match message {
            Message::Response(response) => {
                correlator.record(response);
                continue;
            }
            Message::Ping(nonce) => {
                if sender.send(Message::Pong(nonce).encode().freeze()).await.is_err() {
                    return;
                }
                continue;
            }
            Message::Verack => Control::Verack,
            Message::Pong(nonce) => Control::Pong(nonce),
            other => {
                warn!(kind = other.kind(), "ignoring unexpected frame");
                continue;
            }
        };
        if control.unbounded_send(forwarded).is_err() {
            return;
        }
    }
}
