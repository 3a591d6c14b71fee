//! An in-process node that answers polls over a [crate::transport] connection.

use super::chain::Index;
use crate::{
    transport::{Receiver, Sender},
    types::{Hash, Vote},
    verifier,
    wire::{Message, Poll, Response, SignedResponse, MAX_INVENTORY},
    Error,
};
use avalanche_codec::{Decode, Encode, RangeCfg};
use avalanche_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    hash, Signer as _,
};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, warn};

/// Status reported by calls made during warmup.
const WARMUP_STATUS: &str = "RPC server started";

/// How the node answers polls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Behavior {
    /// Answer every poll with one correctly signed vote per item.
    #[default]
    Honest,
    /// Omit the vote for the last polled item.
    TruncateVotes,
    /// Sign something other than the response.
    CorruptSignature,
    /// Never answer polls.
    Silent,
}

/// Configuration for a simulated [Node].
#[derive(Clone, Debug)]
pub struct Config {
    /// Key used to sign responses.
    pub signer: PrivateKey,

    /// Seed of the genesis block.
    pub seed: u64,

    /// Minimum milliseconds between polls from a peer, advertised in every response. Polls
    /// arriving earlier are ignored.
    pub cooldown: u32,

    /// Duration after creation during which every call fails with [Error::Warmup].
    pub warmup: Duration,

    /// Maximum number of items accepted in a poll.
    pub max_inventory: usize,

    pub behavior: Behavior,
}

impl Config {
    pub fn new(signer: PrivateKey) -> Self {
        Self {
            signer,
            seed: 0,
            cooldown: 0,
            warmup: Duration::ZERO,
            max_inventory: MAX_INVENTORY,
            behavior: Behavior::Honest,
        }
    }
}

/// A simulated node.
///
/// Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Node {
    cfg: Arc<Config>,
    ready_at: Instant,
    index: Arc<Mutex<Index>>,
}

impl Node {
    pub fn new(cfg: Config) -> Self {
        let index = Index::new(cfg.seed);
        Self {
            ready_at: Instant::now() + cfg.warmup,
            cfg: Arc::new(cfg),
            index: Arc::new(Mutex::new(index)),
        }
    }

    /// Serves a peer connection until either end closes it.
    pub fn attach<S: Sender, R: Receiver>(&self, sender: S, receiver: R) -> JoinHandle<()> {
        let node = self.clone();
        tokio::spawn(async move { node.serve(sender, receiver).await })
    }

    async fn serve<S: Sender, R: Receiver>(self, mut sender: S, mut receiver: R) {
        let range: RangeCfg = (..=self.cfg.max_inventory).into();
        let mut handshaken = false;
        let mut last_poll: Option<Instant> = None;
        loop {
            let frame = match receiver.recv().await {
                Ok(frame) => frame,
                Err(err) => {
                    debug!(?err, "peer disconnected");
                    return;
                }
            };
            let message = match Message::decode_cfg(frame, &range) {
                Ok(message) => message,
                Err(err) => {
                    warn!(?err, "disconnecting peer after malformed frame");
                    return;
                }
            };
            debug!(kind = message.kind(), "received");
            let reply = match message {
                Message::Version { protocol, .. } => {
                    debug!(protocol, "peer connected");
                    handshaken = true;
                    Some(Message::Verack)
                }
                Message::Ping(nonce) => Some(Message::Pong(nonce)),
                Message::Poll(poll) if handshaken => {
                    let now = Instant::now();
                    let cooldown = Duration::from_millis(self.cfg.cooldown.into());
                    if last_poll.is_some_and(|last| now < last + cooldown) {
                        warn!(round = poll.round(), "ignoring poll during cooldown");
                        None
                    } else {
                        last_poll = Some(now);
                        self.respond(&poll).map(Message::Response)
                    }
                }
                Message::Poll(poll) => {
                    warn!(round = poll.round(), "ignoring poll before handshake");
                    None
                }
                Message::Verack | Message::Pong(_) | Message::Response(_) => None,
            };
            let Some(reply) = reply else {
                continue;
            };
            if let Err(err) = sender.send(reply.encode().freeze()).await {
                debug!(?err, "peer disconnected");
                return;
            }
        }
    }

    fn respond(&self, poll: &Poll) -> Option<SignedResponse> {
        let mut votes: Vec<Vote> = {
            let index = self.lock();
            poll.ids().map(|id| Vote::new(index.vote(&id), id)).collect()
        };
        match self.cfg.behavior {
            Behavior::Honest => {}
            Behavior::TruncateVotes => {
                votes.pop();
            }
            Behavior::CorruptSignature => {
                let response = Response::new(poll.round(), self.cfg.cooldown, votes);
                let signature = verifier::sign(&self.cfg.signer, &hash(b"corrupt"));
                return Some(SignedResponse {
                    response,
                    signature,
                });
            }
            Behavior::Silent => return None,
        }
        let response = Response::new(poll.round(), self.cfg.cooldown, votes);
        Some(SignedResponse::sign(&self.cfg.signer, response))
    }

    fn lock(&self) -> MutexGuard<'_, Index> {
        // The index is never left inconsistent by a panicking holder
        self.index.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ready(&self) -> Result<(), Error> {
        if Instant::now() < self.ready_at {
            return Err(Error::Warmup(WARMUP_STATUS.into()));
        }
        Ok(())
    }

    fn rpc(&self) -> Result<MutexGuard<'_, Index>, Error> {
        self.ready()?;
        Ok(self.lock())
    }
}

impl crate::Node for Node {
    async fn generate(&self, count: u64, address: &str) -> Result<Vec<Hash>, Error> {
        let mut index = self.rpc()?;
        let mut blocks = Vec::new();
        for _ in 0..count {
            blocks.push(index.mine(address)?);
        }
        debug!(count, tip = %index.tip(), "generated blocks");
        Ok(blocks)
    }

    async fn block_hash(&self, height: u64) -> Result<Hash, Error> {
        self.rpc()?.hash_at(height)
    }

    async fn best_block_hash(&self) -> Result<Hash, Error> {
        Ok(self.rpc()?.tip())
    }

    async fn invalidate_block(&self, hash: Hash) -> Result<(), Error> {
        self.rpc()?.invalidate(&hash)
    }

    async fn reconsider_block(&self, hash: Hash) -> Result<(), Error> {
        self.rpc()?.reconsider(&hash)
    }

    async fn avalanche_key(&self) -> Result<PublicKey, Error> {
        self.ready()?;
        Ok(self.cfg.signer.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::wait_for_rpc,
        transport::{memory, Receiver as _, Sender as _},
        types::VoteStatus,
        Node as _,
    };
    use bytes::Bytes;

    fn node(behavior: Behavior) -> Node {
        let mut cfg = Config::new(PrivateKey::from_seed(0));
        cfg.behavior = behavior;
        Node::new(cfg)
    }

    async fn exchange(
        sender: &mut memory::Sender,
        receiver: &mut memory::Receiver,
        message: Message,
    ) -> Message {
        sender.send(message.encode().freeze()).await.unwrap();
        let frame = receiver.recv().await.unwrap();
        Message::decode_cfg(frame, &(..=MAX_INVENTORY).into()).unwrap()
    }

    async fn connect(node: &Node) -> (memory::Sender, memory::Receiver) {
        let ((mut sender, mut receiver), (peer_sender, peer_receiver)) = memory::channel(8);
        node.attach(peer_sender, peer_receiver);
        let version = Message::Version {
            protocol: 1,
            nonce: 0,
        };
        assert_eq!(
            exchange(&mut sender, &mut receiver, version).await,
            Message::Verack
        );
        (sender, receiver)
    }

    #[tokio::test(start_paused = true)]
    async fn test_warmup() {
        let mut cfg = Config::new(PrivateKey::from_seed(0));
        cfg.warmup = Duration::from_secs(1);
        let node = Node::new(cfg);
        assert!(matches!(
            node.best_block_hash().await,
            Err(Error::Warmup(status)) if status == WARMUP_STATUS
        ));
        wait_for_rpc(&node, Duration::from_secs(2)).await.unwrap();
        node.best_block_hash().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_warmup_timeout() {
        let mut cfg = Config::new(PrivateKey::from_seed(0));
        cfg.warmup = Duration::from_secs(10);
        let node = Node::new(cfg);
        assert!(matches!(
            wait_for_rpc(&node, Duration::from_secs(1)).await,
            Err(Error::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_honest_response() {
        let node = node(Behavior::Honest);
        let blocks = node.generate(3, "a").await.unwrap();
        let (mut sender, mut receiver) = connect(&node).await;

        let unknown = Hash::from([9u8; 32]);
        let poll = Poll::new(1, &[blocks[2], unknown]);
        let Message::Response(signed) =
            exchange(&mut sender, &mut receiver, Message::Poll(poll.clone())).await
        else {
            panic!("expected response");
        };
        poll.check(&signed.response).unwrap();
        assert!(signed.verify(&node.avalanche_key().await.unwrap()));
        let statuses: Vec<_> = signed.response.votes().iter().map(Vote::status).collect();
        assert_eq!(statuses, [VoteStatus::Accepted, VoteStatus::Unknown]);
    }

    #[tokio::test]
    async fn test_ping() {
        let node = node(Behavior::Honest);
        let (mut sender, mut receiver) = connect(&node).await;
        assert_eq!(
            exchange(&mut sender, &mut receiver, Message::Ping(42)).await,
            Message::Pong(42)
        );
    }

    #[tokio::test]
    async fn test_truncated_and_corrupt() {
        let truncating = node(Behavior::TruncateVotes);
        let (mut sender, mut receiver) = connect(&truncating).await;
        let tip = truncating.best_block_hash().await.unwrap();
        let poll = Poll::new(1, &[tip, tip]);
        let Message::Response(signed) =
            exchange(&mut sender, &mut receiver, Message::Poll(poll.clone())).await
        else {
            panic!("expected response");
        };
        assert_eq!(signed.response.votes().len(), 1);
        assert!(matches!(
            poll.check(&signed.response),
            Err(Error::ProtocolViolation(_))
        ));

        let corrupt = node(Behavior::CorruptSignature);
        let (mut sender, mut receiver) = connect(&corrupt).await;
        let Message::Response(signed) =
            exchange(&mut sender, &mut receiver, Message::Poll(poll)).await
        else {
            panic!("expected response");
        };
        assert!(!signed.verify(&corrupt.avalanche_key().await.unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_ignores_early_poll() {
        let mut cfg = Config::new(PrivateKey::from_seed(0));
        cfg.cooldown = 1_000;
        let node = Node::new(cfg);
        let tip = node.best_block_hash().await.unwrap();
        let (mut sender, mut receiver) = connect(&node).await;

        let Message::Response(signed) =
            exchange(&mut sender, &mut receiver, Message::Poll(Poll::new(1, &[tip]))).await
        else {
            panic!("expected response");
        };
        assert_eq!(signed.response.cooldown(), 1_000);

        // The early poll is dropped, so the ping is answered first
        sender
            .send(Message::Poll(Poll::new(2, &[tip])).encode().freeze())
            .await
            .unwrap();
        assert_eq!(
            exchange(&mut sender, &mut receiver, Message::Ping(1)).await,
            Message::Pong(1)
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        let Message::Response(signed) =
            exchange(&mut sender, &mut receiver, Message::Poll(Poll::new(3, &[tip]))).await
        else {
            panic!("expected response");
        };
        assert_eq!(signed.response.round(), 3);
    }

    #[tokio::test]
    async fn test_malformed_frame_disconnects() {
        let node = node(Behavior::Honest);
        let (mut sender, mut receiver) = connect(&node).await;
        sender.send(Bytes::from_static(&[0xFF])).await.unwrap();
        assert!(receiver.recv().await.is_err());
    }
}
