//! Frames exchanged between the harness and a node.
//!
//! Every frame is a one-byte tag followed by the payload of the [Message]. Lists (inventory and
//! votes) are varint length-prefixed and bounded on read by the [RangeCfg] passed to
//! [Message::read_cfg], so an untrusted peer can never force an unbounded allocation.

use crate::{
    types::{Hash, Vote},
    verifier, Error,
};
use avalanche_codec::{
    Encode, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, ReadRangeExt,
    Write,
};
use avalanche_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    sha256,
};
use bytes::{Buf, BufMut};

/// Default maximum number of items in a poll (and votes in a response).
pub const MAX_INVENTORY: usize = 4096;

/// Inventory type of a block.
const BLOCK: u32 = 2;

/// A typed reference to a pollable item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inventory {
    id: Hash,
}

impl Inventory {
    pub fn block(id: Hash) -> Self {
        Self { id }
    }

    pub fn id(&self) -> Hash {
        self.id
    }
}

impl Write for Inventory {
    fn write(&self, buf: &mut impl BufMut) {
        BLOCK.write(buf);
        self.id.write(buf);
    }
}

impl Read for Inventory {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let kind = u32::read(buf)?;
        if kind != BLOCK {
            return Err(CodecError::Invalid("Inventory", "unsupported type"));
        }
        let id = Hash::read(buf)?;
        Ok(Self { id })
    }
}

impl FixedSize for Inventory {
    const SIZE: usize = u32::SIZE + Hash::SIZE;
}

/// Request for the peer's votes on an ordered list of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poll {
    round: u64,
    invs: Vec<Inventory>,
}

impl Poll {
    pub fn new(round: u64, ids: &[Hash]) -> Self {
        let invs = ids.iter().copied().map(Inventory::block).collect();
        Self { round, invs }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn invs(&self) -> &[Inventory] {
        &self.invs
    }

    /// Returns the polled identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = Hash> + '_ {
        self.invs.iter().map(Inventory::id)
    }

    /// Checks that `response` answers this poll: same round, one vote per item, and each vote
    /// refers to the item at the same position.
    pub fn check(&self, response: &Response) -> Result<(), Error> {
        if response.round != self.round {
            return Err(Error::ProtocolViolation(format!(
                "response round {} does not answer poll round {}",
                response.round, self.round
            )));
        }
        if response.votes.len() != self.invs.len() {
            return Err(Error::ProtocolViolation(format!(
                "{} votes for {} polled items",
                response.votes.len(),
                self.invs.len()
            )));
        }
        for (index, (inv, vote)) in self.invs.iter().zip(&response.votes).enumerate() {
            if inv.id != vote.id() {
                return Err(Error::ProtocolViolation(format!(
                    "vote {index} refers to {} instead of {}",
                    vote.id(),
                    inv.id
                )));
            }
        }
        Ok(())
    }
}

impl Write for Poll {
    fn write(&self, buf: &mut impl BufMut) {
        self.round.write(buf);
        self.invs.write(buf);
    }
}

impl EncodeSize for Poll {
    fn encode_size(&self) -> usize {
        self.round.encode_size() + self.invs.encode_size()
    }
}

impl Read for Poll {
    type Cfg = RangeCfg;

    fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, CodecError> {
        let round = u64::read(buf)?;
        let invs = Vec::<Inventory>::read_range(buf, range.clone())?;
        Ok(Self { round, invs })
    }
}

/// Votes returned for a [Poll], excluding the signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    round: u64,
    cooldown: u32,
    votes: Vec<Vote>,
}

impl Response {
    pub fn new(round: u64, cooldown: u32, votes: Vec<Vote>) -> Self {
        Self {
            round,
            cooldown,
            votes,
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Milliseconds the peer asks us to wait before polling again.
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    /// Digest of the canonical encoding, which is what the peer signs.
    pub fn digest(&self) -> Hash {
        sha256::hash(&self.encode())
    }
}

impl Write for Response {
    fn write(&self, buf: &mut impl BufMut) {
        self.round.write(buf);
        self.cooldown.write(buf);
        self.votes.write(buf);
    }
}

impl EncodeSize for Response {
    fn encode_size(&self) -> usize {
        self.round.encode_size() + self.cooldown.encode_size() + self.votes.encode_size()
    }
}

impl Read for Response {
    type Cfg = RangeCfg;

    fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, CodecError> {
        let round = u64::read(buf)?;
        let cooldown = u32::read(buf)?;
        let votes = Vec::<Vote>::read_range(buf, range.clone())?;
        Ok(Self {
            round,
            cooldown,
            votes,
        })
    }
}

/// A [Response] together with the peer's signature over its digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedResponse {
    pub response: Response,
    pub signature: Signature,
}

impl SignedResponse {
    pub fn sign(signer: &PrivateKey, response: Response) -> Self {
        let signature = verifier::sign(signer, &response.digest());
        Self {
            response,
            signature,
        }
    }

    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verifier::verify(&self.signature, public_key, &self.response.digest())
    }
}

impl Write for SignedResponse {
    fn write(&self, buf: &mut impl BufMut) {
        self.response.write(buf);
        self.signature.write(buf);
    }
}

impl EncodeSize for SignedResponse {
    fn encode_size(&self) -> usize {
        self.response.encode_size() + self.signature.encode_size()
    }
}

impl Read for SignedResponse {
    type Cfg = RangeCfg;

    fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, CodecError> {
        let response = Response::read_cfg(buf, range)?;
        let signature = Signature::read(buf)?;
        Ok(Self {
            response,
            signature,
        })
    }
}

/// A single frame on the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Version { protocol: u32, nonce: u64 },
    Verack,
    Ping(u64),
    Pong(u64),
    Poll(Poll),
    Response(SignedResponse),
}

impl Message {
    const VERSION: u8 = 0;
    const VERACK: u8 = 1;
    const PING: u8 = 2;
    const PONG: u8 = 3;
    const POLL: u8 = 4;
    const RESPONSE: u8 = 5;

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Version { .. } => "version",
            Self::Verack => "verack",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Poll(_) => "poll",
            Self::Response(_) => "response",
        }
    }
}

impl Write for Message {
    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Self::Version { protocol, nonce } => {
                Self::VERSION.write(buf);
                protocol.write(buf);
                nonce.write(buf);
            }
            Self::Verack => Self::VERACK.write(buf),
            Self::Ping(nonce) => {
                Self::PING.write(buf);
                nonce.write(buf);
            }
            Self::Pong(nonce) => {
                Self::PONG.write(buf);
                nonce.write(buf);
            }
            Self::Poll(poll) => {
                Self::POLL.write(buf);
                poll.write(buf);
            }
            Self::Response(response) => {
                Self::RESPONSE.write(buf);
                response.write(buf);
            }
        }
    }
}

impl EncodeSize for Message {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Version { .. } => u32::SIZE + u64::SIZE,
                Self::Verack => 0,
                Self::Ping(_) | Self::Pong(_) => u64::SIZE,
                Self::Poll(poll) => poll.encode_size(),
                Self::Response(response) => response.encode_size(),
            }
    }
}

impl Read for Message {
    type Cfg = RangeCfg;

    fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, CodecError> {
        let tag = u8::read(buf)?;
        let message = match tag {
            Self::VERSION => {
                let protocol = u32::read(buf)?;
                let nonce = u64::read(buf)?;
                Self::Version { protocol, nonce }
            }
            Self::VERACK => Self::Verack,
            Self::PING => Self::Ping(u64::read(buf)?),
            Self::PONG => Self::Pong(u64::read(buf)?),
            Self::POLL => Self::Poll(Poll::read_cfg(buf, range)?),
            Self::RESPONSE => Self::Response(SignedResponse::read_cfg(buf, range)?),
            other => return Err(CodecError::InvalidEnum(other)),
        };
        Ok(message)
    }
}
