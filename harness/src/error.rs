use crate::{client::State, types::Hash, types::Vote};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while exercising a node.
#[derive(Error, Debug)]
pub enum Error {
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("no new response within {0:?}")]
    Timeout(Duration),
    #[error("response signature invalid")]
    SignatureInvalid,
    #[error("votes mismatch: expected {expected:?}, actual {actual:?}")]
    ExpectationMismatch { expected: Vec<Vote>, actual: Vec<Vote> },
    #[error("cooldown mismatch: expected {expected}, actual {actual}")]
    Cooldown { expected: u32, actual: u32 },
    #[error("client not ready: {0:?}")]
    NotReady(State),
    #[error("poll must contain at least one item")]
    EmptyPoll,
    #[error("connection closed")]
    Closed,
    #[error("codec error: {0}")]
    Codec(#[from] avalanche_codec::Error),
    #[error("node error: {0}")]
    Node(String),
    #[error("node still warming up: {0}")]
    Warmup(String),
    #[error("model diverged: model tip {model}, node tip {node}")]
    ModelDiverged { model: Hash, node: Hash },
    #[error("unknown block: {0}")]
    UnknownBlock(Hash),
    #[error("duplicate block: {0}")]
    DuplicateBlock(Hash),
    #[error("height out of range: {0}")]
    HeightOutOfRange(u64),
}
