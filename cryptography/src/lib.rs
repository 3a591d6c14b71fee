//! Generate keys, sign vote responses, and deterministically verify signatures.
//!
//! Responses are signed over a digest of their canonical encoding. Every signature is bound to a
//! namespace (see [union_unique]) so that a signature produced for one message type can never be
//! replayed as another.

use avalanche_codec::{Encode, Read};
use std::fmt::{Debug, Display};
use thiserror::Error;

pub mod ed25519;
pub mod sha256;
pub use sha256::{hash, Sha256};
mod utils;
pub use utils::{hex, union_unique};

/// Errors that can occur when interacting with cryptographic primitives.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("invalid public key length")]
    InvalidPublicKeyLength,
    #[error("invalid signature length")]
    InvalidSignatureLength,
}

/// Produces [Signature]s over messages that can be verified with a corresponding [PublicKey].
pub trait Signer: Send + Sync + Clone + 'static {
    /// The type of [Signature] produced by this [Signer].
    type Signature: Signature;

    /// The corresponding [PublicKey] type.
    type PublicKey: PublicKey<Signature = Self::Signature>;

    /// Returns the [PublicKey] corresponding to this [Signer].
    fn public_key(&self) -> Self::PublicKey;

    /// Sign a message with the given namespace.
    ///
    /// The namespace is prepended to the message (see [union_unique]) so a signature meant for
    /// one context cannot be used in another.
    fn sign(&self, namespace: Option<&[u8]>, msg: &[u8]) -> Self::Signature;
}

/// Verifies [Signature]s over messages.
pub trait Verifier {
    /// The type of [Signature] that this verifier can verify.
    type Signature: Signature;

    /// Verify that a [Signature] is valid over a given message.
    ///
    /// The namespace provided here must match the namespace provided during signing.
    fn verify(&self, namespace: Option<&[u8]>, msg: &[u8], sig: &Self::Signature) -> bool;
}

/// A [PublicKey], able to verify [Signature]s.
pub trait PublicKey:
    Verifier + Clone + Eq + Debug + Display + Read<Cfg = ()> + Encode + Send + Sync + 'static
{
}

/// A [Signature] over a message.
pub trait Signature:
    Clone + Eq + Debug + Read<Cfg = ()> + Encode + Send + Sync + 'static
{
}

/// Hashes messages into fixed-size digests.
pub trait Hasher: Clone + Send + Sync + 'static {
    /// Digest produced by this hasher.
    type Digest: Copy + Eq + Ord + std::hash::Hash + Debug + Display + AsRef<[u8]>;

    /// Create a new, empty hasher.
    fn new() -> Self;

    /// Append message to previously recorded data.
    fn update(&mut self, message: &[u8]) -> &mut Self;

    /// Hash all recorded data and reset the hasher to its initial state.
    fn finalize(&mut self) -> Self::Digest;

    /// Reset the hasher without generating a digest.
    fn reset(&mut self);
}
