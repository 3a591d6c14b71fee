//! Exercise the Avalanche poll/vote protocol of a node from the outside.
//!
//! The harness plays a fake peer: it connects to a node, polls it for votes on blocks, and checks
//! that every response is signed by the node, answers the poll it was sent for, and classifies
//! each block the way the node's chain state says it must.
//!
//! # Components
//!
//! - [wire]: poll, response, and handshake frames.
//! - [correlator]: hands a waiting driver each newly delivered response exactly once.
//! - [client]: one connection to the node (handshake, polls, ping synchronization).
//! - [oracle]: the driver's own chain model and the votes it implies.
//! - [verifier]: signatures over response digests.
//! - [orchestrator]: scripted scenarios that tie the above together.
//! - [mocks]: an in-process node to run the scenarios against.
//!
//! # Example
//!
//! ```rust
//! use avalanche_cryptography::ed25519::PrivateKey;
//! use avalanche_harness::{client, mocks, orchestrator::{self, Orchestrator}, transport::memory};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let node = mocks::Node::new(mocks::Config::new(PrivateKey::from_seed(0)));
//! let ((sender, receiver), (peer_sender, peer_receiver)) = memory::channel(16);
//! node.attach(peer_sender, peer_receiver);
//!
//! let mut client = client::Client::new(client::Config::default(), sender);
//! client.connect(receiver).await.unwrap();
//! let mut orchestrator = Orchestrator::new(orchestrator::Config::default(), node, client)
//!     .await
//!     .unwrap();
//! orchestrator.run().await.unwrap();
//! # }
//! ```

pub mod client;
pub mod correlator;
mod error;
pub use error::Error;
pub mod mocks;
pub mod node;
pub use node::Node;
pub mod oracle;
pub mod orchestrator;
pub mod transport;
pub mod types;
pub mod verifier;
pub mod wire;
