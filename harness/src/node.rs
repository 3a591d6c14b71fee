//! Control interface of the node under test.

use crate::{types::Hash, Error};
use avalanche_cryptography::ed25519::PublicKey;
use std::{future::Future, time::Duration};
use tokio::time;
use tracing::debug;

/// Interval between attempts while the node is warming up.
const WARMUP_RETRY: Duration = Duration::from_millis(100);

/// Chain-control operations the harness needs from a node.
///
/// Every call may fail with [Error::Warmup] while the node is still starting.
pub trait Node: Send + Sync + 'static {
    /// Mines `count` blocks on top of the current best tip, paying `address`, and returns their
    /// hashes in height order.
    fn generate(
        &self,
        count: u64,
        address: &str,
    ) -> impl Future<Output = Result<Vec<Hash>, Error>> + Send;

    /// Returns the hash of the block at `height` on the best chain.
    fn block_hash(&self, height: u64) -> impl Future<Output = Result<Hash, Error>> + Send;

    /// Returns the hash of the best chain tip.
    fn best_block_hash(&self) -> impl Future<Output = Result<Hash, Error>> + Send;

    /// Marks `hash` (and every descendant) invalid.
    fn invalidate_block(&self, hash: Hash) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes the invalid mark from `hash`, its ancestors, and its descendants.
    fn reconsider_block(&self, hash: Hash) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the key the node signs responses with.
    fn avalanche_key(&self) -> impl Future<Output = Result<PublicKey, Error>> + Send;
}

/// Waits until `node` answers calls instead of reporting [Error::Warmup].
pub async fn wait_for_rpc<N: Node>(node: &N, timeout: Duration) -> Result<(), Error> {
    let ready = async {
        loop {
            match node.best_block_hash().await {
                Ok(_) => return Ok(()),
                Err(Error::Warmup(status)) => {
                    debug!(status, "node warming up");
                    time::sleep(WARMUP_RETRY).await;
                }
                Err(err) => return Err(err),
            }
        }
    };
    time::timeout(timeout, ready)
        .await
        .map_err(|_| Error::Timeout(timeout))?
}
