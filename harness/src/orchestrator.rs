//! Drive scripted poll scenarios against a node.
//!
//! Every chain mutation is applied to the node and mirrored into the [ChainModel]; every poll is
//! checked for a valid signature, the expected cooldown, and the votes the [oracle] derives from
//! the model. The scenarios also assert the status pattern they were written to produce, so a
//! model that drifts in the same way as the node is still caught.

use crate::{
    client::Client,
    oracle::{self, ChainModel},
    transport::Sender,
    types::{Hash, Vote, VoteStatus},
    Error, Node,
};
use avalanche_cryptography::{ed25519::PublicKey, sha256::Digest};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};

/// Heights polled by the selection scenario.
pub const SELECTION: [u64; 8] = [0, 1, 10, 25, 42, 96, 99, 100];

/// Height invalidated by the fork scenario.
const FORK_HEIGHT: u64 = 75;

/// Configuration for an [Orchestrator].
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for each response.
    pub response_timeout: Duration,

    /// Cooldown every response must advertise.
    pub expected_cooldown: u32,

    /// Seed for the identifiers the node has never seen.
    pub seed: u64,

    /// Address paid by the initial chain.
    pub payout: String,

    /// Address paid by the competing fork (must differ from `payout` or the node would
    /// regenerate blocks it already knows).
    pub fork_payout: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(10),
            expected_cooldown: 0,
            seed: 0,
            payout: "payout".into(),
            fork_payout: "fork".into(),
        }
    }
}

/// Runs scenarios over a connected [Client].
pub struct Orchestrator<N: Node, S: Sender> {
    cfg: Config,
    node: N,
    client: Client<S>,
    key: PublicKey,
    model: ChainModel,
    rng: StdRng,

    /// Blocks at [SELECTION] heights, captured before the fork.
    selection: Vec<Hash>,
}

impl<N: Node, S: Sender> Orchestrator<N, S> {
    /// Creates an orchestrator for a node whose chain is still at genesis.
    pub async fn new(cfg: Config, node: N, client: Client<S>) -> Result<Self, Error> {
        let key = node.avalanche_key().await?;
        let genesis = node.block_hash(0).await?;
        let rng = StdRng::seed_from_u64(cfg.seed);
        let orchestrator = Self {
            cfg,
            node,
            client,
            key,
            model: ChainModel::new(genesis),
            rng,
            selection: Vec::new(),
        };
        orchestrator.check_tip().await?;
        Ok(orchestrator)
    }

    pub fn model(&self) -> &ChainModel {
        &self.model
    }

    pub fn client(&mut self) -> &mut Client<S> {
        &mut self.client
    }

    /// Fails with [Error::ModelDiverged] unless the node's best tip is the model's.
    pub async fn check_tip(&self) -> Result<(), Error> {
        let node = self.node.best_block_hash().await?;
        let model = self.model.tip();
        if node != model {
            return Err(Error::ModelDiverged { model, node });
        }
        Ok(())
    }

    pub async fn generate(&mut self, count: u64, address: &str) -> Result<Vec<Hash>, Error> {
        let blocks = self.node.generate(count, address).await?;
        self.model.extend(&blocks)?;
        self.check_tip().await?;
        debug!(count, address, height = self.model.height(), "generated");
        Ok(blocks)
    }

    pub async fn invalidate(&mut self, hash: Hash) -> Result<(), Error> {
        self.node.invalidate_block(hash).await?;
        self.model.invalidate(&hash)?;
        self.check_tip().await?;
        debug!(%hash, height = self.model.height(), "invalidated");
        Ok(())
    }

    pub async fn reconsider(&mut self, hash: Hash) -> Result<(), Error> {
        self.node.reconsider_block(hash).await?;
        self.model.reconsider(&hash)?;
        self.check_tip().await?;
        debug!(%hash, height = self.model.height(), "reconsidered");
        Ok(())
    }

    /// Polls `ids` and checks the response against the model.
    pub async fn poll(&mut self, ids: &[Hash]) -> Result<Vec<Vote>, Error> {
        self.client.send_poll(ids).await?;
        let observed = self
            .client
            .wait_for_response(self.cfg.response_timeout)
            .await?;
        if !observed.verify(&self.key) {
            return Err(Error::SignatureInvalid);
        }
        let response = &observed.response;
        if response.cooldown() != self.cfg.expected_cooldown {
            return Err(Error::Cooldown {
                expected: self.cfg.expected_cooldown,
                actual: response.cooldown(),
            });
        }
        let expected = oracle::expect(&self.model, ids);
        let actual = response.votes().to_vec();
        if actual != expected {
            return Err(Error::ExpectationMismatch { expected, actual });
        }
        debug!(round = response.round(), count = ids.len(), "votes matched");
        Ok(actual)
    }

    /// Polls `ids` and additionally requires the votes to follow `statuses`.
    async fn poll_expecting(
        &mut self,
        ids: &[Hash],
        statuses: &[VoteStatus],
    ) -> Result<(), Error> {
        let actual = self.poll(ids).await?;
        let expected: Vec<Vote> = ids
            .iter()
            .zip(statuses)
            .map(|(id, status)| Vote::new(*status, *id))
            .collect();
        if actual != expected {
            return Err(Error::ExpectationMismatch { expected, actual });
        }
        Ok(())
    }

    async fn hashes_at(&self, heights: &[u64]) -> Result<Vec<Hash>, Error> {
        let mut hashes = Vec::with_capacity(heights.len());
        for height in heights {
            hashes.push(self.node.block_hash(*height).await?);
        }
        Ok(hashes)
    }

    /// Generates 100 blocks and polls the tip, which must be accepted.
    pub async fn scenario_tip(&mut self) -> Result<(), Error> {
        info!("poll for the chain tip");
        let payout = self.cfg.payout.clone();
        self.generate(100, &payout).await?;
        let tip = self.node.best_block_hash().await?;
        self.poll_expecting(&[tip], &[VoteStatus::Accepted]).await
    }

    /// Polls blocks at a selection of heights, which must all be accepted.
    pub async fn scenario_selection(&mut self) -> Result<(), Error> {
        info!("poll for a selection of blocks");
        self.selection = self.hashes_at(&SELECTION).await?;
        let selection = self.selection.clone();
        self.poll_expecting(&selection, &[VoteStatus::Accepted; SELECTION.len()])
            .await
    }

    /// Replaces the chain above the fork height with a longer one, then re-polls the selection:
    /// the blocks below the fork stay accepted and those above it become rejected.
    pub async fn scenario_fork(&mut self) -> Result<(), Error> {
        info!("poll for a selection of blocks, but some are now invalid");
        if self.selection.is_empty() {
            self.selection = self.hashes_at(&SELECTION).await?;
        }
        let invalidated = self.node.block_hash(FORK_HEIGHT).await?;
        self.invalidate(invalidated).await?;
        let fork_payout = self.cfg.fork_payout.clone();
        self.generate(30, &fork_payout).await?;
        self.reconsider(invalidated).await?;

        let selection = self.selection.clone();
        let mut statuses = vec![VoteStatus::Accepted; 5];
        statuses.extend([VoteStatus::Rejected; 3]);
        self.poll_expecting(&selection, &statuses).await
    }

    /// Mixes blocks on the best chain, blocks off it, and identifiers the node has never seen.
    pub async fn scenario_unknown(&mut self) -> Result<(), Error> {
        info!("poll for unknown blocks");
        if self.selection.is_empty() {
            self.selection = self.hashes_at(&SELECTION).await?;
        }
        let mut ids = self.hashes_at(&[0, 25, 42]).await?;
        ids.extend_from_slice(&self.selection[5..]);
        for _ in 0..3 {
            ids.push(Digest::random(&mut self.rng));
        }
        let mut statuses = vec![VoteStatus::Accepted; 3];
        statuses.extend([VoteStatus::Rejected; 3]);
        statuses.extend([VoteStatus::Unknown; 3]);
        self.poll_expecting(&ids, &statuses).await
    }

    /// Runs every scenario in order, stopping at the first failure.
    pub async fn run(&mut self) -> Result<(), Error> {
        self.scenario_tip().await?;
        self.scenario_selection().await?;
        self.scenario_fork().await?;
        self.scenario_unknown().await?;
        info!("all scenarios passed");
        Ok(())
    }
}
