//! Compute the votes a correct node must return.
//!
//! The oracle never looks at node state. The driver keeps its own [ChainModel] in step with every
//! chain mutation it asks the node to perform, and [expect] classifies polled items against that
//! model alone.

use crate::{
    types::{Hash, Vote, VoteStatus},
    Error,
};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Validity {
    Valid,
    Invalid,
    /// Some ancestor was invalidated while this block was recorded below it.
    InvalidAncestor,
}

#[derive(Clone, Debug)]
struct Record {
    height: u64,
    hash: Hash,
    parent: Option<usize>,
    validity: Validity,
}

/// The driver's own view of the node's block tree.
#[derive(Clone, Debug)]
pub struct ChainModel {
    records: Vec<Record>,
    index: HashMap<Hash, usize>,
    tip: usize,
}

impl ChainModel {
    pub fn new(genesis: Hash) -> Self {
        Self {
            records: vec![Record {
                height: 0,
                hash: genesis,
                parent: None,
                validity: Validity::Valid,
            }],
            index: HashMap::from([(genesis, 0)]),
            tip: 0,
        }
    }

    /// Returns the best tip: the highest valid block, preferring the one recorded first.
    pub fn tip(&self) -> Hash {
        self.records[self.tip].hash
    }

    pub fn height(&self) -> u64 {
        self.records[self.tip].height
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains_key(hash)
    }

    /// Records `blocks` as a chain built, in order, on top of the current tip.
    pub fn extend(&mut self, blocks: &[Hash]) -> Result<(), Error> {
        for hash in blocks {
            if self.index.contains_key(hash) {
                return Err(Error::DuplicateBlock(*hash));
            }
            let parent = self.tip;
            self.records.push(Record {
                height: self.records[parent].height + 1,
                hash: *hash,
                parent: Some(parent),
                validity: Validity::Valid,
            });
            self.index.insert(*hash, self.records.len() - 1);
            self.select_tip();
        }
        Ok(())
    }

    /// Flags `hash` invalid and its currently valid descendants invalid through it.
    pub fn invalidate(&mut self, hash: &Hash) -> Result<(), Error> {
        let position = self.position(hash)?;
        for candidate in self.descendants(position) {
            let record = &mut self.records[candidate];
            if record.validity == Validity::Valid {
                record.validity = Validity::InvalidAncestor;
            }
        }
        self.records[position].validity = Validity::Invalid;
        self.select_tip();
        Ok(())
    }

    /// Makes `hash`, its ancestors, and its descendants valid again.
    ///
    /// Other branches below a reconsidered ancestor keep their flags.
    pub fn reconsider(&mut self, hash: &Hash) -> Result<(), Error> {
        let position = self.position(hash)?;
        let mut cleared = self.descendants(position);
        let mut cursor = Some(position);
        while let Some(current) = cursor {
            cleared.push(current);
            cursor = self.records[current].parent;
        }
        for candidate in cleared {
            self.records[candidate].validity = Validity::Valid;
        }
        self.select_tip();
        Ok(())
    }

    /// Returns the block at `height` on the best chain.
    pub fn hash_at(&self, height: u64) -> Result<Hash, Error> {
        self.ancestor_at(self.tip, height)
            .map(|position| self.records[position].hash)
            .ok_or(Error::HeightOutOfRange(height))
    }

    /// Classifies `id` against the best chain.
    pub fn classify(&self, id: &Hash) -> VoteStatus {
        match self.index.get(id) {
            None => VoteStatus::Unknown,
            Some(&position) if self.on_best(position) => VoteStatus::Accepted,
            Some(_) => VoteStatus::Rejected,
        }
    }

    fn on_best(&self, position: usize) -> bool {
        self.ancestor_at(self.tip, self.records[position].height) == Some(position)
    }

    fn position(&self, hash: &Hash) -> Result<usize, Error> {
        self.index
            .get(hash)
            .copied()
            .ok_or(Error::UnknownBlock(*hash))
    }

    fn ancestor_at(&self, from: usize, height: u64) -> Option<usize> {
        let mut cursor = from;
        if self.records[cursor].height < height {
            return None;
        }
        while self.records[cursor].height > height {
            cursor = self.records[cursor].parent?;
        }
        Some(cursor)
    }

    /// Returns every strict descendant of `ancestor`.
    fn descendants(&self, ancestor: usize) -> Vec<usize> {
        let height = self.records[ancestor].height;
        (0..self.records.len())
            .filter(|&candidate| {
                candidate != ancestor && self.ancestor_at(candidate, height) == Some(ancestor)
            })
            .collect()
    }

    fn select_tip(&mut self) {
        let mut best: Option<usize> = None;
        for (position, record) in self.records.iter().enumerate() {
            if record.validity != Validity::Valid {
                continue;
            }
            // Records are scanned in insertion order, so only a strictly higher block wins
            if best.map_or(true, |best| record.height > self.records[best].height) {
                best = Some(position);
            }
        }
        if let Some(best) = best {
            self.tip = best;
        }
    }
}

/// Returns the vote a correct node casts for each of `items`, in order.
pub fn expect(model: &ChainModel, items: &[Hash]) -> Vec<Vote> {
    items
        .iter()
        .map(|id| Vote::new(model.classify(id), *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use avalanche_cryptography::hash;

    fn block(label: &str, n: u64) -> Hash {
        hash(format!("{label}{n}").as_bytes())
    }

    /// Builds `0..=count` on the main chain labelled "a".
    fn model(count: u64) -> (ChainModel, Vec<Hash>) {
        let genesis = block("a", 0);
        let mut model = ChainModel::new(genesis);
        let blocks: Vec<_> = (1..=count).map(|n| block("a", n)).collect();
        model.extend(&blocks).unwrap();
        let mut chain = vec![genesis];
        chain.extend(blocks);
        (model, chain)
    }

    #[test]
    fn test_extend_moves_tip() {
        let (model, chain) = model(100);
        assert_eq!(model.tip(), chain[100]);
        assert_eq!(model.height(), 100);
        assert_eq!(model.hash_at(42).unwrap(), chain[42]);
        assert!(matches!(
            model.hash_at(101),
            Err(Error::HeightOutOfRange(101))
        ));
    }

    #[test]
    fn test_classification() {
        let (model, chain) = model(10);
        let unknown = block("z", 1);
        let votes = expect(&model, &[chain[0], chain[10], unknown]);
        let statuses: Vec<_> = votes.iter().map(Vote::status).collect();
        assert_eq!(
            statuses,
            [VoteStatus::Accepted, VoteStatus::Accepted, VoteStatus::Unknown]
        );
        assert_eq!(votes[2].id(), unknown);
    }

    #[test]
    fn test_fork_then_reconsider() {
        let (mut model, chain) = model(100);
        let heights = [0, 1, 10, 25, 42, 96, 99, 100];
        let polled: Vec<_> = heights.iter().map(|h| chain[*h]).collect();

        model.invalidate(&chain[75]).unwrap();
        assert_eq!(model.tip(), chain[74]);
        let fork: Vec<_> = (75..105).map(|n| block("b", n)).collect();
        model.extend(&fork).unwrap();
        model.reconsider(&chain[75]).unwrap();

        // The fork (height 104) outgrows the reconsidered chain (height 100)
        assert_eq!(model.tip(), fork[29]);
        let statuses: Vec<_> = expect(&model, &polled).iter().map(Vote::status).collect();
        let mut expected = vec![VoteStatus::Accepted; 5];
        expected.extend([VoteStatus::Rejected; 3]);
        assert_eq!(statuses, expected);
    }

    #[test]
    fn test_reconsider_restores_longer_chain() {
        let (mut model, chain) = model(10);
        model.invalidate(&chain[5]).unwrap();
        model.extend(&[block("b", 5)]).unwrap();
        assert_eq!(model.tip(), block("b", 5));
        model.reconsider(&chain[5]).unwrap();
        assert_eq!(model.tip(), chain[10]);
        assert_eq!(model.classify(&block("b", 5)), VoteStatus::Rejected);
    }

    #[test]
    fn test_tie_prefers_first_recorded() {
        let (mut model, chain) = model(4);
        model.invalidate(&chain[3]).unwrap();
        let fork = [block("b", 3), block("b", 4)];
        model.extend(&fork).unwrap();
        model.reconsider(&chain[3]).unwrap();
        assert_eq!(model.tip(), chain[4]);
        assert_eq!(model.classify(&fork[1]), VoteStatus::Rejected);
    }

    #[test]
    fn test_reconsider_clears_descendants() {
        let (mut model, chain) = model(10);
        model.invalidate(&chain[8]).unwrap();
        model.invalidate(&chain[4]).unwrap();
        assert_eq!(model.tip(), chain[3]);
        model.reconsider(&chain[4]).unwrap();
        assert_eq!(model.tip(), chain[10]);
    }

    #[test]
    fn test_reconsider_keeps_sibling_branch_invalid() {
        let (mut model, chain) = model(10);
        model.invalidate(&chain[8]).unwrap();
        let fork: Vec<_> = (8..13).map(|n| block("b", n)).collect();
        model.extend(&fork).unwrap();
        assert_eq!(model.tip(), fork[4]);

        // Both branches sit above the newly invalidated block
        model.invalidate(&chain[7]).unwrap();
        assert_eq!(model.tip(), chain[6]);

        // Only the reconsidered branch comes back
        model.reconsider(&chain[10]).unwrap();
        assert_eq!(model.tip(), chain[10]);
        assert_eq!(model.classify(&chain[8]), VoteStatus::Accepted);
        assert_eq!(model.classify(&fork[0]), VoteStatus::Rejected);
        assert_eq!(model.classify(&fork[4]), VoteStatus::Rejected);
    }

    #[test]
    fn test_idempotent() {
        let (model, chain) = model(5);
        assert_eq!(expect(&model, &chain), expect(&model, &chain));
    }

    #[test]
    fn test_errors() {
        let (mut model, chain) = model(2);
        let unknown = block("z", 0);
        assert!(matches!(
            model.invalidate(&unknown),
            Err(Error::UnknownBlock(_))
        ));
        assert!(matches!(
            model.extend(&[chain[1]]),
            Err(Error::DuplicateBlock(_))
        ));
    }
}
