//! Block index of the simulated node.

use crate::{
    types::{Hash, VoteStatus},
    Error,
};
use avalanche_cryptography::{Hasher, Sha256};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Valid,
    /// Explicitly invalidated.
    Failed,
    /// Descends from an invalidated block.
    FailedParent,
}

#[derive(Clone, Debug)]
struct Entry {
    height: u64,
    parent: Option<Hash>,
    children: Vec<Hash>,
    /// Order in which the block was first seen.
    sequence: u64,
    status: Status,
}

/// Every block the node has seen, with its best chain.
#[derive(Clone, Debug)]
pub(super) struct Index {
    entries: HashMap<Hash, Entry>,
    next_sequence: u64,
    tip: Hash,
}

impl Index {
    pub fn new(seed: u64) -> Self {
        let genesis = Sha256::new()
            .update(b"genesis")
            .update(&seed.to_be_bytes())
            .finalize();
        let mut entries = HashMap::new();
        entries.insert(
            genesis,
            Entry {
                height: 0,
                parent: None,
                children: Vec::new(),
                sequence: 0,
                status: Status::Valid,
            },
        );
        Self {
            entries,
            next_sequence: 1,
            tip: genesis,
        }
    }

    pub fn tip(&self) -> Hash {
        self.tip
    }

    fn entry(&self, hash: &Hash) -> Result<&Entry, Error> {
        self.entries.get(hash).ok_or(Error::UnknownBlock(*hash))
    }

    /// Appends a block paying `address` on top of the tip.
    pub fn mine(&mut self, address: &str) -> Result<Hash, Error> {
        let parent = self.tip;
        let height = self.entry(&parent)?.height + 1;
        let hash = Sha256::new()
            .update(parent.as_ref())
            .update(&height.to_be_bytes())
            .update(address.as_bytes())
            .finalize();
        if self.entries.contains_key(&hash) {
            return Err(Error::DuplicateBlock(hash));
        }
        self.entries.insert(
            hash,
            Entry {
                height,
                parent: Some(parent),
                children: Vec::new(),
                sequence: self.next_sequence,
                status: Status::Valid,
            },
        );
        self.next_sequence += 1;
        if let Some(entry) = self.entries.get_mut(&parent) {
            entry.children.push(hash);
        }
        self.select_tip();
        Ok(hash)
    }

    /// Returns the block at `height` on the best chain.
    pub fn hash_at(&self, height: u64) -> Result<Hash, Error> {
        let mut cursor = self.tip;
        let mut entry = self.entry(&cursor)?;
        if height > entry.height {
            return Err(Error::HeightOutOfRange(height));
        }
        while entry.height > height {
            let Some(parent) = entry.parent else {
                return Err(Error::HeightOutOfRange(height));
            };
            cursor = parent;
            entry = self.entry(&cursor)?;
        }
        Ok(cursor)
    }

    pub fn invalidate(&mut self, hash: &Hash) -> Result<(), Error> {
        if self.entry(hash)?.parent.is_none() {
            return Err(Error::Node("cannot invalidate genesis".into()));
        }
        for descendant in self.descendants(hash) {
            if let Some(entry) = self.entries.get_mut(&descendant) {
                if entry.status == Status::Valid {
                    entry.status = Status::FailedParent;
                }
            }
        }
        if let Some(entry) = self.entries.get_mut(hash) {
            entry.status = Status::Failed;
        }
        self.select_tip();
        Ok(())
    }

    pub fn reconsider(&mut self, hash: &Hash) -> Result<(), Error> {
        let mut cleared = self.descendants(hash);
        let mut cursor = Some(*hash);
        while let Some(current) = cursor {
            cursor = self.entry(&current)?.parent;
            cleared.push(current);
        }
        for hash in cleared {
            if let Some(entry) = self.entries.get_mut(&hash) {
                entry.status = Status::Valid;
            }
        }
        self.select_tip();
        Ok(())
    }

    /// Returns the node's opinion on `id`.
    pub fn vote(&self, id: &Hash) -> VoteStatus {
        match self.entries.get(id) {
            None => VoteStatus::Unknown,
            Some(entry) if self.hash_at(entry.height).ok() == Some(*id) => VoteStatus::Accepted,
            Some(_) => VoteStatus::Rejected,
        }
    }

    fn descendants(&self, hash: &Hash) -> Vec<Hash> {
        let mut found = Vec::new();
        let mut stack = match self.entries.get(hash) {
            Some(entry) => entry.children.clone(),
            None => return found,
        };
        while let Some(next) = stack.pop() {
            if let Some(entry) = self.entries.get(&next) {
                stack.extend(entry.children.iter().copied());
            }
            found.push(next);
        }
        found
    }

    /// Picks the highest valid block, preferring the one seen first.
    fn select_tip(&mut self) {
        let best = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.status == Status::Valid)
            .min_by_key(|(_, entry)| (std::cmp::Reverse(entry.height), entry.sequence))
            .map(|(hash, _)| *hash);
        if let Some(best) = best {
            self.tip = best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine(index: &mut Index, count: usize, address: &str) -> Vec<Hash> {
        (0..count).map(|_| index.mine(address).unwrap()).collect()
    }

    #[test]
    fn test_mine_extends_tip() {
        let mut index = Index::new(0);
        let genesis = index.tip();
        let blocks = mine(&mut index, 3, "a");
        assert_eq!(index.tip(), blocks[2]);
        assert_eq!(index.hash_at(0).unwrap(), genesis);
        assert_eq!(index.hash_at(2).unwrap(), blocks[1]);
        assert!(matches!(index.hash_at(4), Err(Error::HeightOutOfRange(4))));
    }

    #[test]
    fn test_seed_changes_genesis() {
        assert_ne!(Index::new(0).tip(), Index::new(1).tip());
    }

    #[test]
    fn test_invalidate_then_reuse_address_is_duplicate() {
        let mut index = Index::new(0);
        let blocks = mine(&mut index, 5, "a");
        index.invalidate(&blocks[2]).unwrap();
        assert_eq!(index.tip(), blocks[1]);
        assert!(matches!(index.mine("a"), Err(Error::DuplicateBlock(_))));
    }

    #[test]
    fn test_fork_and_reconsider() {
        let mut index = Index::new(0);
        let old = mine(&mut index, 10, "a");
        index.invalidate(&old[5]).unwrap();
        let fork = mine(&mut index, 8, "b");
        index.reconsider(&old[5]).unwrap();

        // Fork reaches height 13, the old chain only 10
        assert_eq!(index.tip(), fork[7]);
        assert_eq!(index.vote(&old[4]), VoteStatus::Accepted);
        assert_eq!(index.vote(&old[5]), VoteStatus::Rejected);
        assert_eq!(index.vote(&old[9]), VoteStatus::Rejected);
        assert_eq!(index.vote(&fork[0]), VoteStatus::Accepted);
        assert_eq!(index.vote(&Hash::from([7u8; 32])), VoteStatus::Unknown);
    }

    #[test]
    fn test_reconsider_restores_longer_chain() {
        let mut index = Index::new(0);
        let old = mine(&mut index, 10, "a");
        index.invalidate(&old[5]).unwrap();
        let fork = mine(&mut index, 2, "b");
        assert_eq!(index.tip(), fork[1]);
        index.reconsider(&old[5]).unwrap();
        assert_eq!(index.tip(), old[9]);
    }

    #[test]
    fn test_equal_height_prefers_first_seen() {
        let mut index = Index::new(0);
        let old = mine(&mut index, 4, "a");
        index.invalidate(&old[2]).unwrap();
        let fork = mine(&mut index, 2, "b");
        index.reconsider(&old[2]).unwrap();
        assert_eq!(index.tip(), old[3]);
        assert_eq!(index.vote(&fork[1]), VoteStatus::Rejected);
    }

    #[test]
    fn test_genesis_cannot_be_invalidated() {
        let mut index = Index::new(0);
        let genesis = index.tip();
        assert!(matches!(index.invalidate(&genesis), Err(Error::Node(_))));
        assert!(matches!(
            index.invalidate(&Hash::from([1u8; 32])),
            Err(Error::UnknownBlock(_))
        ));
    }
}
