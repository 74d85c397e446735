// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::{Tipset, TipsetKeys};
use cid::Cid;
use std::collections::{BTreeSet, HashMap};

/// The unit stored by the chain store: a validated tipset bound to the root
/// of the chain state that results from applying it to its parent state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TipsetMetadata {
    /// The set of blocks that forms the tipset.
    pub tipset: Tipset,
    /// Root of aggregate state after applying the tipset to its parent
    /// state.
    pub tipset_state_root: Cid,
}

/// Tracks validated tipsets by key, with a secondary index by
/// `(parent key, height)` used to discover sibling tipsets when widening.
#[derive(Default)]
pub struct TipIndex {
    meta_by_key: HashMap<TipsetKeys, TipsetMetadata>,
    keys_by_parents_and_height: HashMap<(TipsetKeys, u64), BTreeSet<TipsetKeys>>,
}

impl TipIndex {
    /// Adds an entry to the index. After this call the metadata can be
    /// looked up by the tipset key or by the tipset's parents and height.
    /// Re-inserting an existing key is a no-op.
    pub fn put(&mut self, meta: TipsetMetadata) {
        let key = meta.tipset.key().clone();
        let parents_and_height = (meta.tipset.parents().clone(), meta.tipset.height());
        self.keys_by_parents_and_height
            .entry(parents_and_height)
            .or_default()
            .insert(key.clone());
        self.meta_by_key.insert(key, meta);
    }

    /// Returns the metadata stored for `key`.
    pub fn get(&self, key: &TipsetKeys) -> Option<&TipsetMetadata> {
        self.meta_by_key.get(key)
    }

    /// Returns true if `key` has been recorded.
    pub fn has(&self, key: &TipsetKeys) -> bool {
        self.meta_by_key.contains_key(key)
    }

    /// Returns true if any recorded tipset has the given parents and height.
    pub fn has_by_parents_and_height(&self, parents: &TipsetKeys, height: u64) -> bool {
        self.keys_by_parents_and_height
            .contains_key(&(parents.clone(), height))
    }

    /// Returns all recorded tipsets sharing the given parents and height, in
    /// deterministic key order.
    pub fn get_by_parents_and_height(
        &self,
        parents: &TipsetKeys,
        height: u64,
    ) -> Vec<TipsetMetadata> {
        self.keys_by_parents_and_height
            .get(&(parents.clone(), height))
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| self.meta_by_key.get(k).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address::Address;
    use blocks::{Block, Ticket};

    fn template_block(ticket: Vec<u8>, parents: TipsetKeys, height: u64) -> Block {
        Block::builder()
            .miner(Address::new_id(0))
            .ticket(Ticket::new(ticket))
            .parents(parents)
            .height(height)
            .build_and_validate()
            .unwrap()
    }

    fn meta(ticket: Vec<u8>, parents: TipsetKeys, height: u64) -> TipsetMetadata {
        let blk = template_block(ticket, parents, height);
        let state_root = *blk.state_root();
        TipsetMetadata {
            tipset: Tipset::new(vec![blk]).unwrap(),
            tipset_state_root: state_root,
        }
    }

    #[test]
    fn put_and_get() {
        let mut index = TipIndex::default();
        let meta = meta(vec![1], TipsetKeys::default(), 1);
        index.put(meta.clone());
        assert!(index.has(meta.tipset.key()));
        assert_eq!(index.get(meta.tipset.key()), Some(&meta));
    }

    #[test]
    fn get_unknown_key() {
        let index = TipIndex::default();
        assert!(!index.has(&TipsetKeys::default()));
        assert_eq!(index.get(&TipsetKeys::default()), None);
    }

    #[test]
    fn indexes_siblings_by_parents_and_height() {
        let mut index = TipIndex::default();
        let parent = template_block(vec![0], TipsetKeys::default(), 0);
        let parents = TipsetKeys::new(vec![*parent.cid()]);
        let m1 = meta(vec![1], parents.clone(), 1);
        let m2 = meta(vec![2], parents.clone(), 1);
        let unrelated = meta(vec![3], parents.clone(), 2);
        index.put(m1.clone());
        index.put(m2.clone());
        index.put(unrelated);

        assert!(index.has_by_parents_and_height(&parents, 1));
        assert!(!index.has_by_parents_and_height(&TipsetKeys::default(), 1));
        let siblings = index.get_by_parents_and_height(&parents, 1);
        assert_eq!(siblings.len(), 2);
        assert!(siblings.contains(&m1));
        assert!(siblings.contains(&m2));
    }

    #[test]
    fn put_is_idempotent() {
        let mut index = TipIndex::default();
        let meta = meta(vec![1], TipsetKeys::default(), 1);
        index.put(meta.clone());
        index.put(meta.clone());
        assert_eq!(
            index.get_by_parents_and_height(meta.tipset.parents(), 1).len(),
            1
        );
    }
}
