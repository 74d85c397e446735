// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::{Tipset, TipsetKeys};
use lru::LruCache;
use nonzero_ext::nonzero;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Thread-safe bounded cache of tipset keys that failed validation, together
/// with every descendant observed in the same sync. Checked before fetching
/// or validating a chain so invalid segments are rejected without repeating
/// the work.
#[derive(Debug)]
pub struct BadTipsetCache {
    cache: Mutex<LruCache<TipsetKeys, ()>>,
}

impl Default for BadTipsetCache {
    fn default() -> Self {
        Self::new(nonzero!(1usize << 15))
    }
}

impl BadTipsetCache {
    pub fn new(cap: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Marks a single tipset key as bad.
    pub fn put(&self, key: TipsetKeys) {
        self.cache.lock().put(key, ());
    }

    /// Returns true if the key is cached as bad. Moves the key to the head
    /// of the cache.
    pub fn has(&self, key: &TipsetKeys) -> bool {
        self.cache.lock().get(key).is_some()
    }

    /// Marks every tipset of `chain` as bad. Called with the failed tipset
    /// and everything after it, so descendants of an invalid tipset are
    /// poisoned along with it.
    pub fn add_chain(&self, chain: &[Tipset]) {
        let mut cache = self.cache.lock();
        for ts in chain {
            cache.put(ts.key().clone(), ());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address::Address;
    use blocks::{Block, Ticket};

    fn tipset(ticket: u8) -> Tipset {
        let blk = Block::builder()
            .miner(Address::new_id(0))
            .ticket(Ticket::new(vec![ticket]))
            .build_and_validate()
            .unwrap();
        Tipset::new(vec![blk]).unwrap()
    }

    #[test]
    fn membership() {
        let cache = BadTipsetCache::default();
        let ts = tipset(1);
        assert!(!cache.has(ts.key()));
        cache.put(ts.key().clone());
        assert!(cache.has(ts.key()));
    }

    #[test]
    fn add_chain_poisons_every_key() {
        let cache = BadTipsetCache::default();
        let chain: Vec<Tipset> = (0..4).map(tipset).collect();
        cache.add_chain(&chain[1..]);
        assert!(!cache.has(chain[0].key()));
        for ts in &chain[1..] {
            assert!(cache.has(ts.key()));
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let cache = BadTipsetCache::new(nonzero!(2usize));
        let a = tipset(1);
        let b = tipset(2);
        let c = tipset(3);
        cache.put(a.key().clone());
        cache.put(b.key().clone());
        cache.put(c.key().clone());
        assert!(!cache.has(a.key()));
        assert!(cache.has(b.key()));
        assert!(cache.has(c.key()));
    }
}
