// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, TipIndex, TipsetMetadata};
use crate::providers::TipsetProvider;
use blocks::{Tipset, TipsetKeys};
use cid::Cid;
use db::Store;
use encoding::Cbor;
use log::info;
use parking_lot::RwLock;

const HEAD_KEY: &[u8] = b"/head";

fn tipset_record_key(key: &TipsetKeys) -> Result<Vec<u8>, Error> {
    let mut record_key = b"/tipset/".to_vec();
    record_key.extend(key.marshal_cbor()?);
    Ok(record_key)
}

fn index_record_key(parents: &TipsetKeys, height: u64) -> Result<Vec<u8>, Error> {
    let mut record_key = b"/index/".to_vec();
    record_key.extend(parents.marshal_cbor()?);
    record_key.extend(height.to_be_bytes());
    Ok(record_key)
}

/// Stores validated tipsets with their post-state roots and tracks the head
/// of the best-known chain.
///
/// Tipsets and the head key are written through to the backing key-value
/// store; the in-memory [`TipIndex`] serves reads and the
/// `(parent key, height)` sibling lookup. Reads are safe under concurrent
/// writers; writes are expected to come only from the holder of the syncer
/// lock.
pub struct ChainStore<DB> {
    // key-value datastore
    db: DB,

    // CID of the genesis block
    genesis: Cid,

    // key of the heaviest validated tipset
    head: RwLock<TipsetKeys>,

    // tracks tipsets by key and by parents/height for use by expected
    // consensus
    tip_index: RwLock<TipIndex>,
}

impl<DB> ChainStore<DB>
where
    DB: Store,
{
    /// Constructs a chain store over the given datastore. The head is unset
    /// until the genesis tipset has been put and selected with
    /// [`ChainStore::set_head`].
    pub fn new(db: DB, genesis: Cid) -> Self {
        Self {
            db,
            genesis,
            head: RwLock::new(TipsetKeys::default()),
            tip_index: RwLock::new(TipIndex::default()),
        }
    }

    /// Returns the CID of the genesis block.
    pub fn genesis_cid(&self) -> &Cid {
        &self.genesis
    }

    /// Returns the backing key-value store.
    pub fn blockstore(&self) -> &DB {
        &self.db
    }

    /// Records a validated tipset and its post-state root. Idempotent. The
    /// parents of the tipset are not required to be known; putting a tipset
    /// never advances the head.
    pub fn put_tipset_and_state(&self, meta: TipsetMetadata) -> Result<(), Error> {
        self.persist_blocks(&meta.tipset)?;
        self.db.write(
            tipset_record_key(meta.tipset.key())?,
            meta.tipset_state_root.to_bytes(),
        )?;
        let parents = meta.tipset.parents().clone();
        let height = meta.tipset.height();
        let mut tip_index = self.tip_index.write();
        tip_index.put(meta);
        // keep the persisted sibling index in step with memory
        let siblings: Vec<TipsetKeys> = tip_index
            .get_by_parents_and_height(&parents, height)
            .into_iter()
            .map(|sibling| sibling.tipset.key().clone())
            .collect();
        self.db
            .write(index_record_key(&parents, height)?, siblings.marshal_cbor()?)?;
        Ok(())
    }

    // Writes encoded block data to the blockstore, skipping blocks already
    // present.
    fn persist_blocks(&self, tipset: &Tipset) -> Result<(), Error> {
        for blk in tipset.blocks() {
            let key = blk.cid().to_bytes();
            if !self.db.exists(&key)? {
                self.db.write(&key, blk.marshal_cbor()?)?;
            }
        }
        Ok(())
    }

    /// Returns the tipset and state root recorded for `key`.
    pub fn get_tipset_and_state(&self, key: &TipsetKeys) -> Result<TipsetMetadata, Error> {
        self.tip_index
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UndefinedKey(key.to_string()))
    }

    /// Returns the tipset recorded for `key`.
    pub fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error> {
        Ok(self.get_tipset_and_state(key)?.tipset)
    }

    /// Returns the post-state root recorded for `key`.
    pub fn get_tipset_state_root(&self, key: &TipsetKeys) -> Result<Cid, Error> {
        Ok(self.get_tipset_and_state(key)?.tipset_state_root)
    }

    /// Returns true if a tipset and state have been recorded for `key`.
    pub fn has_tipset_and_state(&self, key: &TipsetKeys) -> bool {
        self.tip_index.read().has(key)
    }

    /// Returns the key of the current head tipset. The key is empty until
    /// the first call to [`ChainStore::set_head`].
    pub fn get_head(&self) -> TipsetKeys {
        self.head.read().clone()
    }

    /// Returns the current head tipset.
    pub fn head_tipset(&self) -> Result<Tipset, Error> {
        self.get_tipset(&self.get_head())
    }

    /// Selects `tipset` as the head of the heaviest chain. The tipset must
    /// already have been recorded with [`ChainStore::put_tipset_and_state`].
    pub fn set_head(&self, tipset: &Tipset) -> Result<(), Error> {
        if !self.has_tipset_and_state(tipset.key()) {
            return Err(Error::UnexpectedState(format!(
                "setting head to a tipset not in the store: {}",
                tipset.key()
            )));
        }
        self.db.write(HEAD_KEY, tipset.key().marshal_cbor()?)?;
        *self.head.write() = tipset.key().clone();
        info!(
            "new heaviest tipset at height {}: {}",
            tipset.height(),
            tipset.key()
        );
        Ok(())
    }

    /// Returns true if any recorded tipset has the given parents and height.
    pub fn has_tipsets_with_parents_and_height(&self, parents: &TipsetKeys, height: u64) -> bool {
        self.tip_index
            .read()
            .has_by_parents_and_height(parents, height)
    }

    /// Returns all recorded tipsets sharing the given parents and height.
    pub fn get_tipsets_by_parents_and_height(
        &self,
        parents: &TipsetKeys,
        height: u64,
    ) -> Vec<TipsetMetadata> {
        self.tip_index
            .read()
            .get_by_parents_and_height(parents, height)
    }
}

impl<DB> TipsetProvider for ChainStore<DB>
where
    DB: Store + Send + Sync,
{
    fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error> {
        ChainStore::get_tipset(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use address::Address;
    use blocks::{Block, Ticket};
    use db::MemoryDB;

    fn template_block(ticket: Vec<u8>, parents: TipsetKeys, height: u64) -> Block {
        Block::builder()
            .miner(Address::new_id(0))
            .ticket(Ticket::new(ticket))
            .parents(parents)
            .height(height)
            .build_and_validate()
            .unwrap()
    }

    fn meta(blk: Block) -> TipsetMetadata {
        let state_root = *blk.state_root();
        TipsetMetadata {
            tipset: Tipset::new(vec![blk]).unwrap(),
            tipset_state_root: state_root,
        }
    }

    fn genesis_store() -> (ChainStore<MemoryDB>, TipsetMetadata) {
        let genesis = template_block(vec![0], TipsetKeys::default(), 0);
        let store = ChainStore::new(MemoryDB::default(), *genesis.cid());
        let genesis_meta = meta(genesis);
        store.put_tipset_and_state(genesis_meta.clone()).unwrap();
        (store, genesis_meta)
    }

    #[test]
    fn put_and_get_tipset() {
        let (store, genesis_meta) = genesis_store();
        let key = genesis_meta.tipset.key();
        assert!(store.has_tipset_and_state(key));
        assert_eq!(store.get_tipset_and_state(key).unwrap(), genesis_meta);
        assert_eq!(
            store.get_tipset_state_root(key).unwrap(),
            genesis_meta.tipset_state_root
        );
    }

    #[test]
    fn get_unknown_key_fails() {
        let (store, _) = genesis_store();
        let missing = template_block(vec![9], TipsetKeys::default(), 9);
        let err = store
            .get_tipset(&TipsetKeys::new(vec![*missing.cid()]))
            .unwrap_err();
        assert!(matches!(err, Error::UndefinedKey(_)));
    }

    #[test]
    fn set_head_requires_stored_tipset() {
        let (store, genesis_meta) = genesis_store();
        let orphan = template_block(vec![7], TipsetKeys::default(), 4);
        let orphan_ts = Tipset::new(vec![orphan]).unwrap();
        assert!(matches!(
            store.set_head(&orphan_ts),
            Err(Error::UnexpectedState(_))
        ));

        store.set_head(&genesis_meta.tipset).unwrap();
        assert_eq!(store.get_head(), *genesis_meta.tipset.key());
        assert_eq!(store.head_tipset().unwrap(), genesis_meta.tipset);
    }

    #[test]
    fn put_persists_blocks_and_record() {
        let (store, genesis_meta) = genesis_store();
        let block_key = genesis_meta.tipset.at(0).cid().to_bytes();
        assert!(store.blockstore().exists(block_key).unwrap());
        let record_key = tipset_record_key(genesis_meta.tipset.key()).unwrap();
        assert!(store.blockstore().exists(record_key).unwrap());
        let index_key = index_record_key(genesis_meta.tipset.parents(), 0).unwrap();
        assert!(store.blockstore().exists(index_key).unwrap());
    }

    #[test]
    fn sibling_lookup() {
        let (store, genesis_meta) = genesis_store();
        let parents = TipsetKeys::new(genesis_meta.tipset.cids().to_vec());
        let s1 = meta(template_block(vec![1], parents.clone(), 1));
        let s2 = meta(template_block(vec![2], parents.clone(), 1));
        store.put_tipset_and_state(s1.clone()).unwrap();
        store.put_tipset_and_state(s2.clone()).unwrap();

        assert!(store.has_tipsets_with_parents_and_height(&parents, 1));
        assert!(!store.has_tipsets_with_parents_and_height(&parents, 2));
        let siblings = store.get_tipsets_by_parents_and_height(&parents, 1);
        assert_eq!(siblings.len(), 2);
        assert!(siblings.contains(&s1));
        assert!(siblings.contains(&s2));
    }
}
