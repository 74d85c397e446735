// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use address::Address;
use async_trait::async_trait;
use blocks::{Block, Ticket, Tipset, TipsetKeys};
use chain::{Error, Fetcher, MessageProvider, TipsetProvider};
use cid::Cid;
use encoding::{new_from_cbor, to_vec, Cbor, Code::Blake2b256};
use libp2p_identity::PeerId;
use message::{MessageReceipt, SignedMessage};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Options applied to a block while the chain builder generates it.
#[derive(Default)]
pub struct BlockOpts {
    messages: Vec<SignedMessage>,
    receipts: Vec<MessageReceipt>,
    height_offset: u64,
    ticket: Option<Vec<u8>>,
    timestamp: Option<u64>,
}

impl BlockOpts {
    /// Adds messages and their receipts to the block.
    pub fn add_messages(&mut self, messages: Vec<SignedMessage>, receipts: Vec<MessageReceipt>) {
        self.messages.extend(messages);
        self.receipts.extend(receipts);
    }

    /// Raises the block's height, implying null rounds before it is mined.
    pub fn inc_height(&mut self, null_rounds: u64) {
        self.height_offset += null_rounds;
    }

    /// Overrides the generated ticket.
    pub fn set_ticket(&mut self, ticket: Vec<u8>) {
        self.ticket = Some(ticket);
    }

    /// Overrides the generated timestamp.
    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = Some(timestamp);
    }
}

/// Builds fake chains and acts as a provider and fetcher for the chain thus
/// generated. All blocks are unique (even if they share parents) and form
/// valid chains of parents and heights, but do not carry valid tickets.
/// Each block contributes a weight of one.
///
/// State root CIDs are digests over the parents and messages of a block;
/// they are distinct but not roots of any real state tree.
pub struct ChainBuilder {
    miner: Address,
    // for unique tickets and timestamps
    seq: AtomicU64,
    blocks: RwLock<HashMap<Cid, Block>>,
    messages: RwLock<HashMap<Cid, Vec<SignedMessage>>>,
    receipts: RwLock<HashMap<Cid, Vec<MessageReceipt>>>,
}

impl ChainBuilder {
    /// Builds a new chain faker generating blocks with `miner` as the miner
    /// address.
    pub fn new(miner: Address) -> Self {
        Self {
            miner,
            seq: AtomicU64::new(0),
            blocks: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            receipts: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a genesis tipset at height zero with no messages.
    pub fn new_genesis(&self) -> Tipset {
        self.build_one_on(None, |_| {})
    }

    /// Creates a tipset of `width` empty blocks on top of `parent`.
    pub fn append_on(&self, parent: &Tipset, width: usize) -> Tipset {
        self.build_on(Some(parent), width, |_, _| {})
    }

    /// Creates a chain of `count` single-block tipsets on top of `parent`
    /// and returns the new head.
    pub fn append_many_on(&self, count: usize, parent: &Tipset) -> Tipset {
        let mut head = parent.clone();
        for _ in 0..count {
            head = self.append_on(&head, 1);
        }
        head
    }

    /// Creates a tipset of `width` blocks on top of `parent`, invoking
    /// `build` to modify each block before it is stored.
    pub fn build_on(
        &self,
        parent: Option<&Tipset>,
        width: usize,
        mut build: impl FnMut(&mut BlockOpts, usize),
    ) -> Tipset {
        let blocks = (0..width)
            .map(|i| self.build_block_on(parent, |opts| build(opts, i)))
            .collect();
        Tipset::new(blocks).expect("chain builder produced an invalid tipset")
    }

    /// Creates a single-block tipset on top of `parent`. See
    /// [`ChainBuilder::build_on`].
    pub fn build_one_on(
        &self,
        parent: Option<&Tipset>,
        build: impl FnOnce(&mut BlockOpts),
    ) -> Tipset {
        let mut build = Some(build);
        self.build_on(parent, 1, |opts, _| {
            if let Some(build) = build.take() {
                build(opts);
            }
        })
    }

    /// Creates and stores a block on top of `parent`, invoking `build` to
    /// modify it before it is stored.
    pub fn build_block_on(
        &self,
        parent: Option<&Tipset>,
        build: impl FnOnce(&mut BlockOpts),
    ) -> Block {
        let mut opts = BlockOpts::default();
        build(&mut opts);

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let (parents, base_height, parent_weight) = match parent {
            Some(p) => (
                p.key().clone(),
                p.height() + 1,
                p.parent_weight() + p.len() as u64,
            ),
            None => (TipsetKeys::default(), 0, 0),
        };

        let messages_cid = self.put_messages(opts.messages);
        let receipts_cid = self.put_receipts(opts.receipts);
        let state_root = compute_fake_state_root(&parents, &messages_cid);

        let block = Block::builder()
            .miner(self.miner.clone())
            .ticket(Ticket::new(
                opts.ticket.unwrap_or_else(|| seq.to_be_bytes().to_vec()),
            ))
            .parents(parents)
            .parent_weight(parent_weight)
            .height(base_height + opts.height_offset)
            .messages(messages_cid)
            .message_receipts(receipts_cid)
            .state_root(state_root)
            .timestamp(opts.timestamp.unwrap_or(seq))
            .build_and_validate()
            .expect("chain builder produced an invalid block");

        self.blocks.write().insert(*block.cid(), block.clone());
        block
    }

    fn put_messages(&self, messages: Vec<SignedMessage>) -> Cid {
        let cid = messages
            .cid()
            .expect("failed to address a message list");
        self.messages.write().insert(cid, messages);
        cid
    }

    fn put_receipts(&self, receipts: Vec<MessageReceipt>) -> Cid {
        let cid = receipts
            .cid()
            .expect("failed to address a receipt list");
        self.receipts.write().insert(cid, receipts);
        cid
    }
}

// A fake state root digest over a block's parents and messages.
fn compute_fake_state_root(parents: &TipsetKeys, messages: &Cid) -> Cid {
    let bz = to_vec(&(parents, messages)).expect("failed to encode fake state");
    new_from_cbor(&bz, Blake2b256)
}

impl TipsetProvider for ChainBuilder {
    fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error> {
        let blocks = self.blocks.read();
        let members = key
            .cids()
            .iter()
            .map(|cid| {
                blocks
                    .get(cid)
                    .cloned()
                    .ok_or_else(|| Error::UndefinedKey(format!("no block {cid}")))
            })
            .collect::<Result<Vec<Block>, Error>>()?;
        Ok(Tipset::new(members)?)
    }
}

#[async_trait]
impl Fetcher for ChainBuilder {
    async fn fetch_tipsets(
        &self,
        head: &TipsetKeys,
        _peer: &PeerId,
        done: &(dyn for<'r> Fn(&'r Tipset) -> Result<bool, Error> + Send + Sync),
    ) -> Result<Vec<Tipset>, Error> {
        let mut fetched = Vec::new();
        let mut key = head.clone();
        loop {
            let ts = self
                .get_tipset(&key)
                .map_err(|e| Error::Fetch(e.to_string()))?;
            let stop = done(&ts)?;
            key = ts.parents().clone();
            fetched.push(ts);
            if stop {
                return Ok(fetched);
            }
            if key.is_empty() {
                return Err(Error::Fetch(
                    "chain has no ancestor with known parents".to_string(),
                ));
            }
        }
    }
}

impl MessageProvider for ChainBuilder {
    fn load_messages(&self, cid: &Cid) -> Result<Vec<SignedMessage>, Error> {
        self.messages
            .read()
            .get(cid)
            .cloned()
            .ok_or_else(|| Error::UndefinedKey(format!("no message list {cid}")))
    }

    fn load_receipts(&self, cid: &Cid) -> Result<Vec<MessageReceipt>, Error> {
        self.receipts
            .read()
            .get(cid)
            .cloned()
            .ok_or_else(|| Error::UndefinedKey(format!("no receipt list {cid}")))
    }
}
