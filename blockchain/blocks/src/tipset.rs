// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Block, Error, Ticket};
use cid::Cid;
use encoding::Cbor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A set of CIDs forming a unique key for a tipset.
///
/// The CIDs are kept sorted, so equal sets of blocks always produce equal
/// keys. Note that this is *not* the canonical iteration order of the blocks
/// in a tipset, which is by ticket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TipsetKeys {
    cids: Vec<Cid>,
}

impl TipsetKeys {
    /// Creates a key from the given CIDs, sorting and de-duplicating them.
    pub fn new(mut cids: Vec<Cid>) -> Self {
        cids.sort();
        cids.dedup();
        Self { cids }
    }

    /// Returns the block cids forming the key.
    pub fn cids(&self) -> &[Cid] {
        &self.cids
    }

    /// Returns true for the key of the undefined tipset, the parent of
    /// genesis.
    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }
}

impl Cbor for TipsetKeys {}

impl fmt::Display for TipsetKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cid) in self.cids.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{cid}")?;
        }
        write!(f, "}}")
    }
}

/// An immutable set of sibling blocks at the same height with the same
/// parent set. Blocks in a tipset are canonically ordered by ticket,
/// ties broken by block CID.
///
/// The absent tipset (the parent of genesis) is represented as
/// `Option::<Tipset>::None` by callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tipset {
    blocks: Vec<Block>,
    key: TipsetKeys,
}

#[allow(clippy::len_without_is_empty)]
impl Tipset {
    /// Builds a new tipset from a collection of blocks.
    ///
    /// A valid tipset contains a non-empty collection of blocks with
    /// distinct CIDs that all specify identical height, parents and parent
    /// weight.
    pub fn new(blocks: Vec<Block>) -> Result<Self, Error> {
        if blocks.is_empty() {
            return Err(Error::NoBlocks);
        }

        let first = &blocks[0];
        for blk in &blocks[1..] {
            if blk.parents() != first.parents() {
                return Err(Error::InvalidTipset("parent cids are not equal".to_string()));
            }
            if blk.height() != first.height() {
                return Err(Error::InvalidTipset("heights are not equal".to_string()));
            }
            if blk.parent_weight() != first.parent_weight() {
                return Err(Error::InvalidTipset(
                    "parent weights are not equal".to_string(),
                ));
            }
        }

        let cids: Vec<Cid> = blocks.iter().map(|blk| *blk.cid()).collect();
        let key = TipsetKeys::new(cids);
        if key.cids().len() != blocks.len() {
            return Err(Error::InvalidTipset("duplicate block cids".to_string()));
        }

        let mut sorted_blocks = blocks;
        sorted_blocks.sort_by_key(Block::to_sort_key);

        Ok(Self {
            blocks: sorted_blocks,
            key,
        })
    }

    /// Returns the block at index `i` in canonical order.
    ///
    /// Panics if the index is out of range.
    pub fn at(&self, i: usize) -> &Block {
        &self.blocks[i]
    }
    /// Returns all blocks in the tipset in canonical order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
    /// Consumes the tipset, returning its blocks in canonical order.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
    /// Returns the number of blocks in the tipset.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    /// Returns a key for the tipset.
    pub fn key(&self) -> &TipsetKeys {
        &self.key
    }
    /// Returns the CIDs of the blocks in the tipset, sorted.
    pub fn cids(&self) -> &[Cid] {
        self.key.cids()
    }
    /// Returns the key of the parents of the blocks in the tipset.
    pub fn parents(&self) -> &TipsetKeys {
        self.blocks[0].parents()
    }
    /// Returns the height shared by all blocks in the tipset.
    pub fn height(&self) -> u64 {
        self.blocks[0].height()
    }
    /// Returns the aggregate weight of the parent set claimed by the blocks.
    pub fn parent_weight(&self) -> u64 {
        self.blocks[0].parent_weight()
    }
    /// Returns the smallest ticket of all blocks in the tipset.
    pub fn min_ticket(&self) -> &Ticket {
        self.blocks[0].ticket()
    }
}

impl fmt::Display for Tipset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tipset: height {} {}", self.height(), self.key())
    }
}
