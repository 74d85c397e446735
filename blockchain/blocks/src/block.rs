// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, Ticket, TipsetKeys};
use address::Address;
use cid::Cid;
use derive_builder::Builder;
use encoding::{new_from_cbor, Cbor, Code::Blake2b256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single block mined at one height, immutable once constructed.
///
/// Usage:
/// ```
/// use blocks::{Block, Ticket, TipsetKeys};
/// use address::Address;
///
/// Block::builder()
///     .miner(Address::new_id(0)) // required
///     .ticket(Ticket::new(vec![1])) // optional
///     .parents(TipsetKeys::default()) // optional
///     .parent_weight(0) // optional
///     .height(0) // optional
///     .timestamp(0) // optional
///     .build_and_validate()
///     .unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
#[builder(name = "BlockBuilder")]
pub struct Block {
    // CHAIN LINKING
    /// The set of parents this block was based on. Typically one, but can be
    /// several in the case where there were multiple winning ticket holders
    /// for a round.
    #[builder(default)]
    parents: TipsetKeys,

    /// Aggregate chain weight of the parent set.
    #[builder(default)]
    parent_weight: u64,

    /// Round in which this block was mined.
    #[builder(default)]
    height: u64,

    // MINER INFO
    /// Address of the miner actor that mined this block.
    miner: Address,

    /// The ticket submitted with this block.
    #[builder(default)]
    ticket: Ticket,

    // STATE
    /// CID of the root of the list of messages carried by this block.
    #[builder(default)]
    messages: Cid,

    /// CID of the root of the list of receipts for those messages.
    #[builder(default)]
    message_receipts: Cid,

    /// CID of the chain state after applying the parent tipset.
    #[builder(default)]
    state_root: Cid,

    /// Seconds since the Unix epoch at which this block was mined.
    #[builder(default)]
    timestamp: u64,

    // CACHE
    /// Stores the cid of the block, computed when the block is built.
    #[builder(default, setter(skip))]
    cached_cid: Cid,

    /// Stores the marshalled bytes of the block, computed when it is built.
    #[builder(default, setter(skip))]
    cached_bytes: Vec<u8>,
}

impl BlockBuilder {
    /// Builds the block and caches its serialized form and CID.
    pub fn build_and_validate(&self) -> Result<Block, Error> {
        let mut block = self
            .build()
            .map_err(|e| Error::InvalidBlock(e.to_string()))?;
        block.update_cache()?;
        Ok(block)
    }
}

impl Block {
    /// Generates a block builder as a constructor.
    pub fn builder() -> BlockBuilder {
        BlockBuilder::default()
    }
    /// Getter for block parents.
    pub fn parents(&self) -> &TipsetKeys {
        &self.parents
    }
    /// Getter for the weight of the parent set.
    pub fn parent_weight(&self) -> u64 {
        self.parent_weight
    }
    /// Getter for block height.
    pub fn height(&self) -> u64 {
        self.height
    }
    /// Getter for the miner address.
    pub fn miner(&self) -> &Address {
        &self.miner
    }
    /// Getter for the block ticket.
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }
    /// Getter for the message list CID.
    pub fn messages(&self) -> &Cid {
        &self.messages
    }
    /// Getter for the receipt list CID.
    pub fn message_receipts(&self) -> &Cid {
        &self.message_receipts
    }
    /// Getter for the state root.
    pub fn state_root(&self) -> &Cid {
        &self.state_root
    }
    /// Getter for the block timestamp.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
    /// Getter for the block CID, cached when the block was built.
    pub fn cid(&self) -> &Cid {
        &self.cached_cid
    }
    /// Key used for sorting blocks inside a tipset.
    pub fn to_sort_key(&self) -> (Vec<u8>, Vec<u8>) {
        (self.ticket.vrfproof.clone(), self.cached_cid.to_bytes())
    }

    fn update_cache(&mut self) -> Result<(), Error> {
        self.cached_bytes = self.marshal_cbor()?;
        self.cached_cid = new_from_cbor(&self.cached_bytes, Blake2b256);
        Ok(())
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.parents,
            &self.parent_weight,
            &self.height,
            &self.miner,
            &self.ticket,
            &self.messages,
            &self.message_receipts,
            &self.state_root,
            &self.timestamp,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (
            parents,
            parent_weight,
            height,
            miner,
            ticket,
            messages,
            message_receipts,
            state_root,
            timestamp,
        ) = Deserialize::deserialize(deserializer)?;

        Block::builder()
            .parents(parents)
            .parent_weight(parent_weight)
            .height(height)
            .miner(miner)
            .ticket(ticket)
            .messages(messages)
            .message_receipts(message_receipts)
            .state_root(state_root)
            .timestamp(timestamp)
            .build_and_validate()
            .map_err(serde::de::Error::custom)
    }
}

impl Cbor for Block {}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block: {}", self.cid())
    }
}
