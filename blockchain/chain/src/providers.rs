// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::Error;
use async_trait::async_trait;
use blocks::{Tipset, TipsetKeys};
use cid::Cid;
use libp2p_identity::PeerId;
use message::{MessageReceipt, SignedMessage};
use std::sync::Arc;

/// Anything that can resolve a tipset key into the tipset it names, such as
/// the chain store or a networked block source.
pub trait TipsetProvider: Send + Sync {
    /// Returns the tipset identified by `key`.
    fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error>;
}

/// Networked block fetching service for retrieving chain segments.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the chain of tipsets starting at `head` and walking parents,
    /// in traversal (child-first) order. `done` is invoked on every fetched
    /// tipset; fetching stops once it returns true, and the tipset it
    /// stopped on is included in the result.
    async fn fetch_tipsets(
        &self,
        head: &TipsetKeys,
        peer: &PeerId,
        done: &(dyn for<'r> Fn(&'r Tipset) -> Result<bool, Error> + Send + Sync),
    ) -> Result<Vec<Tipset>, Error>;
}

/// Runs consensus state transitions over tipsets.
pub trait StateEvaluator: Send + Sync {
    /// Returns the state root resulting from applying `tipset` to the prior
    /// `parent_state_root`. `messages` and `receipts` hold one list per
    /// block of the tipset, in canonical block order. An error means the
    /// tipset is invalid by consensus.
    fn run_state_transition(
        &self,
        tipset: &Tipset,
        messages: &[Vec<SignedMessage>],
        receipts: &[Vec<MessageReceipt>],
        ancestors: &[Tipset],
        parent_weight: u64,
        parent_state_root: &Cid,
    ) -> Result<Cid, Error>;
}

/// Totally orders tipsets by chain weight. Parent states are `None` for
/// tipsets whose parent is undefined (genesis).
pub trait ChainSelector: Send + Sync {
    /// Returns true if tipset `a` is strictly heavier than tipset `b`. Ties
    /// favor `b`, the current head.
    fn is_heavier(
        &self,
        a: &Tipset,
        b: &Tipset,
        a_parent_state: Option<&Cid>,
        b_parent_state: Option<&Cid>,
    ) -> Result<bool, Error>;

    /// Returns the weight of `ts` given its parent state.
    fn new_weight(&self, ts: &Tipset, parent_state: Option<&Cid>) -> Result<u64, Error>;
}

/// Provides message and receipt collections given their list CIDs.
pub trait MessageProvider: Send + Sync {
    /// Loads the signed messages named by the given list CID.
    fn load_messages(&self, cid: &Cid) -> Result<Vec<SignedMessage>, Error>;
    /// Loads the receipts named by the given list CID.
    fn load_receipts(&self, cid: &Cid) -> Result<Vec<MessageReceipt>, Error>;
}

impl<T: TipsetProvider> TipsetProvider for Arc<T> {
    fn get_tipset(&self, key: &TipsetKeys) -> Result<Tipset, Error> {
        (**self).get_tipset(key)
    }
}

#[async_trait]
impl<T: Fetcher> Fetcher for Arc<T> {
    async fn fetch_tipsets(
        &self,
        head: &TipsetKeys,
        peer: &PeerId,
        done: &(dyn for<'r> Fn(&'r Tipset) -> Result<bool, Error> + Send + Sync),
    ) -> Result<Vec<Tipset>, Error> {
        (**self).fetch_tipsets(head, peer, done).await
    }
}

impl<T: StateEvaluator> StateEvaluator for Arc<T> {
    fn run_state_transition(
        &self,
        tipset: &Tipset,
        messages: &[Vec<SignedMessage>],
        receipts: &[Vec<MessageReceipt>],
        ancestors: &[Tipset],
        parent_weight: u64,
        parent_state_root: &Cid,
    ) -> Result<Cid, Error> {
        (**self).run_state_transition(
            tipset,
            messages,
            receipts,
            ancestors,
            parent_weight,
            parent_state_root,
        )
    }
}

impl<T: ChainSelector> ChainSelector for Arc<T> {
    fn is_heavier(
        &self,
        a: &Tipset,
        b: &Tipset,
        a_parent_state: Option<&Cid>,
        b_parent_state: Option<&Cid>,
    ) -> Result<bool, Error> {
        (**self).is_heavier(a, b, a_parent_state, b_parent_state)
    }

    fn new_weight(&self, ts: &Tipset, parent_state: Option<&Cid>) -> Result<u64, Error> {
        (**self).new_weight(ts, parent_state)
    }
}

impl<T: MessageProvider> MessageProvider for Arc<T> {
    fn load_messages(&self, cid: &Cid) -> Result<Vec<SignedMessage>, Error> {
        (**self).load_messages(cid)
    }

    fn load_receipts(&self, cid: &Cid) -> Result<Vec<MessageReceipt>, Error> {
        (**self).load_receipts(cid)
    }
}
