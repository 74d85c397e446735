// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::{Tipset, TipsetKeys};
use chain::{ChainSelector, Error, StateEvaluator};
use cid::Cid;
use encoding::{new_from_cbor, to_vec, Code::Blake2b256};
use message::{MessageReceipt, SignedMessage};
use parking_lot::RwLock;
use std::collections::HashSet;

/// The weight rule used by the fake collaborators: every block contributes
/// one unit on top of the accumulated parent weight.
pub fn fake_weight(ts: &Tipset) -> u64 {
    ts.parent_weight() + ts.len() as u64
}

/// State evaluator producing deterministic fake state roots, with a switch
/// to reject chosen tipsets for exercising failure paths.
#[derive(Default)]
pub struct FakeStateEvaluator {
    rejected: RwLock<HashSet<TipsetKeys>>,
}

impl FakeStateEvaluator {
    /// Makes the evaluator fail any future transition of the given tipset.
    pub fn reject(&self, key: TipsetKeys) {
        self.rejected.write().insert(key);
    }
}

impl StateEvaluator for FakeStateEvaluator {
    fn run_state_transition(
        &self,
        tipset: &Tipset,
        _messages: &[Vec<SignedMessage>],
        _receipts: &[Vec<MessageReceipt>],
        _ancestors: &[Tipset],
        _parent_weight: u64,
        parent_state_root: &Cid,
    ) -> Result<Cid, Error> {
        if self.rejected.read().contains(tipset.key()) {
            return Err(Error::State("tipset rejected by consensus".to_string()));
        }
        // a distinct digest per (parent state, tipset) pair
        let bz = to_vec(&(parent_state_root, tipset.key()))
            .map_err(|e| Error::State(e.to_string()))?;
        Ok(new_from_cbor(&bz, Blake2b256))
    }
}

/// Chain selector ordering tipsets by [`fake_weight`], ties favoring the
/// current head.
#[derive(Debug, Default)]
pub struct FakeChainSelector;

impl ChainSelector for FakeChainSelector {
    fn is_heavier(
        &self,
        a: &Tipset,
        b: &Tipset,
        _a_parent_state: Option<&Cid>,
        _b_parent_state: Option<&Cid>,
    ) -> Result<bool, Error> {
        Ok(fake_weight(a) > fake_weight(b))
    }

    fn new_weight(&self, ts: &Tipset, _parent_state: Option<&Cid>) -> Result<u64, Error> {
        Ok(fake_weight(ts))
    }
}
