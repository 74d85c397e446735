// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::TipsetKeys;
use libp2p_identity::PeerId;
use std::fmt;

/// A head tipset as declared by a peer, the unit of work handed to the
/// syncer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainInfo {
    /// The peer that sent us the head.
    pub peer: PeerId,
    /// Canonical key of the declared head tipset.
    pub head: TipsetKeys,
    /// Claimed chain height of the head.
    pub height: u64,
}

impl ChainInfo {
    pub fn new(peer: PeerId, head: TipsetKeys, height: u64) -> Self {
        Self { peer, head, height }
    }
}

impl fmt::Display for ChainInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "peer={} height={} head={}",
            self.peer, self.height, self.head
        )
    }
}
