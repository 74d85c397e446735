// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

/// A Ticket is a marker of a tick of the blockchain's clock. It is the
/// source of randomness for leader election and defines the canonical order
/// of sibling blocks inside a tipset: blocks sort by the raw ticket bytes,
/// ties broken by block CID.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Ticket {
    /// A proof output by running a VRF on the parent ticket.
    #[serde(with = "serde_bytes")]
    pub vrfproof: Vec<u8>,
}

impl Ticket {
    /// Ticket constructor
    pub fn new(vrfproof: Vec<u8>) -> Self {
        Self { vrfproof }
    }
}
