// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod cbor;
mod errors;

pub use self::cbor::*;
pub use self::errors::*;

pub use multihash_codetable::Code;
pub use serde_cbor::{from_slice, to_vec};

use cid::Cid;
use multihash_codetable::MultihashDigest;

/// Multicodec identifier for DagCBOR encoded data.
pub const DAG_CBOR: u64 = 0x71;

/// Constructs a v1 `Cid` for a DagCBOR encoded payload using the given
/// multihash code.
pub fn new_from_cbor(bz: &[u8], code: Code) -> Cid {
    Cid::new_v1(DAG_CBOR, code.digest(bz))
}
