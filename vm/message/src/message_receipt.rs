// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use encoding::Cbor;
use serde::{Deserialize, Serialize};

/// Result of a state transition from a message.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub exit_code: u8,
    #[serde(with = "serde_bytes")]
    pub return_data: Vec<u8>,
    pub gas_used: u64,
}

impl Cbor for MessageReceipt {}
