// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Message, Signature, UnsignedMessage};
use address::Address;
use encoding::Cbor;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Represents a wrapped message with signature bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    message: UnsignedMessage,
    signature: Signature,
}

impl SignedMessage {
    pub fn new(message: UnsignedMessage, signature: Signature) -> Self {
        Self { message, signature }
    }

    pub fn message(&self) -> &UnsignedMessage {
        &self.message
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl Message for SignedMessage {
    fn from(&self) -> &Address {
        self.message.from()
    }
    fn to(&self) -> &Address {
        self.message.to()
    }
    fn sequence(&self) -> u64 {
        self.message.sequence()
    }
    fn value(&self) -> &BigInt {
        self.message.value()
    }
    fn method_num(&self) -> u64 {
        self.message.method_num()
    }
    fn params(&self) -> &[u8] {
        self.message.params()
    }
    fn gas_price(&self) -> &BigInt {
        self.message.gas_price()
    }
    fn gas_limit(&self) -> u64 {
        self.message.gas_limit()
    }
}

impl Cbor for SignedMessage {}
