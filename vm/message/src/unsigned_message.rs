// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Message;
use address::Address;
use derive_builder::Builder;
use encoding::Cbor;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Default transaction message with the actor method call it carries.
///
/// Usage:
/// ```
/// use message::UnsignedMessage;
/// use address::Address;
///
/// UnsignedMessage::builder()
///     .to(Address::new_id(0))
///     .from(Address::new_id(1))
///     .sequence(0) // optional
///     .value(0u8.into()) // optional
///     .method_num(0) // optional
///     .params(Vec::new()) // optional
///     .gas_limit(0) // optional
///     .gas_price(0u8.into()) // optional
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(name = "MessageBuilder")]
pub struct UnsignedMessage {
    to: Address,
    from: Address,
    #[builder(default)]
    sequence: u64,
    #[builder(default)]
    value: BigInt,
    #[builder(default)]
    method_num: u64,
    #[builder(default)]
    #[serde(with = "serde_bytes")]
    params: Vec<u8>,
    #[builder(default)]
    gas_price: BigInt,
    #[builder(default)]
    gas_limit: u64,
}

impl UnsignedMessage {
    /// Generates an unsigned message builder as a constructor.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }
}

impl Message for UnsignedMessage {
    fn from(&self) -> &Address {
        &self.from
    }
    fn to(&self) -> &Address {
        &self.to
    }
    fn sequence(&self) -> u64 {
        self.sequence
    }
    fn value(&self) -> &BigInt {
        &self.value
    }
    fn method_num(&self) -> u64 {
        self.method_num
    }
    fn params(&self) -> &[u8] {
        &self.params
    }
    fn gas_price(&self) -> &BigInt {
        &self.gas_price
    }
    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }
}

impl Cbor for UnsignedMessage {}
