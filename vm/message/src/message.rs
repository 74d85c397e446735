// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use address::Address;
use num_bigint::BigInt;

/// Message interface to interact with signed and unsigned messages in a
/// generic context.
pub trait Message {
    /// Returns the from address of the message.
    fn from(&self) -> &Address;
    /// Returns the destination address of the message.
    fn to(&self) -> &Address;
    /// Returns the message sequence or nonce.
    fn sequence(&self) -> u64;
    /// Returns the amount sent in message.
    fn value(&self) -> &BigInt;
    /// Returns the method number to be called.
    fn method_num(&self) -> u64;
    /// Returns the encoded parameters for the method call.
    fn params(&self) -> &[u8];
    /// Returns the gas price for the message.
    fn gas_price(&self) -> &BigInt;
    /// Returns the gas limit for the message.
    fn gas_limit(&self) -> u64;
}
