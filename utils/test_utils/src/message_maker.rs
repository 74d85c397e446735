// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use address::Address;
use message::{MessageReceipt, Signature, SignedMessage, UnsignedMessage};

/// Generates signed messages from a fixed set of sender addresses. The
/// signatures are deterministic stand-ins, not real signatures.
pub struct MessageMaker {
    addresses: Vec<Address>,
}

impl MessageMaker {
    /// Creates a maker with `count` distinct sender addresses.
    pub fn new(count: usize) -> Self {
        Self {
            addresses: (0..count)
                .map(|i| Address::new_id(100 + i as u64))
                .collect(),
        }
    }

    /// Returns the sender addresses this maker signs for.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Creates a signed message from `from` with the given nonce.
    pub fn signed_message(&self, from: &Address, nonce: u64) -> SignedMessage {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(from.clone())
            .sequence(nonce)
            .gas_limit(1000)
            .build()
            .expect("message maker produced an invalid message");
        let mut sig = format!("signature of {from}").into_bytes();
        sig.extend(nonce.to_be_bytes());
        SignedMessage::new(message, Signature::new(sig))
    }
}

/// Returns `n` empty receipts, one per mined message.
pub fn empty_receipts(n: usize) -> Vec<MessageReceipt> {
    vec![MessageReceipt::default(); n]
}
