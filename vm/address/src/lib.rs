// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;

pub use errors::Error;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the payload hash carried by a secp256k1 address.
pub const PAYLOAD_HASH_LEN: usize = 20;

/// Protocol discriminator of an [`Address`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Protocol {
    /// Actor ID assigned by the init actor.
    ID = 0,
    /// Hash of a secp256k1 public key.
    Secp256k1 = 1,
}

/// Identity of an actor on chain. Used to partition the outbound message
/// queue by sender and to attribute blocks to miners.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    protocol: Protocol,
    #[serde(with = "serde_bytes")]
    payload: Vec<u8>,
}

impl Address {
    /// Creates an address for the given actor ID.
    pub fn new_id(id: u64) -> Self {
        Self {
            protocol: Protocol::ID,
            payload: id.to_be_bytes().to_vec(),
        }
    }

    /// Creates an address from a 20 byte secp256k1 public key hash.
    pub fn new_secp256k1(key_hash: &[u8]) -> Result<Self, Error> {
        if key_hash.len() != PAYLOAD_HASH_LEN {
            return Err(Error::InvalidPayload(key_hash.len()));
        }
        Ok(Self {
            protocol: Protocol::Secp256k1,
            payload: key_hash.to_vec(),
        })
    }

    /// Returns the protocol of the address.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the raw payload of the address.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol {
            Protocol::ID => {
                let id = self
                    .payload
                    .iter()
                    .fold(0u64, |id, b| id << 8 | u64::from(*b));
                write!(f, "f0{id}")
            }
            Protocol::Secp256k1 => {
                write!(f, "f1")?;
                for b in &self.payload {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}
