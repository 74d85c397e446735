// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use chain::Error as ChainError;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The head of a sender's queue does not carry the nonce expected by
    /// the caller.
    #[error("removing message with nonce {got}, expected {expected}")]
    NonceMismatch { got: u64, expected: u64 },
    /// Enqueuing would break the ascending per-sender nonce order.
    #[error("message nonce {got} is not above the highest queued nonce {largest}")]
    OutOfOrderNonce { got: u64, largest: u64 },
    /// A block's message list could not be loaded.
    #[error("{0}")]
    Provider(#[from] ChainError),
}
