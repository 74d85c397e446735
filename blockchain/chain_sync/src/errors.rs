// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::Error as BlocksError;
use chain::Error as StoreError;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The declared head is ahead of the local head by more than the
    /// untrusted chain length limit.
    #[error("input chain forked from best chain too far in the past")]
    ChainTooLong,
    /// The input chain contains a tipset already known to be invalid.
    #[error("input chain contains a cached bad tipset")]
    BadTipset,
    /// The chain store violates an invariant the syncer relies on. The
    /// surrounding process should stop writing to the store.
    #[error("the chain store is in an unexpected state: {0}")]
    UnexpectedStoreState(String),
    /// The sync was cancelled before completing.
    #[error("sync cancelled")]
    Cancelled,
    /// Error originating from constructing blockchain structures.
    #[error("{0}")]
    Blockchain(#[from] BlocksError),
    /// Error from the chain store or one of the sync collaborators.
    #[error("{0}")]
    Store(StoreError),
    /// Any other error that does not need to be specifically handled.
    #[error("{0}")]
    Other(String),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnexpectedState(s) => Self::UnexpectedStoreState(s),
            other => Self::Store(other),
        }
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::Other(e)
    }
}
