// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use blocks::Error as BlocksError;
use db::Error as DbError;
use encoding::Error as EncodingError;
use thiserror::Error;

/// Chain store and chain traversal error.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Key was not found in the chain store.
    #[error("Invalid tipset key: {0}")]
    UndefinedKey(String),
    /// The store violates one of its invariants.
    #[error("the chain store is in an unexpected state: {0}")]
    UnexpectedState(String),
    /// Error originating from the blocks crate.
    #[error("{0}")]
    Blockchain(#[from] BlocksError),
    /// Error originating from encoding chain data.
    #[error("{0}")]
    Encoding(String),
    /// Error originating from the key-value store.
    #[error("{0}")]
    KeyValueStore(String),
    /// The state evaluator rejected a tipset.
    #[error("state error: {0}")]
    State(String),
    /// The fetcher could not retrieve a chain segment.
    #[error("fetch error: {0}")]
    Fetch(String),
    /// Two chain heads share no ancestor; with a shared genesis this
    /// indicates corruption.
    #[error("no common ancestor between chain heads")]
    NoCommonAncestor,
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        Self::KeyValueStore(e.to_string())
    }
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e.to_string())
    }
}
