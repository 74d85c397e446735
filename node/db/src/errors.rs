// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Error returned by a key-value store backend.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Error(String);

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self(e)
    }
}
