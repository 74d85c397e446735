// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde_cbor::Error as CborError;
use thiserror::Error;

/// Serialization error produced when marshalling or unmarshalling CBOR.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("Cbor error: {0}")]
pub struct Error(String);

impl From<CborError> for Error {
    fn from(e: CborError) -> Self {
        Self(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self(e)
    }
}
