// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::errors::Error;
use cid::Cid;
use multihash_codetable::Code::Blake2b256;
use serde::{de::DeserializeOwned, Serialize};

/// Types that marshal to and from their canonical CBOR representation.
///
/// The default methods route through `serde_cbor`, matching the on-disk
/// encoding used by the stores in this workspace.
pub trait Cbor: Serialize + DeserializeOwned {
    /// Marshals the value into CBOR bytes.
    fn marshal_cbor(&self) -> Result<Vec<u8>, Error> {
        Ok(crate::to_vec(self)?)
    }

    /// Unmarshals CBOR bytes into the value.
    fn unmarshal_cbor(bz: &[u8]) -> Result<Self, Error> {
        Ok(crate::from_slice(bz)?)
    }

    /// Returns the content identifier of the marshalled value.
    fn cid(&self) -> Result<Cid, Error> {
        Ok(crate::new_from_cbor(&self.marshal_cbor()?, Blake2b256))
    }
}

impl<T: Serialize + DeserializeOwned> Cbor for Vec<T> {}
