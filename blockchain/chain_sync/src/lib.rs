// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod bad_tipset_cache;
mod errors;
mod status;
mod sync;

pub use self::bad_tipset_cache::BadTipsetCache;
pub use self::errors::Error;
pub use self::status::*;
pub use self::sync::*;
