// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod ancestors;
mod providers;
mod store;

pub use self::ancestors::*;
pub use self::providers::*;
pub use self::store::*;
