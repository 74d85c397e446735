// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod block;
mod chain_info;
mod errors;
mod ticket;
mod tipset;

pub use block::*;
pub use chain_info::*;
pub use errors::*;
pub use ticket::*;
pub use tipset::*;
