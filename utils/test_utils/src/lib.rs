// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Fixtures for exercising the chain syncer and the message queue policy:
//! a deterministic fake-chain builder that doubles as tipset provider,
//! fetcher and message provider, plus fake consensus collaborators.

mod chain_builder;
mod fakes;
mod message_maker;

pub use chain_builder::{BlockOpts, ChainBuilder};
pub use fakes::{fake_weight, FakeChainSelector, FakeStateEvaluator};
pub use message_maker::{empty_receipts, MessageMaker};
