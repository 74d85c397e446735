// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod policy;
mod queue;

pub use self::errors::Error;
pub use self::policy::MessageQueuePolicy;
pub use self::queue::{MessageQueue, Queued};
