// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod message;
mod message_receipt;
mod signature;
mod signed_message;
mod unsigned_message;

pub use crate::message::Message;
pub use crate::message_receipt::MessageReceipt;
pub use crate::signature::Signature;
pub use crate::signed_message::SignedMessage;
pub use crate::unsigned_message::UnsignedMessage;
