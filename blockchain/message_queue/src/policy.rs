// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::{Error, MessageQueue};
use blocks::Tipset;
use chain::MessageProvider;
use log::debug;
use message::Message;

/// Updates the outbound queue when the chain head moves.
///
/// The policy is forward-only: messages mined on the chain being added are
/// dequeued, nothing is re-enqueued for messages dropped with the old
/// chain, and messages that have waited longer than the expiry window are
/// purged.
pub struct MessageQueuePolicy<P> {
    // loads block message lists by cid
    messages: P,

    // maximum number of rounds a message may wait in the queue, measured
    // against its enqueue stamp
    max_age: u64,
}

impl<P> MessageQueuePolicy<P>
where
    P: MessageProvider,
{
    /// Creates a policy that loads block messages from `messages` and
    /// expires queued messages older than `max_age` rounds.
    pub fn new(messages: P, max_age: u64) -> Self {
        Self { messages, max_age }
    }

    /// Processes a head change. `old_chain` holds the tipsets removed from
    /// the canonical chain and `new_chain` the tipsets added, both in
    /// height-ascending order.
    ///
    /// Every message mined in `new_chain` that heads its sender's queue is
    /// removed from it, visiting tipsets in height order and blocks in
    /// canonical (ticket) order so consecutive nonces spread across sibling
    /// blocks are consumed correctly. A mined message whose sender queue is
    /// non-empty but heads with a different nonce fails the call with
    /// [`Error::NonceMismatch`].
    ///
    /// After block processing, every sender holding a message stamped
    /// strictly before `new_head_height - max_age` has its queue purged.
    pub fn handle_new_head(
        &self,
        queue: &MessageQueue,
        _old_chain: &[Tipset],
        new_chain: &[Tipset],
    ) -> Result<(), Error> {
        if new_chain.is_empty() {
            // pure truncation, nothing was mined and nothing aged
            return Ok(());
        }
        if new_chain.iter().all(|ts| ts.height() == 0) {
            // a genesis-only update carries no mined messages
            return Ok(());
        }

        for tipset in new_chain {
            for block in tipset.blocks() {
                let mined = self.messages.load_messages(block.messages())?;
                for msg in mined {
                    // `None` means the sender has nothing queued here, so
                    // the message was not ours.
                    if let Some(removed) = queue.remove_next(msg.from(), msg.sequence())? {
                        debug!(
                            "dequeued mined message from {} nonce {}",
                            removed.from(),
                            removed.sequence()
                        );
                    }
                }
            }
        }

        let head_height = new_chain
            .iter()
            .map(Tipset::height)
            .max()
            .unwrap_or_default();
        queue.expire_before(head_height.saturating_sub(self.max_age));
        Ok(())
    }
}
