// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use super::Error;
use address::Address;
use message::{Message, SignedMessage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// A message in the outbound queue together with the head height observed
/// when it was enqueued, used for expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queued {
    pub msg: SignedMessage,
    pub stamp: u64,
}

/// Pending outbound messages, partitioned by sender and ordered by
/// ascending nonce within each partition.
///
/// The internal lock makes `enqueue` and the policy's head-change
/// processing mutually exclusive; the queue itself is driven by a single
/// policy actor.
#[derive(Debug, Default)]
pub struct MessageQueue {
    pending: Mutex<HashMap<Address, VecDeque<Queued>>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to its sender's queue, stamped with the given
    /// value. The nonce must be above every nonce already queued for the
    /// sender; gap-free numbering is the enqueuing caller's concern.
    pub fn enqueue(&self, msg: SignedMessage, stamp: u64) -> Result<(), Error> {
        let mut pending = self.pending.lock();
        let queue = pending.entry(msg.from().clone()).or_default();
        if let Some(last) = queue.back() {
            if msg.sequence() <= last.msg.sequence() {
                return Err(Error::OutOfOrderNonce {
                    got: msg.sequence(),
                    largest: last.msg.sequence(),
                });
            }
        }
        queue.push_back(Queued { msg, stamp });
        Ok(())
    }

    /// Returns the sender's pending messages in ascending nonce order.
    pub fn list(&self, sender: &Address) -> Vec<Queued> {
        self.pending
            .lock()
            .get(sender)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes and returns the head of the sender's queue, which must carry
    /// `expected_nonce`. Returns `None` when the sender has nothing queued;
    /// fails with [`Error::NonceMismatch`] when the head carries any other
    /// nonce.
    pub fn remove_next(
        &self,
        sender: &Address,
        expected_nonce: u64,
    ) -> Result<Option<SignedMessage>, Error> {
        let mut pending = self.pending.lock();
        let queue = match pending.get_mut(sender) {
            Some(queue) if !queue.is_empty() => queue,
            _ => return Ok(None),
        };
        let head_nonce = queue[0].msg.sequence();
        if head_nonce != expected_nonce {
            return Err(Error::NonceMismatch {
                got: head_nonce,
                expected: expected_nonce,
            });
        }
        let removed = queue.pop_front().map(|queued| queued.msg);
        if queue.is_empty() {
            pending.remove(sender);
        }
        Ok(removed)
    }

    /// Purges the whole queue of every sender whose oldest entry was
    /// stamped strictly before `stamp`. Removing only the aged entries
    /// would strand the later nonces behind a gap, so expiry takes the
    /// whole partition. Returns the purged messages by sender.
    pub fn expire_before(&self, stamp: u64) -> HashMap<Address, Vec<SignedMessage>> {
        let mut pending = self.pending.lock();
        let mut expired = HashMap::new();
        pending.retain(|sender, queue| {
            match queue.front() {
                Some(head) if head.stamp < stamp => {
                    expired.insert(
                        sender.clone(),
                        queue.drain(..).map(|queued| queued.msg).collect(),
                    );
                    false
                }
                _ => true,
            }
        });
        expired
    }

    /// Returns the number of messages queued for the sender.
    pub fn size(&self, sender: &Address) -> usize {
        self.pending
            .lock()
            .get(sender)
            .map(VecDeque::len)
            .unwrap_or_default()
    }

    /// Returns the highest nonce queued for the sender.
    pub fn largest_nonce(&self, sender: &Address) -> Option<u64> {
        self.pending
            .lock()
            .get(sender)
            .and_then(|queue| queue.back().map(|queued| queued.msg.sequence()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message::{Signature, UnsignedMessage};

    fn msg(from: u64, nonce: u64) -> SignedMessage {
        let message = UnsignedMessage::builder()
            .to(Address::new_id(1))
            .from(Address::new_id(from))
            .sequence(nonce)
            .build()
            .unwrap();
        SignedMessage::new(message, Signature::default())
    }

    #[test]
    fn enqueue_and_list_in_nonce_order() {
        let q = MessageQueue::new();
        let alice = Address::new_id(100);
        q.enqueue(msg(100, 1), 10).unwrap();
        q.enqueue(msg(100, 2), 11).unwrap();
        q.enqueue(msg(100, 5), 12).unwrap();

        let listed = q.list(&alice);
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].msg.sequence(), 1);
        assert_eq!(listed[0].stamp, 10);
        assert_eq!(listed[2].msg.sequence(), 5);
        assert_eq!(q.size(&alice), 3);
        assert_eq!(q.largest_nonce(&alice), Some(5));
    }

    #[test]
    fn enqueue_rejects_non_increasing_nonce() {
        let q = MessageQueue::new();
        q.enqueue(msg(100, 2), 10).unwrap();
        assert_eq!(
            q.enqueue(msg(100, 2), 11),
            Err(Error::OutOfOrderNonce { got: 2, largest: 2 })
        );
        assert_eq!(
            q.enqueue(msg(100, 1), 11),
            Err(Error::OutOfOrderNonce { got: 1, largest: 2 })
        );
        // other senders are unaffected
        q.enqueue(msg(101, 1), 11).unwrap();
    }

    #[test]
    fn remove_next_pops_in_order() {
        let q = MessageQueue::new();
        let alice = Address::new_id(100);
        q.enqueue(msg(100, 1), 10).unwrap();
        q.enqueue(msg(100, 2), 11).unwrap();

        let removed = q.remove_next(&alice, 1).unwrap().unwrap();
        assert_eq!(removed.sequence(), 1);
        let removed = q.remove_next(&alice, 2).unwrap().unwrap();
        assert_eq!(removed.sequence(), 2);
        // empty queue yields nothing
        assert_eq!(q.remove_next(&alice, 3).unwrap(), None);
        assert_eq!(q.size(&alice), 0);
    }

    #[test]
    fn remove_next_rejects_wrong_nonce() {
        let q = MessageQueue::new();
        let alice = Address::new_id(100);
        q.enqueue(msg(100, 1), 10).unwrap();
        let err = q.remove_next(&alice, 2).unwrap_err();
        assert_eq!(err, Error::NonceMismatch { got: 1, expected: 2 });
        assert_eq!(err.to_string(), "removing message with nonce 1, expected 2");
        // the queue is left untouched
        assert_eq!(q.size(&alice), 1);
    }

    #[test]
    fn expire_before_purges_whole_sender() {
        let q = MessageQueue::new();
        let alice = Address::new_id(100);
        let bob = Address::new_id(101);
        q.enqueue(msg(100, 1), 100).unwrap();
        q.enqueue(msg(100, 2), 102).unwrap();
        q.enqueue(msg(101, 1), 200).unwrap();

        // threshold below every stamp expires nothing
        assert!(q.expire_before(100).is_empty());
        assert_eq!(q.size(&alice), 2);

        // one aged entry takes the sender's whole queue with it
        let expired = q.expire_before(101);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[&alice].len(), 2);
        assert!(q.list(&alice).is_empty());
        assert_eq!(q.size(&bob), 1);
    }
}
