//! Resend queue for messages the transport rejected.
//!
//! The event loop drains at most one message per resend tick, so a backlog
//! trickles out instead of bursting onto a freshly reconnected socket.
//! The queue is unbounded and never discards: a message that keeps failing
//! keeps cycling to the tail.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use crate::protocol::Message;

// ============================================================================
// ResendQueue
// ============================================================================

/// FIFO buffer of outbound messages awaiting retransmission.
#[derive(Debug, Default)]
pub struct ResendQueue {
    messages: VecDeque<Message>,
}

impl ResendQueue {
    /// Creates an empty queue.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the tail.
    #[inline]
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
    }

    /// Removes and returns the oldest message.
    #[inline]
    pub fn drain_one(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Returns the oldest message without removing it.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> Option<&Message> {
        self.messages.front()
    }

    /// Keeps only the messages `keep` accepts, in their original order.
    ///
    /// Returns how many messages were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Message) -> bool) -> usize {
        let before = self.messages.len();
        self.messages.retain(|message| keep(message));
        before - self.messages.len()
    }

    /// Returns the number of queued messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use crate::identifiers::Guid;
    use crate::protocol::Body;

    fn message(guid: &str) -> Message {
        Message::with_guid(Guid::new(guid), Body::Pong)
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = ResendQueue::new();
        assert!(queue.is_empty());
        assert!(queue.peek().is_none());
        assert!(queue.drain_one().is_none());
    }

    #[test]
    fn test_drain_is_fifo() {
        let mut queue = ResendQueue::new();
        queue.push(message("a"));
        queue.push(message("b"));
        queue.push(message("c"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(|m| m.guid.as_str()), Some("a"));
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("a")));
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("b")));
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("c")));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_repush_goes_to_tail() {
        let mut queue = ResendQueue::new();
        queue.push(message("a"));
        queue.push(message("b"));

        let failed = queue.drain_one().expect("head");
        queue.push(failed);

        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("b")));
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("a")));
    }

    #[test]
    fn test_retain_keeps_order() {
        let mut queue = ResendQueue::new();
        queue.push(message("a"));
        queue.push(Message::with_guid(Guid::new("b"), Body::Ping));
        queue.push(message("c"));

        let removed = queue.retain(|m| !matches!(m.body, Body::Ping));

        assert_eq!(removed, 1);
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("a")));
        assert_eq!(queue.drain_one().map(|m| m.guid), Some(Guid::new("c")));
    }

    proptest! {
        #[test]
        fn test_drain_order_matches_push_order(guids in prop::collection::vec("[a-z0-9]{1,12}", 0..64)) {
            let mut queue = ResendQueue::new();
            for guid in &guids {
                queue.push(message(guid));
            }

            let drained: Vec<String> = std::iter::from_fn(|| queue.drain_one())
                .map(|m| m.guid.to_string())
                .collect();

            prop_assert_eq!(drained, guids);
            prop_assert!(queue.is_empty());
        }
    }
}
