//! Delivery queue
//!
//! FIFO buffer of chat messages between ingestion and fan-out.
//! One global order across all senders; no bound.

use std::collections::VecDeque;

use crate::types::ClientId;

/// A chat line waiting to be broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender identity (excluded from the fan-out)
    pub sender: ClientId,
    /// Sender's display name captured when the message was accepted
    pub sender_name: String,
    /// Raw message bytes
    pub text: Vec<u8>,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(sender: ClientId, sender_name: impl Into<String>, text: impl Into<Vec<u8>>) -> Self {
        Self {
            sender,
            sender_name: sender_name.into(),
            text: text.into(),
        }
    }
}

/// Pending broadcast messages in arrival order
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    messages: VecDeque<ChatMessage>,
}

impl DeliveryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the back
    pub fn enqueue(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
    }

    /// Take the oldest message, if any
    pub fn try_dequeue(&mut self) -> Option<ChatMessage> {
        self.messages.pop_front()
    }

    /// Number of pending messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_across_senders() {
        let mut queue = DeliveryQueue::new();
        queue.enqueue(ChatMessage::new(ClientId(1), "A", "one"));
        queue.enqueue(ChatMessage::new(ClientId(2), "B", "two"));
        queue.enqueue(ChatMessage::new(ClientId(1), "A", "three"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_dequeue().unwrap().text, b"one");
        assert_eq!(queue.try_dequeue().unwrap().text, b"two");
        assert_eq!(queue.try_dequeue().unwrap().text, b"three");
        assert!(queue.try_dequeue().is_none());
        assert!(queue.is_empty());
    }
}
