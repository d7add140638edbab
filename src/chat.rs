//! Room chat log
//!
//! This module keeps the append-only chat log of the room. Message ids and
//! timestamps are assigned server-side; ids come from a monotonically
//! increasing counter, so arrival order is authoritative even when two
//! messages land within the same wall-clock instant.

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    /// The teacher running the session
    Teacher,
    /// A participating student
    Student,
}

/// A single chat message with its server-assigned id and timestamp
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned id, strictly increasing by arrival order
    id: u64,
    /// Display name of the sender
    sender: String,
    /// Whether the sender is the teacher or a student
    sender_type: SenderType,
    /// The message text
    message: String,
    /// When the message was received by the server
    timestamp: SystemTime,
}

impl ChatMessage {
    /// Returns the server-assigned message id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the display name of the sender
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns whether the sender is the teacher or a student
    pub fn sender_type(&self) -> SenderType {
        self.sender_type
    }

    /// Returns the message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns when the message was received by the server
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

/// Update message broadcast when a chat message is appended
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// A newly appended chat message
    MessageReceived(ChatMessage),
}

/// Sync message replaying the chat log to one connection
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The full chat history in append order
    History(Vec<ChatMessage>),
}

/// Append-only ordered chat log, unbounded within process lifetime
#[derive(Debug, Default)]
pub struct ChatLog {
    /// All messages in append order
    messages: Vec<ChatMessage>,
    /// Id assigned to the next appended message
    next_id: u64,
}

impl ChatLog {
    /// Appends a message, assigning its id and timestamp server-side
    ///
    /// Client-supplied ids are untrusted and never used; the authoritative
    /// id is the arrival-order counter.
    ///
    /// # Arguments
    ///
    /// * `sender` - Display name of the sender
    /// * `sender_type` - Whether the sender is the teacher or a student
    /// * `message` - The message text
    ///
    /// # Returns
    ///
    /// The stored message, for broadcasting to all clients
    pub fn append(
        &mut self,
        sender: String,
        sender_type: SenderType,
        message: String,
    ) -> ChatMessage {
        self.next_id += 1;
        let stored = ChatMessage {
            id: self.next_id,
            sender,
            sender_type,
            message,
            timestamp: SystemTime::now(),
        };
        self.messages.push(stored.clone());
        stored
    }

    /// Returns all messages in append order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages in the log
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns a read-only snapshot of the full history in append order
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let mut log = ChatLog::default();

        let first = log.append("Teacher".to_string(), SenderType::Teacher, "Hi".to_string());
        let second = log.append("Alice".to_string(), SenderType::Student, "Hello".to_string());
        let third = log.append("Bob".to_string(), SenderType::Student, "Hey".to_string());

        assert!(first.id() < second.id());
        assert!(second.id() < third.id());
    }

    #[test]
    fn test_history_in_append_order() {
        let mut log = ChatLog::default();
        log.append("Alice".to_string(), SenderType::Student, "first".to_string());
        log.append("Bob".to_string(), SenderType::Student, "second".to_string());

        let history = log.snapshot();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message(), "first");
        assert_eq!(history[1].message(), "second");
    }

    #[test]
    fn test_sender_type_wire_format() {
        let json = serde_json::to_string(&SenderType::Teacher).unwrap();
        assert_eq!(json, "\"teacher\"");
        let parsed: SenderType = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(parsed, SenderType::Student);
    }

    #[test]
    fn test_message_wire_shape() {
        let mut log = ChatLog::default();
        let message = log.append("Alice".to_string(), SenderType::Student, "hi".to_string());

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"senderType\":\"student\""));
        assert!(json.contains("\"sender\":\"Alice\""));
    }
}
