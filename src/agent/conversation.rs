//! Conversation memory
//!
//! Keeps a bounded chat history and exposes it to the reasoning loop through
//! the [`MemorySink`] trait.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::core::{Message, Result};

/// Destination for completed exchanges
#[async_trait]
pub trait MemorySink: Send + Sync {
    /// Append one message to memory
    async fn append_message(&self, role: &str, content: &str) -> Result<()>;
}

/// Manages conversation history
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: VecDeque<Message>,
    max_length: usize,
}

impl Conversation {
    /// Create a new conversation
    pub fn new(max_length: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_length,
        }
    }

    /// Add a message and maintain size limit
    pub fn add_message(&mut self, message: Message) {
        self.messages.push_back(message);

        while self.messages.len() > self.max_length {
            self.messages.pop_front();
        }
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[async_trait]
impl MemorySink for Mutex<Conversation> {
    async fn append_message(&self, role: &str, content: &str) -> Result<()> {
        self.lock()
            .await
            .add_message(Message::new(role, content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_limit() {
        let mut conv = Conversation::new(3);
        conv.add_message(Message::user("1"));
        conv.add_message(Message::assistant("2"));
        conv.add_message(Message::user("3"));
        conv.add_message(Message::assistant("4"));

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.messages[0].content, "2");
        assert_eq!(conv.messages[2].content, "4");

        conv.clear();
        assert!(conv.is_empty());
    }

    #[test]
    fn test_mutex_sink_appends() {
        let sink = Mutex::new(Conversation::new(10));
        tokio_test::block_on(async {
            sink.append_message("user", "question").await.unwrap();
            sink.append_message("assistant", "answer").await.unwrap();
        });

        let conv = sink.into_inner();
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages[0].role, "user");
        assert_eq!(conv.messages[1].content, "answer");
    }
}
