//! Deterministic provider that replays queued replies
//!
//! Useful for offline runs and for exercising the reasoning loop without a
//! model server. Every request is recorded so callers can inspect prompts.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::{BatonError, Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// Provider returning pre-recorded replies in order
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that answers with each reply in turn
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for reply in replies {
            provider.push_reply(reply);
        }
        provider
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock_replies()
            .push_back(ScriptedReply::Text(reply.into()));
    }

    /// Queue a provider failure
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_replies()
            .push_back(ScriptedReply::Failure(message.into()));
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    /// Every message list received so far
    pub fn requests(&self) -> Vec<Vec<Message>> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedReply>> {
        match self.replies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(&self, messages: &[Message], _options: &GenerateOptions) -> Result<LLMResponse> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(messages.to_vec()),
            Err(poisoned) => poisoned.into_inner().push(messages.to_vec()),
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.lock_replies().pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(LLMResponse::text(text, "scripted")),
            Some(ScriptedReply::Failure(message)) => Err(BatonError::provider(message)),
            None => Err(BatonError::provider("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order() {
        let provider = ScriptedProvider::with_replies(["one", "two"]);
        provider.push_failure("boom");
        let options = GenerateOptions::default();

        let first = provider.chat(&[Message::user("a")], &options).await.unwrap();
        let second = provider.chat(&[Message::user("b")], &options).await.unwrap();
        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert!(provider.chat(&[], &options).await.is_err());
        assert!(provider.chat(&[], &options).await.is_err());
        assert_eq!(provider.requests().len(), 4);
        assert_eq!(provider.requests()[1][0].content, "b");
    }
}
