//! Handoff request text format
//!
//! A handoff travels inside an agent's final answer as
//! `[HANDOFF:Target|optional reason] input for the target`.
//! The prefix is matched case-insensitively; anything that does not parse
//! cleanly is simply not a handoff.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opening token of an encoded handoff
pub const HANDOFF_PREFIX: &str = "[HANDOFF:";
const REASON_SEPARATOR: char = '|';
const CLOSING_DELIMITER: char = ']';

/// Instruction to move the task to another agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRequest {
    /// Agent that should take over
    pub target: String,
    /// Text handed to the target as its input
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Values copied into the target session's metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
    /// Append the source agent's steps to the target's input
    #[serde(default)]
    pub preserve_history: bool,
}

impl HandoffRequest {
    pub fn new(target: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            input: input.into(),
            reason: None,
            context: HashMap::new(),
            preserve_history: false,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn preserve_history(mut self, preserve: bool) -> Self {
        self.preserve_history = preserve;
        self
    }

    /// Text form of this request. Context and history flag are not encoded.
    pub fn to_text(&self) -> String {
        HandoffCodec::encode(&self.target, &self.input, self.reason.as_deref())
    }
}

/// Encoder and decoder for the handoff text format
pub struct HandoffCodec;

impl HandoffCodec {
    /// Encode a handoff. Delimiter characters are stripped from the target
    /// name and the reason so the header always parses back.
    ///
    /// The input is trimmed, since decoding trims it too. An empty input
    /// decodes as the whole encoded text.
    pub fn encode(target: &str, input: &str, reason: Option<&str>) -> String {
        let target: String = target
            .chars()
            .filter(|c| *c != REASON_SEPARATOR && *c != CLOSING_DELIMITER)
            .collect();

        let mut header = target.trim().to_string();
        if let Some(reason) = reason {
            let reason: String = reason.chars().filter(|c| *c != CLOSING_DELIMITER).collect();
            let reason = reason.trim();
            if !reason.is_empty() {
                header.push(REASON_SEPARATOR);
                header.push_str(reason);
            }
        }

        format!("{}{}{} {}", HANDOFF_PREFIX, header, CLOSING_DELIMITER, input.trim())
    }

    /// Decode a handoff; `None` when the text is not one
    pub fn decode(text: &str) -> Option<HandoffRequest> {
        let trimmed = text.trim_start();
        let prefix = trimmed.get(..HANDOFF_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(HANDOFF_PREFIX) {
            return None;
        }

        let rest = &trimmed[HANDOFF_PREFIX.len()..];
        let close = rest.find(CLOSING_DELIMITER)?;
        let header = &rest[..close];

        let (target, reason) = match header.split_once(REASON_SEPARATOR) {
            Some((target, reason)) => {
                let reason = reason.trim();
                (target.trim(), (!reason.is_empty()).then(|| reason.to_string()))
            }
            None => (header.trim(), None),
        };

        if target.is_empty() {
            return None;
        }

        let remainder = rest[close + CLOSING_DELIMITER.len_utf8()..].trim();
        let input = if remainder.is_empty() {
            text.to_string()
        } else {
            remainder.to_string()
        };

        Some(HandoffRequest {
            target: target.to_string(),
            input,
            reason,
            context: HashMap::new(),
            preserve_history: false,
        })
    }
}
