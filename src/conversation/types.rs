//! Types for the conversation transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
    System,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Turn-taking state of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No request in flight
    Idle,
    /// Exactly one request in flight
    AwaitingResponse,
}

/// How a submitted turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The assistant answered
    Replied(ChatMessage),
    /// The request failed and the fallback reply was recorded
    Fallback(ChatMessage),
    /// The request failed and nothing was recorded
    Failed,
}

impl TurnOutcome {
    /// The model message appended by this turn, if any
    pub fn reply(&self) -> Option<&ChatMessage> {
        match self {
            TurnOutcome::Replied(message) | TurnOutcome::Fallback(message) => Some(message),
            TurnOutcome::Failed => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Replied(_))
    }
}

/// Canned prompts offered while the input is empty
pub const SUGGESTIONS: [&str; 4] = [
    "Suggest a diabetic-friendly breakfast",
    "I feel a bit shaky and dizzy",
    "Can I exercise right now?",
    "How can I lower my stress?",
];
