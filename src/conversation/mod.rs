//! Conversation session with the assistant
//!
//! A [`Conversation`] owns the local transcript, the turn state and the
//! primed remote chat. A turn is split into [`Conversation::begin_turn`] and
//! [`Conversation::complete_turn`] so that the state can be checked and
//! updated without holding anything across the network call; see
//! [`ConversationHandle`].

mod types;

pub use types::*;

use log::{debug, error, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::assistant::{context_primer, primed_instruction, Assistant, AssistantChat};
use crate::error::{Error, Result};
use crate::profile::UserProfile;
use crate::storage;
use crate::vitals::VitalsLog;

/// A turn whose request is in flight. Obtained from
/// [`Conversation::begin_turn`] and handed back to
/// [`Conversation::complete_turn`].
pub struct PendingTurn {
    text: String,
    chat: Box<dyn AssistantChat>,
    generation: u64,
}

impl PendingTurn {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sends the message. Exactly one attempt.
    pub async fn send(&mut self) -> Result<String> {
        self.chat.send(&self.text).await
    }
}

pub struct Conversation {
    transcript: Vec<ChatMessage>,
    state: TurnState,
    chat: Option<Box<dyn AssistantChat>>,
    primer: Option<String>,
    generation: u64,
    fallback_reply: Option<String>,
}

impl Conversation {
    /// Starts a transcript with the welcome message for `profile`
    pub fn new(profile: &UserProfile, fallback_reply: Option<String>) -> Self {
        let mut conversation = Self {
            transcript: Vec::new(),
            state: TurnState::Idle,
            chat: None,
            primer: None,
            generation: 0,
            fallback_reply,
        };
        conversation.push_message(
            MessageRole::Model,
            &format!(
                "Hello {}, I'm AFYA. I'm here to listen. \n\nYou can type or speak to me.",
                profile.name
            ),
        );
        conversation
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == TurnState::AwaitingResponse
    }

    /// The context the current remote chat was primed with
    pub fn primer(&self) -> Option<&str> {
        self.primer.as_deref()
    }

    pub fn is_primed(&self) -> bool {
        self.primer.is_some()
    }

    /// Replaces the remote chat with a new one grounded on `profile` and
    /// the latest `vitals`. The local transcript is kept.
    pub fn prime(&mut self, assistant: &dyn Assistant, profile: &UserProfile, vitals: &VitalsLog) {
        let primer = context_primer(profile, vitals);
        self.chat = Some(assistant.start_chat(&primed_instruction(&primer)));
        self.primer = Some(primer);
        self.generation += 1;
        debug!("conversation primed (generation {})", self.generation);
    }

    /// Primes only when no remote chat is available for the next turn
    fn ensure_primed(
        &mut self,
        assistant: &dyn Assistant,
        profile: &UserProfile,
        vitals: &VitalsLog,
    ) {
        if self.state == TurnState::Idle && self.chat.is_none() {
            self.prime(assistant, profile, vitals);
        }
    }

    /// Idle -> AwaitingResponse. Records the user message and hands out the
    /// chat to send it with.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::validation("message cannot be empty"));
        }
        if self.state == TurnState::AwaitingResponse {
            return Err(Error::busy("a reply is still pending"));
        }
        let chat = self
            .chat
            .take()
            .ok_or_else(|| Error::general("conversation has not been primed"))?;

        self.push_message(MessageRole::User, text);
        self.state = TurnState::AwaitingResponse;
        Ok(PendingTurn {
            text: text.to_string(),
            chat,
            generation: self.generation,
        })
    }

    /// AwaitingResponse -> Idle, recording the reply or the fallback
    pub fn complete_turn(
        &mut self,
        pending: PendingTurn,
        result: Result<String>,
    ) -> TurnOutcome {
        self.state = TurnState::Idle;
        // A re-prime while the request was out already installed a newer chat.
        if pending.generation == self.generation && self.chat.is_none() {
            self.chat = Some(pending.chat);
        }

        match result {
            Ok(reply) => {
                TurnOutcome::Replied(self.push_message(MessageRole::Model, &reply).clone())
            }
            Err(e) => {
                error!("Assistant error: {}", e);
                match self.fallback_reply.clone() {
                    Some(fallback) => {
                        warn!("recording fallback reply");
                        let message = self.push_message(MessageRole::Model, &fallback).clone();
                        TurnOutcome::Fallback(message)
                    }
                    None => TurnOutcome::Failed,
                }
            }
        }
    }

    /// Runs a whole turn, priming first if no remote chat exists yet
    pub async fn submit(
        &mut self,
        assistant: &dyn Assistant,
        profile: &UserProfile,
        vitals: &VitalsLog,
        text: &str,
    ) -> Result<TurnOutcome> {
        self.ensure_primed(assistant, profile, vitals);
        let mut pending = self.begin_turn(text)?;
        let result = pending.send().await;
        Ok(self.complete_turn(pending, result))
    }

    fn push_message(&mut self, role: MessageRole, text: &str) -> &ChatMessage {
        let mut timestamp = storage::now();
        if let Some(last) = self.transcript.last() {
            timestamp = timestamp.max(last.timestamp);
        }
        self.transcript.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.to_string(),
            timestamp,
        });
        &self.transcript[self.transcript.len() - 1]
    }
}

/// Shared access to a conversation from several tasks.
///
/// The lock is only held to begin and to complete a turn, never across the
/// request, so a submission made while another is in flight fails with
/// [`Error::Busy`] instead of queueing behind it.
#[derive(Clone)]
pub struct ConversationHandle {
    inner: Arc<Mutex<Conversation>>,
}

impl ConversationHandle {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conversation)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Conversation>> {
        self.inner
            .lock()
            .map_err(|_| Error::general("conversation lock poisoned"))
    }

    pub fn prime(
        &self,
        assistant: &dyn Assistant,
        profile: &UserProfile,
        vitals: &VitalsLog,
    ) -> Result<()> {
        self.lock()?.prime(assistant, profile, vitals);
        Ok(())
    }

    /// Runs a whole turn, priming first if no remote chat exists yet
    pub async fn submit(
        &self,
        assistant: &dyn Assistant,
        profile: &UserProfile,
        vitals: &VitalsLog,
        text: &str,
    ) -> Result<TurnOutcome> {
        let mut pending = {
            let mut conversation = self.lock()?;
            conversation.ensure_primed(assistant, profile, vitals);
            conversation.begin_turn(text)?
        };
        let result = pending.send().await;
        Ok(self.lock()?.complete_turn(pending, result))
    }

    pub fn transcript(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.lock()?.transcript().to_vec())
    }
}
