use log::debug;

use crate::error::{GenAiError, Result};
use crate::types::{Content, GenerateContentRequest};
use crate::GenAiClient;

/// A remote conversation: a fixed system instruction plus the turns
/// exchanged so far.
///
/// History only grows when a turn succeeds, so a failed send leaves the
/// session exactly as it was.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: GenAiClient,
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub(crate) fn new(client: GenAiClient, system_instruction: &str) -> Self {
        Self {
            client,
            system_instruction: system_instruction.to_string(),
            history: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Sends `message` with the accumulated history and returns the reply text
    pub async fn send_message(&mut self, message: &str) -> Result<String> {
        let mut contents = self.history.clone();
        contents.push(Content::user(message));

        let request = GenerateContentRequest {
            contents,
            ..Default::default()
        }
        .with_system_instruction(self.system_instruction.as_str());

        let response = self.client.generate_content(&request).await?;
        let reply = response.text().ok_or(GenAiError::EmptyResponse)?;

        self.history.push(Content::user(message));
        self.history.push(Content::model(reply.as_str()));
        debug!("chat history now {} entries", self.history.len());
        Ok(reply)
    }
}
