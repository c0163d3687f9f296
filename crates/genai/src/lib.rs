//! Gemini generateContent client for Rust
//!
//! This crate provides the two calls AFYA needs from the generative API:
//! multi-turn chat with a system instruction, and one-shot structured output
//! constrained by a response schema.

mod chat;
mod error;
pub mod schema;
pub mod types;

use log::{debug, error};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub use chat::ChatSession;
pub use error::{GenAiError, Result};
pub use schema::{Schema, Type};
pub use types::*;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Connection settings for the API
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Option<Duration>,
}

impl GenAiConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Reads `GEMINI_API_KEY` (or `API_KEY`) and the optional `GEMINI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| GenAiError::config("GEMINI_API_KEY environment variable not found"))?;
        if api_key.trim().is_empty() {
            return Err(GenAiError::config("GEMINI_API_KEY cannot be empty"));
        }
        let mut config = Self::new(api_key.trim());
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Client for the generateContent endpoint
#[derive(Debug, Clone)]
pub struct GenAiClient {
    config: GenAiConfig,
    http_client: Client,
}

impl GenAiClient {
    pub fn new(config: GenAiConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GenAiError::UrlError(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("v1beta")
            .push("models")
            .push(&format!("{}:generateContent", self.config.model));
        Ok(url)
    }

    /// Sends one generateContent request. Exactly one attempt is made.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint()?;
        debug!(
            "generateContent model={} turns={}",
            self.config.model,
            request.contents.len()
        );

        let mut builder = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request);
        if let Some(timeout) = self.config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            error!("generateContent failed with status {}", status);
            return Err(GenAiError::from_response_body(status.as_u16(), &body));
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        if let Some(reason) = parsed.block_reason() {
            return Err(GenAiError::Blocked(reason.to_string()));
        }
        Ok(parsed)
    }

    /// One-shot prompt returning the reply text
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let response = self
            .generate_content(&GenerateContentRequest::prompt(prompt))
            .await?;
        response.text().ok_or(GenAiError::EmptyResponse)
    }

    /// One-shot prompt whose reply must be JSON matching `schema`
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Schema,
    ) -> Result<T> {
        let request = GenerateContentRequest::prompt(prompt)
            .with_generation_config(GenerationConfig::json(schema));
        let response = self.generate_content(&request).await?;
        let text = response.text().ok_or(GenAiError::EmptyResponse)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Starts a chat whose every turn carries `system_instruction`
    pub fn start_chat(&self, system_instruction: &str) -> ChatSession {
        ChatSession::new(self.clone(), system_instruction)
    }
}
