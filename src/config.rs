//! Configuration options for AFYA

use std::path::PathBuf;
use std::time::Duration;

/// Reply appended to the transcript when the assistant cannot be reached
pub const DEFAULT_FALLBACK_REPLY: &str = "I'm having trouble connecting to the health network right now. Please check your internet connection or try again later.";

/// Configuration options for the application
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// The generative model name
    pub model: String,

    /// Base URL of the generative API
    pub api_base_url: String,

    /// The request timeout for assistant calls
    pub request_timeout: Option<Duration>,

    /// Directory holding the persisted blobs
    pub data_dir: PathBuf,

    /// Whether replies are spoken by default
    pub voice_enabled: bool,

    /// Reply recorded when a chat turn fails, `None` to record nothing
    pub fallback_reply: Option<String>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            model: afya_genai::DEFAULT_MODEL.to_string(),
            api_base_url: afya_genai::DEFAULT_BASE_URL.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            data_dir: default_data_dir(),
            voice_enabled: true,
            fallback_reply: Some(DEFAULT_FALLBACK_REPLY.to_string()),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("afya")
}

impl AppOptions {
    /// Set the model name
    pub fn with_model(mut self, value: &str) -> Self {
        self.model = value.to_string();
        self
    }

    /// Set the API base URL
    pub fn with_api_base_url(mut self, value: &str) -> Self {
        self.api_base_url = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.data_dir = value.into();
        self
    }

    /// Set whether replies are spoken
    pub fn with_voice_enabled(mut self, value: bool) -> Self {
        self.voice_enabled = value;
        self
    }

    /// Set the fallback reply
    pub fn with_fallback_reply(mut self, value: Option<&str>) -> Self {
        self.fallback_reply = value.map(str::to_string);
        self
    }

    /// Connection settings for the generative API
    pub fn genai_config(&self, api_key: &str) -> afya_genai::GenAiConfig {
        afya_genai::GenAiConfig::new(api_key)
            .with_base_url(&self.api_base_url)
            .with_model(&self.model)
            .with_request_timeout(self.request_timeout)
    }
}
