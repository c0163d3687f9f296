//! AFYA diabetes companion
//!
//! A personal health tracker for people living with diabetes: a profile,
//! an append-only glucose log, a meal diary with AI nutrition estimates, a
//! context-aware conversation with the assistant and an emergency overlay.
//! All state is persisted locally.

pub mod app;
pub mod assistant;
pub mod config;
pub mod conversation;
pub mod dashboard;
pub mod emergency;
pub mod error;
pub mod nutrition;
pub mod profile;
pub mod speech;
pub mod storage;
pub mod vitals;

use log::debug;
use reqwest::Client;
use std::sync::Arc;

use afya_genai::{GenAiClient, GenAiConfig};

use crate::app::AppState;
use crate::assistant::Assistant;
use crate::config::AppOptions;
use crate::error::Result;
use crate::speech::{SpeechInput, SpeechOutput};
use crate::storage::{FileStore, KeyValueStore};

/// The main entry point for AFYA
pub struct Afya {
    /// The API key for the generative API
    pub api_key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Application options
    pub options: AppOptions,
    genai: GenAiClient,
}

impl Afya {
    /// Create a new AFYA instance with default options
    ///
    /// # Example
    ///
    /// ```
    /// use afya::Afya;
    ///
    /// let afya = Afya::new("your-api-key");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self::new_with_options(api_key, AppOptions::default())
    }

    /// Create a new AFYA instance with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use afya::{Afya, config::AppOptions};
    ///
    /// let options = AppOptions::default().with_voice_enabled(false);
    /// let afya = Afya::new_with_options("your-api-key", options);
    /// ```
    pub fn new_with_options(api_key: &str, options: AppOptions) -> Self {
        let http_client = Client::new();
        let genai = GenAiClient::new(options.genai_config(api_key), http_client.clone());

        Self {
            api_key: api_key.to_string(),
            http_client,
            options,
            genai,
        }
    }

    /// Create an instance from `GEMINI_API_KEY` (or `API_KEY`). A
    /// `GEMINI_BASE_URL` in the environment overrides the configured base URL.
    pub fn from_env(options: AppOptions) -> Result<Self> {
        let env = GenAiConfig::from_env()?;
        let options = if env.base_url != afya_genai::DEFAULT_BASE_URL {
            options.with_api_base_url(&env.base_url)
        } else {
            options
        };
        Ok(Self::new_with_options(&env.api_key, options))
    }

    /// The generative API client
    pub fn genai(&self) -> &GenAiClient {
        &self.genai
    }

    /// The assistant backing the chat and the meal analysis
    pub fn assistant(&self) -> Arc<dyn Assistant> {
        Arc::new(self.genai.clone())
    }

    /// Opens the store in the configured data directory
    pub fn open_store(&self) -> Result<FileStore> {
        debug!("opening store at {}", self.options.data_dir.display());
        FileStore::open(&self.options.data_dir)
    }

    /// Loads the application state from the configured data directory
    pub fn open(&self, speech_out: SpeechOutput, speech_in: SpeechInput) -> Result<AppState> {
        let store = self.open_store()?;
        Ok(self.open_with_store(Box::new(store), speech_out, speech_in))
    }

    /// Loads the application state from `store`
    pub fn open_with_store(
        &self,
        store: Box<dyn KeyValueStore>,
        speech_out: SpeechOutput,
        speech_in: SpeechInput,
    ) -> AppState {
        AppState::load(store, self.assistant(), speech_out, speech_in, &self.options)
    }
}

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::app::{AppState, View};
    pub use crate::config::AppOptions;
    pub use crate::conversation::{ChatMessage, MessageRole, TurnOutcome, TurnState};
    pub use crate::error::{Error, Result};
    pub use crate::nutrition::{GlycemicCategory, MealAnalysis, MealLog};
    pub use crate::profile::{DiabetesType, Gender, ProfileDraft, UserProfile};
    pub use crate::vitals::{GlucoseStatus, NewReading, ReadingContext, VitalLog};
    pub use crate::Afya;
}
