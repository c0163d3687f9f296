//! Error handling for AFYA

use std::fmt;
use thiserror::Error;

/// Unified error type for AFYA
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors from the local store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generative API errors
    #[error("Assistant error: {0}")]
    Assistant(#[from] afya_genai::GenAiError),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A turn or recognition attempt is already running
    #[error("Busy: {0}")]
    Busy(String),

    /// Speech capability errors
    #[error("Speech error: {0}")]
    Speech(String),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new busy error
    pub fn busy<T: fmt::Display>(msg: T) -> Self {
        Error::Busy(msg.to_string())
    }

    /// Create a new speech error
    pub fn speech<T: fmt::Display>(msg: T) -> Self {
        Error::Speech(msg.to_string())
    }

    /// Create a new storage error
    pub fn storage<T: fmt::Display>(msg: T) -> Self {
        Error::Storage(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Whether the error was raised before anything was sent or stored
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
