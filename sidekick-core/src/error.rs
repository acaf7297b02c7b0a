//! Error types for Code Sidekick

use thiserror::Error;

/// Result type alias for Code Sidekick operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Code Sidekick operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No credential is stored for the session
    #[error("User not authenticated.")]
    Unauthenticated,

    /// Task fields are missing or malformed
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Language model request failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Agent execution error
    #[error("Agent error: {0}")]
    Agent(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Llm(err.to_string())
    }
}
