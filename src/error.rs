//! Error types for quizloop
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur while driving the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool plumbing failed outside of a single tool call
    #[error("Tool error: {0}")]
    Tool(String),

    /// Configuration could not be loaded or rendered
    #[error("Config error: {0}")]
    Config(String),

    /// A required credential is absent from the environment
    #[error("Missing credential: environment variable {0} not set")]
    MissingCredential(String),

    /// The step ceiling was reached before the loop terminated
    #[error("Agent exhausted after {limit} steps without reaching END")]
    Exhausted { limit: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, AgentError::Exhausted { .. })
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
