//! Error types for loanlens.
//!
//! Defines the main error enum used throughout the service.
//!
//! Validation outcomes are deliberately NOT part of this enum: the
//! statement validator returns a [`crate::safety::ValidationResult`]
//! value, and the response builder turns rejections into the fixed
//! user-facing messages. Only infrastructure failures travel as errors.

use thiserror::Error;

/// Main error type for loanlens operations.
#[derive(Error, Debug)]
pub enum LoanlensError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors reported by the database driver
    /// (syntax errors, missing tables, permission errors, timeouts).
    /// Surfaced verbatim to the caller and never retried.
    #[error("Query error: {0}")]
    Query(String),

    /// Reasoning-agent errors (LLM API failures, wall-clock timeout,
    /// iteration cap exceeded, malformed tool output).
    #[error("Agent error: {0}")]
    Agent(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoanlensError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an agent error with the given message.
    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Agent(_) => "Agent Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the underlying message without the category prefix.
    ///
    /// The API envelope carries driver and agent messages verbatim,
    /// so this strips the wrapper that `Display` adds.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Agent(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using LoanlensError.
pub type Result<T> = std::result::Result<T, LoanlensError>;
