//! Error types for the agent SDK.
//!
//! This module provides a structured error hierarchy using `thiserror`
//! for proper error handling throughout the agent system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Error during inference API call.
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    /// Error during tool dispatch.
    #[error("Tool execution failed: {0}")]
    ToolExecution(#[from] ToolError),

    /// Error related to task context or configuration.
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Error while loading or persisting a conversation.
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Errors raised by the language-model inference service.
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    /// The provider answered with an error.
    #[error("Provider Error: {0}")]
    ProviderError(String),

    /// Invalid model name or model not available.
    #[error("Invalid model: {model}")]
    InvalidModel {
        /// The name of the invalid model.
        model: String,
    },

    /// Rate limit exceeded.
    #[error("Rate Limit Exceeded")]
    RateLimit,

    /// The conversation no longer fits the model context.
    #[error("Context Length Exceeded")]
    ContextLengthExceeded,

    /// Network or connection error.
    #[error("Network Error: {0}")]
    NetworkError(String),

    /// Provider configuration error.
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    /// Response parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl InferenceError {
    /// Returns `true` if this error is transient and retry may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit | Self::NetworkError(_) => true,
            Self::ProviderError(msg) => msg.contains("HTTP 50") || msg.contains("HTTP 52"),
            Self::InvalidModel { .. }
            | Self::ContextLengthExceeded
            | Self::ConfigError(_)
            | Self::ParseError(_) => false,
        }
    }
}

/// Errors related to tool dispatch.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool not found in registry.
    #[error("Tool '{name}' not found")]
    NotFound {
        /// Name of the tool that was not found.
        name: String,
    },

    /// Invalid arguments provided to tool.
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments {
        /// Name of the tool.
        tool: String,
        /// Reason why arguments are invalid.
        reason: String,
    },
}

/// Errors raised by the sandboxed code-execution service.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The sandbox backend could not be reached or started.
    #[error("Sandbox unavailable: {0}")]
    Unavailable(String),

    /// A file could not be copied into the sandbox.
    #[error("Failed to stage '{path}' into the sandbox: {reason}")]
    Staging {
        /// Host path being staged.
        path: PathBuf,
        /// Backend message.
        reason: String,
    },

    /// The backend failed to run the code at all.
    #[error("Sandbox run failed: {0}")]
    Run(String),

    /// Execution or session exceeded its time budget.
    #[error("{scope} timed out after {elapsed:?}")]
    Timeout {
        /// Which budget was exceeded ("execution" or "session").
        scope: &'static str,
        /// The budget that was exceeded.
        elapsed: std::time::Duration,
    },

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to task context and configuration.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Question is empty or invalid.
    #[error("Invalid task description: {0}")]
    InvalidDescription(String),

    /// Missing required configuration.
    #[error("Missing configuration: {key}")]
    MissingConfiguration {
        /// The configuration key that is missing.
        key: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration for '{key}': {value}")]
    InvalidConfiguration {
        /// The configuration key.
        key: String,
        /// The invalid value.
        value: String,
    },
}

/// Errors related to conversation persistence.
#[derive(Error, Debug)]
pub enum ConversationError {
    /// The log file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The log file content is not a valid conversation.
    #[error("Invalid conversation data: {0}")]
    Serialization(#[from] serde_json::Error),
}
