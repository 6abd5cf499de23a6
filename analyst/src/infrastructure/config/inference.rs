//! Inference provider configuration.

use secrecy::SecretString;
use serde::Deserialize;

/// Settings for the Ollama inference service.
#[derive(Debug, Deserialize, Clone)]
pub struct InferenceSettings {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}
