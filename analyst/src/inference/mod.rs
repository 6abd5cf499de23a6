//! Language-model inference backends.

pub mod ollama;
pub mod retry;

pub use ollama::{OllamaConfig, OllamaProvider};
pub use retry::RetryConfig;
