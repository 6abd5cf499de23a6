//! Ollama chat API provider implementation.
//!
//! Talks to `POST /api/chat` with streaming disabled and native tool calling.

pub mod client;
pub mod mapping;

pub use client::{OllamaConfig, OllamaProvider};
pub use mapping::{OllamaChatRequest, OllamaChatResponse, create_request, map_response};
