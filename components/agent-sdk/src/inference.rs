//! Interface to the language-model inference service.

use crate::error::InferenceError;
use crate::tools::ToolDefinition;
use crate::types::{Message, ToolCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for a chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The model to use for completion
    pub model: String,
    /// The conversation history
    pub messages: Vec<Message>,
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature
    pub temperature: f32,
    /// Request a thinking trace
    pub think: bool,
}

impl ChatRequest {
    /// Creates a new chat request with no tools.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            temperature: 0.0,
            think: false,
        }
    }

    /// Sets the tool schema sent with the request.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enables or disables the thinking trace.
    #[must_use]
    pub fn with_think(mut self, think: bool) -> Self {
        self.think = think;
        self
    }
}

/// Token usage information for a completion request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total number of tokens used
    pub total_tokens: u32,
}

/// Response from a chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// The generated content
    pub content: String,
    /// Thinking trace, when the model produced one
    pub thinking: Option<String>,
    /// Requested tool invocations, in order
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information, if available
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Creates a final-answer response.
    #[must_use]
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Creates a response requesting the given tool calls.
    #[must_use]
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }

    /// Returns `true` if the model asked for at least one tool.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Executes a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new("gpt-oss", vec![Message::user("Hi")])
            .with_temperature(0.5)
            .with_think(true);
        assert_eq!(request.model, "gpt-oss");
        assert_eq!(request.messages.len(), 1);
        assert!(request.think);
        assert!(request.tools.is_empty());
    }

    #[test]
    fn test_response_kinds() {
        assert!(!ChatResponse::answer("42").has_tool_calls());
        assert!(ChatResponse::tool_calls(vec![ToolCall::new("python_datascience")]).has_tool_calls());
    }
}
