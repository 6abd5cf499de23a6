//! Ollama API type mapping.
//!
//! Wire types for `POST /api/chat` and their conversion to and from the SDK
//! types.

use agent_sdk::{ChatRequest, ChatResponse, Message, Role, ToolCall, ToolDefinition, Usage};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ollama chat request format
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OllamaMessage>,
    /// Callable tools
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<OllamaTool>,
    /// Always `false`; responses are read in one piece
    pub stream: bool,
    /// Request a thinking trace
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub think: bool,
    /// Sampling options
    pub options: OllamaOptions,
}

/// Sampling options
#[derive(Debug, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature
    pub temperature: f32,
}

/// A single message on the wire
#[derive(Debug, Serialize)]
pub struct OllamaMessage {
    /// `system`, `user`, `assistant` or `tool`
    pub role: &'static str,
    /// Message text
    pub content: String,
    /// Tool calls made by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Tool definition sent with the request
#[derive(Debug, Serialize)]
pub struct OllamaTool {
    /// Always `function`
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    /// Function schema
    pub function: OllamaFunctionDef,
}

/// Function schema
#[derive(Debug, Serialize)]
pub struct OllamaFunctionDef {
    /// Function name
    pub name: String,
    /// What it does
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: Value,
}

/// Tool call, in either direction
#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaToolCall {
    /// The called function
    pub function: OllamaFunctionCall,
}

/// Function name and arguments of a tool call
#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaFunctionCall {
    /// Function name
    pub name: String,
    /// Arguments object; some models send it as a JSON string
    #[serde(default)]
    pub arguments: Value,
}

/// Ollama chat response format (non-streaming)
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    /// The generated message
    pub message: Option<OllamaResponseMessage>,
    /// Prompt token count
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    /// Completion token count
    #[serde(default)]
    pub eval_count: Option<u32>,
}

/// Message within a response
#[derive(Debug, Deserialize)]
pub struct OllamaResponseMessage {
    /// Answer text
    #[serde(default)]
    pub content: Option<String>,
    /// Thinking trace
    #[serde(default)]
    pub thinking: Option<String>,
    /// Requested tool calls
    #[serde(default)]
    pub tool_calls: Option<Vec<OllamaToolCall>>,
}

/// Error body returned by Ollama
#[derive(Debug, Deserialize)]
pub struct OllamaErrorResponse {
    /// Error description
    pub error: String,
}

/// Wire name of a role. Tool results travel as `tool`.
#[must_use]
pub fn map_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::ToolResult => "tool",
    }
}

fn map_message(message: Message) -> OllamaMessage {
    OllamaMessage {
        role: map_role(message.role),
        content: message.content,
        tool_calls: message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: call.name,
                        arguments: Value::Object(call.arguments),
                    },
                })
                .collect()
        }),
    }
}

fn map_tool(tool: ToolDefinition) -> OllamaTool {
    OllamaTool {
        tool_type: "function",
        function: OllamaFunctionDef {
            name: tool.name,
            description: tool.description,
            parameters: tool.parameters,
        },
    }
}

/// Creates an Ollama request from the SDK request
#[must_use]
pub fn create_request(request: ChatRequest) -> OllamaChatRequest {
    OllamaChatRequest {
        model: request.model,
        messages: request.messages.into_iter().map(map_message).collect(),
        tools: request.tools.into_iter().map(map_tool).collect(),
        stream: false,
        think: request.think,
        options: OllamaOptions {
            temperature: request.temperature,
        },
    }
}

/// Maps an Ollama response to the SDK `ChatResponse`
///
/// # Errors
///
/// Returns an error if the response has no message or a tool call carries
/// arguments that are not a JSON object.
pub fn map_response(body: OllamaChatResponse) -> Result<ChatResponse, String> {
    let message = body
        .message
        .ok_or_else(|| "No message returned".to_string())?;

    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let arguments = map_arguments(&call.function.name, call.function.arguments)?;
            Ok(ToolCall {
                name: call.function.name,
                arguments,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let usage = match (body.prompt_eval_count, body.eval_count) {
        (None, None) => None,
        (prompt, completion) => {
            let prompt = prompt.unwrap_or(0);
            let completion = completion.unwrap_or(0);
            Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt.saturating_add(completion),
            })
        }
    };

    Ok(ChatResponse {
        content: message.content.unwrap_or_default(),
        thinking: message.thinking.filter(|t| !t.trim().is_empty()),
        tool_calls,
        usage,
    })
}

fn map_arguments(tool: &str, arguments: Value) -> Result<Map<String, Value>, String> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(format!("Arguments for '{tool}' are not a JSON object")),
        },
        _ => Err(format!("Arguments for '{tool}' are not a JSON object")),
    }
}
