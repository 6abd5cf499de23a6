//! Agent SDK - Core of the Brio data-science analyst.
//!
//! This crate holds the domain logic of a bounded reasoning loop between a
//! language model and a sandboxed Python executor. Concrete model and
//! sandbox backends live in the host crate and plug in through the
//! [`LLMProvider`] and [`Sandbox`] traits.
//!
//! # Features
//!
//! - **Error Handling**: Structured error hierarchy using `thiserror`
//! - **Configuration**: Validated run configuration with a builder
//! - **Conversation State**: Append-only history with JSON persistence
//! - **Tool System**: Closed tool set with typed argument validation
//! - **Agent Engine**: Bounded `ReAct` loop with an explicit state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_sdk::{AgentEngineBuilder, LLMProvider, RunConfig, Sandbox};
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     provider: Arc<dyn LLMProvider>,
//! #     sandbox: Arc<dyn Sandbox>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::builder()
//!     .max_steps(10)
//!     .data_file("data.csv")
//!     .build()?;
//!
//! let engine = AgentEngineBuilder::new()
//!     .provider(provider)
//!     .sandbox(sandbox)
//!     .config(config)
//!     .build()?;
//!
//! let report = engine.run("What is the mean of column x?", None).await?;
//! println!("{:?}", report.answer());
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod inference;
pub mod prompt;
pub mod sandbox;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use config::{RunConfig, RunConfigBuilder};
pub use conversation::ConversationState;
pub use engine::{AgentEngine, AgentEngineBuilder, LoopState, SessionOutcome, SessionReport};
pub use error::{
    AgentError, ConversationError, InferenceError, SandboxError, TaskError, ToolError,
};
pub use inference::{ChatRequest, ChatResponse, LLMProvider, Usage};
pub use prompt::PromptBuilder;
pub use sandbox::{Sandbox, SandboxSession, SessionOptions};
pub use tools::{CodeExecutionAdapter, ToolDefinition, ToolDispatcher, ToolKind};
pub use types::{Artifact, ExecutionResult, Message, Role, ToolCall};

/// Version of the agent SDK.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
