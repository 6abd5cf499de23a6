//! Engine builder pattern.

use crate::config::RunConfig;
use crate::engine::AgentEngine;
use crate::error::{AgentError, TaskError};
use crate::inference::LLMProvider;
use crate::sandbox::Sandbox;
use crate::tools::{CodeExecutionAdapter, ToolDispatcher};
use std::sync::Arc;

/// Builder for constructing agent engines.
#[derive(Default)]
pub struct AgentEngineBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    config: Option<RunConfig>,
}

impl std::fmt::Debug for AgentEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEngineBuilder")
            .field("provider", &self.provider.is_some())
            .field("sandbox", &self.sandbox.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl AgentEngineBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inference service.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the code-execution sandbox.
    #[must_use]
    pub fn sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the agent engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or sandbox is not configured, or the
    /// configuration is invalid.
    pub fn build(self) -> Result<AgentEngine, AgentError> {
        let provider = self.provider.ok_or_else(|| TaskError::MissingConfiguration {
            key: "provider".to_string(),
        })?;
        let sandbox = self.sandbox.ok_or_else(|| TaskError::MissingConfiguration {
            key: "sandbox".to_string(),
        })?;
        let config = self.config.unwrap_or_default();

        let adapter = CodeExecutionAdapter::new(sandbox, config.artifact_dir.clone());
        let dispatcher = ToolDispatcher::new(adapter, &config);

        AgentEngine::new(provider, dispatcher, config)
    }
}
