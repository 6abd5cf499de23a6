//! Tool dispatch: routes a model's tool call to its implementation.

use crate::config::RunConfig;
use crate::error::ToolError;
use crate::tools::constants::args;
use crate::tools::python::CodeExecutionAdapter;
use crate::tools::validation::{ToolRequest, validate_call};
use crate::tools::{ToolDefinition, ToolKind};
use crate::types::{Message, ToolCall};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Dispatches validated tool calls and wraps each report in a
/// tool-result message.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    python: CodeExecutionAdapter,
    data_file: Option<PathBuf>,
    execution_timeout: Duration,
}

impl ToolDispatcher {
    /// Creates a dispatcher using the run's data file and timeout.
    #[must_use]
    pub fn new(python: CodeExecutionAdapter, config: &RunConfig) -> Self {
        Self {
            python,
            data_file: config.data_file.clone(),
            execution_timeout: config.execution_timeout,
        }
    }

    /// Schemas of every registered tool.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(|kind| kind.definition()).collect()
    }

    /// Executes one tool call.
    ///
    /// Invalid arguments do not abort the run: they come back as an
    /// `error:` report for the model to correct.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] if the tool is not registered.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Message, ToolError> {
        let reason = call.str_arg(args::REASON).unwrap_or_default();
        info!(tool = %call.name, reason, "Model requested tool");

        match validate_call(call) {
            Ok(ToolRequest::PythonDatascience(request)) => {
                info!(code = %request.code, "Executing code");
                let report = self
                    .python
                    .execute(
                        &request.code,
                        self.data_file.as_deref(),
                        self.execution_timeout,
                    )
                    .await;
                info!(report = %report, "Code execution complete");
                Ok(tool_result_message(&request.reason, &request.code, &report))
            }
            Err(e @ ToolError::NotFound { .. }) => Err(e),
            Err(e) => {
                warn!(error = %e, "Rejected tool call");
                let code = call.str_arg(args::CODE).unwrap_or_default();
                Ok(tool_result_message(reason, code, &format!("error:\n{e}")))
            }
        }
    }
}

/// Formats the message recorded for one tool invocation.
#[must_use]
pub fn tool_result_message(reason: &str, code: &str, report: &str) -> Message {
    Message::tool_result(format!(
        "Executed code to '{reason}'\nCode:\n{code}\nOutput:\n{report}"
    ))
}
