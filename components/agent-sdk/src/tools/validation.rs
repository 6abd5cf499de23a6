//! Argument validation for tool calls.
//!
//! A raw [`ToolCall`] is turned into a typed [`ToolRequest`] before anything
//! is executed.

use crate::error::ToolError;
use crate::tools::ToolKind;
use crate::tools::constants::args;
use crate::types::ToolCall;
use serde_json::Value;

/// Validated arguments for `python_datascience`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonArgs {
    /// Code exactly as the model sent it.
    pub code: String,
    /// Why the model is running it.
    pub reason: String,
}

/// A tool call whose name and arguments have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    /// Run Python code.
    PythonDatascience(PythonArgs),
}

/// Validates a tool call against the registry and the tool's argument shape.
///
/// # Errors
///
/// Returns [`ToolError::NotFound`] for unregistered names and
/// [`ToolError::InvalidArguments`] when required arguments are missing or
/// have the wrong type.
pub fn validate_call(call: &ToolCall) -> Result<ToolRequest, ToolError> {
    let kind = ToolKind::from_name(&call.name).ok_or_else(|| ToolError::NotFound {
        name: call.name.clone(),
    })?;

    match kind {
        ToolKind::PythonDatascience => {
            let code = required_string(call, args::CODE)?;
            if code.trim().is_empty() {
                return Err(invalid(call, "`code` must not be empty"));
            }
            let reason = optional_string(call, args::REASON)?;
            Ok(ToolRequest::PythonDatascience(PythonArgs { code, reason }))
        }
    }
}

fn required_string(call: &ToolCall, key: &str) -> Result<String, ToolError> {
    match call.arguments.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(call, &format!("`{key}` must be a string"))),
        None => Err(invalid(call, &format!("missing required argument `{key}`"))),
    }
}

fn optional_string(call: &ToolCall, key: &str) -> Result<String, ToolError> {
    match call.arguments.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Ok(String::new()),
        Some(_) => Err(invalid(call, &format!("`{key}` must be a string"))),
    }
}

fn invalid(call: &ToolCall, reason: &str) -> ToolError {
    ToolError::InvalidArguments {
        tool: call.name.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_call() {
        let call = ToolCall::new("python_datascience")
            .with_arg("code", "print(1)")
            .with_arg("reason", "check");
        let request = validate_call(&call).unwrap();
        assert_eq!(
            request,
            ToolRequest::PythonDatascience(PythonArgs {
                code: "print(1)".to_string(),
                reason: "check".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_reason_defaults_to_empty() {
        let call = ToolCall::new("python_datascience").with_arg("code", "print(1)");
        let ToolRequest::PythonDatascience(args) = validate_call(&call).unwrap();
        assert_eq!(args.reason, "");
    }

    #[test]
    fn test_unknown_tool() {
        let call = ToolCall::new("plot_chart").with_arg("code", "x");
        assert!(matches!(
            validate_call(&call),
            Err(ToolError::NotFound { name }) if name == "plot_chart"
        ));
    }

    #[test]
    fn test_missing_code() {
        let call = ToolCall::new("python_datascience").with_arg("reason", "why");
        let err = validate_call(&call).unwrap_err();
        assert!(err.to_string().contains("missing required argument `code`"));
    }

    #[test]
    fn test_wrong_types() {
        let call = ToolCall::new("python_datascience").with_arg("code", 42);
        assert!(matches!(
            validate_call(&call),
            Err(ToolError::InvalidArguments { .. })
        ));

        let call = ToolCall::new("python_datascience")
            .with_arg("code", "print(1)")
            .with_arg("reason", serde_json::json!(["a"]));
        assert!(matches!(
            validate_call(&call),
            Err(ToolError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_blank_code_rejected() {
        let call = ToolCall::new("python_datascience").with_arg("code", "   \n");
        assert!(validate_call(&call).is_err());
    }
}
