//! Tool system: a closed set of tools, their schema, validation and dispatch.

pub mod constants;
pub mod python;
pub mod registry;
pub mod validation;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Every tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Run Python against the staged data file.
    PythonDatascience,
}

impl ToolKind {
    /// All registered tools.
    pub const ALL: &'static [ToolKind] = &[ToolKind::PythonDatascience];

    /// Wire name of the tool.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::PythonDatascience => constants::datascience::PYTHON_DATASCIENCE,
        }
    }

    /// Resolves a wire name, or `None` for unregistered tools.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Static schema sent to the model.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        match self {
            ToolKind::PythonDatascience => ToolDefinition {
                name: self.name().to_string(),
                description: "Execute Python code for data science tasks using the provided code and data file."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        constants::args::CODE: {
                            "type": "string",
                            "description": "The Python code to execute."
                        },
                        constants::args::REASON: {
                            "type": "string",
                            "description": "Why you chose to execute this code."
                        }
                    },
                    "required": [constants::args::CODE, constants::args::REASON]
                }),
            },
        }
    }
}

/// Description of a callable tool: name, purpose and argument shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: Value,
}

pub use python::{CodeExecutionAdapter, strip_code_fences, strip_header};
pub use registry::ToolDispatcher;
pub use validation::{PythonArgs, ToolRequest, validate_call};
