//! Tool name constants for the Agent SDK.
//!
//! Using constants prevents typos and makes refactoring easier.
//! All tool names should be defined here and imported where needed.

/// Tool names for data-science operations.
pub mod datascience {
    /// Execute Python code against the staged data file.
    pub const PYTHON_DATASCIENCE: &str = "python_datascience";
}

/// Argument keys shared by the tool schema and the validator.
pub mod args {
    /// Source code to execute.
    pub const CODE: &str = "code";

    /// Human-readable justification for the call.
    pub const REASON: &str = "reason";
}
