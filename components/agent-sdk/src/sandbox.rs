//! Interface to the sandboxed code-execution service.
//!
//! A [`Sandbox`] hands out one [`SandboxSession`] per tool invocation. A
//! session is an isolated, time-bounded environment used exactly once and
//! then closed, so no variables, imports or files survive between calls.

use crate::error::SandboxError;
use crate::types::ExecutionResult;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Path where the data file is staged inside every session.
pub const DATA_FILE_PATH: &str = "/sandbox/data.csv";

/// Libraries the code may import.
pub const ALLOWED_LIBRARIES: &[&str] = &[
    "matplotlib",
    "numpy",
    "io",
    "pandas",
    "scipy",
    "re",
    "math",
];

/// Parameters for opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound for a single run.
    pub execution_timeout: Duration,
    /// Upper bound for the whole session.
    pub session_timeout: Duration,
}

impl SessionOptions {
    /// Derives session options from an execution timeout.
    #[must_use]
    pub fn from_execution_timeout(execution_timeout: Duration) -> Self {
        Self {
            execution_timeout,
            session_timeout: execution_timeout.saturating_mul(10),
        }
    }
}

/// Factory for isolated execution sessions.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Acquires a fresh session.
    async fn open(&self, options: SessionOptions) -> Result<Box<dyn SandboxSession>, SandboxError>;
}

/// A single-use execution environment.
#[async_trait]
pub trait SandboxSession: Send {
    /// Copies a host file into the session at `destination`.
    async fn copy_to_runtime(&mut self, source: &Path, destination: &str)
    -> Result<(), SandboxError>;

    /// Runs `code` with the given libraries available.
    async fn run(
        &mut self,
        code: &str,
        libraries: &[&str],
        timeout: Duration,
    ) -> Result<ExecutionResult, SandboxError>;

    /// Releases the session.
    async fn close(self: Box<Self>) -> Result<(), SandboxError>;
}
