//! Adapter that turns model-written Python into a textual report.

use crate::error::SandboxError;
use crate::sandbox::{ALLOWED_LIBRARIES, DATA_FILE_PATH, Sandbox, SandboxSession, SessionOptions};
use crate::types::{Artifact, ExecutionResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

const FENCE: &str = "```";

/// Runs code in a fresh sandbox session per call and renders the outcome
/// as `output:\n...` or `error:\n...`.
#[derive(Clone)]
pub struct CodeExecutionAdapter {
    sandbox: Arc<dyn Sandbox>,
    artifact_dir: PathBuf,
}

impl std::fmt::Debug for CodeExecutionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeExecutionAdapter")
            .field("artifact_dir", &self.artifact_dir)
            .finish_non_exhaustive()
    }
}

impl CodeExecutionAdapter {
    /// Creates an adapter writing artifacts into `artifact_dir`.
    pub fn new(sandbox: Arc<dyn Sandbox>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            sandbox,
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Executes `code` and returns the report text.
    ///
    /// Never fails: sandbox problems are reported as `error:` text so the
    /// model can react to them.
    pub async fn execute(
        &self,
        code: &str,
        data_file: Option<&Path>,
        execution_timeout: Duration,
    ) -> String {
        let code = strip_code_fences(code);
        let options = SessionOptions::from_execution_timeout(execution_timeout);

        match self.run_in_session(&code, data_file, options).await {
            Ok(result) if result.success() => {
                self.write_artifacts(&result.artifacts).await;
                format!("output:\n{}", strip_header(&result.stdout))
            }
            Ok(result) => format!("error:\n{}", result.stderr),
            Err(e) => {
                warn!(error = %e, "Sandbox failure");
                format!("error:\n{e}")
            }
        }
    }

    async fn run_in_session(
        &self,
        code: &str,
        data_file: Option<&Path>,
        options: SessionOptions,
    ) -> Result<ExecutionResult, SandboxError> {
        // Opening, staging and running share one session deadline.
        let deadline = Instant::now() + options.session_timeout;
        let expired = || SandboxError::Timeout {
            scope: "session",
            elapsed: options.session_timeout,
        };

        let mut session = timeout_at(deadline, self.sandbox.open(options))
            .await
            .map_err(|_| expired())??;

        let outcome = timeout_at(
            deadline,
            stage_and_run(session.as_mut(), code, data_file, options.execution_timeout),
        )
        .await;

        // The session is released on every path, waiting at most one execution timeout.
        match timeout(options.execution_timeout, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to close sandbox session"),
            Err(_) => warn!("Timed out closing sandbox session"),
        }

        outcome.map_err(|_| expired())?
    }

    async fn write_artifacts(&self, artifacts: &[Artifact]) {
        for (i, artifact) in artifacts.iter().enumerate() {
            let path = self
                .artifact_dir
                .join(format!("plot_{}.{}", i + 1, artifact.format));
            match tokio::fs::write(&path, &artifact.content).await {
                Ok(()) => info!(path = %path.display(), "Saved artifact"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to save artifact"),
            }
        }
    }
}

async fn stage_and_run(
    session: &mut dyn SandboxSession,
    code: &str,
    data_file: Option<&Path>,
    execution_timeout: Duration,
) -> Result<ExecutionResult, SandboxError> {
    if let Some(path) = data_file {
        debug!(path = %path.display(), "Staging data file");
        session.copy_to_runtime(path, DATA_FILE_PATH).await?;
    }
    session
        .run(code, ALLOWED_LIBRARIES, execution_timeout)
        .await
}

/// Removes surrounding Markdown code fences and whitespace.
///
/// An opening fence takes its whole line with it, language tag included
/// (`python`, `Python`, `python3`, ...). Applied repeatedly until nothing
/// changes, so the result is a fixpoint.
#[must_use]
pub fn strip_code_fences(code: &str) -> String {
    let mut current = code.trim();
    loop {
        let mut next = current;
        if let Some(rest) = next.strip_prefix(FENCE) {
            next = rest.split_once('\n').map_or(rest, |(_, body)| body);
        }
        if let Some(rest) = next.strip_suffix(FENCE) {
            next = rest;
        }
        let next = next.trim();
        if next == current {
            return next.to_string();
        }
        current = next;
    }
}

/// Drops the two header lines the sandbox prepends to stdout.
///
/// Output with fewer than two line breaks yields an empty string.
#[must_use]
pub fn strip_header(stdout: &str) -> &str {
    stdout
        .match_indices('\n')
        .nth(1)
        .map_or("", |(idx, _)| &stdout[idx + 1..])
}


#[cfg(test)]
mod tests {
    use super::testing::FakeSandbox;
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn ok(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            ..ExecutionResult::default()
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("```py\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("```\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("  print(1)  "), "print(1)");
        assert_eq!(strip_code_fences("```python\n```python\nx = 1\n```\n```"), "x = 1");
    }

    #[test]
    fn test_strip_code_fences_drops_language_tag_line() {
        assert_eq!(strip_code_fences("```Python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("```python3\nx = 1\nprint(x)\n```"), "x = 1\nprint(x)");
        assert_eq!(strip_code_fences("```PY \nprint(2)"), "print(2)");
        assert_eq!(strip_code_fences("```print(3)```"), "print(3)");
    }

    #[test]
    fn test_strip_code_fences_is_idempotent() {
        for input in [
            "```python\nprint(1)\n```",
            "```Python3\nprint(1)\n```",
            "```",
            "",
            "a\n```",
            "```py x",
        ] {
            let once = strip_code_fences(input);
            assert_eq!(strip_code_fences(&once), once);
        }
    }

    #[test]
    fn test_strip_header() {
        assert_eq!(strip_header("h1\nh2\n3.0\n"), "3.0\n");
        assert_eq!(strip_header("h1\nh2\n"), "");
        assert_eq!(strip_header("only one line\n"), "");
        assert_eq!(strip_header(""), "");
    }

    #[tokio::test]
    async fn test_success_report() {
        let sandbox = Arc::new(FakeSandbox::returning(ok("h1\nh2\n3.0\n")));
        let dir = TempDir::new().unwrap();
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), dir.path());

        let report = adapter
            .execute("```python\nprint(3.0)\n```", None, Duration::from_secs(5))
            .await;

        assert_eq!(report, "output:\n3.0\n");
        assert_eq!(sandbox.codes.lock().unwrap().as_slice(), ["print(3.0)"]);
        assert_eq!(*sandbox.opened.lock().unwrap(), 1);
        assert_eq!(*sandbox.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failure_report_uses_stderr() {
        let result = ExecutionResult {
            exit_code: 1,
            stdout: "h1\nh2\n".to_string(),
            stderr: "NameError: name 'y' is not defined".to_string(),
            artifacts: Vec::new(),
        };
        let sandbox = Arc::new(FakeSandbox::returning(result));
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), ".");

        let report = adapter.execute("print(y)", None, Duration::from_secs(5)).await;

        assert_eq!(report, "error:\nNameError: name 'y' is not defined");
        assert_eq!(*sandbox.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_data_file_is_staged() {
        let sandbox = Arc::new(FakeSandbox::returning(ok("h1\nh2\n")));
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), ".");

        adapter
            .execute("print(1)", Some(Path::new("data.csv")), Duration::from_secs(5))
            .await;

        let staged = sandbox.staged.lock().unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].0, PathBuf::from("data.csv"));
        assert_eq!(staged[0].1, DATA_FILE_PATH);
    }

    #[tokio::test]
    async fn test_artifacts_written_in_order() {
        let result = ExecutionResult {
            exit_code: 0,
            stdout: "h1\nh2\ndone\n".to_string(),
            stderr: String::new(),
            artifacts: vec![
                Artifact {
                    format: "png".to_string(),
                    content: b"first".to_vec(),
                },
                Artifact {
                    format: "svg".to_string(),
                    content: b"second".to_vec(),
                },
            ],
        };
        let sandbox = Arc::new(FakeSandbox::returning(result));
        let dir = TempDir::new().unwrap();
        let adapter = CodeExecutionAdapter::new(sandbox, dir.path());

        adapter.execute("plot()", None, Duration::from_secs(5)).await;

        assert_eq!(std::fs::read(dir.path().join("plot_1.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join("plot_2.svg")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_artifact_write_failure_keeps_report() {
        let result = ExecutionResult {
            exit_code: 0,
            stdout: "h1\nh2\nok\n".to_string(),
            stderr: String::new(),
            artifacts: vec![Artifact {
                format: "png".to_string(),
                content: vec![1, 2, 3],
            }],
        };
        let sandbox = Arc::new(FakeSandbox::returning(result));
        let adapter = CodeExecutionAdapter::new(sandbox, "/nonexistent/dir/for/plots");

        let report = adapter.execute("plot()", None, Duration::from_secs(5)).await;
        assert_eq!(report, "output:\nok\n");
    }

    #[tokio::test]
    async fn test_unavailable_sandbox_is_reported() {
        let sandbox = Arc::new(FakeSandbox {
            fail_open: true,
            ..FakeSandbox::default()
        });
        let adapter = CodeExecutionAdapter::new(sandbox, ".");

        let report = adapter.execute("print(1)", None, Duration::from_secs(5)).await;
        assert!(report.starts_with("error:\n"));
        assert!(report.contains("no runtime"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_timeout_closes_session() {
        let sandbox = Arc::new(FakeSandbox {
            hang: true,
            ..FakeSandbox::default()
        });
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), ".");

        let report = adapter.execute("while True: pass", None, Duration::from_secs(1)).await;

        assert!(report.starts_with("error:\n"));
        assert!(report.contains("timed out"));
        assert_eq!(*sandbox.closed.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_open_is_bounded_by_session_timeout() {
        let sandbox = Arc::new(FakeSandbox {
            hang_open: true,
            ..FakeSandbox::default()
        });
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), ".");
        let started = tokio::time::Instant::now();

        let report = tokio::time::timeout(
            Duration::from_secs(60),
            adapter.execute("print(1)", None, Duration::from_secs(1)),
        )
        .await
        .expect("execute must return within the session timeout");

        assert!(report.starts_with("error:\n"));
        assert!(report.contains("session timed out"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
        assert!(sandbox.codes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_close_does_not_block_report() {
        let sandbox = Arc::new(FakeSandbox {
            result: Mutex::new(Some(ok("h1\nh2\n1\n"))),
            hang_close: true,
            ..FakeSandbox::default()
        });
        let adapter = CodeExecutionAdapter::new(sandbox.clone(), ".");
        let started = tokio::time::Instant::now();

        let report = tokio::time::timeout(
            Duration::from_secs(60),
            adapter.execute("print(1)", None, Duration::from_secs(1)),
        )
        .await
        .expect("execute must return once closing times out");

        assert_eq!(report, "output:\n1\n");
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1) && elapsed < Duration::from_secs(2));
    }
}
