//! Sandbox backed by throw-away docker containers.
//!
//! Every session is a fresh container named `analyst-<uuid>`. Missing
//! libraries are installed while the container still has network access;
//! it is then disconnected before any model-written code runs.

use crate::infrastructure::config::SandboxSettings;
use crate::sandbox::harness::{OUTPUT_DIR, MISSING_LIBRARIES_SCRIPT, RUN_SCRIPT};
use agent_sdk::{Artifact, ExecutionResult, Sandbox, SandboxError, SandboxSession, SessionOptions};
use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

const NETWORK: &str = "bridge";

/// Factory for docker-backed sessions.
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    docker: String,
    image: String,
}

impl DockerSandbox {
    /// Creates a sandbox using the configured image and docker binary.
    #[must_use]
    pub fn new(settings: &SandboxSettings) -> Self {
        Self {
            docker: settings.docker_binary.clone(),
            image: settings.image.clone(),
        }
    }

    /// Image every session starts from.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    async fn open(&self, options: SessionOptions) -> Result<Box<dyn SandboxSession>, SandboxError> {
        let name = format!("analyst-{}", Uuid::new_v4().simple());
        let lifetime = options.session_timeout.as_secs().max(1).to_string();

        let output = docker(&self.docker, &start_args(&name, &self.image, &lifetime))
            .await
            .map_err(|e| SandboxError::Unavailable(format!("cannot run '{}': {e}", self.docker)))?;
        if !output.status.success() {
            return Err(SandboxError::Unavailable(stderr_of(&output)));
        }
        debug!(container = %name, image = %self.image, "Sandbox container started");

        // Dropping the session removes the container from here on.
        let session = DockerSession {
            docker: self.docker.clone(),
            name,
            scratch: TempDir::new()?,
            closed: false,
        };
        session.exec(&["mkdir", "-p", OUTPUT_DIR]).await?;

        Ok(Box::new(session))
    }
}

/// A running container used for exactly one execution.
struct DockerSession {
    docker: String,
    name: String,
    scratch: TempDir,
    closed: bool,
}

impl DockerSession {
    async fn exec(&self, command: &[&str]) -> Result<Output, SandboxError> {
        let mut args = vec!["exec", self.name.as_str()];
        args.extend_from_slice(command);
        let output = docker(&self.docker, &args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(SandboxError::Run(stderr_of(&output)))
        }
    }

    async fn install_missing(&self, libraries: &[&str]) -> Result<(), SandboxError> {
        let mut check = vec!["python", "-c", MISSING_LIBRARIES_SCRIPT];
        check.extend_from_slice(libraries);
        let output = self.exec(&check).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let missing: Vec<&str> = stdout.split_whitespace().collect();
        if missing.is_empty() {
            return Ok(());
        }

        info!(libraries = ?missing, "Installing missing sandbox libraries");
        let mut install = vec![
            "python",
            "-m",
            "pip",
            "install",
            "--quiet",
            "--disable-pip-version-check",
        ];
        install.extend_from_slice(&missing);
        self.exec(&install).await.map(|_| ())
    }

    async fn go_offline(&self) -> Result<(), SandboxError> {
        let output = docker(
            &self.docker,
            &["network", "disconnect", "--force", NETWORK, self.name.as_str()],
        )
        .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SandboxError::Run(format!(
                "failed to isolate container: {}",
                stderr_of(&output)
            )))
        }
    }

    async fn run_harness(&self, code: &str) -> Result<Output, SandboxError> {
        let mut child = Command::new(&self.docker)
            .args(["exec", "-i", self.name.as_str(), "python", "-c", RUN_SCRIPT])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        Ok(child.wait_with_output().await?)
    }

    async fn collect_output(&self) -> Result<Vec<Artifact>, SandboxError> {
        let host_dir = self.scratch.path().join("output");
        let source = format!("{}:{OUTPUT_DIR}/.", self.name);
        let target = host_dir.to_string_lossy().into_owned();
        let output = docker(&self.docker, &["cp", source.as_str(), target.as_str()]).await?;
        if !output.status.success() {
            return Err(SandboxError::Run(format!(
                "failed to copy artifacts: {}",
                stderr_of(&output)
            )));
        }
        read_artifacts(&host_dir)
    }
}

#[async_trait]
impl SandboxSession for DockerSession {
    async fn copy_to_runtime(
        &mut self,
        source: &Path,
        destination: &str,
    ) -> Result<(), SandboxError> {
        let target = format!("{}:{destination}", self.name);
        let host = source.to_string_lossy().into_owned();
        let output = docker(&self.docker, &["cp", host.as_str(), target.as_str()])
            .await
            .map_err(|e| SandboxError::Staging {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SandboxError::Staging {
                path: source.to_path_buf(),
                reason: stderr_of(&output),
            })
        }
    }

    async fn run(
        &mut self,
        code: &str,
        libraries: &[&str],
        timeout: Duration,
    ) -> Result<ExecutionResult, SandboxError> {
        self.install_missing(libraries).await?;
        self.go_offline().await?;

        let started = Instant::now();
        let output = tokio::time::timeout(timeout, self.run_harness(code))
            .await
            .map_err(|_| SandboxError::Timeout {
                scope: "execution",
                elapsed: started.elapsed(),
            })??;

        let exit_code = output.status.code().unwrap_or(-1);
        let artifacts = if output.status.success() {
            self.collect_output().await?
        } else {
            Vec::new()
        };
        debug!(
            container = %self.name,
            exit_code,
            artifacts = artifacts.len(),
            "Sandbox run finished"
        );

        Ok(ExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            artifacts,
        })
    }

    async fn close(self: Box<Self>) -> Result<(), SandboxError> {
        let mut session = self;
        session.closed = true;
        let output = docker(&session.docker, &["rm", "-f", session.name.as_str()]).await?;
        if output.status.success() {
            debug!(container = %session.name, "Sandbox container removed");
            Ok(())
        } else {
            Err(SandboxError::Run(stderr_of(&output)))
        }
    }
}

impl Drop for DockerSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Interrupted mid-session; remove the container without waiting.
        let spawned = std::process::Command::new(&self.docker)
            .args(["rm", "-f", self.name.as_str()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            warn!(container = %self.name, error = %e, "Failed to remove sandbox container");
        }
    }
}

fn start_args<'a>(name: &'a str, image: &'a str, lifetime_secs: &'a str) -> Vec<&'a str> {
    vec![
        "run", "-d", "--rm", "--network", NETWORK, "--name", name, image, "sleep", lifetime_secs,
    ]
}

async fn docker(binary: &str, args: &[&str]) -> Result<Output, std::io::Error> {
    Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Reads `plot_<n>.<ext>` files from `dir`, ordered by `n`.
fn read_artifacts(dir: &Path) -> Result<Vec<Artifact>, SandboxError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some((index, format)) = plot_index(&path) else {
            continue;
        };
        found.push((index, format, path));
    }
    found.sort_by_key(|(index, _, _)| *index);

    found
        .into_iter()
        .map(|(_, format, path)| -> Result<Artifact, SandboxError> {
            Ok(Artifact {
                format,
                content: std::fs::read(&path)?,
            })
        })
        .collect()
}

fn plot_index(path: &Path) -> Option<(u32, String)> {
    let stem = path.file_stem()?.to_str()?;
    let format = path.extension()?.to_str()?;
    let index = stem.strip_prefix("plot_")?.parse().ok()?;
    Some((index, format.to_string()))
}
