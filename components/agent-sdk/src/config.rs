//! Configuration for a reasoning session.
//!
//! Provides a strongly-typed configuration with sensible defaults and a
//! validating builder. A [`RunConfig`] is immutable for the lifetime of one
//! reasoning session.

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings for one reasoning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model identifier passed to the inference service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of reasoning steps before giving up.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Timeout for a single code execution. The sandbox session is bounded
    /// by ten times this value.
    #[serde(default = "default_execution_timeout", with = "duration_secs")]
    pub execution_timeout: Duration,

    /// Ask the model for a thinking trace.
    #[serde(default)]
    pub thinking: bool,

    /// Log thinking traces and extra diagnostics.
    #[serde(default)]
    pub verbose: bool,

    /// Persist the conversation when a final answer is produced.
    #[serde(default)]
    pub persist_on_finish: bool,

    /// Data file staged into every sandbox session.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Directory receiving plot artifacts.
    #[serde(default = "default_dir")]
    pub artifact_dir: PathBuf,

    /// Directory receiving persisted conversation logs.
    #[serde(default = "default_dir")]
    pub log_dir: PathBuf,
}

impl RunConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_steps` is zero, the model is empty, the
    /// temperature is outside `[0, 2]`, or the execution timeout is zero.
    pub fn validate(&self) -> Result<&Self, TaskError> {
        if self.max_steps == 0 {
            return Err(TaskError::InvalidConfiguration {
                key: "max_steps".to_string(),
                value: "0".to_string(),
            });
        }

        if self.model.trim().is_empty() {
            return Err(TaskError::InvalidConfiguration {
                key: "model".to_string(),
                value: "empty".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(TaskError::InvalidConfiguration {
                key: "temperature".to_string(),
                value: self.temperature.to_string(),
            });
        }

        if self.execution_timeout.is_zero() {
            return Err(TaskError::InvalidConfiguration {
                key: "execution_timeout".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(self)
    }

    /// Returns a builder for creating configuration.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_steps: default_max_steps(),
            execution_timeout: default_execution_timeout(),
            thinking: false,
            verbose: false,
            persist_on_finish: false,
            data_file: None,
            artifact_dir: default_dir(),
            log_dir: default_dir(),
        }
    }
}

/// Builder for constructing [`RunConfig`].
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_steps: Option<u32>,
    execution_timeout: Option<Duration>,
    thinking: Option<bool>,
    verbose: Option<bool>,
    persist_on_finish: Option<bool>,
    data_file: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

impl RunConfigBuilder {
    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the reasoning step budget.
    #[must_use]
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Sets the execution timeout.
    #[must_use]
    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    /// Enables the model thinking trace.
    #[must_use]
    pub fn thinking(mut self, thinking: bool) -> Self {
        self.thinking = Some(thinking);
        self
    }

    /// Sets whether to enable verbose logging.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Persist the conversation after a final answer.
    #[must_use]
    pub fn persist_on_finish(mut self, persist: bool) -> Self {
        self.persist_on_finish = Some(persist);
        self
    }

    /// Sets the data file staged into the sandbox.
    #[must_use]
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Sets the plot artifact directory.
    #[must_use]
    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Sets the conversation log directory.
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Builds the configuration, validating all values.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration fails validation.
    pub fn build(self) -> Result<RunConfig, TaskError> {
        let mut config = RunConfig::default();

        if let Some(v) = self.model {
            config.model = v;
        }
        if let Some(v) = self.temperature {
            config.temperature = v;
        }
        if let Some(v) = self.max_steps {
            config.max_steps = v;
        }
        if let Some(v) = self.execution_timeout {
            config.execution_timeout = v;
        }
        if let Some(v) = self.thinking {
            config.thinking = v;
        }
        if let Some(v) = self.verbose {
            config.verbose = v;
        }
        if let Some(v) = self.persist_on_finish {
            config.persist_on_finish = v;
        }
        if self.data_file.is_some() {
            config.data_file = self.data_file;
        }
        if let Some(v) = self.artifact_dir {
            config.artifact_dir = v;
        }
        if let Some(v) = self.log_dir {
            config.log_dir = v;
        }

        config.validate()?;
        Ok(config)
    }
}

// Default value functions
fn default_model() -> String {
    "gpt-oss".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_steps() -> u32 {
    20
}

fn default_execution_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

// Durations are stored as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
