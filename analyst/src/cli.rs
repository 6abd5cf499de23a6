use agent_sdk::{RunConfig, TaskError};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Chat with an AI data scientist that answers by running Python.
#[derive(Parser, Debug, Clone)]
#[command(name = "brio-analyst", version)]
#[command(about = "Chat with an AI data scientist that answers by running Python")]
pub struct Args {
    /// A single question to answer. Omit to start an interactive chat.
    pub question: Option<String>,

    /// Data file to analyse; staged at /sandbox/data.csv.
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Expert model and temperature.
    #[arg(long, value_name = "MODEL:TEMP", default_value = "gpt-oss:0.5")]
    pub expert: ModelSpec,

    /// Maximum reasoning steps per question.
    #[arg(long, default_value_t = 20)]
    pub max_steps: u32,

    /// Log the model's thinking and debug details.
    #[arg(long)]
    pub verbose: bool,

    /// Ask the model for a thinking trace, if it supports one.
    #[arg(long)]
    pub thinking: bool,

    /// Write the conversation to a .convo file after each final answer.
    #[arg(long)]
    pub write_convo: bool,

    /// Timeout for one Python execution, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub execution_timeout: u64,

    /// Continue a conversation saved with --write-convo.
    #[arg(long, value_name = "PATH")]
    pub resume: Option<PathBuf>,
}

impl Args {
    /// Builds the run configuration for this invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the data file does not exist or a value fails
    /// validation.
    pub fn run_config(&self) -> Result<RunConfig, TaskError> {
        let mut builder = RunConfig::builder()
            .model(self.expert.model.clone())
            .temperature(self.expert.temperature)
            .max_steps(self.max_steps)
            .execution_timeout(Duration::from_secs(self.execution_timeout))
            .thinking(self.thinking)
            .verbose(self.verbose)
            .persist_on_finish(self.write_convo);

        if let Some(path) = &self.data_file {
            if !path.is_file() {
                return Err(TaskError::InvalidConfiguration {
                    key: "data_file".to_string(),
                    value: path.display().to_string(),
                });
            }
            builder = builder.data_file(path.clone());
        }

        builder.build()
    }
}

/// A `model:temperature` pair, e.g. `gpt-oss:0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    /// Model identifier; may itself contain `:` (e.g. `qwen3:8b:0.2`).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Rejected `--expert` value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid format: '{0}'. Use 'model_name:temperature'.")]
pub struct ModelSpecError(String);

impl FromStr for ModelSpec {
    type Err = ModelSpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelSpecError(value.to_string());
        let (model, temp) = value.rsplit_once(':').ok_or_else(invalid)?;

        // Digits with at most one decimal point
        let digits = temp.replacen('.', "", 1);
        if model.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let temperature = temp.parse().map_err(|_| invalid())?;

        Ok(Self {
            model: model.to_string(),
            temperature,
        })
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_model_spec_parsing() {
        assert_eq!(
            "gpt-oss:0.5".parse::<ModelSpec>().unwrap(),
            ModelSpec {
                model: "gpt-oss".to_string(),
                temperature: 0.5
            }
        );
        let spec: ModelSpec = "qwen3:8b:1".parse().unwrap();
        assert_eq!(spec.model, "qwen3:8b");
        assert!((spec.temperature - 1.0).abs() < f32::EPSILON);
        assert!(".5".parse::<ModelSpec>().is_err());
        assert!("m:.5".parse::<ModelSpec>().is_ok());
    }

    #[test]
    fn test_model_spec_rejects_bad_values() {
        for bad in ["gpt-oss", "gpt-oss:", "gpt-oss:hot", "gpt-oss:0.5.1", "gpt-oss:-1", ":0.5"] {
            assert!(bad.parse::<ModelSpec>().is_err(), "{bad} should be rejected");
        }
        assert_eq!(
            "x".parse::<ModelSpec>().unwrap_err().to_string(),
            "Invalid format: 'x'. Use 'model_name:temperature'."
        );
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["brio-analyst"]);
        assert!(args.question.is_none());
        assert_eq!(args.expert.to_string(), "gpt-oss:0.5");
        assert_eq!(args.max_steps, 20);
        assert_eq!(args.execution_timeout, 600);
        assert!(!args.write_convo);

        let config = args.run_config().unwrap();
        assert_eq!(config.model, "gpt-oss");
        assert_eq!(config.max_steps, 20);
        assert_eq!(config.execution_timeout, Duration::from_secs(600));
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_flags() {
        let data = NamedTempFile::new().unwrap();
        let args = Args::parse_from([
            "brio-analyst",
            "What is the mean of x?",
            "--data-file",
            data.path().to_str().unwrap(),
            "--expert",
            "llama3.1:0.2",
            "--max-steps",
            "3",
            "--verbose",
            "--thinking",
            "--write-convo",
            "--execution-timeout",
            "30",
        ]);
        assert_eq!(args.question.as_deref(), Some("What is the mean of x?"));

        let config = args.run_config().unwrap();
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.max_steps, 3);
        assert!(config.thinking && config.verbose && config.persist_on_finish);
        assert_eq!(config.data_file.as_deref(), Some(data.path()));
    }

    #[test]
    fn test_missing_data_file_rejected() {
        let args = Args::parse_from(["brio-analyst", "--data-file", "/nonexistent/data.csv"]);
        assert!(matches!(
            args.run_config(),
            Err(TaskError::InvalidConfiguration { key, .. }) if key == "data_file"
        ));
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        let args = Args::parse_from(["brio-analyst", "--max-steps", "0"]);
        assert!(args.run_config().is_err());
    }
}
