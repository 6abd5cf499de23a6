//! Configuration management for the analyst.
//!
//! Settings come from built-in defaults overridden by environment variables
//! prefixed with `ANALYST`, using `__` to separate nested keys.
//!
//! # Example
//!
//! ```no_run
//! use brio_analyst::infrastructure::config::Settings;
//!
//! // ANALYST__INFERENCE__BASE_URL=http://gpu-box:11434/
//! let settings = Settings::new()?;
//! # Ok::<(), config::ConfigError>(())
//! ```

pub mod inference;
pub mod sandbox;
pub mod telemetry;

pub use inference::InferenceSettings;
pub use sandbox::SandboxSettings;
pub use telemetry::TelemetrySettings;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ANALYST";

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Inference service settings.
    pub inference: InferenceSettings,
    /// Sandbox settings.
    pub sandbox: SandboxSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Creates a new settings instance from environment variables and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_prefix(ENV_PREFIX)
    }

    /// Like [`Settings::new`], reading variables under a custom prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("inference.base_url", "http://127.0.0.1:11434/")?
            .set_default("inference.max_retries", 2)?
            .set_default("inference.request_timeout_secs", 600)?
            .set_default("sandbox.image", "python:3.12-slim")?
            .set_default("sandbox.docker_binary", "docker")?
            .set_default("telemetry.log_level", "info")?
            .set_default("telemetry.json", false)?
            .add_source(Environment::with_prefix(prefix).separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
