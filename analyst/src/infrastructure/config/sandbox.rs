//! Sandbox configuration.
//!
//! The image must provide `python`; missing allowed libraries are installed
//! with pip before the container is taken offline.

use serde::Deserialize;

/// Settings for the docker sandbox.
#[derive(Debug, Deserialize, Clone)]
pub struct SandboxSettings {
    /// Container image used for every session.
    pub image: String,
    /// Docker CLI binary.
    pub docker_binary: String,
}
